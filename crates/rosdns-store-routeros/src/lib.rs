// # RouterOS Record Store
//
// This crate provides a `RecordStore` over the RouterOS REST API
// (RouterOS 7.1 and later), backed by the router's static DNS table.
//
// ## Behaviour
//
// - One HTTP request per store call, no retries
// - HTTP Basic authentication on every request
// - Bounded request timeout (30 seconds unless configured)
// - Non-success statuses decode the router's `{error, message, detail}` body
// - Dry-run mode: listing is live, mutations are logged and skipped
//
// ## Security Requirements
//
// - The password NEVER appears in logs or `Debug` output
// - Plain-HTTP router URLs are accepted but warned about at startup
//
// ## API Reference
//
// - List records: GET `/rest/ip/dns/static`
// - Create record: PUT `/rest/ip/dns/static`
// - Update record: PATCH `/rest/ip/dns/static/{id}`
// - Delete record: DELETE `/rest/ip/dns/static/{id}`

use async_trait::async_trait;
use rosdns_core::config::StoreConfig;
use rosdns_core::{Error, Record, RecordStore, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// REST path of the static DNS table, relative to the router URL
const STATIC_DNS_PATH: &str = "rest/ip/dns/static";

/// Success statuses per operation
///
/// RouterOS releases differ in which of them they return for the same call.
const LIST_OK: &[u16] = &[200];
const CREATE_OK: &[u16] = &[200, 201];
const MUTATION_OK: &[u16] = &[200, 204];

/// Error body returned by the RouterOS REST API
#[derive(Debug, Deserialize)]
struct ApiError {
    error: Option<u16>,
    message: Option<String>,
    detail: Option<String>,
}

/// RouterOS static DNS store
///
/// Stateless: every call is a single request against the router.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the store will:
/// - Perform list requests
/// - Log the intended PUT/PATCH/DELETE with its payload
/// - **NOT** modify the table
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct RouterOsStore {
    /// Collection URL of the static DNS table
    records_url: Url,

    /// REST API user
    username: String,

    /// REST API password
    /// ⚠️ NEVER log this value
    password: SecretString,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list normally but skip mutations
    dry_run: bool,
}

impl std::fmt::Debug for RouterOsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOsStore")
            .field("records_url", &self.records_url.as_str())
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl RouterOsStore {
    /// Create a store from configuration
    ///
    /// Fails if the router URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        if config.dry_run {
            tracing::warn!("RouterOS store running in DRY-RUN mode - no changes will be made");
        }

        Self::with_client(
            client,
            config.url()?,
            config.username.clone(),
            config.password.clone(),
            config.dry_run,
        )
    }

    /// Create a store around an existing HTTP client
    ///
    /// `base_url` is the router URL; a path prefix is kept, so
    /// `https://gw/router` addresses `https://gw/router/rest/ip/dns/static`.
    pub fn with_client(
        client: reqwest::Client,
        mut base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        dry_run: bool,
    ) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let records_url = base_url
            .join(STATIC_DNS_PATH)
            .map_err(|e| Error::config(format!("Invalid router URL {base_url}: {e}")))?;

        Ok(Self {
            records_url,
            username: username.into(),
            password,
            client,
            dry_run,
        })
    }

    /// Whether mutations are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// URL of a single record
    fn record_url(&self, operation: &'static str, id: &str) -> Result<Url> {
        let mut url = self.records_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::transport(operation, format!("{} cannot address records", self.records_url)))?
            .push(id);
        Ok(url)
    }

    /// Send a request and check its status against `accepted`
    async fn send(
        &self,
        operation: &'static str,
        accepted: &[u16],
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(|e| Error::transport(operation, format!("HTTP request failed: {e}")))?;

        let status = response.status().as_u16();
        if accepted.contains(&status) {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(store_error(operation, status, &body))
    }

    /// Read a response body
    async fn read_body(operation: &'static str, response: reqwest::Response) -> Result<String> {
        response
            .text()
            .await
            .map_err(|e| Error::transport(operation, format!("Failed to read response: {e}")))
    }

    fn log_dry_run(&self, method: &str, url: &Url, payload: Option<&Record>) {
        match payload.map(serde_json::to_string) {
            Some(Ok(body)) => tracing::info!(
                "[DRY-RUN] Would send {} request to {} with payload: {}",
                method,
                url,
                body
            ),
            _ => tracing::info!("[DRY-RUN] Would send {} request to {}", method, url),
        }
    }
}

/// Map a non-success response to a store error
///
/// An undecodable body is kept verbatim as the message.
fn store_error(operation: &'static str, status: u16, body: &str) -> Error {
    let (code, message, detail) = match serde_json::from_str::<ApiError>(body) {
        Ok(api) => (
            api.error,
            api.message.unwrap_or_else(|| status_text(status)),
            api.detail,
        ),
        Err(_) if body.trim().is_empty() => (None, status_text(status), None),
        Err(_) => (None, body.trim().to_string(), None),
    };

    if matches!(status, 401 | 403) {
        tracing::warn!("RouterOS rejected the credentials of the configured user (HTTP {})", status);
    }

    Error::Store {
        operation,
        status,
        code,
        message,
        detail,
    }
}

/// Decode one record of a store response
fn decode_record(operation: &'static str, value: serde_json::Value) -> Result<Record> {
    Record::from_json(value).map_err(|e| match e {
        Error::Json(e) => Error::decode(operation, e.to_string()),
        other => other,
    })
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown status")
        .to_string()
}

#[async_trait]
impl RecordStore for RouterOsStore {
    /// List the static DNS table
    ///
    /// ```http
    /// GET /rest/ip/dns/static
    /// Authorization: Basic <credentials>
    /// ```
    async fn list_records(&self) -> Result<Vec<Record>> {
        tracing::debug!("Listing static DNS records: GET {}", self.records_url);

        let response = self
            .send("list", LIST_OK, self.client.get(self.records_url.clone()))
            .await?;
        let body = Self::read_body("list", response).await?;
        let values: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| Error::decode("list", e.to_string()))?;
        let records = values
            .into_iter()
            .map(|value| decode_record("list", value))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Router returned {} static DNS records", records.len());
        Ok(records)
    }

    /// Create a record
    ///
    /// ```http
    /// PUT /rest/ip/dns/static
    /// {"name": "api.example.com", "type": "A", "ttl": "300s", "address": "10.0.0.1"}
    /// ```
    async fn create_record(&self, record: &Record) -> Result<Record> {
        let payload = record.without_id();

        if self.dry_run {
            self.log_dry_run("PUT", &self.records_url, Some(&payload));
            return Ok(payload);
        }

        tracing::debug!("Creating {} {}: PUT {}", payload.record_type, payload.name, self.records_url);
        let response = self
            .send("create", CREATE_OK, self.client.put(self.records_url.clone()).json(&payload))
            .await?;
        let body = Self::read_body("create", response).await?;

        // The record exists at this point; without an echo its identity is
        // only learned on the next read
        if body.trim().is_empty() {
            tracing::warn!("Router created {} {} without echoing it", payload.record_type, payload.name);
            return Ok(payload);
        }
        let value = serde_json::from_str(&body).map_err(|e| Error::decode("create", e.to_string()))?;
        decode_record("create", value)
    }

    /// Update a record
    ///
    /// ```http
    /// PATCH /rest/ip/dns/static/*1A
    /// {"name": "api.example.com", "type": "A", "ttl": "300s", "address": "10.0.0.2"}
    /// ```
    async fn update_record(&self, id: &str, record: &Record) -> Result<()> {
        let url = self.record_url("update", id)?;
        let payload = record.without_id();

        if self.dry_run {
            self.log_dry_run("PATCH", &url, Some(&payload));
            return Ok(());
        }

        tracing::debug!("Updating {} {}: PATCH {}", payload.record_type, payload.name, url);
        self.send("update", MUTATION_OK, self.client.patch(url).json(&payload))
            .await?;
        Ok(())
    }

    /// Delete a record
    ///
    /// ```http
    /// DELETE /rest/ip/dns/static/*1A
    /// ```
    async fn delete_record(&self, id: &str) -> Result<()> {
        let url = self.record_url("delete", id)?;

        if self.dry_run {
            self.log_dry_run("DELETE", &url, None);
            return Ok(());
        }

        tracing::debug!("Deleting record {}: DELETE {}", id, url);
        self.send("delete", MUTATION_OK, self.client.delete(url)).await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "routeros"
    }
}
