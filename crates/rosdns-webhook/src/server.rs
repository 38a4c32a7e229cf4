//! HTTP surface of the webhook
//!
//! Routes of the external-dns webhook protocol on the webhook listener, and
//! `/healthz` alone on the health listener. Handlers only decode, call the
//! [`SyncEngine`] and encode; all DNS logic lives in `rosdns-core`.

use std::convert::Infallible;

use axum::{
    Router,
    body::Bytes,
    extract::{FromRequestParts, State},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rosdns_core::model::WEBHOOK_MEDIA_TYPE;
use rosdns_core::{Changes, DomainFilter, Endpoint, Error, ErrorKind, SyncEngine};
use serde::Serialize;
use tracing::{debug, error};

/// Media type without parameters, as matched against `Accept`
const WEBHOOK_MEDIA_TYPE_ESSENCE: &str = "application/external.dns.webhook+json";

/// Build the webhook router
pub fn router(engine: SyncEngine) -> Router {
    Router::new()
        .route("/", get(domain_filter))
        .route("/records", get(records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .route("/healthz", get(healthz))
        .with_state(engine)
}

/// Build the health router
pub fn health_router() -> Router {
    Router::new().route("/healthz", get(healthz))
}

/// Response media type negotiated from the request's `Accept` header
///
/// The first `Accept` entry naming the webhook media type is echoed,
/// including its version parameter; anything else yields the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedMediaType(pub String);

impl NegotiatedMediaType {
    fn from_accept(accept: Option<&str>) -> Self {
        let negotiated = accept
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .find(|entry| {
                entry
                    .split(';')
                    .next()
                    .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(WEBHOOK_MEDIA_TYPE_ESSENCE))
            })
            .unwrap_or(WEBHOOK_MEDIA_TYPE);
        Self(negotiated.to_string())
    }

    fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.0).unwrap_or(HeaderValue::from_static(WEBHOOK_MEDIA_TYPE))
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for NegotiatedMediaType {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok());
        Ok(Self::from_accept(accept))
    }
}

/// JSON body sent with the negotiated media type
pub struct WebhookJson<T>(pub NegotiatedMediaType, pub T);

impl<T: Serialize> IntoResponse for WebhookJson<T> {
    fn into_response(self) -> Response {
        let WebhookJson(media_type, body) = self;
        match serde_json::to_vec(&body) {
            Ok(bytes) => {
                debug!("Response body: {}", String::from_utf8_lossy(&bytes));
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, media_type.header_value())],
                    bytes,
                )
                    .into_response()
            }
            Err(e) => ApiError(Error::Json(e)).into_response(),
        }
    }
}

/// Error response; the status follows the error's kind
///
/// Anything the router sent or failed to send is a bad gateway, whatever
/// its kind.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    fn status(&self) -> StatusCode {
        if self.0.is_upstream() {
            return StatusCode::BAD_GATEWAY;
        }
        match self.0.kind() {
            ErrorKind::Serialization => StatusCode::BAD_REQUEST,
            ErrorKind::Translation | ErrorKind::Parse => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Store | ErrorKind::Transport => StatusCode::BAD_GATEWAY,
            ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("Request failed ({}): {}", status, self.0);
        (status, self.0.to_string()).into_response()
    }
}

/// GET / - Domain filter, also the controller's negotiation handshake
async fn domain_filter(media_type: NegotiatedMediaType) -> WebhookJson<DomainFilter> {
    debug!("GET / negotiated {}", media_type.0);
    WebhookJson(media_type, DomainFilter::default())
}

/// GET /records - Current endpoints
async fn records(
    State(engine): State<SyncEngine>,
    media_type: NegotiatedMediaType,
) -> Result<WebhookJson<Vec<Endpoint>>, ApiError> {
    let endpoints = engine.records().await?;
    Ok(WebhookJson(media_type, endpoints))
}

/// POST /adjustendpoints - Attach store identities
async fn adjust_endpoints(
    State(engine): State<SyncEngine>,
    media_type: NegotiatedMediaType,
    body: Bytes,
) -> Result<WebhookJson<Vec<Endpoint>>, ApiError> {
    debug!("POST /adjustendpoints body: {}", String::from_utf8_lossy(&body));
    let proposed: Vec<Endpoint> = serde_json::from_slice(&body).map_err(Error::Json)?;
    let adjusted = engine.adjust_endpoints(proposed).await?;
    Ok(WebhookJson(media_type, adjusted))
}

/// POST /records - Apply a change set
async fn apply_changes(
    State(engine): State<SyncEngine>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    debug!("POST /records body: {}", String::from_utf8_lossy(&body));
    let changes: Changes = serde_json::from_slice(&body).map_err(Error::Json)?;
    engine.apply_changes(&changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /healthz - Liveness
async fn healthz() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use rosdns_core::{Record, RecordStore, RecordType, Ttl};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Store with a fixed table that records mutations
    #[derive(Default)]
    struct FixedStore {
        records: Vec<Record>,
        mutations: Mutex<Vec<String>>,
        unreachable: bool,
    }

    #[async_trait]
    impl RecordStore for FixedStore {
        async fn list_records(&self) -> rosdns_core::Result<Vec<Record>> {
            if self.unreachable {
                return Err(Error::transport("list", "connection refused"));
            }
            Ok(self.records.clone())
        }

        async fn create_record(&self, record: &Record) -> rosdns_core::Result<Record> {
            self.mutations.lock().unwrap().push(format!("create {}", record.name));
            Ok(Record {
                id: Some("*NEW".to_string()),
                ..record.clone()
            })
        }

        async fn update_record(&self, id: &str, _record: &Record) -> rosdns_core::Result<()> {
            self.mutations.lock().unwrap().push(format!("update {id}"));
            Ok(())
        }

        async fn delete_record(&self, id: &str) -> rosdns_core::Result<()> {
            self.mutations.lock().unwrap().push(format!("delete {id}"));
            Ok(())
        }

        fn store_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn table() -> Vec<Record> {
        let a = |id: &str, address: &str| Record {
            id: Some(id.to_string()),
            address: Some(address.to_string()),
            ..Record::new("api.example.com", RecordType::A, Ttl::from_secs(300))
        };
        vec![a("*1", "10.0.0.1"), a("*2", "10.0.0.2")]
    }

    fn app(store: Arc<FixedStore>) -> Router {
        router(SyncEngine::new(store))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response.headers()[header::CONTENT_TYPE].to_str().unwrap()
    }

    #[test]
    fn negotiation_echoes_webhook_media_type() {
        let versioned = "application/external.dns.webhook+json;version=1";
        assert_eq!(NegotiatedMediaType::from_accept(Some(versioned)).0, versioned);

        let listed = "application/json, application/external.dns.webhook+json;version=2";
        assert_eq!(
            NegotiatedMediaType::from_accept(Some(listed)).0,
            "application/external.dns.webhook+json;version=2"
        );
    }

    #[test]
    fn negotiation_falls_back_to_default() {
        assert_eq!(NegotiatedMediaType::from_accept(None).0, WEBHOOK_MEDIA_TYPE);
        assert_eq!(
            NegotiatedMediaType::from_accept(Some("text/html")).0,
            WEBHOOK_MEDIA_TYPE
        );
    }

    #[test]
    fn errors_map_to_statuses() {
        let status = |e: Error| ApiError(e).status();
        assert_eq!(status(Error::unsupported("PTR")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(Error::invalid_ttl("5x", "bad")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(Error::transport("list", "refused")), StatusCode::BAD_GATEWAY);
        assert_eq!(status(Error::decode("list", "not json")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(Error::Json(serde_json::from_str::<u8>("x").unwrap_err())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(Error::config("bad")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn domain_filter_uses_negotiated_media_type() {
        let response = app(Arc::default())
            .oneshot(
                Request::get("/")
                    .header(header::ACCEPT, "application/external.dns.webhook+json;version=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "application/external.dns.webhook+json;version=1");
        assert_eq!(body_json(response).await, json!({"include": [], "exclude": []}));
    }

    #[tokio::test]
    async fn records_are_grouped_with_identity() {
        let store = Arc::new(FixedStore {
            records: table(),
            ..FixedStore::default()
        });

        let response = app(store)
            .oneshot(Request::get("/records").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), WEBHOOK_MEDIA_TYPE);
        assert_eq!(
            body_json(response).await,
            json!([{
                "dnsName": "api.example.com",
                "targets": ["10.0.0.1", "10.0.0.2"],
                "recordType": "A",
                "recordTTL": 300,
                "providerSpecific": [{"name": ".id", "value": "*1,*2"}]
            }])
        );
    }

    #[tokio::test]
    async fn unreachable_store_is_bad_gateway() {
        let store = Arc::new(FixedStore {
            unreachable: true,
            ..FixedStore::default()
        });

        let response = app(store)
            .oneshot(Request::get("/records").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn adjust_endpoints_attaches_identity() {
        let store = Arc::new(FixedStore {
            records: table(),
            ..FixedStore::default()
        });
        let body = json!([
            {"dnsName": "api.example.com", "recordType": "A", "targets": ["10.0.0.9"]},
            {"dnsName": "new.example.com", "recordType": "A", "targets": ["10.0.0.8"]}
        ]);

        let response = app(store)
            .oneshot(
                Request::post("/adjustendpoints")
                    .header(header::CONTENT_TYPE, WEBHOOK_MEDIA_TYPE)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let adjusted = body_json(response).await;
        assert_eq!(adjusted[0]["providerSpecific"], json!([{"name": ".id", "value": "*1,*2"}]));
        assert!(adjusted[1].get("providerSpecific").is_none());
    }

    #[tokio::test]
    async fn apply_changes_returns_no_content() {
        let store = Arc::new(FixedStore::default());
        let body = json!({
            "Create": [{"dnsName": "new.example.com", "recordType": "A", "targets": ["10.0.0.8"]}],
            "UpdateOld": null,
            "UpdateNew": [{
                "dnsName": "api.example.com",
                "recordType": "A",
                "targets": ["10.0.0.9"],
                "providerSpecific": [{"name": ".id", "value": "*1"}]
            }],
            "Delete": null
        });

        let response = app(Arc::clone(&store))
            .oneshot(
                Request::post("/records")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            *store.mutations.lock().unwrap(),
            vec!["create new.example.com", "update *1"]
        );
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let response = app(Arc::default())
            .oneshot(Request::post("/records").body(Body::from("{not json")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn untranslatable_change_is_unprocessable() {
        let store = Arc::new(FixedStore::default());
        let body = json!({
            "create": [{"dnsName": "r.example.com", "recordType": "PTR", "targets": ["x.example.com"]}]
        });

        let response = app(Arc::clone(&store))
            .oneshot(Request::post("/records").body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(store.mutations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_router_serves_only_healthz() {
        let ok = health_router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let missing = health_router()
            .oneshot(Request::get("/records").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
