//! Configuration types for the webhook
//!
//! This module defines all configuration structures used throughout the crate.

use secrecy::SecretString;
use tracing::{Level, warn};
use url::Url;

/// Default webhook listen address
pub const DEFAULT_BIND_ADDR: &str = "localhost:8888";

/// Default health listen address
pub const DEFAULT_HEALTH_ADDR: &str = "localhost:8080";

/// Default router URL
pub const DEFAULT_ROUTER_URL: &str = "http://192.168.88.1";

/// Default router user
pub const DEFAULT_ROUTER_USERNAME: &str = "admin";

/// Default store request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Upper bound for the store request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main webhook configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Listener settings
    pub server: ServerConfig,

    /// Router connection settings
    pub store: StoreConfig,

    /// Log level name (trace, debug, info, warn, error)
    pub log_level: String,

    /// Forces debug logging regardless of `log_level`
    pub debug: bool,
}

impl WebhookConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.server.validate()?;
        self.store.validate()?;

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(crate::Error::config(format!(
                "Unknown log level {:?}, expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Effective maximum log level
    ///
    /// Unknown names fall back to `info`; `validate` reports them.
    pub fn max_level(&self) -> Level {
        if self.debug {
            return Level::DEBUG;
        }
        match self.log_level.to_ascii_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            debug: false,
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address of the webhook listener
    pub bind_addr: String,

    /// Address of the health listener
    pub health_addr: String,
}

impl ServerConfig {
    /// Validate the listener configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.bind_addr.trim().is_empty() {
            return Err(crate::Error::config("Webhook bind address cannot be empty"));
        }
        if self.health_addr.trim().is_empty() {
            return Err(crate::Error::config("Health bind address cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            health_addr: DEFAULT_HEALTH_ADDR.to_string(),
        }
    }
}

/// Router connection configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the router, e.g. `https://192.168.88.1`
    pub base_url: String,

    /// REST API user
    pub username: String,

    /// REST API password
    pub password: SecretString,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Log mutations instead of sending them
    pub dry_run: bool,
}

impl StoreConfig {
    /// Validate the router configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let url = self.url()?;
        if url.scheme() == "http" {
            warn!("Router URL {} uses plain HTTP, credentials are sent unencrypted", url);
        }

        if self.username.is_empty() {
            return Err(crate::Error::config("Router username cannot be empty"));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(crate::Error::config(format!(
                "Router timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {}",
                self.timeout_secs
            )));
        }

        Ok(())
    }

    /// Parsed base URL; only http and https are accepted
    pub fn url(&self) -> Result<Url, crate::Error> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            crate::Error::config(format!("Invalid router URL {:?}: {}", self.base_url, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(crate::Error::config(format!(
                "Router URL scheme must be http or https, got {other:?}"
            ))),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ROUTER_URL.to_string(),
            username: DEFAULT_ROUTER_USERNAME.to_string(),
            password: SecretString::from(String::new()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dry_run: false,
        }
    }
}
