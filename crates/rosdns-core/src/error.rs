//! Error types for the webhook
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for webhook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
///
/// The HTTP layer maps each kind onto a response status; the core uses it to
/// tell fatal translation problems apart from store-side failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An endpoint or record cannot be materialized for the store
    Translation,
    /// A TTL or target string is malformed
    Parse,
    /// The store answered with a non-success status
    Store,
    /// The store could not be reached
    Transport,
    /// A request or response body could not be (de)serialized
    Serialization,
    /// Invalid configuration
    Config,
}

/// Core error type for the webhook
#[derive(Error, Debug)]
pub enum Error {
    /// Record type outside the supported set
    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(String),

    /// A delete or update was requested for an endpoint without store identity
    #[error("Endpoint {name} ({record_type}) carries no store identity")]
    MissingIdentity {
        /// DNS name of the endpoint
        name: String,
        /// Record type of the endpoint
        record_type: String,
    },

    /// One store identity is listed for several targets of an endpoint
    #[error("Endpoint {name} ({record_type}) lists store identity {id} more than once")]
    AmbiguousIdentity {
        /// DNS name of the endpoint
        name: String,
        /// Record type of the endpoint
        record_type: String,
        /// The repeated identity
        id: String,
    },

    /// Malformed compound duration
    #[error("Invalid TTL {input:?}: {reason}")]
    InvalidTtl {
        /// The rejected input
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// Target string that does not fit its record type
    #[error("Invalid {record_type} target {target:?}: {reason}")]
    InvalidTarget {
        /// Record type the target was parsed for
        record_type: String,
        /// The rejected target
        target: String,
        /// What was wrong with it
        reason: String,
    },

    /// Non-success status reported by the store
    #[error("Store error during {operation} (HTTP {status}): {message}{}", detail_suffix(.detail))]
    Store {
        /// Store operation that failed (list, create, update, delete)
        operation: &'static str,
        /// HTTP status returned by the store
        status: u16,
        /// Error code from the store's error body, if it sent one
        code: Option<u16>,
        /// Error message
        message: String,
        /// Additional detail from the store
        detail: Option<String>,
    },

    /// Connection-level failure talking to the store
    #[error("Transport error during {operation}: {message}")]
    Transport {
        /// Store operation that failed
        operation: &'static str,
        /// Error message
        message: String,
    },

    /// Success response of the store that is not the expected JSON
    #[error("Failed to decode {operation} response: {message}")]
    Decode {
        /// Store operation whose response was rejected
        operation: &'static str,
        /// Decoder message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!(" ({detail})"),
        _ => String::new(),
    }
}

impl Error {
    /// Create an unsupported record type error
    pub fn unsupported(record_type: impl Into<String>) -> Self {
        Self::UnsupportedRecordType(record_type.into())
    }

    /// Create a missing identity error
    pub fn missing_identity(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self::MissingIdentity {
            name: name.into(),
            record_type: record_type.into(),
        }
    }

    /// Create an ambiguous identity error
    pub fn ambiguous_identity(
        name: impl Into<String>,
        record_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self::AmbiguousIdentity {
            name: name.into(),
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    /// Create an invalid TTL error
    pub fn invalid_ttl(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTtl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid target error
    pub fn invalid_target(
        record_type: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTarget {
            record_type: record_type.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Create a store response decode error
    pub fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            operation,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedRecordType(_)
            | Self::MissingIdentity { .. }
            | Self::AmbiguousIdentity { .. } => ErrorKind::Translation,
            Self::InvalidTtl { .. } | Self::InvalidTarget { .. } => ErrorKind::Parse,
            Self::Store { .. } => ErrorKind::Store,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Json(_) | Self::Decode { .. } => ErrorKind::Serialization,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` if the error concerns something the store sent or
    /// failed to send, rather than the controller's request
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Store { .. } | Self::Transport { .. } | Self::Decode { .. }
        )
    }

    /// Returns `true` if the store reported that the addressed record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store { status: 404, .. })
    }
}
