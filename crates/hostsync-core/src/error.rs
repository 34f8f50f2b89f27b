//! Error types for the reconciliation system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciliation system
#[derive(Error, Debug)]
pub enum Error {
    /// Two or more filtered hosts share a hostname. Reconciliation must not
    /// start: the hostname is the join key against the IPAM inventory.
    #[error("duplicate hostnames in router snapshot: {0:?}")]
    DuplicateHostnames(Vec<String>),

    /// Router-side errors (unreachable, bad payload)
    #[error("router error: {0}")]
    Router(String),

    /// IPAM-side errors that are not tied to a specific HTTP status
    #[error("IPAM error: {0}")]
    Ipam(String),

    /// An IPAM API call returned an unexpected status code
    #[error("IPAM API returned {status}: {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Response body or a short description
        message: String,
    },

    /// Authentication errors
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),

    /// More than one IPAM record matched a host's name. First-match-wins is
    /// not applied here; the caller reports the host as failed instead.
    #[error("multiple IPAM records match name {0:?}")]
    MultipleMatches(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// A response body could not be decoded into the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors (snapshot cache)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a router error
    pub fn router(msg: impl Into<String>) -> Self {
        Self::Router(msg.into())
    }

    /// Create an IPAM error
    pub fn ipam(msg: impl Into<String>) -> Self {
        Self::Ipam(msg.into())
    }

    /// Create an API-status error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
