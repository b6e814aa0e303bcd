//! Client error types

use std::sync::Arc;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Client errors
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was empty or missing; caught before any network call
    #[error("{0} is not specified")]
    Validation(&'static str),

    /// URL or request body assembly failed
    #[error("building '{operation}' request: {reason}")]
    RequestConstruction {
        operation: &'static str,
        reason: String,
    },

    /// Connection, timeout, or cancellation at the transport level
    #[error("sending '{operation}' request: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service returned an HTML page instead of JSON, possibly an error page
    #[error("'{operation}' received an HTML response, possible error page")]
    UnexpectedHtml { operation: &'static str },

    /// HTTP status >= 400, with the body preserved for diagnostics
    #[error("'{operation}' received bad status {status}, body: {body}")]
    Status {
        operation: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not match the expected shape
    #[error("decoding '{operation}' response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Resolution succeeded transport-wise but returned an empty identifier
    #[error("'{operation}' returned an empty identifier")]
    EmptyIdentifier { operation: &'static str },

    /// A previously failed resolution, replayed from the cache
    #[error("{0}")]
    Cached(Arc<Error>),
}

impl Error {
    /// True when the failure happened at the transport level,
    /// including request timeouts and cancellation.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Cached(inner) => inner.is_transport(),
            _ => false,
        }
    }

    /// True when the failure is an HTTP error status.
    pub fn is_status(&self) -> bool {
        match self {
            Self::Status { .. } => true,
            Self::Cached(inner) => inner.is_status(),
            _ => false,
        }
    }

    /// True when this error was replayed from the resolver cache.
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}
