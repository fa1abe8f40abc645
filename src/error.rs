//! Error types for todo-ingest
//!
//! The taxonomy mirrors how failures propagate through the pipeline:
//! - [`AuthError`] — no usable credential could be produced; fatal to the run.
//! - [`FetchError`] — a network/HTTP failure that survived the retry budget.
//!   Fatal during list discovery, recovered locally during per-list fetches.
//! - Malformed individual records are not errors at all; they are skipped
//!   during mapping (see [`crate::types::RemoteTask::into_task`]).

use std::time::Duration;
use thiserror::Error;

/// Result type alias for todo-ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for todo-ingest
///
/// This is the terminal error surface of the pipeline entry point. Each
/// variant includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable access credential could be produced
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Network or HTTP failure that exhausted the retry budget
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "lists_endpoint")
        key: Option<String>,
    },
}

/// Credential acquisition errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No previously established identity exists, so silent renewal is impossible
    #[error("no previously established identity available")]
    NoAccount,

    /// Silent token renewal failed
    #[error("silent token acquisition failed: {0}")]
    SilentFailed(String),

    /// The interactive sign-in flow failed or was abandoned
    #[error("interactive token acquisition failed: {0}")]
    InteractiveFailed(String),
}

/// A single page fetch failure, as seen by the retry executor
///
/// Every variant is treated as transient and consumes the shared attempt
/// budget; [`FetchError::RateLimited`] additionally carries the
/// server-requested delay so the executor can honor it instead of the
/// exponential backoff sequence.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, TLS, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-2xx status other than 429
    #[error("HTTP {status} from {url}")]
    Status {
        /// The HTTP status code received
        status: u16,
        /// The URL that produced the status
        url: String,
    },

    /// Server answered 429 Too Many Requests
    #[error("rate limited by {url}")]
    RateLimited {
        /// The URL that rate-limited us
        url: String,
        /// Parsed `Retry-After` header, when the server supplied one
        retry_after: Option<Duration>,
    },

    /// Response body did not decode as the expected page envelope
    #[error("malformed response body from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode
        url: String,
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// True when the server explicitly rate-limited the request
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// The server-requested retry delay, if this failure carried one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
