//! Error types for FounderFuel.
//!
//! Library crates use [`FounderFuelError`] via `thiserror`.
//! The CLI wraps this with `color-eyre`; the HTTP server maps each variant
//! to a status code by pattern matching.

use std::path::PathBuf;

/// Top-level error type for all FounderFuel operations.
#[derive(Debug, thiserror::Error)]
pub enum FounderFuelError {
    /// The submitted string is not an absolute `http`/`https` URL.
    #[error("Invalid URL format: {url}")]
    InvalidUrl { url: String },

    /// The origin refused to serve us (HTTP 403 or 429).
    #[error("Blocked by {url} with status {status}")]
    Blocked { url: String, status: u16 },

    /// The origin answered with any other non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Fetch { status: u16, status_text: String },

    /// Transport failure before an HTTP status was available (DNS, connect, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The origin did not answer within the configured fetch timeout.
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The language model call itself failed (network, auth, quota).
    #[error("generation error: {0}")]
    Generation(String),

    /// The model answered, but not with the structured payload we asked for.
    #[error("malformed model response: {message}")]
    MalformedResponse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FounderFuelError>;

impl FounderFuelError {
    /// Create an invalid-URL error carrying the offending input.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Create a malformed-response error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
