//! Error types for the feed module.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the remote feed or decoding it.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request, status or body error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request or a single body read exceeded its timeout.
    #[error("timed out after {timeout:?} reading {url}")]
    Timeout { url: String, timeout: Duration },

    /// A configured endpoint is not a valid URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Stream content could not be decoded into a record.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// Local I/O while rendering or compressing a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The feed has no such document.
    #[error("not found: {0}")]
    NotFound(String),
}

impl FeedError {
    /// Whether this error came from the stream content rather than the transport.
    pub fn is_malformed(&self) -> bool {
        matches!(self, FeedError::MalformedRecord { .. })
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
