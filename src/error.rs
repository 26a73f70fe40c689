//! Error types for weread-export
//!
//! This module provides the error taxonomy for the library:
//! - [`RequestError`] for remote failures, classified as retryable or fatal once
//!   at construction time
//! - [`Error`], the crate-wide error, which also carries contract errors
//!   (unsupported export format, missing clipboard) and local I/O failures

use thiserror::Error;

/// Result type alias for weread-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for weread-export
#[derive(Debug, Error)]
pub enum Error {
    /// Remote API request failed (after any retries were exhausted)
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "batch.concurrency")
        key: Option<String>,
    },

    /// Export format is not one of markdown, json or csv
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// No clipboard capability is available in the current environment
    #[error("clipboard is not available in the current environment")]
    ClipboardUnavailable,

    /// File already exists and the collision policy forbids replacing it
    #[error("file already exists: {0}")]
    FileExists(std::path::PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// A failed GET against the remote API
///
/// `should_retry` is derived from the status when the error is built and never
/// changes afterwards: it describes the failure, not the remaining retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestError {
    message: String,
    status: Option<u16>,
    should_retry: bool,
}

impl RequestError {
    /// Build an error for a response that arrived with a non-success status
    pub fn from_status(status: u16) -> Self {
        Self {
            message: format!("Request failed with status {status}"),
            status: Some(status),
            should_retry: status == 429 || status >= 500,
        }
    }

    /// Build an error for a failure that produced no status (connect, timeout, body decode)
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            should_retry: true,
        }
    }

    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Whether the failure is transient
    pub fn should_retry(&self) -> bool {
        self.should_retry
    }
}
