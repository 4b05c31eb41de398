//! Error type definitions for the EPG logo cache
//!
//! This module defines all error types used throughout the crate, keeping the
//! run-level, per-show and per-document failure domains apart so that a
//! failure in one can never escalate into another.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
///
/// Only configuration-level problems are fatal to a run; every other failure
/// is contained by [`FetchError`] or [`DocumentError`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (missing schedules root, invalid settings)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Filesystem errors outside of a single document's scope
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        Self::configuration(err.to_string())
    }
}

/// Classification reported for a show whose logo could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Download failed (after retries for transient faults)
    Network,
    /// The downloaded bytes are not a usable image
    Decode,
    /// The normalized asset could not be encoded or written to the cache
    Storage,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Decode => "decode",
            FailureKind::Storage => "storage",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-show logo fetch and transcode errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("HTTP error: {status} - {url}")]
    Status { status: u16, url: String },

    /// Connection could not be established or broke mid-transfer
    #[error("Connection failed: {url} - {message}")]
    Connection { url: String, message: String },

    /// The request could not be built (malformed URL, unsupported scheme)
    #[error("Invalid request: {url} - {message}")]
    InvalidRequest { url: String, message: String },

    /// Response body larger than the configured limit
    #[error("Logo too large: {size} bytes (max: {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// Bytes could not be decoded as an image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Normalized image could not be encoded
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Encoded asset could not be written to the cache
    #[error("Failed to store asset {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Whether another attempt may succeed
    ///
    /// Timeouts, non-2xx statuses and connection errors are transient. Content
    /// defects and local failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Status { .. } | FetchError::Connection { .. }
        )
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout { .. }
            | FetchError::Status { .. }
            | FetchError::Connection { .. }
            | FetchError::InvalidRequest { .. } => FailureKind::Network,
            FetchError::TooLarge { .. } | FetchError::Decode { .. } => FailureKind::Decode,
            FetchError::Encode { .. } | FetchError::Storage { .. } => FailureKind::Storage,
        }
    }

    /// Classify a reqwest error for the given URL
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = crate::utils::url::UrlUtils::obfuscate_credentials(url);
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
                url,
            }
        } else if err.is_builder() {
            FetchError::InvalidRequest {
                url,
                message: err.to_string(),
            }
        } else {
            FetchError::Connection {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Per-document load and persist errors
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Document could not be read from disk
    #[error("Failed to read document {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid schedule JSON
    #[error("Invalid JSON in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Document could not be serialized
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Temporary file could not be created or written
    #[error("Failed to write temporary file for {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temporary file could not replace the original
    #[error("Failed to replace {path:?}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Background persistence task did not complete
    #[error("Persistence task failed: {message}")]
    Task { message: String },
}

impl DocumentError {
    /// Whether the failure happened while committing the document
    pub fn is_persist_failure(&self) -> bool {
        !matches!(self, DocumentError::Read { .. } | DocumentError::Parse { .. })
    }
}
