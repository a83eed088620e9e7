//! Error types for the rcpt-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the rcpt library.
///
/// Every variant here ends the run. Per-file failures are carried inside
/// [`crate::ReceiptRecord::error`] instead.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Missing or invalid configuration, including credentials.
    #[error("configuration error: {0}")]
    Config(String),

    /// The input path does not exist.
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A single-file input with an extension the service does not accept.
    #[error("unsupported format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Fatal error reported by the document analysis service.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A worker task panicked or was cancelled unexpectedly.
    #[error("worker failed: {0}")]
    Worker(String),
}

/// Errors reported while talking to the document analysis service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service rejected the credentials.
    #[error("authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out or the analysis did not finish in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The service could not read the uploaded document.
    #[error("invalid document ({status}): {message}")]
    InvalidDocument { status: u16, message: String },

    /// Any other non-success HTTP status.
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The analyze operation finished with status `failed`.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    /// The service replied with something we could not interpret.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Errors that invalidate the whole batch, not just one file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Authentication { .. })
    }

    /// Transient errors worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network(_) | ServiceError::Timeout(_) => true,
            ServiceError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors raised while loading a document from disk before upload.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes do not look like the format the extension claims.
    #[error("corrupt document {}: {reason}", path.display())]
    CorruptDocument { path: PathBuf, reason: String },
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, ScanError>;
