//! Error types for the ingestion pipeline
//!
//! Every failure a chunk worker can hit maps onto one of these variants, and
//! all of them are terminal for their chunk only: the worker reports the
//! error and its siblings keep running.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors raised while splitting, parsing or loading chunks
#[derive(Error, Debug)]
pub enum IngestError {
    /// A log line did not match the expected access-log structure
    #[error("failed to parse log line: {line}")]
    Parse { line: String },

    /// The per-worker database connection could not be established or dropped
    #[error("database connection failed: {0}. Check DB_HOST, DB_PORT, DB_USER, DB_PASSWD and DB_NAME.")]
    Connection(#[source] sqlx::Error),

    /// A batch insert statement was rejected by the database
    #[error("batch insert failed: {0}")]
    Insert(#[source] sqlx::Error),

    /// Reading the input file or writing/reading a chunk file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Run options or environment configuration are invalid
    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error naming the offending line
    pub fn parse(line: impl Into<String>) -> Self {
        Self::Parse { line: line.into() }
    }
}
