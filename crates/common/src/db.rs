//! Shared storage types for Planpal
//!
//! Store implementations (Postgres and in-memory) report failures through
//! `RepositoryError` so callers can treat them uniformly.

use thiserror::Error;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::InvalidData(err.to_string())
    }
}
