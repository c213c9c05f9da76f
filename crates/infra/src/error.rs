//! Storage error model.

use killstreaks_core::DomainError;
use thiserror::Error;

/// Failure of a local storage operation.
///
/// Storage faults fail the whole operation; nothing is partially committed
/// beyond what the SQLite transaction guarantees.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("could not resolve a data directory for the database")]
    NoDataDir,
}

impl StoreError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}
