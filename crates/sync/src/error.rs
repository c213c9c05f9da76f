//! Sync error model.

use killstreaks_infra::{JobQueueError, StoreError};
use thiserror::Error;

/// Failure of a sync operation.
///
/// Jobs report these to the worker, which logs them; they never reach the
/// code that performed the local write.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport fault: connection refused, timeout, TLS, body read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response (auth headers were already refreshed from it).
    #[error("API error ({status}) from {url}")]
    Api { status: u16, url: String },

    /// Response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error(transparent)]
    Queue(#[from] JobQueueError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
