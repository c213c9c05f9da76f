//! Client-side sync for locally stored achievements.
//!
//! - [`RemoteClient`]: HTTP calls against the achievements service
//! - [`SyncEngine`]: cursor resolution, batch upload and per-record upload;
//!   runs as the [`JobHandler`](killstreaks_infra::JobHandler) of the sync queue
//! - [`RemoteAchievementStore`]: store decorator that queues uploads for new records
//! - [`SyncConfig`]: base URL, timeout and database location

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod remote_store;

pub use client::RemoteClient;
pub use config::SyncConfig;
pub use engine::{SyncEngine, compress_achievements, decompress_achievements};
pub use error::SyncError;
pub use jobs::SyncJob;
pub use remote_store::RemoteAchievementStore;
