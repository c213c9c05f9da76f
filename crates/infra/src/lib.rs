//! Infrastructure layer: SQLite storage, session persistence, background jobs.

pub mod achievements;
pub mod db;
pub mod error;
pub mod jobs;
pub mod session;

pub use achievements::{AchievementStore, MedalCounts, SqliteAchievementStore};
pub use db::{DbLocation, DbSettings};
pub use error::StoreError;
pub use jobs::{Job, JobHandler, JobQueue, JobQueueError, WorkerHandle, WorkerStats};
pub use session::{InMemorySessionStore, SessionStore, SqliteSessionStore};
