//! Local achievement persistence and aggregate queries.

pub mod sqlite;
pub mod store;

pub use sqlite::SqliteAchievementStore;
pub use store::{AchievementStore, MedalCounts};
