//! `killstreaks-core`: domain building blocks.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! achievements, medals, the local session and the identifiers they use.

pub mod achievement;
pub mod error;
pub mod id;
pub mod session;
pub mod time;

pub use achievement::{
    EnrichedAchievement, Medal, MedalCatalog, NewAchievement, PersistedAchievement,
    StaticMedalCatalog, join_medals,
};
pub use error::{DomainError, DomainResult};
pub use id::{AchievementId, ClientUuid, DeckId};
pub use session::{AUTH_HEADER_NAMES, AuthHeaders, Session};
