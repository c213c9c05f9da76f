use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use killstreaks_core::{DeckId, EnrichedAchievement, NewAchievement, PersistedAchievement, time};

use crate::error::StoreError;

/// Achievement count per `medal_id`.
pub type MedalCounts = HashMap<String, u64>;

/// Durable, append-only store of achievements.
///
/// Records are never updated or deleted through this interface.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    /// Append new achievements atomically and return them as stored.
    async fn insert_many(
        &self,
        records: Vec<NewAchievement>,
    ) -> Result<Vec<PersistedAchievement>, StoreError>;

    /// Every achievement joined with its medal, in insertion order.
    ///
    /// Achievements whose medal is not in the catalog are left out.
    async fn all(&self) -> Result<Vec<EnrichedAchievement>, StoreError>;

    /// Raw achievements with `created_at > since`, in insertion order.
    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<PersistedAchievement>, StoreError>;

    /// Counts per medal for achievements with `created_at > since`.
    async fn count_by_medal(&self, since: DateTime<Utc>) -> Result<MedalCounts, StoreError>;

    /// Like [`count_by_medal`](Self::count_by_medal), restricted to `deck_ids`.
    ///
    /// An empty deck set matches nothing. Duplicate ids count once, and the set
    /// may be arbitrarily large.
    async fn count_by_medal_for_decks(
        &self,
        since: DateTime<Utc>,
        deck_ids: &[DeckId],
    ) -> Result<MedalCounts, StoreError>;

    /// Counts since a host-supplied day start (Unix seconds).
    async fn todays_achievements(&self, day_start: i64) -> Result<MedalCounts, StoreError> {
        let since = time::from_unix_seconds(day_start)?;
        self.count_by_medal(since).await
    }

    /// Counts since a host-supplied day start (Unix seconds), restricted to `deck_ids`.
    async fn todays_achievements_for_deck_ids(
        &self,
        day_start: i64,
        deck_ids: &[DeckId],
    ) -> Result<MedalCounts, StoreError> {
        let since = time::from_unix_seconds(day_start)?;
        self.count_by_medal_for_decks(since, deck_ids).await
    }
}

#[async_trait]
impl<S> AchievementStore for Arc<S>
where
    S: AchievementStore + ?Sized,
{
    async fn insert_many(
        &self,
        records: Vec<NewAchievement>,
    ) -> Result<Vec<PersistedAchievement>, StoreError> {
        (**self).insert_many(records).await
    }

    async fn all(&self) -> Result<Vec<EnrichedAchievement>, StoreError> {
        (**self).all().await
    }

    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<PersistedAchievement>, StoreError> {
        (**self).since(since).await
    }

    async fn count_by_medal(&self, since: DateTime<Utc>) -> Result<MedalCounts, StoreError> {
        (**self).count_by_medal(since).await
    }

    async fn count_by_medal_for_decks(
        &self,
        since: DateTime<Utc>,
        deck_ids: &[DeckId],
    ) -> Result<MedalCounts, StoreError> {
        (**self).count_by_medal_for_decks(since, deck_ids).await
    }
}
