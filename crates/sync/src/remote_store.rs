//! Achievement store decorator that queues uploads for new records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use killstreaks_core::{DeckId, EnrichedAchievement, NewAchievement, PersistedAchievement};
use killstreaks_infra::{AchievementStore, JobQueue, MedalCounts, SessionStore, StoreError};

use crate::jobs::SyncJob;

/// Wraps a local [`AchievementStore`].
///
/// Writes go to the local store first; when a user is logged in, one
/// [`SyncJob::PostAchievement`] is queued per new record. Reads are passed
/// through unchanged.
#[derive(Debug, Clone)]
pub struct RemoteAchievementStore<S, U> {
    local: S,
    session: U,
    queue: JobQueue<SyncJob>,
}

impl<S, U> RemoteAchievementStore<S, U>
where
    S: AchievementStore,
    U: SessionStore,
{
    pub fn new(local: S, session: U, queue: JobQueue<SyncJob>) -> Self {
        Self {
            local,
            session,
            queue,
        }
    }

    pub fn local(&self) -> &S {
        &self.local
    }

    /// Persist locally, then queue uploads if logged in.
    ///
    /// Only local storage faults are returned; upload problems are logged.
    pub async fn create_all(
        &self,
        records: Vec<NewAchievement>,
    ) -> Result<Vec<PersistedAchievement>, StoreError> {
        let persisted = self.local.insert_many(records).await?;
        if persisted.is_empty() {
            return Ok(persisted);
        }

        match self.session.is_logged_in().await {
            Ok(true) => self.enqueue_uploads(&persisted),
            Ok(false) => {
                tracing::debug!(count = persisted.len(), "not logged in, uploads skipped");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read session, uploads skipped");
            }
        }

        Ok(persisted)
    }

    fn enqueue_uploads(&self, persisted: &[PersistedAchievement]) {
        for achievement in persisted {
            if let Err(e) = self
                .queue
                .perform_later(SyncJob::PostAchievement(achievement.clone()))
            {
                tracing::warn!(id = %achievement.id, error = %e, "upload not queued");
            }
        }
    }
}

#[async_trait]
impl<S, U> AchievementStore for RemoteAchievementStore<S, U>
where
    S: AchievementStore,
    U: SessionStore,
{
    async fn insert_many(
        &self,
        records: Vec<NewAchievement>,
    ) -> Result<Vec<PersistedAchievement>, StoreError> {
        self.create_all(records).await
    }

    async fn all(&self) -> Result<Vec<EnrichedAchievement>, StoreError> {
        self.local.all().await
    }

    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<PersistedAchievement>, StoreError> {
        self.local.since(since).await
    }

    async fn count_by_medal(&self, since: DateTime<Utc>) -> Result<MedalCounts, StoreError> {
        self.local.count_by_medal(since).await
    }

    async fn count_by_medal_for_decks(
        &self,
        since: DateTime<Utc>,
        deck_ids: &[DeckId],
    ) -> Result<MedalCounts, StoreError> {
        self.local.count_by_medal_for_decks(since, deck_ids).await
    }
}
