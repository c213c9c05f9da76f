//! Sync engine: batch and per-record uploads.
//!
//! Every remote response refreshes the stored auth headers before its status
//! is checked. Failures are returned to the worker, which logs them and moves
//! on; there is no retry.

use std::io::{Read, Write};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use killstreaks_core::{AuthHeaders, ClientUuid, PersistedAchievement, time};
use killstreaks_infra::{AchievementStore, JobHandler, JobQueue, SessionStore, WorkerHandle};

use crate::client::{AchievementPayload, RemoteClient, SyncRecord};
use crate::error::SyncError;
use crate::jobs::SyncJob;

/// Runs [`SyncJob`]s against the remote service.
#[derive(Debug, Clone)]
pub struct SyncEngine<S, U> {
    client: RemoteClient,
    store: S,
    session: U,
}

impl<S, U> SyncEngine<S, U>
where
    S: AchievementStore,
    U: SessionStore,
{
    pub fn new(client: RemoteClient, store: S, session: U) -> Self {
        Self {
            client,
            store,
            session,
        }
    }

    /// Return the install's client uuid, generating and persisting one on first use.
    pub async fn ensure_client_uuid_exists(&self) -> Result<ClientUuid, SyncError> {
        if let Some(existing) = self.session.load().await?.client_uuid {
            return Ok(existing);
        }

        let client_uuid = ClientUuid::generate();
        self.session.set_client_uuid(client_uuid).await?;
        tracing::info!(%client_uuid, "client uuid generated");
        Ok(client_uuid)
    }

    /// Queue a batch sync when a user is logged in. Returns whether a job was queued.
    pub async fn sync_if_logged_in(&self, queue: &JobQueue<SyncJob>) -> Result<bool, SyncError> {
        if !self.session.is_logged_in().await? {
            tracing::debug!("not logged in, skipping sync");
            return Ok(false);
        }

        queue.perform_later(SyncJob::SyncAchievements)?;
        Ok(true)
    }

    /// Creation time of the latest server-side sync, or [`time::MIN_TIMESTAMP`] if there is none.
    pub async fn latest_sync_cursor(&self) -> Result<DateTime<Utc>, SyncError> {
        let auth = self.session.load_auth_headers().await?;
        let reply = self.client.get_syncs(&auth).await?;
        self.refresh_auth_headers(reply.auth_headers()).await?;

        let body = reply.error_for_status()?.bytes().await?;
        let syncs: Vec<SyncRecord> = serde_json::from_slice(&body)
            .map_err(|e| SyncError::parse(format!("sync history: {e}")))?;

        match syncs.last() {
            Some(latest) => time::parse_remote(&latest.created_at)
                .map_err(|e| SyncError::parse(format!("sync history: {e}"))),
            None => Ok(time::MIN_TIMESTAMP),
        }
    }

    /// Upload, as one compressed batch, every local achievement newer than the
    /// latest server-side sync. Returns the number of achievements sent.
    pub async fn sync_achievements(&self) -> Result<usize, SyncError> {
        let cursor = self.latest_sync_cursor().await?;
        let achievements = self.store.since(cursor).await?;

        let json = serialize_achievements(&achievements)?;
        let compressed = compress_achievements(&json)?;

        let client_uuid = self.ensure_client_uuid_exists().await?;
        let auth = self.session.load_auth_headers().await?;
        let reply = self.client.post_sync(&auth, client_uuid, compressed).await?;
        self.refresh_auth_headers(reply.auth_headers()).await?;

        if let Err(e) = reply.error_for_status() {
            tracing::error!(error = %e, count = achievements.len(), "batch sync rejected");
            return Err(e);
        }

        tracing::info!(count = achievements.len(), %cursor, "achievements synced");
        Ok(achievements.len())
    }

    /// Upload a single achievement.
    pub async fn post_achievement(&self, achievement: &PersistedAchievement) -> Result<(), SyncError> {
        let client_uuid = self.ensure_client_uuid_exists().await?;
        let payload = AchievementPayload::new(achievement, client_uuid);

        let auth = self.session.load_auth_headers().await?;
        let reply = self.client.post_achievement(&auth, &payload).await?;
        self.refresh_auth_headers(reply.auth_headers()).await?;
        reply.error_for_status()?;

        tracing::debug!(id = %achievement.id, medal_id = %achievement.medal_id, "achievement uploaded");
        Ok(())
    }

    /// Overwrite stored headers with the ones a response carried, if any.
    async fn refresh_auth_headers(&self, headers: &AuthHeaders) -> Result<(), SyncError> {
        if headers.is_empty() {
            return Ok(());
        }
        self.session.store_auth_headers(headers).await?;
        tracing::debug!("auth headers refreshed");
        Ok(())
    }
}

impl<S, U> SyncEngine<S, U>
where
    S: AchievementStore + 'static,
    U: SessionStore + 'static,
{
    /// Start the sync worker with this engine as its handler.
    pub fn spawn_worker(self) -> (JobQueue<SyncJob>, WorkerHandle) {
        JobQueue::spawn("sync", self)
    }
}

#[async_trait]
impl<S, U> JobHandler<SyncJob> for SyncEngine<S, U>
where
    S: AchievementStore + 'static,
    U: SessionStore + 'static,
{
    type Error = SyncError;

    async fn run(&self, job: SyncJob) -> Result<(), SyncError> {
        match job {
            SyncJob::PostAchievement(achievement) => self.post_achievement(&achievement).await,
            SyncJob::SyncAchievements => self.sync_achievements().await.map(|_| ()),
        }
    }
}

/// JSON array of `{id_, medal_id, created_at, deck_id}` objects.
pub fn serialize_achievements(achievements: &[PersistedAchievement]) -> Result<Vec<u8>, SyncError> {
    serde_json::to_vec(achievements).map_err(|e| SyncError::parse(format!("achievements batch: {e}")))
}

/// zlib-compress a serialized batch.
pub fn compress_achievements(json: &[u8]) -> Result<Vec<u8>, SyncError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`compress_achievements`].
pub fn decompress_achievements(compressed: &[u8]) -> Result<Vec<u8>, SyncError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use killstreaks_core::{AchievementId, DeckId};
    use proptest::prelude::*;

    fn achievement(id: i64, medal_id: &str, created_at: &str) -> PersistedAchievement {
        PersistedAchievement {
            id: AchievementId::new(id),
            medal_id: medal_id.to_string(),
            created_at: created_at.parse().unwrap(),
            deck_id: DeckId::new(1),
        }
    }

    #[test]
    fn batch_has_only_primitive_fields() {
        let json = serialize_achievements(&[achievement(3, "Killing Spree", "2020-05-01T12:30:00.5Z")]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();

        assert_eq!(
            value,
            serde_json::json!([{
                "id_": 3,
                "medal_id": "Killing Spree",
                "created_at": "2020-05-01T12:30:00.500Z",
                "deck_id": 1,
            }])
        );
    }

    #[test]
    fn compressed_batch_is_a_zlib_stream() {
        let compressed = compress_achievements(b"[]").unwrap();
        // CMF byte for deflate with a 32K window.
        assert_eq!(compressed[0], 0x78);
    }

    #[test]
    fn garbage_does_not_decompress() {
        let err = decompress_achievements(b"not zlib").unwrap_err();
        assert!(matches!(err, SyncError::Compression(_)));
    }

    proptest! {
        #[test]
        fn compression_round_trip_reproduces_json(
            rows in prop::collection::vec((1i64..10_000, "[A-Za-z ]{1,20}", 0i64..2_000_000_000), 0..50)
        ) {
            let achievements: Vec<PersistedAchievement> = rows
                .into_iter()
                .map(|(id, medal, secs)| PersistedAchievement {
                    id: AchievementId::new(id),
                    medal_id: medal,
                    created_at: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
                    deck_id: DeckId::new(id % 7),
                })
                .collect();

            let json = serialize_achievements(&achievements).unwrap();
            let restored = decompress_achievements(&compress_achievements(&json).unwrap()).unwrap();

            prop_assert_eq!(restored, json);
        }
    }
}
