//! SQLite-backed achievement store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use killstreaks_core::{
    AchievementId, DeckId, EnrichedAchievement, MedalCatalog, NewAchievement,
    PersistedAchievement, join_medals, time,
};

use super::store::{AchievementStore, MedalCounts};
use crate::error::StoreError;

/// Deck ids bound into one statement; well under SQLite's host parameter limit.
const DECK_IDS_PER_QUERY: usize = 500;

/// Achievement store over the `achievements` table.
///
/// Cheap to clone; clones share the pool and the catalog.
#[derive(Clone)]
pub struct SqliteAchievementStore {
    pool: SqlitePool,
    catalog: Arc<dyn MedalCatalog>,
}

impl std::fmt::Debug for SqliteAchievementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAchievementStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl SqliteAchievementStore {
    pub fn new(pool: SqlitePool, catalog: Arc<dyn MedalCatalog>) -> Self {
        Self { pool, catalog }
    }

    async fn load_rows(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PersistedAchievement>, StoreError> {
        let rows = match since {
            Some(since) => {
                sqlx::query(
                    r#"
                    SELECT id, medal_id, created_at, deck_id
                    FROM achievements
                    WHERE created_at > ?1
                    ORDER BY id ASC
                    "#,
                )
                .bind(time::encode_bound(since))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, medal_id, created_at, deck_id
                    FROM achievements
                    ORDER BY id ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_achievement).collect()
    }
}

#[async_trait]
impl AchievementStore for SqliteAchievementStore {
    async fn insert_many(
        &self,
        records: Vec<NewAchievement>,
    ) -> Result<Vec<PersistedAchievement>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        // Storage keeps microseconds; hand back exactly what a reload returns.
        // The whole batch is checked before anything is written.
        let encoded = records
            .into_iter()
            .map(|record| {
                let created_at = record.created_at.trunc_subsecs(6);
                let stamp = time::encode(created_at)?;
                Ok((record, created_at, stamp))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut tx = self.pool.begin().await?;
        let mut persisted = Vec::with_capacity(encoded.len());

        for (record, created_at, stamp) in encoded {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO achievements (medal_id, created_at, deck_id)
                VALUES (?1, ?2, ?3)
                RETURNING id
                "#,
            )
            .bind(&record.medal_id)
            .bind(stamp)
            .bind(record.deck_id.get())
            .fetch_one(&mut *tx)
            .await?;

            persisted.push(PersistedAchievement {
                id: AchievementId::new(id),
                medal_id: record.medal_id,
                created_at,
                deck_id: record.deck_id,
            });
        }

        tx.commit().await?;
        tracing::debug!(count = persisted.len(), "achievements stored");

        Ok(persisted)
    }

    async fn all(&self) -> Result<Vec<EnrichedAchievement>, StoreError> {
        let rows = self.load_rows(None).await?;
        let (joined, unmatched) = join_medals(self.catalog.medals(), rows);

        for row in &unmatched {
            tracing::warn!(
                achievement_id = %row.id,
                medal_id = %row.medal_id,
                "achievement references unknown medal; omitted"
            );
        }

        Ok(joined)
    }

    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<PersistedAchievement>, StoreError> {
        self.load_rows(Some(since)).await
    }

    async fn count_by_medal(&self, since: DateTime<Utc>) -> Result<MedalCounts, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT medal_id, COUNT(*)
            FROM achievements
            WHERE created_at > ?1
            GROUP BY medal_id
            "#,
        )
        .bind(time::encode_bound(since))
        .fetch_all(&self.pool)
        .await?;

        collect_counts(rows)
    }

    async fn count_by_medal_for_decks(
        &self,
        since: DateTime<Utc>,
        deck_ids: &[DeckId],
    ) -> Result<MedalCounts, StoreError> {
        // `IN ()` is not valid SQL, and no deck means no match.
        if deck_ids.is_empty() {
            return Ok(MedalCounts::new());
        }

        // Duplicates would be counted once per chunk they land in.
        let mut unique: Vec<i64> = deck_ids.iter().map(|deck_id| deck_id.get()).collect();
        unique.sort_unstable();
        unique.dedup();

        let since = time::encode_bound(since);
        let mut counts = MedalCounts::new();

        for chunk in unique.chunks(DECK_IDS_PER_QUERY) {
            let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
                "SELECT medal_id, COUNT(*) FROM achievements WHERE created_at > ",
            );
            query.push_bind(since.clone());
            query.push(" AND deck_id IN (");
            let mut ids = query.separated(", ");
            for deck_id in chunk {
                ids.push_bind(*deck_id);
            }
            ids.push_unseparated(") GROUP BY medal_id");

            let rows = query
                .build_query_as::<(String, i64)>()
                .fetch_all(&self.pool)
                .await?;

            for (medal_id, count) in collect_counts(rows)? {
                *counts.entry(medal_id).or_default() += count;
            }
        }

        Ok(counts)
    }
}

fn row_to_achievement(row: &SqliteRow) -> Result<PersistedAchievement, StoreError> {
    let id: i64 = row.try_get("id")?;
    let medal_id: String = row.try_get("medal_id")?;
    let created_at: String = row.try_get("created_at")?;
    let deck_id: i64 = row.try_get("deck_id")?;

    let created_at = time::decode(&created_at)
        .map_err(|e| StoreError::corrupt(format!("achievements.created_at (id {id}): {e}")))?;

    Ok(PersistedAchievement {
        id: AchievementId::new(id),
        medal_id,
        created_at,
        deck_id: DeckId::new(deck_id),
    })
}

fn collect_counts(rows: Vec<(String, i64)>) -> Result<MedalCounts, StoreError> {
    rows.into_iter()
        .map(|(medal_id, count)| {
            u64::try_from(count)
                .map(|count| (medal_id, count))
                .map_err(|_| StoreError::corrupt(format!("negative count {count}")))
        })
        .collect()
}
