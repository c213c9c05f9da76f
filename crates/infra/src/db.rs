//! SQLite connection settings and schema bootstrap.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::StoreError;

const APP_DIR_NAME: &str = "killstreaks";
const DB_FILE_NAME: &str = "medals.db";

/// Statements run on every open. All of them are idempotent.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS achievements (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        medal_id   TEXT NOT NULL,
        created_at TEXT NOT NULL,
        deck_id    INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS achievements_created_at
        ON achievements (created_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id           INTEGER PRIMARY KEY CHECK (id = 1),
        client_uuid  TEXT NULL,
        email        TEXT NULL,
        auth_headers TEXT NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    INSERT INTO users (id) VALUES (1)
    ON CONFLICT (id) DO NOTHING
    "#,
];

/// Where the local database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private in-memory database (tests, dry runs).
    InMemory,
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub location: DbLocation,
}

impl DbSettings {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DbLocation::File(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: DbLocation::InMemory,
        }
    }

    /// `{addon}/user_files/medals.db`, the layout used when embedded in a host add-on.
    pub fn from_addon_path(addon_path: &Path) -> Self {
        Self::file(addon_path.join("user_files").join(DB_FILE_NAME))
    }

    /// `{data_dir}/killstreaks/medals.db`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let base = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .ok_or(StoreError::NoDataDir)?;

        Ok(base.join(APP_DIR_NAME).join(DB_FILE_NAME))
    }
}

/// Open a pool for the configured database and make sure the schema exists.
pub async fn open(settings: &DbSettings) -> Result<SqlitePool, StoreError> {
    let pool = match &settings.location {
        DbLocation::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal);

            SqlitePoolOptions::new()
                .max_connections(4)
                .connect_with(options)
                .await?
        }
        DbLocation::InMemory => {
            // Every connection to ":memory:" is a separate database, so the
            // pool holds exactly one and never recycles it.
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        }
    };

    ensure_schema(&pool).await?;
    tracing::debug!(location = ?settings.location, "database ready");

    Ok(pool)
}

/// Create tables and the singleton user row if they are missing.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_bootstrap_is_idempotent() {
        let pool = open(&DbSettings::in_memory()).await.unwrap();
        ensure_schema(&pool).await.unwrap();

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 1);
    }

    #[test]
    fn addon_layout_points_into_user_files() {
        let settings = DbSettings::from_addon_path(Path::new("/addons/killstreaks"));
        assert_eq!(
            settings.location,
            DbLocation::File(PathBuf::from("/addons/killstreaks/user_files/medals.db"))
        );
    }
}
