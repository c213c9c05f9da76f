//! SQLite-backed session holder (single row in `users`).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use killstreaks_core::{AuthHeaders, ClientUuid, Session};

use super::store::SessionStore;
use crate::error::StoreError;

/// Session holder over the singleton `users` row created by [`crate::db::open`].
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self) -> Result<Session, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT client_uuid, email, auth_headers
            FROM users
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let client_uuid: Option<String> = row.try_get("client_uuid")?;
        let client_uuid = client_uuid
            .map(|raw| {
                raw.parse::<ClientUuid>()
                    .map_err(|e| StoreError::corrupt(format!("users.client_uuid: {e}")))
            })
            .transpose()?;

        let email: Option<String> = row.try_get("email")?;

        let auth_headers: String = row.try_get("auth_headers")?;
        let auth_headers: AuthHeaders = serde_json::from_str(&auth_headers)?;

        Ok(Session {
            client_uuid,
            email,
            auth_headers,
        })
    }

    async fn set_client_uuid(&self, client_uuid: ClientUuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET client_uuid = ?1 WHERE id = 1")
            .bind(client_uuid.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn store_auth_headers(&self, headers: &AuthHeaders) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET auth_headers = ?1 WHERE id = 1")
            .bind(serde_json::to_string(headers)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn store_login(&self, email: &str, headers: &AuthHeaders) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET email = ?1, auth_headers = ?2 WHERE id = 1")
            .bind(email)
            .bind(serde_json::to_string(headers)?)
            .execute(&self.pool)
            .await?;
        tracing::info!("login stored");
        Ok(())
    }

    async fn clear_credentials(&self) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET email = NULL, auth_headers = '{}' WHERE id = 1")
            .execute(&self.pool)
            .await?;
        tracing::info!("credentials cleared");
        Ok(())
    }
}
