//! HTTP client for the achievements service.
//!
//! Each call returns a [`Reply`] that exposes the auth headers of the response
//! before its status is judged, so callers can store rotated tokens even when
//! the request failed.

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use killstreaks_core::{AchievementId, AuthHeaders, ClientUuid, DeckId, PersistedAchievement};

use crate::config::SyncConfig;
use crate::error::SyncError;

pub const SYNCS_PATH: &str = "/api/v1/syncs";
pub const ACHIEVEMENTS_PATH: &str = "/api/v1/achievements";

pub const ACHIEVEMENTS_FILE_FIELD: &str = "achievements_file";
pub const ACHIEVEMENTS_FILE_NAME: &str = "achievements.json.zlib";
pub const ACHIEVEMENTS_FILE_MIME: &str = "application/zlib";

/// Body of `POST /api/v1/achievements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementPayload {
    pub client_db_id: AchievementId,
    pub client_medal_id: String,
    pub client_deck_id: DeckId,
    pub client_earned_at: DateTime<Utc>,
    pub client_uuid: ClientUuid,
}

impl AchievementPayload {
    pub fn new(achievement: &PersistedAchievement, client_uuid: ClientUuid) -> Self {
        Self {
            client_db_id: achievement.id,
            client_medal_id: achievement.medal_id.clone(),
            client_deck_id: achievement.deck_id,
            client_earned_at: achievement.created_at,
            client_uuid,
        }
    }
}

/// One entry of `GET /api/v1/syncs`. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRecord {
    pub created_at: String,
}

/// A response whose status has not been checked yet.
#[derive(Debug)]
pub struct Reply {
    auth_headers: AuthHeaders,
    response: reqwest::Response,
}

impl Reply {
    fn new(response: reqwest::Response) -> Self {
        let auth_headers = auth_headers_of(response.headers());
        Self {
            auth_headers,
            response,
        }
    }

    /// Auth headers carried by the response; empty if it had none.
    pub fn auth_headers(&self) -> &AuthHeaders {
        &self.auth_headers
    }

    /// The response, or [`SyncError::Api`] for a non-2xx status.
    pub fn error_for_status(self) -> Result<reqwest::Response, SyncError> {
        let status = self.response.status();
        if status.is_success() {
            Ok(self.response)
        } else {
            Err(SyncError::Api {
                status: status.as_u16(),
                url: self.response.url().to_string(),
            })
        }
    }
}

fn auth_headers_of(headers: &HeaderMap) -> AuthHeaders {
    AuthHeaders::from_pairs(
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
    )
}

/// Thin wrapper over a configured `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    config: SyncConfig,
}

impl RemoteClient {
    /// Client with the configured timeout and `Accept: application/json` on every request.
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self { http, config })
    }

    /// `GET /api/v1/syncs`.
    pub async fn get_syncs(&self, auth: &AuthHeaders) -> Result<Reply, SyncError> {
        let url = self.config.url(SYNCS_PATH);
        tracing::debug!(%url, "fetching sync history");

        let response = with_auth(self.http.get(&url), auth).send().await?;
        Ok(Reply::new(response))
    }

    /// `POST /api/v1/syncs` with a zlib-compressed JSON array of achievements.
    pub async fn post_sync(
        &self,
        auth: &AuthHeaders,
        client_uuid: ClientUuid,
        compressed: Vec<u8>,
    ) -> Result<Reply, SyncError> {
        let url = self.config.url(SYNCS_PATH);
        tracing::debug!(%url, bytes = compressed.len(), "uploading achievements batch");

        let file = Part::bytes(compressed)
            .file_name(ACHIEVEMENTS_FILE_NAME)
            .mime_str(ACHIEVEMENTS_FILE_MIME)?;
        let form = Form::new()
            .text("client_uuid", client_uuid.to_string())
            .part(ACHIEVEMENTS_FILE_FIELD, file);

        let response = with_auth(self.http.post(&url), auth)
            .multipart(form)
            .send()
            .await?;
        Ok(Reply::new(response))
    }

    /// `POST /api/v1/achievements`.
    pub async fn post_achievement(
        &self,
        auth: &AuthHeaders,
        payload: &AchievementPayload,
    ) -> Result<Reply, SyncError> {
        let url = self.config.url(ACHIEVEMENTS_PATH);
        tracing::debug!(%url, client_db_id = %payload.client_db_id, "uploading achievement");

        let response = with_auth(self.http.post(&url), auth)
            .json(payload)
            .send()
            .await?;
        Ok(Reply::new(response))
    }
}

fn with_auth(mut request: reqwest::RequestBuilder, auth: &AuthHeaders) -> reqwest::RequestBuilder {
    for (name, value) in auth.iter() {
        request = request.header(name, value);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_headers_are_captured_from_a_response() {
        let mut headers = HeaderMap::new();
        headers.insert("access-token", HeaderValue::from_static("tok"));
        headers.insert("uid", HeaderValue::from_static("a@b.c"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let captured = auth_headers_of(&headers);

        assert_eq!(captured.get("access-token"), Some("tok"));
        assert_eq!(captured.get("uid"), Some("a@b.c"));
        assert_eq!(captured.get("content-type"), None);
    }

    #[test]
    fn achievement_payload_uses_client_field_names() {
        let achievement = PersistedAchievement {
            id: AchievementId::new(7),
            medal_id: "Rampage".to_string(),
            created_at: "2020-05-01T12:30:00Z".parse().unwrap(),
            deck_id: DeckId::new(42),
        };
        let uuid: ClientUuid = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();

        let json = serde_json::to_value(AchievementPayload::new(&achievement, uuid)).unwrap();

        assert_eq!(json["client_db_id"], 7);
        assert_eq!(json["client_medal_id"], "Rampage");
        assert_eq!(json["client_deck_id"], 42);
        assert_eq!(json["client_earned_at"], "2020-05-01T12:30:00Z");
        assert_eq!(json["client_uuid"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }
}
