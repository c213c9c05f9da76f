//! Sync configuration.

use std::path::PathBuf;
use std::time::Duration;

use killstreaks_infra::DbSettings;

use crate::error::SyncError;

/// Production service.
pub const DEFAULT_BASE_URL: &str = "https://www.ankiachievements.com";

/// Bound on every HTTP call so a hung connection cannot stall the worker.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_API_URL: &str = "KILLSTREAKS_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "KILLSTREAKS_TIMEOUT_SECS";
pub const ENV_DB_PATH: &str = "KILLSTREAKS_DB_PATH";

/// Everything the sync side needs at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Service root, without a trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    pub db: DbSettings,
}

impl SyncConfig {
    /// Defaults for the given database.
    pub fn new(db: DbSettings) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            db,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Defaults overridden by `KILLSTREAKS_API_URL`, `KILLSTREAKS_TIMEOUT_SECS`
    /// and `KILLSTREAKS_DB_PATH`.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let db = match lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            Some(path) => DbSettings::file(PathBuf::from(path)),
            None => DbSettings::file(DbSettings::default_path()?),
        };

        let mut config = Self::new(db);

        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.is_empty()) {
            config = config.with_base_url(url);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .parse()
                .map_err(|_| SyncError::Config(format!("{ENV_TIMEOUT_SECS}={raw:?} is not a number of seconds")))?;
            if secs == 0 {
                return Err(SyncError::Config(format!("{ENV_TIMEOUT_SECS} must be positive")));
            }
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Absolute URL for a service path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Where new users create an account.
    pub fn signup_url(&self) -> String {
        self.url("users/sign_up")
    }
}
