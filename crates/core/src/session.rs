//! Local user session: install identity and token-auth headers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::ClientUuid;

/// Header names issued by the remote service's token auth.
///
/// Every response may rotate these; the latest values must be echoed on the
/// next request.
pub const AUTH_HEADER_NAMES: [&str; 5] = ["access-token", "client", "uid", "expiry", "token-type"];

/// Auth headers captured from the most recent remote response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthHeaders(BTreeMap<String, String>);

impl AuthHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only recognised auth headers (case-insensitive), lower-cased.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let headers = pairs
            .into_iter()
            .filter_map(|(name, value)| {
                let name = name.to_ascii_lowercase();
                AUTH_HEADER_NAMES
                    .contains(&name.as_str())
                    .then(|| (name, value.to_string()))
            })
            .collect();
        Self(headers)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Persisted state of the single local user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub client_uuid: Option<ClientUuid>,
    pub email: Option<String>,
    pub auth_headers: AuthHeaders,
}

impl Session {
    /// A session is authenticated while it holds auth headers.
    pub fn is_logged_in(&self) -> bool {
        !self.auth_headers.is_empty()
    }
}
