use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use killstreaks_core::{AuthHeaders, ClientUuid, Session};

use crate::error::StoreError;

/// Session/credential holder for the local user.
///
/// Every remote call reads the auth headers and overwrites them from the
/// response, so implementations only need per-write atomicity.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Session, StoreError>;

    async fn set_client_uuid(&self, client_uuid: ClientUuid) -> Result<(), StoreError>;

    async fn store_auth_headers(&self, headers: &AuthHeaders) -> Result<(), StoreError>;

    /// Persist the identity and headers produced by a successful login.
    async fn store_login(&self, email: &str, headers: &AuthHeaders) -> Result<(), StoreError>;

    /// Forget identity and headers. The client uuid survives logout.
    async fn clear_credentials(&self) -> Result<(), StoreError>;

    async fn load_auth_headers(&self) -> Result<AuthHeaders, StoreError> {
        Ok(self.load().await?.auth_headers)
    }

    async fn is_logged_in(&self) -> Result<bool, StoreError> {
        Ok(self.load().await?.is_logged_in())
    }
}

#[async_trait]
impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn load(&self) -> Result<Session, StoreError> {
        (**self).load().await
    }

    async fn set_client_uuid(&self, client_uuid: ClientUuid) -> Result<(), StoreError> {
        (**self).set_client_uuid(client_uuid).await
    }

    async fn store_auth_headers(&self, headers: &AuthHeaders) -> Result<(), StoreError> {
        (**self).store_auth_headers(headers).await
    }

    async fn store_login(&self, email: &str, headers: &AuthHeaders) -> Result<(), StoreError> {
        (**self).store_login(email, headers).await
    }

    async fn clear_credentials(&self) -> Result<(), StoreError> {
        (**self).clear_credentials().await
    }
}

/// In-memory session holder for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: RwLock::new(session),
        }
    }

    fn poisoned() -> StoreError {
        StoreError::corrupt("session lock poisoned")
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Session, StoreError> {
        let session = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(session.clone())
    }

    async fn set_client_uuid(&self, client_uuid: ClientUuid) -> Result<(), StoreError> {
        let mut session = self.inner.write().map_err(|_| Self::poisoned())?;
        session.client_uuid = Some(client_uuid);
        Ok(())
    }

    async fn store_auth_headers(&self, headers: &AuthHeaders) -> Result<(), StoreError> {
        let mut session = self.inner.write().map_err(|_| Self::poisoned())?;
        session.auth_headers = headers.clone();
        Ok(())
    }

    async fn store_login(&self, email: &str, headers: &AuthHeaders) -> Result<(), StoreError> {
        let mut session = self.inner.write().map_err(|_| Self::poisoned())?;
        session.email = Some(email.to_string());
        session.auth_headers = headers.clone();
        Ok(())
    }

    async fn clear_credentials(&self) -> Result<(), StoreError> {
        let mut session = self.inner.write().map_err(|_| Self::poisoned())?;
        session.email = None;
        session.auth_headers = AuthHeaders::new();
        Ok(())
    }
}
