//! Picker session lifecycle: `NONE → CREATING → OPEN(pending) → OPEN(complete)`.
//!
//! Completion (`mediaItemsSet`) is a provider-owned fact, so every operation
//! that reports it goes back to the provider. The cached copy only remembers
//! which session id belongs to which user.

use chrono::Utc;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    models::{
        picker_session::{PickerSession, SessionPhase},
        user::Credentials,
    },
    picker::{PickerApi, PickerError},
    services::session_store::SessionStore,
};

pub struct PickerSessionService {
    api: Arc<dyn PickerApi>,
    store: Arc<dyn SessionStore>,
    creating: Mutex<HashSet<String>>,
}

impl PickerSessionService {
    pub fn new(api: Arc<dyn PickerApi>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            creating: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the caller's session, refreshed from the provider, or a new one.
    pub async fn ensure_session(
        &self,
        credentials: &Credentials,
    ) -> Result<PickerSession, PickerError> {
        credentials.ensure_present()?;

        match self.cached(&credentials.owner_key).await? {
            Some(cached) if !cached.is_expired_at(Utc::now()) => {
                self.refresh_cached(credentials, cached).await
            }
            Some(cached) => {
                tracing::info!(
                    owner_key = %credentials.owner_key,
                    session_id = %cached.id,
                    "Cached picker session expired at the provider, creating a new one"
                );
                self.create_session(credentials).await
            }
            None => self.create_session(credentials).await,
        }
    }

    /// Starts over: a fresh provider session replaces whatever was cached.
    /// The abandoned session is left to expire on the provider side.
    pub async fn create_session(
        &self,
        credentials: &Credentials,
    ) -> Result<PickerSession, PickerError> {
        credentials.ensure_present()?;
        let owner_key = credentials.owner_key.as_str();

        let remote = {
            let _creating = CreatingGuard::enter(&self.creating, owner_key);
            self.api.create_session(&credentials.access_token).await?
        };
        let session = PickerSession::from_remote(owner_key, remote, Utc::now());
        self.store_session(&session).await?;

        tracing::info!(
            owner_key,
            session_id = %session.id,
            "Created picker session"
        );
        Ok(session)
    }

    /// The one authoritative status check: asks the provider unless the
    /// cached session is already past `expiresAt`.
    pub async fn refresh_status(
        &self,
        credentials: &Credentials,
    ) -> Result<PickerSession, PickerError> {
        credentials.ensure_present()?;
        let cached = self
            .cached(&credentials.owner_key)
            .await?
            .ok_or_else(|| PickerError::NotFound(credentials.owner_key.clone()))?;
        if cached.is_expired_at(Utc::now()) {
            return Err(PickerError::SessionExpired(cached.id));
        }
        self.refresh_cached(credentials, cached).await
    }

    /// Cache read without a provider round trip. Never authoritative for
    /// completion; used to look up the session id for media listing.
    pub async fn get_status(&self, owner_key: &str) -> Result<PickerSession, PickerError> {
        self.cached(owner_key)
            .await?
            .ok_or_else(|| PickerError::NotFound(owner_key.to_string()))
    }

    pub async fn end_session(&self, owner_key: &str) -> Result<(), PickerError> {
        self.store
            .remove(owner_key)
            .await
            .map_err(|e| PickerError::Store(e.to_string()))?;
        tracing::info!(owner_key, "Dropped cached picker session");
        Ok(())
    }

    pub async fn state(&self, owner_key: &str) -> Result<SessionPhase, PickerError> {
        if self.is_creating(owner_key) {
            return Ok(SessionPhase::Creating);
        }
        Ok(self
            .cached(owner_key)
            .await?
            .map(|session| session.phase())
            .unwrap_or(SessionPhase::None))
    }

    async fn refresh_cached(
        &self,
        credentials: &Credentials,
        cached: PickerSession,
    ) -> Result<PickerSession, PickerError> {
        let remote = self
            .api
            .get_session(&credentials.access_token, &cached.id)
            .await?;
        let created_at = if remote.id == cached.id {
            cached.created_at
        } else {
            Utc::now()
        };
        let session = PickerSession::from_remote(&credentials.owner_key, remote, created_at);
        self.store_session(&session).await?;

        tracing::debug!(
            owner_key = %credentials.owner_key,
            session_id = %session.id,
            media_items_set = session.media_items_set,
            "Refreshed picker session"
        );
        Ok(session)
    }

    async fn cached(&self, owner_key: &str) -> Result<Option<PickerSession>, PickerError> {
        self.store
            .get(owner_key)
            .await
            .map_err(|e| PickerError::Store(e.to_string()))
    }

    async fn store_session(&self, session: &PickerSession) -> Result<(), PickerError> {
        self.store
            .set(&session.owner_key, session.clone())
            .await
            .map_err(|e| PickerError::Store(e.to_string()))
    }

    fn is_creating(&self, owner_key: &str) -> bool {
        self.creating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(owner_key)
    }
}

/// Marks `owner_key` as CREATING for as long as the guard lives.
struct CreatingGuard<'a> {
    creating: &'a Mutex<HashSet<String>>,
    owner_key: String,
}

impl<'a> CreatingGuard<'a> {
    fn enter(creating: &'a Mutex<HashSet<String>>, owner_key: &str) -> Self {
        creating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner_key.to_string());
        Self {
            creating,
            owner_key: owner_key.to_string(),
        }
    }
}

impl Drop for CreatingGuard<'_> {
    fn drop(&mut self) {
        self.creating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.owner_key);
    }
}
