use std::{collections::HashMap, time::Duration};
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

use crate::models::user::AuthUser;

struct LoginEntry {
    user: AuthUser,
    expires_at: Instant,
}

/// Server-side login sessions keyed by the opaque id stored in the cookie.
pub struct LoginSessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, LoginEntry>>,
}

impl LoginSessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the new session id.
    pub async fn create(&self, user: AuthUser) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        let entry = LoginEntry {
            user,
            expires_at: Instant::now() + self.ttl,
        };
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(session_id.clone(), entry);
        session_id
    }

    pub async fn get(&self, session_id: &str) -> Option<AuthUser> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.user.clone())
    }

    pub async fn remove(&self, session_id: &str) -> Option<AuthUser> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|entry| entry.user)
    }
}
