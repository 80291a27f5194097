//! Per-user cache of the most recent picker session.
//!
//! Entries expire after a fixed TTL that is independent of the provider's own
//! session expiry. A `get` after the TTL elapsed reports the entry as absent
//! whether or not anything removed it.

use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::{redis::AsyncCommands, RedisConnectionManager};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};

use crate::{config::Config, models::picker_session::PickerSession};

pub type RedisPool = Pool<RedisConnectionManager>;

/// Stays under the provider's session lifetime with some margin.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(29 * 60);

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, owner_key: &str) -> anyhow::Result<Option<PickerSession>>;
    async fn set(&self, owner_key: &str, session: PickerSession) -> anyhow::Result<()>;
    async fn remove(&self, owner_key: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
struct CachedEntry {
    session: PickerSession,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct InMemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedEntry>>,
}

const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Sweeps at least once a second, however short `every` is.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        let every = every.max(MIN_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = self.sweep().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted expired picker sessions");
                }
            }
        })
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, owner_key: &str) -> anyhow::Result<Option<PickerSession>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(owner_key) {
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.session.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        // A concurrent `set` may have refreshed the entry since the read.
        if entries
            .get(owner_key)
            .is_some_and(|entry| !entry.is_live(now))
        {
            entries.remove(owner_key);
        }
        Ok(entries
            .get(owner_key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.session.clone()))
    }

    async fn set(&self, owner_key: &str, session: PickerSession) -> anyhow::Result<()> {
        let entry = CachedEntry {
            session,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries
            .write()
            .await
            .insert(owner_key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, owner_key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(owner_key);
        Ok(())
    }
}

/// Shares cached sessions between server instances. Redis expires keys itself.
pub struct RedisSessionStore {
    pool: RedisPool,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(pool: RedisPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Builds a pool from `REDIS_URL`; `None` when Redis is not configured.
    pub async fn connect(config: &Config) -> anyhow::Result<Option<Self>> {
        let Some(url) = &config.redis_url else {
            tracing::info!("Redis URL not set, picker sessions cached in memory");
            return Ok(None);
        };

        let manager = RedisConnectionManager::new(url.clone())?;
        let pool = Pool::builder()
            .max_size(config.redis_pool_size)
            .connection_timeout(Duration::from_secs(config.redis_connect_timeout))
            .build(manager)
            .await?;

        tracing::info!(
            pool_size = config.redis_pool_size,
            "Redis session store connected"
        );
        Ok(Some(Self::new(pool, config.picker_session_ttl())))
    }

    fn session_key(owner_key: &str) -> String {
        format!("picker_session:{}", owner_key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, owner_key: &str) -> anyhow::Result<Option<PickerSession>> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = conn.get(Self::session_key(owner_key)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, owner_key: &str, session: PickerSession) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await?;
        let payload = serde_json::to_string(&session)?;
        conn.set_ex::<_, _, ()>(
            Self::session_key(owner_key),
            payload,
            self.ttl.as_secs().max(1),
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, owner_key: &str) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(Self::session_key(owner_key)).await?;
        Ok(())
    }
}
