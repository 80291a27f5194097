use std::sync::Arc;

use crate::{
    config::Config,
    picker::{GooglePickerClient, PickerApi},
    services::{
        login_session::LoginSessionStore,
        media_browser::MediaBrowser,
        oauth::GoogleOAuthClient,
        picker_session::PickerSessionService,
        session_store::{InMemorySessionStore, RedisSessionStore, SessionStore},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<PickerSessionService>,
    pub media: Arc<MediaBrowser>,
    pub logins: Arc<LoginSessionStore>,
    pub oauth: Arc<GoogleOAuthClient>,
}

impl AppState {
    /// Wires the services around an explicit picker API and session store.
    pub fn new(
        config: Config,
        api: Arc<dyn PickerApi>,
        store: Arc<dyn SessionStore>,
    ) -> anyhow::Result<Self> {
        let sessions = Arc::new(PickerSessionService::new(api.clone(), store));
        let media = Arc::new(MediaBrowser::new(api, config.media_allowed_hosts.clone()));
        let logins = Arc::new(LoginSessionStore::new(config.login_session_ttl()));
        let oauth = Arc::new(GoogleOAuthClient::from_config(&config)?);
        Ok(Self {
            config,
            sessions,
            media,
            logins,
            oauth,
        })
    }

    /// Production wiring: the Google client plus Redis when `REDIS_URL` is set,
    /// otherwise the in-memory store with a background sweeper.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let api: Arc<dyn PickerApi> = Arc::new(GooglePickerClient::new(
            config.picker_api_base.clone(),
            config.http_timeout(),
        )?);

        let store: Arc<dyn SessionStore> = match RedisSessionStore::connect(&config).await? {
            Some(redis) => {
                tracing::info!("Caching picker sessions in Redis");
                Arc::new(redis)
            }
            None => {
                let memory = Arc::new(InMemorySessionStore::new(config.picker_session_ttl()));
                memory.clone().spawn_sweeper(config.picker_session_ttl());
                tracing::info!("Caching picker sessions in memory");
                memory
            }
        };

        Self::new(config, api, store)
    }
}
