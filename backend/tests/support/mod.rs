#![allow(dead_code)]
use async_trait::async_trait;
use axum::{body::Bytes, Router};
use chrono::{Duration as ChronoDuration, Utc};
use futures::StreamExt;
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::{net::TcpListener, task::JoinHandle};
use photopicker_backend::{
    config::{self, Config},
    models::{
        media_item::{MediaFile, MediaItem, MediaPage, MediaType},
        picker_session::RemoteSession,
        user::AuthUser,
    },
    picker::{MediaDownload, MediaItemsQuery, PickerApi, PickerError},
    services::session_store::InMemorySessionStore,
    state::AppState,
    utils::cookies::{SameSite, LOGIN_COOKIE_NAME},
};

pub const MEDIA_BYTES: &[u8] = b"jpeg-bytes";

pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        frontend_url: "http://localhost:5173".to_string(),
        google_client_id: "test-client-id".to_string(),
        google_client_secret: "test-client-secret".to_string(),
        oauth_callback_url: "http://localhost:3001/auth/google/callback".to_string(),
        oauth_scopes: vec!["openid".to_string(), "email".to_string()],
        google_auth_url: config::GOOGLE_AUTH_URL.to_string(),
        google_token_url: config::GOOGLE_TOKEN_URL.to_string(),
        google_userinfo_url: config::GOOGLE_USERINFO_URL.to_string(),
        picker_api_base: "http://127.0.0.1:9/v1".to_string(),
        picker_session_ttl_secs: 29 * 60,
        media_page_size: 25,
        media_allowed_hosts: vec!["googleusercontent.com".to_string()],
        login_session_ttl_hours: 24,
        cookie_secure: false,
        cookie_same_site: SameSite::Lax,
        http_timeout_secs: 5,
        redis_url: None,
        redis_pool_size: 2,
        redis_connect_timeout: 5,
        poll_interval_secs: 5,
        poll_max_wait_secs: 300,
    }
}

/// In-process stand-in for the Photos Picker API.
///
/// Each `create_session` hands out `session-{n}`. `get_session` reports
/// `mediaItemsSet` from [`StubPickerApi::finish_selection`].
#[derive(Default)]
pub struct StubPickerApi {
    pub created: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub selection_done: AtomicBool,
    pub list_queries: Mutex<Vec<MediaItemsQuery>>,
    pub fetched_urls: Mutex<Vec<String>>,
    pub failure: Mutex<Option<PickerError>>,
}

impl StubPickerApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn finish_selection(&self) {
        self.selection_done.store(true, Ordering::SeqCst);
    }

    pub fn fail_with(&self, err: PickerError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<MediaItemsQuery> {
        self.list_queries.lock().unwrap().last().cloned()
    }

    fn remote(&self, id: String) -> RemoteSession {
        RemoteSession {
            picker_uri: Some(format!("https://photos.google.com/picker/{}", id)),
            id,
            media_items_set: self.selection_done.load(Ordering::SeqCst),
            expire_time: Some(Utc::now() + ChronoDuration::minutes(30)),
            polling_config: None,
        }
    }

    fn injected_failure(&self) -> Result<(), PickerError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PickerApi for StubPickerApi {
    async fn create_session(&self, _access_token: &str) -> Result<RemoteSession, PickerError> {
        self.injected_failure()?;
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        self.selection_done.store(false, Ordering::SeqCst);
        Ok(self.remote(format!("session-{}", n)))
    }

    async fn get_session(
        &self,
        _access_token: &str,
        session_id: &str,
    ) -> Result<RemoteSession, PickerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        Ok(self.remote(session_id.to_string()))
    }

    async fn list_media_items(
        &self,
        _access_token: &str,
        query: MediaItemsQuery,
    ) -> Result<MediaPage, PickerError> {
        self.injected_failure()?;
        let next_page_token = if query.page_token.is_none() {
            Some("next/+page==".to_string())
        } else {
            None
        };
        self.list_queries.lock().unwrap().push(query);
        Ok(MediaPage {
            media_items: vec![media_item("m1")],
            next_page_token,
        })
    }

    async fn fetch_media(
        &self,
        _access_token: &str,
        url: &str,
    ) -> Result<MediaDownload, PickerError> {
        self.injected_failure()?;
        self.fetched_urls.lock().unwrap().push(url.to_string());
        let body = futures::stream::iter(vec![Ok(Bytes::from_static(MEDIA_BYTES))]).boxed();
        Ok(MediaDownload {
            content_type: Some("image/jpeg".to_string()),
            content_disposition: None,
            content_length: Some(MEDIA_BYTES.len() as u64),
            body,
        })
    }
}

pub fn media_item(id: &str) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        create_time: None,
        media_type: MediaType::Photo,
        media_file: MediaFile {
            base_url: format!("https://lh3.googleusercontent.com/{}", id),
            mime_type: "image/jpeg".to_string(),
            filename: format!("{}.jpg", id),
            media_file_metadata: None,
        },
    }
}

pub fn test_state(api: Arc<StubPickerApi>) -> AppState {
    test_state_with_store(api).0
}

pub fn test_state_with_store(api: Arc<StubPickerApi>) -> (AppState, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::default());
    let state = AppState::new(test_config(), api, store.clone()).expect("build app state");
    (state, store)
}

pub fn test_user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        display_name: format!("User {}", id),
        email: Some(format!("{}@example.com", id)),
        access_token: format!("token-{}", id),
    }
}

/// Signs `user_id` in and returns a `Cookie` header value.
pub async fn login_cookie(state: &AppState, user_id: &str) -> String {
    let session_id = state.logins.create(test_user(user_id)).await;
    format!("{}={}", LOGIN_COOKIE_NAME, session_id)
}

/// Serves `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
    let addr = listener.local_addr().expect("read socket addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });
    (addr, handle)
}
