use async_trait::async_trait;
use axum::body::Bytes;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use std::{fmt, io, time::Duration};

use crate::{
    models::{media_item::MediaPage, picker_session::RemoteSession},
    picker::PickerError,
};

pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Streamed media bytes plus the headers worth forwarding to the browser.
pub struct MediaDownload {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl fmt::Debug for MediaDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDownload")
            .field("content_type", &self.content_type)
            .field("content_disposition", &self.content_disposition)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItemsQuery {
    pub session_id: String,
    pub page_size: u32,
    pub page_token: Option<String>,
}

/// Remote Photos Picker service. Stateless; every call carries the bearer token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PickerApi: Send + Sync {
    async fn create_session(&self, access_token: &str) -> Result<RemoteSession, PickerError>;

    async fn get_session(
        &self,
        access_token: &str,
        session_id: &str,
    ) -> Result<RemoteSession, PickerError>;

    async fn list_media_items(
        &self,
        access_token: &str,
        query: MediaItemsQuery,
    ) -> Result<MediaPage, PickerError>;

    /// Fetches `url` as-is. Callers append size/variant suffixes beforehand.
    async fn fetch_media(&self, access_token: &str, url: &str)
        -> Result<MediaDownload, PickerError>;
}

pub struct GooglePickerClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl GooglePickerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PickerError> {
        let http = Client::builder()
            .user_agent(concat!("photopicker-backend/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PickerApi for GooglePickerClient {
    async fn create_session(&self, access_token: &str) -> Result<RemoteSession, PickerError> {
        let response = self
            .http
            .post(self.endpoint("/sessions"))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        read_json(response).await
    }

    async fn get_session(
        &self,
        access_token: &str,
        session_id: &str,
    ) -> Result<RemoteSession, PickerError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/sessions/{}", session_id)))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .send()
            .await?;
        read_json(response).await
    }

    async fn list_media_items(
        &self,
        access_token: &str,
        query: MediaItemsQuery,
    ) -> Result<MediaPage, PickerError> {
        let mut params = vec![
            ("sessionId", query.session_id),
            ("pageSize", query.page_size.to_string()),
        ];
        if let Some(token) = query.page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .http
            .get(self.endpoint("/mediaItems"))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .query(&params)
            .send()
            .await?;
        read_json(response).await
    }

    async fn fetch_media(
        &self,
        access_token: &str,
        url: &str,
    ) -> Result<MediaDownload, PickerError> {
        // No total timeout here: large videos legitimately stream for minutes.
        let response = self.http.get(url).bearer_auth(access_token).send().await?;
        let response = ensure_success(response).await?;

        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header_value(header::CONTENT_TYPE);
        let content_disposition = header_value(header::CONTENT_DISPOSITION);
        let content_length = response.content_length();

        let body = response.bytes_stream().map_err(io::Error::other).boxed();
        Ok(MediaDownload {
            content_type,
            content_disposition,
            content_length,
            body,
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response, PickerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), body = %body, "Picker API returned an error");
    Err(PickerError::Provider {
        status_code: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PickerError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| PickerError::Transport(format!("invalid picker response: {}", e)))
}
