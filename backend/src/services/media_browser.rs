use serde::Deserialize;
use std::sync::Arc;
use url::Url;
use utoipa::ToSchema;

use crate::{
    models::{media_item::MediaPage, user::Credentials},
    picker::{MediaDownload, MediaItemsQuery, PickerApi, PickerError},
};

pub const MIN_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Size/format suffix appended to a media item's `baseUrl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaVariant {
    #[default]
    Original,
    /// Full-resolution photo with metadata (`=d`).
    Download,
    Thumbnail { width: u32, height: u32 },
    /// Playable video bytes (`=dv`).
    Video,
}

impl MediaVariant {
    pub fn suffix(&self) -> String {
        match self {
            MediaVariant::Original => String::new(),
            MediaVariant::Download => "=d".to_string(),
            MediaVariant::Thumbnail { width, height } => format!("=w{}-h{}", width, height),
            MediaVariant::Video => "=dv".to_string(),
        }
    }

    /// Used when the provider sends no `content-disposition`.
    pub fn fallback_disposition(&self) -> &'static str {
        match self {
            MediaVariant::Video => "attachment; filename=\"video.mp4\"",
            MediaVariant::Thumbnail { .. } => "inline",
            _ => "attachment; filename=\"photo.jpg\"",
        }
    }
}

pub struct MediaBrowser {
    api: Arc<dyn PickerApi>,
    allowed_hosts: Vec<String>,
}

impl MediaBrowser {
    pub fn new(api: Arc<dyn PickerApi>, allowed_hosts: Vec<String>) -> Self {
        Self { api, allowed_hosts }
    }

    /// Lists one page. The page token goes to the provider byte for byte.
    pub async fn list_page(
        &self,
        credentials: &Credentials,
        session_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<MediaPage, PickerError> {
        credentials.ensure_present()?;
        let query = MediaItemsQuery {
            session_id: session_id.to_string(),
            page_size: page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
            page_token: page_token.map(str::to_string),
        };
        let page = self
            .api
            .list_media_items(&credentials.access_token, query)
            .await?;

        tracing::debug!(
            session_id,
            items = page.media_items.len(),
            has_more = page.next_page_token.is_some(),
            "Listed picked media items"
        );
        Ok(page)
    }

    /// Streams an item's bytes with the caller's token; nothing is buffered or kept.
    pub async fn fetch_media_bytes(
        &self,
        credentials: &Credentials,
        base_url: &str,
        variant: MediaVariant,
    ) -> Result<MediaDownload, PickerError> {
        credentials.ensure_present()?;
        let url = self.media_url(base_url, variant)?;
        tracing::debug!(?variant, "Fetching media bytes");
        self.api.fetch_media(&credentials.access_token, &url).await
    }

    fn media_url(&self, base_url: &str, variant: MediaVariant) -> Result<String, PickerError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| PickerError::InvalidMediaUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(PickerError::InvalidMediaUrl(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| PickerError::InvalidMediaUrl("missing host".to_string()))?;
        if !self.host_allowed(host) {
            return Err(PickerError::InvalidMediaUrl(format!(
                "host {} is not a media host",
                host
            )));
        }
        Ok(format!("{}{}", base_url, variant.suffix()))
    }

    fn host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.iter().any(|allowed| {
            host.eq_ignore_ascii_case(allowed)
                || host
                    .to_ascii_lowercase()
                    .ends_with(&format!(".{}", allowed.to_ascii_lowercase()))
        })
    }
}
