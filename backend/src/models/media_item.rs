use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Photo,
    Video,
    #[default]
    #[serde(other)]
    TypeUnspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub base_url: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub media_file_metadata: Option<serde_json::Value>,
}

/// A picked item, read-only and shaped exactly like the provider's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    pub media_file: MediaFile,
}

impl MediaItem {
    pub fn filename(&self) -> &str {
        &self.media_file.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.media_file.mime_type
    }

    pub fn base_url(&self) -> &str {
        &self.media_file.base_url
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }
}

/// One page of a completed session's items. `next_page_token` is opaque.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaPage {
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
