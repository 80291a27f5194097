use axum::{
    body::Body,
    extract::{Extension, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::AppError,
    models::{media_item::MediaPage, user::AuthUser},
    picker::PickerError,
    services::media_browser::{MediaVariant, MAX_PAGE_SIZE, MIN_PAGE_SIZE},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListMediaQuery {
    #[validate(range(min = MIN_PAGE_SIZE, max = MAX_PAGE_SIZE))]
    pub page_size: Option<u32>,
    /// Opaque cursor from the previous page's `nextPageToken`.
    pub page_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaContentRequest {
    #[validate(url)]
    pub base_url: String,
    #[serde(default)]
    pub variant: MediaVariant,
}

/// Lists picked items. Only a completed selection can be listed.
pub async fn list_media(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListMediaQuery>,
) -> Result<Json<MediaPage>, AppError> {
    query.validate()?;
    let credentials = user.credentials();

    let cached = state.sessions.get_status(&user.id).await?;
    if cached.is_expired_at(Utc::now()) {
        return Err(PickerError::SessionExpired(cached.id).into());
    }
    let session = if cached.media_items_set {
        cached
    } else {
        state.sessions.refresh_status(&credentials).await?
    };
    if !session.media_items_set {
        return Err(PickerError::SelectionIncomplete.into());
    }

    let page_size = query.page_size.unwrap_or(state.config.media_page_size);
    let page = state
        .media
        .list_page(
            &credentials,
            &session.id,
            query.page_token.as_deref(),
            page_size,
        )
        .await?;
    Ok(Json(page))
}

/// Streams one item's bytes back to the browser.
pub async fn media_content(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<MediaContentRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let download = state
        .media
        .fetch_media_bytes(&user.credentials(), &payload.base_url, payload.variant)
        .await?;

    let mut headers = HeaderMap::new();
    let content_type = download
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    let disposition = download
        .content_disposition
        .as_deref()
        .unwrap_or(payload.variant.fallback_disposition());
    if let Ok(value) = HeaderValue::from_str(disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(length) = download.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok((headers, Body::from_stream(download.body)).into_response())
}
