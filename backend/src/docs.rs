#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use axum::Json;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    error::ErrorResponse,
    handlers::media::{ListMediaQuery, MediaContentRequest},
    models::{
        media_item::{MediaFile, MediaItem, MediaPage, MediaType},
        picker_session::{PickerSession, PollingConfig, SessionPhase, SessionStateResponse},
        user::{MeResponse, UserResponse},
    },
    services::media_browser::MediaVariant,
    utils::cookies::LOGIN_COOKIE_NAME,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        google_login_doc,
        google_callback_doc,
        me_doc,
        logout_doc,
        ensure_session_doc,
        create_session_doc,
        session_status_doc,
        session_state_doc,
        list_media_doc,
        media_content_doc
    ),
    components(schemas(
        ErrorResponse,
        MeResponse,
        UserResponse,
        PickerSession,
        PollingConfig,
        SessionPhase,
        SessionStateResponse,
        MediaPage,
        MediaItem,
        MediaFile,
        MediaType,
        MediaVariant,
        MediaContentRequest
    )),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Google sign-in and login session"),
        (name = "Picker", description = "Picker session lifecycle"),
        (name = "Media", description = "Picked media listing and bytes")
    ),
    security(("SessionCookie" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(LOGIN_COOKIE_NAME))),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/auth/google",
    responses((status = 303, description = "Redirect to the Google consent screen")),
    tag = "Auth",
    security(())
)]
fn google_login_doc() {}

#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "CSRF state echoed by Google")
    ),
    responses(
        (status = 303, description = "Login cookie set, redirect to the frontend"),
        (status = 401, description = "State mismatch or sign-in rejected", body = ErrorResponse)
    ),
    tag = "Auth",
    security(())
)]
fn google_callback_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, body = MeResponse)),
    tag = "Auth",
    security(())
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Login and picker session dropped", body = serde_json::Value)
    ),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/picker/session",
    responses(
        (status = 200, description = "Current session, refreshed or new", body = PickerSession),
        (status = 401, body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    ),
    tag = "Picker"
)]
fn ensure_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/picker/session",
    responses(
        (status = 200, description = "New session replacing the cached one", body = PickerSession),
        (status = 401, body = ErrorResponse),
        (status = 502, body = ErrorResponse)
    ),
    tag = "Picker"
)]
fn create_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/picker/session/status",
    responses(
        (status = 200, description = "Status from the provider", body = PickerSession),
        (status = 404, description = "No session yet", body = ErrorResponse),
        (status = 410, description = "Session expired", body = ErrorResponse),
        (status = 502, body = ErrorResponse)
    ),
    tag = "Picker"
)]
fn session_status_doc() {}

#[utoipa::path(
    get,
    path = "/api/picker/session/state",
    responses((status = 200, body = SessionStateResponse)),
    tag = "Picker"
)]
fn session_state_doc() {}

#[utoipa::path(
    get,
    path = "/api/picker/media",
    params(ListMediaQuery),
    responses(
        (status = 200, body = MediaPage),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, description = "Selection not complete", body = ErrorResponse),
        (status = 410, description = "Session expired", body = ErrorResponse)
    ),
    tag = "Media"
)]
fn list_media_doc() {}

#[utoipa::path(
    post,
    path = "/api/picker/media/content",
    request_body = MediaContentRequest,
    responses(
        (status = 200, description = "Media bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Rejected media URL", body = ErrorResponse),
        (status = 502, body = ErrorResponse)
    ),
    tag = "Media"
)]
fn media_content_doc() {}
