use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{current_user, login_session_id},
    models::user::{AuthUser, MeResponse, UserResponse},
    state::AppState,
    utils::cookies::{
        build_clear_cookie, build_cookie, extract_cookie_value, LOGIN_COOKIE_NAME,
        LOGIN_COOKIE_PATH, OAUTH_STATE_COOKIE_NAME, OAUTH_STATE_COOKIE_PATH,
    },
};

const OAUTH_STATE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Redirects to the Google consent screen.
pub async fn google_login(State(state): State<AppState>) -> Result<Response, AppError> {
    if !state.config.oauth_configured() {
        return Err(AppError::InternalServerError(anyhow::anyhow!(
            "GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET are not configured"
        )));
    }

    let csrf_state = Uuid::new_v4().simple().to_string();
    let authorize_url = state.oauth.authorize_url(&csrf_state)?;
    let state_cookie = build_cookie(
        OAUTH_STATE_COOKIE_NAME,
        &csrf_state,
        OAUTH_STATE_TTL,
        OAUTH_STATE_COOKIE_PATH,
        state.config.cookie_options(),
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, state_cookie)]),
        Redirect::to(authorize_url.as_str()),
    )
        .into_response())
}

pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google sign-in was not granted");
        return Err(AppError::Unauthorized("Google sign-in was cancelled".to_string()));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let expected_state = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| extract_cookie_value(cookies, OAUTH_STATE_COOKIE_NAME));
    if expected_state.is_none() || expected_state != query.state {
        return Err(AppError::Unauthorized("OAuth state mismatch".to_string()));
    }

    let token = state.oauth.exchange_code(&code).await?;
    let profile = state.oauth.fetch_profile(&token.access_token).await?;
    let user = AuthUser {
        id: profile.sub.clone(),
        display_name: profile.display_name(),
        email: profile.email.clone(),
        access_token: token.access_token,
    };
    tracing::info!(user_id = %user.id, "Google sign-in completed");

    let session_id = state.logins.create(user).await;
    let options = state.config.cookie_options();
    let login_cookie = build_cookie(
        LOGIN_COOKIE_NAME,
        &session_id,
        state.logins.ttl(),
        LOGIN_COOKIE_PATH,
        options,
    );
    let clear_state = build_clear_cookie(OAUTH_STATE_COOKIE_NAME, OAUTH_STATE_COOKIE_PATH, options);

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, login_cookie),
            (header::SET_COOKIE, clear_state),
        ]),
        Redirect::to(&state.config.frontend_url),
    )
        .into_response())
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<MeResponse> {
    let user = current_user(&headers, &state.logins).await;
    Json(MeResponse {
        authenticated: user.is_some(),
        user: user.as_ref().map(UserResponse::from),
    })
}

/// Drops the login session and the cached picker session. Always clears the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(session_id) = login_session_id(&headers) {
        if let Some(user) = state.logins.remove(&session_id).await {
            state.sessions.end_session(&user.id).await?;
            tracing::info!(user_id = %user.id, "Logged out");
        }
    }

    let clear = build_clear_cookie(
        LOGIN_COOKIE_NAME,
        LOGIN_COOKIE_PATH,
        state.config.cookie_options(),
    );
    Ok((
        AppendHeaders([(header::SET_COOKIE, clear)]),
        Json::<Value>(json!({ "success": true })),
    ))
}
