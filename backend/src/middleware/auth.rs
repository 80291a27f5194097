use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::user::AuthUser,
    services::login_session::LoginSessionStore,
    state::AppState,
    utils::cookies::{extract_cookie_value, LOGIN_COOKIE_NAME},
};

/// Resolves the `picker_sid` cookie to an [`AuthUser`] request extension.
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = current_user(request.headers(), &state.logins)
        .await
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn login_session_id(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    extract_cookie_value(cookies, LOGIN_COOKIE_NAME)
}

pub async fn current_user(headers: &HeaderMap, logins: &LoginSessionStore) -> Option<AuthUser> {
    let session_id = login_session_id(headers)?;
    logins.get(&session_id).await
}
