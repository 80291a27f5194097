use axum::{
    extract::{Extension, State},
    Json,
};

use crate::{
    error::AppError,
    models::{
        picker_session::{PickerSession, SessionStateResponse},
        user::AuthUser,
    },
    state::AppState,
};

pub async fn ensure_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PickerSession>, AppError> {
    let session = state.sessions.ensure_session(&user.credentials()).await?;
    Ok(Json(session))
}

pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PickerSession>, AppError> {
    let session = state.sessions.create_session(&user.credentials()).await?;
    Ok(Json(session))
}

/// One authoritative status check; clients poll this route.
pub async fn session_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PickerSession>, AppError> {
    let session = state.sessions.refresh_status(&user.credentials()).await?;
    Ok(Json(session))
}

/// Lifecycle phase from the cache, including an in-flight create.
pub async fn session_state(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionStateResponse>, AppError> {
    let phase = state.sessions.state(&user.id).await?;
    Ok(Json(SessionStateResponse { state: phase }))
}
