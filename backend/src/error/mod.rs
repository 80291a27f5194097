use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use utoipa::ToSchema;

use crate::{picker::PickerError, services::oauth::OAuthError};

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Gone(String),
    Unauthorized(String),
    Conflict(String),
    BadRequest(String),
    InternalServerError(anyhow::Error),
    Validation(Vec<String>),
    /// The picker provider answered with a non-success status.
    Provider { status_code: u16, body: String },
    ProviderUnavailable(String),
    PollTimeout(Duration),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND", None),
            AppError::Gone(msg) => (StatusCode::GONE, msg, "SESSION_EXPIRED", None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED", None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT", None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST", None),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR",
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR",
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::Provider { status_code, body } => (
                StatusCode::BAD_GATEWAY,
                "Picker provider error".to_string(),
                "PROVIDER_ERROR",
                Some(serde_json::json!({ "statusCode": status_code, "body": body })),
            ),
            AppError::ProviderUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, msg, "PROVIDER_UNAVAILABLE", None)
            }
            AppError::PollTimeout(waited) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Media selection was not completed in time".to_string(),
                "POLL_TIMEOUT",
                Some(serde_json::json!({ "waitedSecs": waited.as_secs() })),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<PickerError> for AppError {
    fn from(err: PickerError) -> Self {
        match err {
            PickerError::Unauthenticated => {
                AppError::Unauthorized("Authentication required".to_string())
            }
            PickerError::Provider { status_code, body } => {
                AppError::Provider { status_code, body }
            }
            PickerError::Transport(msg) => AppError::ProviderUnavailable(msg),
            PickerError::NotFound(_) => AppError::NotFound("No picker session".to_string()),
            PickerError::SessionExpired(_) => {
                AppError::Gone("Picker session has expired, start a new one".to_string())
            }
            PickerError::SelectionIncomplete => {
                AppError::Conflict("Media selection is not complete".to_string())
            }
            PickerError::PollTimeout(waited) => AppError::PollTimeout(waited),
            PickerError::PollCanceled => AppError::Conflict("Polling was canceled".to_string()),
            PickerError::InvalidMediaUrl(msg) => AppError::BadRequest(msg),
            PickerError::Store(msg) => {
                AppError::InternalServerError(anyhow::anyhow!("session store: {}", msg))
            }
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::Rejected { status, body } => {
                tracing::warn!(status, body = %body, "Google OAuth2 endpoint rejected the request");
                AppError::Unauthorized("Google sign-in failed".to_string())
            }
            other => AppError::InternalServerError(other.into()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        AppError::Validation(messages)
    }
}
