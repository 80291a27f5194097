use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

use crate::{
    models::{media_item::MediaPage, picker_session::PickerSession},
    picker::PickerError,
    polling::StatusSource,
    utils::cookies::LOGIN_COOKIE_NAME,
};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    details: Option<ProviderDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderDetails {
    status_code: Option<u16>,
    body: Option<String>,
}

/// HTTP client for this service's own picker routes, authenticated by the
/// login session cookie.
pub struct BackendClient {
    http: Client,
    base_url: String,
    cookie: String,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        login_session_id: &str,
        timeout: Duration,
    ) -> Result<Self, PickerError> {
        let http = Client::builder()
            .user_agent(concat!("picker-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie: format!("{}={}", LOGIN_COOKIE_NAME, login_session_id),
        })
    }

    pub async fn ensure_session(&self) -> Result<PickerSession, PickerError> {
        self.get_json("/api/picker/session", &[]).await
    }

    pub async fn create_session(&self) -> Result<PickerSession, PickerError> {
        let response = self
            .http
            .post(self.endpoint("/api/picker/session"))
            .header(header::COOKIE, &self.cookie)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn session_status(&self) -> Result<PickerSession, PickerError> {
        self.get_json("/api/picker/session/status", &[]).await
    }

    pub async fn list_media(
        &self,
        page_token: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<MediaPage, PickerError> {
        let mut params = Vec::new();
        if let Some(size) = page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get_json("/api/picker/media", &params).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, PickerError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .header(header::COOKIE, &self.cookie)
            .query(params)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl StatusSource for BackendClient {
    async fn refresh_status(&self) -> Result<PickerSession, PickerError> {
        self.session_status().await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PickerError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| PickerError::Transport(format!("invalid backend response: {}", e)));
    }
    let text = response.text().await.unwrap_or_default();
    Err(error_from_response(status, &text))
}

/// Turns an `{error, code, details}` body back into the error kind it came from.
fn error_from_response(status: StatusCode, text: &str) -> PickerError {
    let parsed = serde_json::from_str::<ErrorBody>(text).ok();
    let message = parsed
        .as_ref()
        .map(|body| body.error.clone())
        .unwrap_or_else(|| text.to_string());
    let code = parsed.as_ref().map(|body| body.code.as_str()).unwrap_or("");

    match (status, code) {
        (StatusCode::UNAUTHORIZED, _) => PickerError::Unauthenticated,
        (StatusCode::NOT_FOUND, _) => PickerError::NotFound(message),
        (StatusCode::GONE, _) => PickerError::SessionExpired(message),
        (StatusCode::CONFLICT, _) => PickerError::SelectionIncomplete,
        (StatusCode::BAD_REQUEST, "BAD_REQUEST") => PickerError::InvalidMediaUrl(message),
        (_, "PROVIDER_UNAVAILABLE") => PickerError::Transport(message),
        (_, "PROVIDER_ERROR") => {
            let details = parsed.and_then(|body| body.details);
            PickerError::Provider {
                status_code: details
                    .as_ref()
                    .and_then(|d| d.status_code)
                    .unwrap_or(status.as_u16()),
                body: details.and_then(|d| d.body).unwrap_or(message),
            }
        }
        _ => PickerError::Provider {
            status_code: status.as_u16(),
            body: text.to_string(),
        },
    }
}
