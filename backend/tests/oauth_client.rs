use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::collections::HashMap;

use photopicker_backend::services::oauth::{GoogleOAuthClient, OAuthError};

mod support;

/// Fake token and userinfo endpoints. Only `auth-code` is redeemable.
fn fake_google() -> Router {
    Router::new()
        .route(
            "/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let valid = form.get("grant_type").map(String::as_str) == Some("authorization_code")
                    && form.get("code").map(String::as_str) == Some("auth-code")
                    && form.get("client_id").map(String::as_str) == Some("test-client-id")
                    && form.get("client_secret").map(String::as_str) == Some("test-client-secret");
                if !valid {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": "invalid_grant" })),
                    )
                        .into_response();
                }
                Json(json!({
                    "access_token": "ya29.access",
                    "expires_in": 3599,
                    "token_type": "Bearer"
                }))
                .into_response()
            }),
        )
        .route(
            "/userinfo",
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer ya29.access");
                if !authorized {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(json!({
                    "sub": "10769150350006150715113082367",
                    "name": "Ada Lovelace",
                    "email": "ada@example.com"
                }))
                .into_response()
            }),
        )
}

async fn client() -> GoogleOAuthClient {
    let (addr, _handle) = support::spawn_app(fake_google()).await;
    let mut config = support::test_config();
    config.google_token_url = format!("http://{}/token", addr);
    config.google_userinfo_url = format!("http://{}/userinfo", addr);
    GoogleOAuthClient::from_config(&config).expect("build oauth client")
}

#[tokio::test]
async fn authorize_url_carries_client_scope_and_state() {
    let url = client().await.authorize_url("state-123").unwrap();
    let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

    assert!(url
        .as_str()
        .starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert_eq!(params["client_id"], "test-client-id");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "openid email");
    assert_eq!(params["state"], "state-123");
    assert_eq!(
        params["redirect_uri"],
        "http://localhost:3001/auth/google/callback"
    );
}

#[tokio::test]
async fn exchange_code_then_fetch_profile() {
    let client = client().await;

    let token = client.exchange_code("auth-code").await.unwrap();
    let profile = client.fetch_profile(&token.access_token).await.unwrap();

    assert_eq!(token.access_token, "ya29.access");
    assert_eq!(token.expires_in, Some(3599));
    assert_eq!(profile.sub, "10769150350006150715113082367");
    assert_eq!(profile.display_name(), "Ada Lovelace");
}

#[tokio::test]
async fn rejected_code_exchange_is_reported() {
    let err = client().await.exchange_code("stale").await.unwrap_err();
    match err {
        OAuthError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn profile_with_bad_token_is_rejected() {
    let err = client().await.fetch_profile("expired").await.unwrap_err();
    assert!(matches!(err, OAuthError::Rejected { status: 401, .. }));
}
