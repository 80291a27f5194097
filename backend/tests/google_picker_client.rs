use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::TryStreamExt;
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use photopicker_backend::picker::{GooglePickerClient, MediaItemsQuery, PickerApi, PickerError};

mod support;

type SeenQueries = Arc<Mutex<Vec<HashMap<String, String>>>>;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// A fake of the Photos Picker API that only accepts `token-1`.
fn fake_picker(seen: SeenQueries) -> Router {
    Router::new()
        .route(
            "/v1/sessions",
            post(|headers: HeaderMap| async move {
                if bearer(&headers) != Some("token-1") {
                    return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
                }
                Json(json!({
                    "id": "s1",
                    "pickerUri": "https://photos.google.com/picker/s1",
                    "mediaItemsSet": false,
                    "expireTime": "2030-01-01T00:00:00Z",
                    "pollingConfig": { "pollInterval": "5s", "timeoutIn": "1800s" }
                }))
                .into_response()
            }),
        )
        .route(
            "/v1/sessions/{id}",
            get(|headers: HeaderMap, Path(id): Path<String>| async move {
                if bearer(&headers) != Some("token-1") {
                    return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
                }
                match id.as_str() {
                    "s1" => Json(json!({ "id": "s1", "mediaItemsSet": true })).into_response(),
                    "garbled" => "not json".into_response(),
                    _ => (StatusCode::NOT_FOUND, "session not found").into_response(),
                }
            }),
        )
        .route(
            "/v1/mediaItems",
            get(move |Query(params): Query<HashMap<String, String>>| async move {
                let next_page_token = match params.get("pageToken") {
                    None => Some("page-2/+tok=="),
                    Some(_) => None,
                };
                seen.lock().unwrap().push(params);
                Json(json!({
                    "nextPageToken": next_page_token,
                    "mediaItems": [{
                        "id": "m1",
                        "type": "PHOTO",
                        "mediaFile": {
                            "baseUrl": "https://lh3.googleusercontent.com/m1",
                            "mimeType": "image/jpeg",
                            "filename": "m1.jpg"
                        }
                    }]
                }))
            }),
        )
        .route(
            "/media/{name}",
            get(|headers: HeaderMap, Path(name): Path<String>| async move {
                if bearer(&headers) != Some("token-1") || name != "m1=dv" {
                    return StatusCode::FORBIDDEN.into_response();
                }
                let response: Response = (
                    [
                        (header::CONTENT_TYPE, "video/mp4"),
                        (header::CONTENT_DISPOSITION, "attachment; filename=\"clip.mp4\""),
                    ],
                    "video-bytes",
                )
                    .into_response();
                response
            }),
        )
}

async fn setup() -> (GooglePickerClient, String, SeenQueries) {
    let seen = SeenQueries::default();
    let (addr, _handle) = support::spawn_app(fake_picker(seen.clone())).await;
    let base = format!("http://{}", addr);
    let client = GooglePickerClient::new(format!("{}/v1/", base), Duration::from_secs(5))
        .expect("build client");
    (client, base, seen)
}

#[tokio::test]
async fn create_session_posts_with_bearer_token() {
    let (client, _, _) = setup().await;

    let session = client.create_session("token-1").await.unwrap();

    assert_eq!(session.id, "s1");
    assert!(!session.media_items_set);
    assert!(session.expire_time.is_some());
    assert_eq!(
        session.polling_config.and_then(|c| c.poll_interval).as_deref(),
        Some("5s")
    );
}

#[tokio::test]
async fn provider_errors_carry_status_and_body() {
    let (client, _, _) = setup().await;

    let err = client.get_session("wrong-token", "s1").await.unwrap_err();
    assert_eq!(
        err,
        PickerError::Provider {
            status_code: 401,
            body: "invalid credentials".into()
        }
    );

    let err = client.get_session("token-1", "gone").await.unwrap_err();
    assert!(matches!(err, PickerError::Provider { status_code: 404, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn get_session_reads_completion_flag() {
    let (client, _, _) = setup().await;
    let session = client.get_session("token-1", "s1").await.unwrap();
    assert!(session.media_items_set);
}

#[tokio::test]
async fn malformed_json_is_a_transport_error() {
    let (client, _, _) = setup().await;
    let err = client.get_session("token-1", "garbled").await.unwrap_err();
    assert!(matches!(err, PickerError::Transport(_)));
}

#[tokio::test]
async fn list_media_items_forwards_page_token_untouched() {
    let (client, _, seen) = setup().await;

    let page = client
        .list_media_items(
            "token-1",
            MediaItemsQuery {
                session_id: "s1".into(),
                page_size: 25,
                page_token: Some("abc/+def==".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(page.media_items.len(), 1);
    assert_eq!(page.media_items[0].base_url(), "https://lh3.googleusercontent.com/m1");
    assert!(page.next_page_token.is_none());

    let params = seen.lock().unwrap().last().cloned().expect("request seen");
    assert_eq!(params["sessionId"], "s1");
    assert_eq!(params["pageSize"], "25");
    assert_eq!(params["pageToken"], "abc/+def==");
}

#[tokio::test]
async fn first_page_request_omits_page_token() {
    let (client, _, seen) = setup().await;

    client
        .list_media_items(
            "token-1",
            MediaItemsQuery {
                session_id: "s1".into(),
                page_size: 50,
                page_token: None,
            },
        )
        .await
        .unwrap();

    let params = seen.lock().unwrap().last().cloned().expect("request seen");
    assert!(!params.contains_key("pageToken"));
    assert_eq!(params["pageSize"], "50");
}

#[tokio::test]
async fn next_page_token_is_fed_back_verbatim() {
    let (client, _, seen) = setup().await;
    let query = |page_token: Option<String>| MediaItemsQuery {
        session_id: "s1".into(),
        page_size: 25,
        page_token,
    };

    let first = client.list_media_items("token-1", query(None)).await.unwrap();
    let token = first.next_page_token.expect("first page has a next token");
    let second = client
        .list_media_items("token-1", query(Some(token.clone())))
        .await
        .unwrap();

    assert!(second.next_page_token.is_none());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(!seen[0].contains_key("pageToken"));
    assert_eq!(seen[1]["pageToken"], token);
}

#[tokio::test]
async fn fetch_media_streams_body_and_headers() {
    let (client, base, _) = setup().await;

    let download = client
        .fetch_media("token-1", &format!("{}/media/m1=dv", base))
        .await
        .unwrap();

    assert_eq!(download.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(
        download.content_disposition.as_deref(),
        Some("attachment; filename=\"clip.mp4\"")
    );
    let chunks: Vec<_> = download.body.try_collect().await.unwrap();
    let bytes: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    assert_eq!(bytes, b"video-bytes");
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    let client = GooglePickerClient::new("http://127.0.0.1:9/v1", Duration::from_secs(1))
        .expect("build client");
    let err = client.create_session("token-1").await.unwrap_err();
    assert!(matches!(err, PickerError::Transport(_)));
}
