use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

const MAX_BUFFERED_BODY_BYTES: usize = 64 * 1024;
const MAX_LOGGED_BODY_BYTES: usize = 2048;

/// Logs every 4xx/5xx response together with a preview of its JSON error body.
///
/// Only JSON bodies are buffered; anything else (e.g. a proxied media error)
/// is passed through untouched and logged without a body.
pub async fn log_error_responses(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let latency_ms = started.elapsed().as_millis() as u64;

    if !is_json(&response) {
        log_error_status(status.as_u16(), method.as_str(), &path, latency_ms, "");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => {
            log_error_status(
                status.as_u16(),
                method.as_str(),
                &path,
                latency_ms,
                &preview(&bytes),
            );
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            tracing::warn!(
                status = status.as_u16(),
                method = %method,
                path,
                error = ?err,
                "Failed to read error response body"
            );
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::empty())
        }
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn preview(bytes: &[u8]) -> String {
    if bytes.len() > MAX_LOGGED_BODY_BYTES {
        format!(
            "{}... (truncated, {} bytes total)",
            String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY_BYTES]),
            bytes.len()
        )
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn log_error_status(status: u16, method: &str, path: &str, latency_ms: u64, body: &str) {
    if status >= 500 {
        tracing::error!(status, method, path, latency_ms, body, "Request failed");
    } else {
        tracing::warn!(status, method, path, latency_ms, body, "Request rejected");
    }
}
