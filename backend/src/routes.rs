use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{docs, handlers, middleware, state::AppState};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/google", get(handlers::auth::google_login))
        .route("/auth/google/callback", get(handlers::auth::google_callback))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/openapi.json", get(docs::openapi_json));

    let picker_routes = Router::new()
        .route(
            "/api/picker/session",
            get(handlers::picker::ensure_session).post(handlers::picker::create_session),
        )
        .route(
            "/api/picker/session/status",
            get(handlers::picker::session_status),
        )
        .route(
            "/api/picker/session/state",
            get(handlers::picker::session_state),
        )
        .route("/api/picker/media", get(handlers::media::list_media))
        .route(
            "/api/picker/media/content",
            post(handlers::media::media_content),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .merge(public_routes)
        .merge(picker_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum_middleware::from_fn(middleware::log_error_responses)),
        )
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(24 * 60 * 60));
    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url, "FRONTEND_URL is not a valid origin, CORS disabled");
            cors
        }
    }
}
