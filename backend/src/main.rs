use photopicker_backend::{config::Config, routes, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

fn mask_url_credentials(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => mask_secret(raw),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photopicker_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        frontend_url = %config.frontend_url,
        google_client_id = %mask_secret(&config.google_client_id),
        google_client_secret = %mask_secret(&config.google_client_secret),
        oauth_callback_url = %config.oauth_callback_url,
        picker_api_base = %config.picker_api_base,
        picker_session_ttl_secs = config.picker_session_ttl_secs,
        media_allowed_hosts = ?config.media_allowed_hosts,
        redis_url = %config
            .redis_url
            .as_deref()
            .map(mask_url_credentials)
            .unwrap_or_else(|| "<unset>".into()),
        "Loaded configuration from environment/.env"
    );
    if !config.oauth_configured() {
        tracing::warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET missing; sign-in will fail");
    }

    let addr = config.bind_addr;
    let state = AppState::from_config(config).await?;
    let app = routes::router(state);

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
