//! Drives a picker session against a running backend from the terminal.
//!
//! `PICKER_SID` is the `picker_sid` cookie of a signed-in browser session.

use anyhow::Context;
use photopicker_backend::{
    config::Config,
    polling::{BackendClient, PollConfig, PollingController},
};
use std::{env, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photopicker_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    dotenvy::dotenv().ok();

    let backend_url =
        env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
    let login_session = env::var("PICKER_SID").context("PICKER_SID must be set")?;
    let poll_config = PollConfig::from(&Config::load()?);

    let client = Arc::new(BackendClient::new(
        backend_url,
        &login_session,
        Duration::from_secs(30),
    )?);

    let session = client.ensure_session().await?;
    match session.picker_uri.as_deref() {
        Some(uri) if !session.media_items_set => {
            println!("Open this link and pick your photos:\n  {}", uri);
        }
        _ => println!("Session {} already has a selection", session.id),
    }

    let mut controller = PollingController::new(client.clone(), poll_config);
    let completed = controller.poll_until_complete().await?;
    println!("Selection complete for session {}", completed.id);

    let page = client.list_media(None, None).await?;
    for item in &page.media_items {
        println!(
            "{}  {:<28} {}",
            item.id,
            item.filename(),
            item.mime_type()
        );
    }
    if let Some(token) = page.next_page_token {
        println!("(more items, next page token: {})", token);
    }
    Ok(())
}

