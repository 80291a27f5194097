use anyhow::anyhow;
use std::{env, net::SocketAddr, time::Duration};

use crate::utils::cookies::{CookieOptions, SameSite};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
pub const PICKER_API_BASE: &str = "https://photospicker.googleapis.com/v1";
pub const DEFAULT_SCOPES: &str =
    "openid profile email https://www.googleapis.com/auth/photospicker.mediaitems.readonly";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub frontend_url: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub oauth_callback_url: String,
    pub oauth_scopes: Vec<String>,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
    pub picker_api_base: String,
    pub picker_session_ttl_secs: u64,
    pub media_page_size: u32,
    pub media_allowed_hosts: Vec<String>,
    pub login_session_ttl_hours: u64,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub http_timeout_secs: u64,
    pub redis_url: Option<String>,
    pub redis_pool_size: u32,
    pub redis_connect_timeout: u64,
    pub poll_interval_secs: u64,
    pub poll_max_wait_secs: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr_raw = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let bind_addr: SocketAddr = bind_addr_raw
            .parse()
            .map_err(|_| anyhow!("Invalid BIND_ADDR value: {}", bind_addr_raw))?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let google_client_id = env::var("GOOGLE_CLIENT_ID").unwrap_or_default();
        let google_client_secret = env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default();
        let oauth_callback_url = env::var("OAUTH_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:3001/auth/google/callback".to_string());
        let oauth_scopes = split_list(
            &env::var("OAUTH_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string()),
            ' ',
        );

        let same_site_raw = env::var("COOKIE_SAME_SITE").unwrap_or_else(|_| "lax".to_string());
        let cookie_same_site = SameSite::parse(&same_site_raw)
            .ok_or_else(|| anyhow!("Invalid COOKIE_SAME_SITE value: {}", same_site_raw))?;

        Ok(Config {
            bind_addr,
            frontend_url,
            google_client_id,
            google_client_secret,
            oauth_callback_url,
            oauth_scopes,
            google_auth_url: env::var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|_| GOOGLE_AUTH_URL.to_string()),
            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| GOOGLE_TOKEN_URL.to_string()),
            google_userinfo_url: env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| GOOGLE_USERINFO_URL.to_string()),
            picker_api_base: env::var("PICKER_API_BASE")
                .unwrap_or_else(|_| PICKER_API_BASE.to_string()),
            picker_session_ttl_secs: parse_env("PICKER_SESSION_TTL_SECS", 29 * 60),
            media_page_size: parse_env("MEDIA_PAGE_SIZE", 25),
            media_allowed_hosts: split_list(
                &env::var("MEDIA_ALLOWED_HOSTS")
                    .unwrap_or_else(|_| "googleusercontent.com".to_string()),
                ',',
            ),
            login_session_ttl_hours: parse_env("LOGIN_SESSION_TTL_HOURS", 24),
            cookie_secure: parse_env("COOKIE_SECURE", false),
            cookie_same_site,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 30),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            redis_pool_size: parse_env("REDIS_POOL_SIZE", 10),
            redis_connect_timeout: parse_env("REDIS_CONNECT_TIMEOUT", 5),
            poll_interval_secs: parse_env("POLL_INTERVAL_SECS", 5),
            poll_max_wait_secs: parse_env("POLL_MAX_WAIT_SECS", 300),
        })
    }

    pub fn picker_session_ttl(&self) -> Duration {
        Duration::from_secs(self.picker_session_ttl_secs.max(1))
    }

    pub fn login_session_ttl(&self) -> Duration {
        Duration::from_secs(self.login_session_ttl_hours * 60 * 60)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
        }
    }

    pub fn oauth_configured(&self) -> bool {
        !self.google_client_id.is_empty() && !self.google_client_secret.is_empty()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
