//! First-run setup and token checks.
//!
//! `wpsync init` asks for the site URL and credentials, exchanges them for
//! a bearer token through the JWT Auth plugin endpoint, and writes the
//! config file. `wpsync check` confirms that a saved token still works.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::api::{Dialect, RemoteApi};
use crate::config::{load_config, save_config, Config};
use crate::prompt;

pub const TOKEN_PATH: &str = "jwt-auth/v1/token";

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

/// Exchange a username and password for a JWT.
pub async fn request_token(
    client: &reqwest::Client,
    site_url: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let url = format!("{}/wp-json/{}", site_url.trim_end_matches('/'), TOKEN_PATH);
    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "username": username,
            "password": password,
        }))
        .send()
        .await
        .context("API error during authentication")?;

    let status = response.status().as_u16();
    let body = response.text().await?;

    match status {
        403 => bail!("Error authenticating, try again."),
        404 => bail!("Auth API not found. Is the JWT Auth plugin installed and activated?"),
        s if s >= 300 => bail!("Authentication failed [{}]: {}", s, body),
        _ => {}
    }

    let parsed: TokenResponse = serde_json::from_str(&body)
        .with_context(|| format!("Error parsing token response: {}", body))?;
    if parsed.token.is_empty() {
        bail!("No authentication token in response [{}]: {}", status, body);
    }
    Ok(parsed.token)
}

/// Interactive setup. Keeps the rest of an existing config intact and
/// replaces the site URL and token.
pub async fn run_setup(config_path: &Path) -> Result<Config> {
    let site_url = prompt::ask_url("Enter URL for site: ")?;

    let mut config = match load_config(config_path) {
        Ok(mut existing) => {
            existing.site.url = site_url.clone();
            existing
        }
        Err(_) => Config::for_site(&site_url),
    };

    config.site.token = match config.api.dialect {
        Dialect::WpV2 => {
            let username = prompt::ask("Enter username: ")?;
            let password = prompt::ask("Enter password: ")?;
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.api.timeout_secs))
                .build()?;
            request_token(&client, &site_url, &username, &password).await?
        }
        Dialect::WpCom => {
            let token = prompt::ask("Enter OAuth token: ")?;
            if token.is_empty() {
                bail!("No authentication token entered");
            }
            token
        }
    };

    save_config(&config, config_path)?;
    tracing::info!("{} written", config_path.display());
    Ok(config)
}

/// Confirm the config is usable and the token is accepted.
pub async fn check_setup(config: &Config, api: &dyn RemoteApi) -> Result<()> {
    if config.site.url.is_empty() {
        bail!("Site URL not set");
    }
    if !config.has_token() {
        bail!("Authentication token not set. Run `wpsync init`.");
    }
    api.validate_token()
        .await
        .context("Token validation failed. Try running `wpsync init`")?;
    Ok(())
}
