//! GitHub Copilot token exchange.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{IssuedToken, TokenSource};
use crate::{Error, Result};

pub const COPILOT_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";
pub const COPILOT_VERSION: &str = "0.26.7";
pub const EDITOR_VERSION: &str = "vscode/1.96.0";
pub const EDITOR_PLUGIN_VERSION: &str = "copilot-chat/0.26.7";
pub const USER_AGENT: &str = "GitHubCopilotChat/0.26.7";
pub const API_VERSION: &str = "2025-04-01";

/// Editor identification headers shared by the token exchange and chat calls.
pub fn editor_headers(req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.header("Editor-Version", EDITOR_VERSION)
        .header("Editor-Plugin-Version", EDITOR_PLUGIN_VERSION)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header("X-Github-Api-Version", API_VERSION)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    expires_at: i64,
    #[serde(default)]
    refresh_in: Option<u64>,
}

/// Exchanges a long-lived GitHub token for a short-lived Copilot API token.
pub struct CopilotTokenSource {
    http: reqwest::Client,
    github_token: SecretString,
    url: String,
}

impl CopilotTokenSource {
    pub fn new(github_token: SecretString, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            http,
            github_token,
            url: COPILOT_TOKEN_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl TokenSource for CopilotTokenSource {
    fn name(&self) -> &str {
        "copilot"
    }

    async fn fetch(&self) -> Result<IssuedToken> {
        let response = editor_headers(self.http.get(&self.url))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", self.github_token.expose_secret()),
            )
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {}
            401 => {
                return Err(Error::auth(
                    "GitHub token is invalid or expired, please re-authenticate",
                ));
            }
            403 => {
                return Err(Error::auth(
                    "GitHub Copilot access denied, an active Copilot subscription is required",
                ));
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::api(
                    status,
                    format!("failed to get Copilot token: status {}, body: {}", status, body),
                ));
            }
        }

        let body: TokenResponse = response.json().await?;
        let expires_at = DateTime::<Utc>::from_timestamp(body.expires_at, 0).ok_or_else(|| {
            Error::auth(format!("invalid token expiry: {}", body.expires_at))
        })?;

        let mut issued = IssuedToken::new(body.token, expires_at);
        if let Some(secs) = body.refresh_in {
            issued = issued.with_refresh_in(Duration::from_secs(secs));
        }
        Ok(issued)
    }
}

impl std::fmt::Debug for CopilotTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopilotTokenSource")
            .field("url", &self.url)
            .finish()
    }
}
