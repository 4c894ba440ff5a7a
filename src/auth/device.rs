//! GitHub OAuth device flow.
//!
//! The user opens `verification_uri`, enters `user_code`, and the flow polls
//! GitHub until the authorization is granted, refused or expires.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::header::ACCEPT;
use secrecy::SecretString;
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

pub const GITHUB_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";
pub const GITHUB_BASE_URL: &str = "https://github.com";
pub const GITHUB_APP_SCOPES: &str = "read:user";

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Added to the server-requested interval between polls.
pub const DEFAULT_POLL_MARGIN: Duration = Duration::from_secs(1);
/// Added to the interval on every `slow_down` answer.
pub const DEFAULT_SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds until `device_code` stops being accepted.
    pub expires_in: u64,
    /// Minimum seconds between polls.
    #[serde(default)]
    pub interval: u64,
}

#[derive(Debug, Default, Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

pub struct DeviceFlow {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    poll_margin: Duration,
    slow_down_step: Duration,
}

impl DeviceFlow {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            http,
            base_url: GITHUB_BASE_URL.to_string(),
            client_id: GITHUB_CLIENT_ID.to_string(),
            poll_margin: DEFAULT_POLL_MARGIN,
            slow_down_step: DEFAULT_SLOW_DOWN_STEP,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_timing(mut self, margin: Duration, slow_down_step: Duration) -> Self {
        self.poll_margin = margin;
        self.slow_down_step = slow_down_step;
        self
    }

    /// Start a device authorization.
    pub async fn request_code(&self, cancel: &CancellationToken) -> Result<DeviceCode> {
        let request = self
            .http
            .post(format!("{}/login/device/code", self.base_url))
            .header(ACCEPT, "application/json")
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "scope": GITHUB_APP_SCOPES,
            }))
            .send();
        let response = cancellable(cancel, request).await??;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(
                status,
                format!("failed to get device code: status {}, body: {}", status, body),
            ));
        }
        Ok(response.json().await?)
    }

    /// Poll until the user authorizes `code`, returning the GitHub token.
    ///
    /// Transport failures and unreadable answers are retried at the poll
    /// interval. Refusal, expiry and unknown OAuth errors end the flow.
    pub async fn poll_token(
        &self,
        code: &DeviceCode,
        cancel: &CancellationToken,
    ) -> Result<SecretString> {
        let mut interval = Duration::from_secs(code.interval) + self.poll_margin;
        let expires_at = Instant::now() + Duration::from_secs(code.expires_in);
        let body = serde_json::json!({
            "client_id": self.client_id,
            "device_code": code.device_code,
            "grant_type": DEVICE_GRANT_TYPE,
        });

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if Instant::now() >= expires_at {
                return Err(Error::auth("device code expired, please try again"));
            }

            let request = self
                .http
                .post(format!("{}/login/oauth/access_token", self.base_url))
                .header(ACCEPT, "application/json")
                .json(&body)
                .send();

            let answer = match cancellable(cancel, request).await? {
                Ok(response) => response.json::<AccessTokenResponse>().await.ok(),
                Err(e) => {
                    tracing::debug!(error = %e, "Device token poll failed");
                    None
                }
            };

            if let Some(answer) = answer {
                if !answer.access_token.is_empty() {
                    tracing::info!("GitHub device authorization granted");
                    return Ok(SecretString::from(answer.access_token));
                }
                match answer.error.as_str() {
                    "" | "authorization_pending" => {}
                    "slow_down" => {
                        interval += self.slow_down_step;
                        tracing::debug!(
                            interval_ms = interval.as_millis() as u64,
                            "Device token polling slowed down"
                        );
                    }
                    "expired_token" => {
                        return Err(Error::auth("device code expired, please try again"));
                    }
                    "access_denied" => return Err(Error::auth("access denied by user")),
                    other => {
                        return Err(Error::auth(format!(
                            "OAuth error: {} - {}",
                            other, answer.error_description
                        )));
                    }
                }
            }

            cancellable(cancel, tokio::time::sleep(interval)).await?;
        }
    }

    /// Run the whole flow. `prompt` receives the code to show the user
    /// before polling starts.
    pub async fn authorize(
        &self,
        cancel: &CancellationToken,
        prompt: impl FnOnce(&DeviceCode),
    ) -> Result<SecretString> {
        let code = self.request_code(cancel).await?;
        prompt(&code);
        self.poll_token(&code, cancel).await
    }
}

impl std::fmt::Debug for DeviceFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceFlow")
            .field("base_url", &self.base_url)
            .field("poll_margin", &self.poll_margin)
            .finish()
    }
}

async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        output = future => Ok(output),
    }
}

/// Authorize through `flow` and store the token at the default location.
pub async fn login(
    flow: &DeviceFlow,
    cancel: &CancellationToken,
    prompt: impl FnOnce(&DeviceCode),
) -> Result<()> {
    let token = flow.authorize(cancel, prompt).await?;
    super::save_github_token(&token).await
}

/// Remove the stored token. Returns whether one was present.
pub async fn logout() -> Result<bool> {
    let was_logged_in = is_logged_in().await;
    super::delete_github_token().await?;
    Ok(was_logged_in)
}

/// Whether a non-empty GitHub token is stored at the default location.
pub async fn is_logged_in() -> bool {
    match super::github_token_path() {
        Some(path) => is_logged_in_at(&path).await,
        None => false,
    }
}

pub async fn is_logged_in_at(path: &Path) -> bool {
    super::load_github_token_at(path).await.is_ok()
}
