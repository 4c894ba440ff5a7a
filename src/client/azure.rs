//! Azure OpenAI chat-completions provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use super::error::check_response;
use super::streaming::process_stream;
use super::{ChatProvider, Resilience, RetryConfig, TextSink};
use crate::types::{ChatRequest, ChatResponse};
use crate::{Error, Result};

pub struct AzureProvider {
    http: reqwest::Client,
    url: String,
    api_key: SecretString,
    resilience: Resilience,
}

impl AzureProvider {
    pub fn new(endpoint: &str, api_key: SecretString, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(Error::Config("Azure OpenAI endpoint is required".into()));
        }
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config("Azure OpenAI API key is required".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            http,
            url: format!("{}/openai/v1/chat/completions", endpoint),
            api_key,
            resilience: Resilience::new(RetryConfig::api()),
        })
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.resilience = Resilience::new(config);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let mut req = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(request);
        if request.stream {
            req = req.header(ACCEPT, "text/event-stream");
        }

        let response = req.send().await?;
        check_response(response, |status, message| {
            Error::api(status, format!("Azure API error: {}", message))
        })
        .await
    }
}

#[async_trait]
impl ChatProvider for AzureProvider {
    fn name(&self) -> &str {
        "azure"
    }

    async fn query(&self, request: ChatRequest, cancel: &CancellationToken) -> Result<ChatResponse> {
        let request = request.streaming(false);
        self.resilience
            .execute(cancel, || async {
                let response = self.send(&request).await?;
                Ok(response.json::<ChatResponse>().await?)
            })
            .await
    }

    async fn query_streaming(
        &self,
        request: ChatRequest,
        sink: &mut TextSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse> {
        let request = request.streaming(true);
        let response = self
            .resilience
            .execute(cancel, || self.send(&request))
            .await?;
        process_stream(response.bytes_stream(), sink, cancel).await
    }
}

impl std::fmt::Debug for AzureProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureProvider")
            .field("url", &self.url)
            .finish()
    }
}
