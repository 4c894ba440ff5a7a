//! Brave Search backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{
    KeyRotator, RotationCallback, SearchBackend, SearchResponse, SearchResult,
    search_with_rotation,
};
use crate::{Error, Result};

pub const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const RESULT_COUNT: &str = "5";

#[derive(Debug, Default, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: BraveWebResults,
}

#[derive(Debug, Default, Deserialize)]
struct BraveWebResults {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

impl From<BraveResponse> for SearchResponse {
    fn from(response: BraveResponse) -> Self {
        SearchResponse {
            results: response
                .web
                .results
                .into_iter()
                .map(|r| SearchResult {
                    title: r.title,
                    url: r.url,
                    content: r.description,
                })
                .collect(),
        }
    }
}

pub struct BraveSearch {
    http: reqwest::Client,
    url: String,
    keys: KeyRotator,
    on_rotate: Option<RotationCallback>,
}

impl BraveSearch {
    pub fn new(keys: Vec<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            http,
            url: BRAVE_API_URL.to_string(),
            keys: KeyRotator::new(keys),
            on_rotate: None,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_rotation_callback(mut self, callback: RotationCallback) -> Self {
        self.on_rotate = Some(callback);
        self
    }

    pub fn keys(&self) -> &KeyRotator {
        &self.keys
    }

    async fn search_once(&self, query: &str, key: String) -> Result<SearchResponse> {
        let url = url::Url::parse_with_params(&self.url, &[("q", query), ("count", RESULT_COUNT)])
            .map_err(|e| Error::Config(format!("invalid Brave API URL: {}", e)))?;

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header("X-Subscription-Token", key)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(Error::api(
                status,
                format!("Brave API error: status code {}", status),
            ));
        }

        let body: BraveResponse = response.json().await?;
        Ok(body.into())
    }
}

#[async_trait]
impl SearchBackend for BraveSearch {
    fn name(&self) -> &str {
        "Brave"
    }

    async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<SearchResponse> {
        search_with_rotation(
            &self.keys,
            self.name(),
            cancel,
            self.on_rotate.as_ref(),
            |key| self.search_once(query, key),
        )
        .await
    }
}

impl std::fmt::Debug for BraveSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveSearch")
            .field("url", &self.url)
            .field("keys", &self.keys.len())
            .finish()
    }
}
