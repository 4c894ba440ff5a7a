//! Web-search backends with API-key rotation.
//!
//! Providers that accept several API keys rotate to the next key when one
//! is rejected or rate limited (see [`search_with_rotation`]).

mod brave;
mod rotation;

pub use brave::{BRAVE_API_URL, BraveSearch};
pub use rotation::{KeyRotator, ROTATABLE_STATUS_CODES, RotationCallback, search_with_rotation};

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::config::{AppConfig, SearchProvider};

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

impl SearchResponse {
    /// Numbered `[n] title / URL / content` blocks suitable as model context.
    pub fn format_as_context(&self) -> String {
        let mut out = String::new();
        for (i, result) in self.results.iter().enumerate() {
            let _ = write!(
                out,
                "[{}] {}\nURL: {}\n{}\n\n",
                i + 1,
                result.title,
                result.url,
                result.content
            );
        }
        out
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<SearchResponse>;
}

/// Backend for the configured search provider.
///
/// `None` when the provider has no keys or no built-in backend; search is
/// then simply unavailable.
pub fn create_search_backend(config: &AppConfig) -> Result<Option<Arc<dyn SearchBackend>>> {
    let keys = config.search_keys(config.search_provider);
    if keys.is_empty() {
        return Ok(None);
    }
    match config.search_provider {
        SearchProvider::Brave => Ok(Some(Arc::new(BraveSearch::new(
            keys.to_vec(),
            DEFAULT_SEARCH_TIMEOUT,
        )?))),
        other => {
            tracing::warn!(
                provider = %other,
                "Search provider has no built-in backend, web search disabled"
            );
            Ok(None)
        }
    }
}
