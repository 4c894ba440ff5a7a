//! Chat-completion clients for GitHub Copilot and Azure OpenAI.

mod accumulator;
mod azure;
mod copilot;
pub mod error;
pub mod resilience;
mod streaming;

pub use accumulator::{ChunkChoice, Delta, FunctionDelta, StreamAccumulator, StreamChunk, ToolCallDelta};
pub use azure::AzureProvider;
pub use copilot::CopilotProvider;
pub use resilience::{ExponentialBackoff, Resilience, RetryConfig};
pub use streaming::{SseEvent, SseStream, process_stream};

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::auth::{CopilotTokenSource, TokenManager};
use crate::config::{AppConfig, ProviderKind};
use crate::types::{ChatRequest, ChatResponse};
use crate::{Error, Result};

/// Receiver for streamed text deltas.
pub type TextSink<'s> = dyn for<'a> FnMut(&'a str) + Send + 's;

/// A chat-completions backend.
///
/// Both calls honour `cancel`: a cancelled request resolves to
/// [`Error::Cancelled`] without waiting for the server.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn query(&self, request: ChatRequest, cancel: &CancellationToken) -> Result<ChatResponse>;

    /// Streams the answer, handing every text delta to `sink` as it arrives,
    /// and returns the assembled response.
    async fn query_streaming(
        &self,
        request: ChatRequest,
        sink: &mut TextSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse>;

    /// Release background resources such as credential refresh tasks.
    async fn close(&self) {}
}

/// Build the provider selected by `config`.
///
/// Copilot needs a stored GitHub token and starts its credential refresh
/// task here, so this must run inside a Tokio runtime.
pub async fn create_provider(config: &AppConfig) -> Result<Arc<dyn ChatProvider>> {
    match config.resolved_provider() {
        ProviderKind::Azure => {
            let endpoint = config.azure_endpoint.as_deref().ok_or_else(|| {
                Error::Config("AZURE_OPENAI_ENDPOINT is required for the azure provider".into())
            })?;
            let api_key = config.azure_api_key.clone().ok_or_else(|| {
                Error::Config("AZURE_OPENAI_API_KEY is required for the azure provider".into())
            })?;
            let provider = AzureProvider::new(endpoint, api_key, config.api_timeout)?;
            tracing::info!(provider = "azure", model = %config.model, "Chat provider ready");
            Ok(Arc::new(provider))
        }
        ProviderKind::Copilot | ProviderKind::Auto => {
            let github_token = crate::auth::load_github_token().await?;
            let source = CopilotTokenSource::new(github_token, config.oauth_timeout)?;
            let tokens = TokenManager::new(Arc::new(source));
            tokens.start(&CancellationToken::new());
            let provider =
                CopilotProvider::new(tokens, config.copilot_base_url(), config.api_timeout)?;
            tracing::info!(provider = "copilot", model = %config.model, "Chat provider ready");
            Ok(Arc::new(provider))
        }
    }
}

impl std::fmt::Debug for dyn ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProvider")
            .field("name", &self.name())
            .finish()
    }
}
