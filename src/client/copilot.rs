//! GitHub Copilot chat-completions provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;

use super::error::check_response;
use super::streaming::process_stream;
use super::{ChatProvider, Resilience, RetryConfig, TextSink};
use crate::auth::{TokenManager, copilot as headers};
use crate::types::{ChatRequest, ChatResponse};
use crate::{Error, Result};

pub struct CopilotProvider {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenManager,
    resilience: Resilience,
}

impl CopilotProvider {
    pub fn new(tokens: TokenManager, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(Self::with_http(tokens, base_url, http))
    }

    pub fn with_http(tokens: TokenManager, base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
            resilience: Resilience::new(RetryConfig::api()),
        }
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.resilience = Resilience::new(config);
        self
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let token = self.tokens.get().await?;
        let initiator = if request.is_agent_initiated() {
            "agent"
        } else {
            "user"
        };

        let mut req = headers::editor_headers(self.http.post(self.endpoint()))
            .bearer_auth(token.expose_secret())
            .header("Copilot-Integration-Id", "vscode-chat")
            .header("Openai-Intent", "conversation-panel")
            .header("X-Initiator", initiator)
            .json(request);
        if request.stream {
            req = req.header(ACCEPT, "text/event-stream");
        }

        let response = req.send().await?;
        check_response(response, map_error).await
    }
}

fn map_error(status: u16, message: String) -> Error {
    let message = match status {
        401 => "Copilot token expired or invalid, please re-authenticate".to_string(),
        403 => "Access denied, an active GitHub Copilot subscription is required".to_string(),
        429 => "Rate limited, please wait a moment and try again".to_string(),
        _ => format!("Copilot API error: {}", message),
    };
    Error::api(status, message)
}

#[async_trait]
impl ChatProvider for CopilotProvider {
    fn name(&self) -> &str {
        "copilot"
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

    async fn close(&self) {
        self.tokens.stop().await;
    }
}

impl std::fmt::Debug for CopilotProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopilotProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::{IssuedToken, TokenSource};
    use crate::types::Message;

    struct StaticSource;

    #[async_trait]
    impl TokenSource for StaticSource {
        async fn fetch(&self) -> Result<IssuedToken> {
            Ok(IssuedToken::new(
                "copilot-token",
                Utc::now() + chrono::Duration::hours(1),
            ))
        }
    }

    fn provider(server: &MockServer) -> CopilotProvider {
        let tokens = TokenManager::new(Arc::new(StaticSource));
        CopilotProvider::new(tokens, server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_retry(RetryConfig::no_retry())
    }

    #[tokio::test]
    async fn test_query_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer copilot-token"))
            .and(header("copilot-integration-id", "vscode-chat"))
            .and(header("x-initiator", "user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "r1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new("gpt-5-mini", vec![Message::user("hello")]);
        let response = provider(&server)
            .query(request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.content(), "hi");
    }

    #[tokio::test]
    async fn test_agent_initiator() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-initiator", "agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "done"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new(
            "gpt-5-mini",
            vec![
                Message::user("list"),
                Message::tool_result("call_1", "a.txt"),
            ],
        );
        provider(&server)
            .query(request, &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = provider(&server)
            .query(
                ChatRequest::new("m", vec![Message::user("x")]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert!(err.to_string().contains("active GitHub Copilot subscription"));
        assert!(err.is_authorization_error());
    }

    #[test]
    fn test_map_error_other_status() {
        let err = map_error(400, "bad tools".to_string());
        assert_eq!(err.to_string(), "Copilot API error: bad tools");
        assert_eq!(
            map_error(401, String::new()).to_string(),
            "Copilot token expired or invalid, please re-authenticate"
        );
    }
}
