//! The tool-execution loop.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::conversation::Conversation;
use super::executor::Agent;
use crate::client::TextSink;
use crate::types::{ChatRequest, ChatResponse, Message, ToolCall};
use crate::{Error, Result};

impl Agent {
    /// Run one user turn to completion and return the final answer.
    ///
    /// Text is forwarded to `sink` as it is produced. Tool calls are executed
    /// in the order the model issued them. When the turn fails or `cancel`
    /// fires, `conversation` is restored to its length before `input` was
    /// appended.
    #[instrument(skip_all, fields(provider = self.provider.name(), model = %self.config.model))]
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: &str,
        sink: &mut TextSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let checkpoint = conversation.len();
        conversation.push(Message::user(input));

        let started = Instant::now();
        match self.run_rounds(conversation, sink, cancel).await {
            Ok(answer) => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    messages = conversation.len(),
                    "Turn completed"
                );
                Ok(answer)
            }
            Err(e) => {
                conversation.truncate(checkpoint);
                if e.is_cancelled() {
                    info!("Turn cancelled, conversation rolled back");
                } else {
                    warn!(error = %e, "Turn failed, conversation rolled back");
                }
                Err(e)
            }
        }
    }

    async fn run_rounds(
        &self,
        conversation: &mut Conversation,
        sink: &mut TextSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let definitions = self.tools.definitions();
        let mut rounds = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let request = ChatRequest::new(&self.config.model, conversation.messages().to_vec())
                .with_tools(definitions.clone())
                .streaming(self.config.stream);
            let response = self.send(request, sink, cancel).await?;

            let Some(message) = response.first_message() else {
                return Err(Error::Api {
                    message: "Empty response from model".into(),
                    status: None,
                });
            };

            if !message.has_tool_calls() {
                let answer = message.text().to_string();
                conversation.push(Message::assistant(answer.clone()));
                return Ok(answer);
            }

            if let Some(limit) = self.config.max_tool_rounds
                && rounds >= limit
            {
                warn!(limit, "Tool call round limit reached");
                return Err(Error::ToolRoundLimit { limit });
            }
            rounds += 1;

            let calls = message.tool_calls.clone();
            debug!(round = rounds, calls = calls.len(), "Executing tool calls");
            conversation.push(Message::assistant_with_tools(message.text(), calls.clone()));

            for call in &calls {
                let output = self.dispatch(call, cancel).await?;
                conversation.push(Message::tool_result(&call.id, output));
            }
        }
    }

    async fn send(
        &self,
        request: ChatRequest,
        sink: &mut TextSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse> {
        if self.config.stream {
            return self.provider.query_streaming(request, sink, cancel).await;
        }

        let response = self.provider.query(request, cancel).await?;
        let content = response.content();
        if !content.is_empty() {
            sink(content);
        }
        Ok(response)
    }

    /// Execute one tool call and return the text reported back to the model.
    async fn dispatch(&self, call: &ToolCall, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let input = match call.parse_arguments() {
            Ok(input) => input,
            Err(e) => {
                warn!(tool = call.name(), error = %e, "Malformed tool arguments");
                return Ok(format!("Error parsing arguments: {}", e));
            }
        };

        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = self.tools.execute(call.name(), input, &self.context) => result,
        };

        debug!(
            tool = call.name(),
            duration_ms = started.elapsed().as_millis() as u64,
            is_error = result.is_error(),
            "Tool execution completed"
        );
        Ok(result.text())
    }
}
