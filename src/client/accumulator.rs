//! Assembly of streamed chat completion chunks into a full response.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Deserialize;

use super::TextSink;
use crate::types::{ChatResponse, Choice, FinishReason, Message, Role, ToolCall, Usage};

/// One `data:` payload of a streaming chat completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Fragment of a tool call; fragments sharing an `index` belong together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StreamAccumulator {
    id: String,
    content: String,
    tool_calls: BTreeMap<usize, ToolCall>,
    usage: Option<Usage>,
    chunks: usize,
    started_at: Option<Instant>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            started_at: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Fold one chunk in, forwarding its text deltas to `sink`.
    pub fn apply(&mut self, chunk: StreamChunk, sink: &mut TextSink<'_>) {
        self.chunks += 1;
        if self.id.is_empty() && !chunk.id.is_empty() {
            self.id = chunk.id;
        }
        if let Some(usage) = chunk.usage
            && usage.total_tokens > 0
        {
            self.usage = Some(usage);
        }

        for choice in chunk.choices {
            let Some(delta) = choice.delta else {
                continue;
            };
            if let Some(text) = delta.content
                && !text.is_empty()
            {
                sink(&text);
                self.content.push_str(&text);
            }
            for fragment in delta.tool_calls.into_iter().flatten() {
                self.merge_tool_call(fragment);
            }
        }
    }

    fn merge_tool_call(&mut self, fragment: ToolCallDelta) {
        let function = fragment.function.unwrap_or_default();
        match self.tool_calls.get_mut(&fragment.index) {
            Some(existing) => {
                if let Some(args) = function.arguments {
                    existing.function.arguments.push_str(&args);
                }
                if existing.id.is_empty()
                    && let Some(id) = fragment.id
                {
                    existing.id = id;
                }
                if existing.function.name.is_empty()
                    && let Some(name) = function.name
                {
                    existing.function.name = name;
                }
            }
            None => {
                let mut call = ToolCall::new(
                    fragment.id.unwrap_or_default(),
                    function.name.unwrap_or_default(),
                    function.arguments.unwrap_or_default(),
                )
                .with_index(fragment.index);
                if let Some(call_type) = fragment.call_type
                    && !call_type.is_empty()
                {
                    call.call_type = call_type;
                }
                self.tool_calls.insert(fragment.index, call);
            }
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    pub fn finish(self) -> ChatResponse {
        let tool_calls: Vec<ToolCall> = self.tool_calls.into_values().collect();
        let finish_reason = if tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolCalls
        };
        tracing::debug!(
            chunks = self.chunks,
            content_len = self.content.len(),
            tool_calls = tool_calls.len(),
            "Stream assembled"
        );

        let message = Message {
            role: Role::Assistant,
            content: (!self.content.is_empty() || tool_calls.is_empty()).then_some(self.content),
            tool_calls,
            tool_call_id: None,
        };

        ChatResponse {
            id: self.id,
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason: Some(finish_reason),
            }],
            usage: self.usage.unwrap_or_default(),
        }
    }
}
