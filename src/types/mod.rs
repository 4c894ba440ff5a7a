//! Chat-completions wire types shared by the client, tools and agent loop.

mod message;
mod response;
mod tool;

pub use message::{FunctionCall, Message, Role, ToolCall};
pub use response::{ChatRequest, ChatResponse, Choice, FinishReason, Usage};
pub use tool::{ToolDefinition, ToolOutput, ToolResult};
