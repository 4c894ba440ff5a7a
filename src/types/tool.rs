//! Tool definition and tool result types.

use serde::{Deserialize, Serialize};

/// Tool declaration in chat-completions function format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Success(String),
    Error(String),
    Empty,
}

/// Outcome of a tool invocation, always reported back to the model as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub output: ToolOutput,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            output: ToolOutput::Success(content.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: ToolOutput::Error(message.into()),
        }
    }

    pub fn empty() -> Self {
        Self {
            output: ToolOutput::Empty,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.output, ToolOutput::Error(_))
    }

    pub fn text(&self) -> String {
        match &self.output {
            ToolOutput::Success(s) | ToolOutput::Error(s) => s.clone(),
            ToolOutput::Empty => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_wire_format() {
        let def = ToolDefinition::new(
            "read_file",
            "Read a file",
            serde_json::json!({"type": "object"}),
        );
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "read_file");
        assert_eq!(json["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_result_text() {
        assert_eq!(ToolResult::success("ok").text(), "ok");
        assert!(ToolResult::error("bad").is_error());
        assert_eq!(ToolResult::empty().text(), "");
    }
}
