//! Agent configuration types.

use crate::config::DEFAULT_MODEL;

/// Per-agent loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Model name sent with every request.
    pub model: String,
    /// Stream responses and forward text deltas as they arrive.
    pub stream: bool,
    /// Upper bound on tool-call rounds in one turn. `None` is unbounded.
    pub max_tool_rounds: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            stream: true,
            max_tool_rounds: None,
        }
    }
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = Some(rounds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.model, "gpt-5-mini");
        assert!(config.stream);
        assert_eq!(config.max_tool_rounds, None);

        let config = AgentConfig::new("gpt-4.1")
            .with_stream(false)
            .with_max_tool_rounds(4);
        assert_eq!(config.model, "gpt-4.1");
        assert!(!config.stream);
        assert_eq!(config.max_tool_rounds, Some(4));
    }
}
