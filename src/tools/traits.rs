//! Tool trait definitions.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::context::ExecutionContext;
use crate::types::{ToolDefinition, ToolResult};

/// A function the model can call.
///
/// Failures are reported through the returned [`ToolResult`], never as a
/// Rust error, so the conversation can carry on.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> serde_json::Value;
    async fn execute(&self, input: serde_json::Value, context: &ExecutionContext) -> ToolResult;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Implementors get a typed `Input`; the blanket [`Tool`] impl decodes the
/// model's JSON arguments into it and derives the declared parameters from
/// its schemars schema.
#[async_trait]
pub trait SchemaTool: Send + Sync {
    type Input: JsonSchema + DeserializeOwned + Send;
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    async fn handle(&self, input: Self::Input, context: &ExecutionContext) -> ToolResult;

    /// Parameters object in the shape chat-completions expects: no
    /// `$schema`/`title`, and `properties`/`required` always present.
    fn input_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(Self::Input);
        let mut params = match serde_json::to_value(schema) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        params.remove("$schema");
        params.remove("title");
        params
            .entry("type")
            .or_insert_with(|| serde_json::Value::from("object"));
        params
            .entry("properties")
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        params
            .entry("required")
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));

        serde_json::Value::Object(params)
    }
}

#[async_trait]
impl<T: SchemaTool + 'static> Tool for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn input_schema(&self) -> serde_json::Value {
        T::input_schema()
    }

    async fn execute(&self, input: serde_json::Value, context: &ExecutionContext) -> ToolResult {
        match serde_json::from_value::<T::Input>(input) {
            Ok(typed) => SchemaTool::handle(self, typed, context).await,
            Err(e) => ToolResult::error(format!("Error parsing arguments: {}", e)),
        }
    }
}
