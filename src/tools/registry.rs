//! Tool registry.

use std::sync::Arc;

use super::context::ExecutionContext;
use super::traits::Tool;
use crate::types::{ToolDefinition, ToolResult};

/// Ordered set of tools offered to the model.
///
/// Definitions are reported in registration order so requests are stable
/// from one round to the next.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed catalog: execute_command, read_file, write_file, edit_file,
    /// search_files, list_directory, delete_file and update_plan.
    pub fn default_tools() -> Self {
        Self::with_plan(Arc::new(super::UpdatePlanTool::new()))
    }

    /// Default catalog sharing `plan` so the caller can observe plan updates.
    pub fn with_plan(plan: Arc<super::UpdatePlanTool>) -> Self {
        let mut registry = Self::new();
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(super::ExecuteCommandTool),
            Arc::new(super::ReadFileTool),
            Arc::new(super::WriteFileTool),
            Arc::new(super::EditFileTool),
            Arc::new(super::SearchFilesTool),
            Arc::new(super::ListDirectoryTool),
            Arc::new(super::DeleteFileTool),
            plan,
        ];
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool, replacing any tool with the same name in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub async fn execute(
        &self,
        name: &str,
        input: serde_json::Value,
        context: &ExecutionContext,
    ) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.execute(input, context).await,
            None => ToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::helpers::TestContext;

    #[test]
    fn test_default_catalog() {
        let registry = ToolRegistry::default_tools();
        assert_eq!(
            registry.names(),
            vec![
                "execute_command",
                "read_file",
                "write_file",
                "edit_file",
                "search_files",
                "list_directory",
                "delete_file",
                "update_plan",
            ]
        );

        for definition in registry.definitions() {
            assert_eq!(definition.tool_type, "function");
            assert!(!definition.function.description.is_empty());
            assert_eq!(definition.function.parameters["type"], "object");
        }
    }

    #[test]
    fn test_required_parameters() {
        let registry = ToolRegistry::default_tools();
        let required = |name: &str| {
            let definition = registry.get(name).unwrap().definition();
            let mut fields: Vec<String> = definition.function.parameters["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect();
            fields.sort();
            fields
        };

        assert_eq!(required("execute_command"), vec!["command", "reasoning"]);
        assert_eq!(required("edit_file"), vec!["new_text", "old_text", "path"]);
        assert_eq!(required("search_files"), vec!["pattern"]);
        assert!(required("list_directory").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let ctx = TestContext::new();
        let result = ToolRegistry::default_tools()
            .execute("format_disk", serde_json::json!({}), &ctx.context)
            .await;
        assert_eq!(result.text(), "Unknown tool: format_disk");
    }
}
