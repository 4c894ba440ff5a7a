//! write_file - creates or overwrites files.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::SchemaTool;
use super::context::ExecutionContext;
use crate::agent::FileOperation;
use crate::types::ToolResult;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileInput {
    /// File path (relative or absolute)
    pub path: String,
    /// Content to write to the file
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteFileTool;

#[async_trait]
impl SchemaTool for WriteFileTool {
    type Input = WriteFileInput;

    const NAME: &'static str = "write_file";
    const DESCRIPTION: &'static str = "Create a new file or overwrite an existing file. \
        Creates parent directories if needed. \
        Use for creating new files or completely replacing content.";

    async fn handle(&self, input: WriteFileInput, context: &ExecutionContext) -> ToolResult {
        let path = match context.try_check_path(&input.path) {
            Ok(p) => p,
            Err(blocked) => return blocked,
        };

        let summary = format!("Content length: {} bytes", input.content.len());
        if !context
            .approver()
            .confirm_file(FileOperation::Write, &path, Some(&summary))
            .await
        {
            return ToolResult::error("Write denied by user");
        }

        if let Some(parent) = path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return ToolResult::error(format!("Error creating directory: {}", e));
        }

        match tokio::fs::write(&path, &input.content).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = input.content.len(), "File written");
                ToolResult::success(format!(
                    "Wrote {} bytes to {}",
                    input.content.len(),
                    input.path
                ))
            }
            Err(e) => ToolResult::error(format!("Error: {}", e)),
        }
    }
}
