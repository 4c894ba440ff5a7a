//! delete_file - removes a single file, only in dangerous mode.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::SchemaTool;
use super::context::ExecutionContext;
use crate::agent::FileOperation;
use crate::types::ToolResult;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteFileInput {
    /// Path to the file to delete
    pub path: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteFileTool;

#[async_trait]
impl SchemaTool for DeleteFileTool {
    type Input = DeleteFileInput;

    const NAME: &'static str = "delete_file";
    const DESCRIPTION: &'static str = "Delete a file (not directories). Requires confirmation. \
        Cannot delete system files. Use with caution.";

    async fn handle(&self, input: DeleteFileInput, context: &ExecutionContext) -> ToolResult {
        let path = match context.try_check_path(&input.path) {
            Ok(p) => p,
            Err(blocked) => return blocked,
        };

        if !context.permissions().dangerous_enabled() {
            return ToolResult::error(
                "Delete blocked: dangerous operations are disabled. Use /allow-dangerous to enable.",
            );
        }

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ToolResult::error(format!("Error: file not found: {}", input.path));
            }
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };
        if metadata.is_dir() {
            return ToolResult::error(
                "Error: cannot delete directories with this tool, use execute_command with 'rm -r' instead",
            );
        }

        if !context
            .approver()
            .confirm_file(FileOperation::Delete, &path, None)
            .await
        {
            return ToolResult::error("Delete denied by user");
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "File deleted");
                ToolResult::success(format!("Deleted {}", input.path))
            }
            Err(e) => ToolResult::error(format!("Error: {}", e)),
        }
    }
}
