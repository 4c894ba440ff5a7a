//! read_file - reads file contents with a size cap.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::io::AsyncReadExt;

use super::SchemaTool;
use super::context::ExecutionContext;
use crate::types::ToolResult;

/// Largest number of bytes returned to the model.
pub const MAX_READ_BYTES: u64 = 512 * 1024;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileInput {
    /// File path (relative or absolute)
    pub path: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadFileTool;

#[async_trait]
impl SchemaTool for ReadFileTool {
    type Input = ReadFileInput;

    const NAME: &'static str = "read_file";
    const DESCRIPTION: &'static str =
        "Read the contents of a file. Limited to 512KB. Use for viewing code, configs, or logs.";

    async fn handle(&self, input: ReadFileInput, context: &ExecutionContext) -> ToolResult {
        let path = context.resolve(&input.path);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ToolResult::error(format!("Error: file not found: {}", input.path));
            }
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };

        if metadata.is_dir() {
            return ToolResult::error(format!(
                "Error: {} is a directory, use list_directory instead",
                input.path
            ));
        }

        let file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };

        let mut data = Vec::new();
        if let Err(e) = file.take(MAX_READ_BYTES).read_to_end(&mut data).await {
            return ToolResult::error(format!("Error: {}", e));
        }

        let mut output = String::from_utf8_lossy(&data).into_owned();
        if metadata.len() > MAX_READ_BYTES {
            tracing::debug!(path = %path.display(), size = metadata.len(), "File truncated");
            output.push_str(&format!(
                "\n\n[Truncated: file is {} bytes, showing first 512KB]",
                metadata.len()
            ));
        }

        ToolResult::success(output)
    }
}
