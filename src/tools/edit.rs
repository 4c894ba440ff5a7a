//! edit_file - exact text replacement in a file.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::SchemaTool;
use super::context::ExecutionContext;
use crate::agent::FileOperation;
use crate::types::ToolResult;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditFileInput {
    /// File path (relative or absolute)
    pub path: String,
    /// Exact text to find and replace (must match exactly)
    pub old_text: String,
    /// Text to replace with
    pub new_text: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditFileTool;

/// Line diff of a replacement: every old line prefixed `- `, then every new
/// line prefixed `+ `.
pub fn generate_diff(old_text: &str, new_text: &str) -> String {
    let mut diff = String::from("--- old\n+++ new\n");
    for line in old_text.split('\n') {
        diff.push_str("- ");
        diff.push_str(line);
        diff.push('\n');
    }
    for line in new_text.split('\n') {
        diff.push_str("+ ");
        diff.push_str(line);
        diff.push('\n');
    }
    diff
}

#[async_trait]
impl SchemaTool for EditFileTool {
    type Input = EditFileInput;

    const NAME: &'static str = "edit_file";
    const DESCRIPTION: &'static str = "Edit a file by finding and replacing text. \
        Shows diff preview before applying. The old_text must match exactly \
        (including whitespace and indentation). Use for surgical edits to existing files.";

    async fn handle(&self, input: EditFileInput, context: &ExecutionContext) -> ToolResult {
        if input.old_text.is_empty() {
            return ToolResult::error("Error: old_text must not be empty");
        }

        let path = match context.try_check_path(&input.path) {
            Ok(p) => p,
            Err(blocked) => return blocked,
        };

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ToolResult::error(format!("Error: file not found: {}", input.path));
            }
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };

        let count = content.matches(&input.old_text).count();
        if count == 0 {
            return ToolResult::error("Error: text not found in file");
        }

        let diff = generate_diff(&input.old_text, &input.new_text);
        if !context
            .approver()
            .confirm_file(FileOperation::Edit, &path, Some(&diff))
            .await
        {
            return ToolResult::error("Edit denied by user");
        }

        let updated = content.replacen(&input.old_text, &input.new_text, 1);
        if let Err(e) = tokio::fs::write(&path, updated).await {
            return ToolResult::error(format!("Error: {}", e));
        }

        let mut message = format!("Edited {}", input.path);
        if count > 1 {
            message.push_str(&format!(" (replaced 1 of {} occurrences)", count));
        }
        tracing::debug!(path = %path.display(), occurrences = count, "File edited");
        ToolResult::success(format!("{}\n\n{}", message, diff))
    }
}
