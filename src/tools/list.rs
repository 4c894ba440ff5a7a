//! list_directory - `ls -la` listing of a directory.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::process::Command;

use super::SchemaTool;
use super::context::ExecutionContext;
use super::process::{output_with_timeout, truncate_in_place};
use crate::types::ToolResult;

const MAX_LISTING: usize = 100_000;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirectoryInput {
    /// Directory path (default: current directory)
    #[serde(default)]
    pub path: Option<String>,
    /// List recursively (default: false)
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListDirectoryTool;

#[async_trait]
impl SchemaTool for ListDirectoryTool {
    type Input = ListDirectoryInput;

    const NAME: &'static str = "list_directory";
    const DESCRIPTION: &'static str =
        "List contents of a directory with file sizes and permissions.";

    async fn handle(&self, input: ListDirectoryInput, context: &ExecutionContext) -> ToolResult {
        let target = input.path.as_deref().filter(|p| !p.is_empty()).unwrap_or(".");
        let timeout = context.file_operation_timeout();

        let mut cmd = Command::new("ls");
        cmd.arg(if input.recursive { "-laR" } else { "-la" })
            .arg("--")
            .arg(target)
            .current_dir(context.working_dir());

        let output = match output_with_timeout(cmd, timeout).await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                return ToolResult::error(format!(
                    "Error: list directory timed out ({}s limit)",
                    timeout.as_secs()
                ));
            }
            Err(e) => return ToolResult::error(format!("Error: {}", e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return ToolResult::error(format!("Error: {}", stderr.trim()));
        }

        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        if truncate_in_place(&mut listing, MAX_LISTING) {
            listing.push_str("\n... (listing truncated)");
        }
        ToolResult::success(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use crate::tools::testing::helpers::TestContext;

    #[tokio::test]
    async fn test_list_current_directory() {
        let ctx = TestContext::new();
        ctx.write_file("visible.txt", "x");

        let result = ListDirectoryTool
            .execute(serde_json::json!({}), &ctx.context)
            .await;
        assert!(!result.is_error());
        assert!(result.text().contains("visible.txt"));
    }

    #[tokio::test]
    async fn test_list_recursive() {
        let ctx = TestContext::new();
        ctx.write_file("a/b/deep.txt", "x");

        let flat = ListDirectoryTool
            .execute(serde_json::json!({"path": "a"}), &ctx.context)
            .await;
        assert!(!flat.text().contains("deep.txt"));

        let recursive = ListDirectoryTool
            .execute(serde_json::json!({"path": "a", "recursive": true}), &ctx.context)
            .await;
        assert!(recursive.text().contains("deep.txt"));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let ctx = TestContext::new();
        let result = ListDirectoryTool
            .execute(serde_json::json!({"path": "missing"}), &ctx.context)
            .await;
        assert!(result.is_error());
        assert!(result.text().starts_with("Error:"));
    }
}
