//! search_files - content search with ripgrep, falling back to grep.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::process::Command;

use super::SchemaTool;
use super::context::ExecutionContext;
use super::process::{on_path, output_with_timeout};
use crate::types::ToolResult;

/// Result lines returned to the model.
pub const MAX_SEARCH_RESULTS: usize = 50;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchFilesInput {
    /// Search pattern (supports regex)
    pub pattern: String,
    /// Directory or file to search in (default: current directory)
    #[serde(default)]
    pub path: Option<String>,
    /// File type filter, e.g., 'go', 'js', 'py', 'ts' (optional)
    #[serde(default)]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFilesTool;

#[async_trait]
impl SchemaTool for SearchFilesTool {
    type Input = SearchFilesInput;

    const NAME: &'static str = "search_files";
    const DESCRIPTION: &'static str = "Search for a pattern in files using ripgrep (with grep fallback). \
        Returns matching lines with file paths and line numbers. Limited to 50 matches.";

    async fn handle(&self, input: SearchFilesInput, context: &ExecutionContext) -> ToolResult {
        let target = input.path.as_deref().filter(|p| !p.is_empty()).unwrap_or(".");
        let file_type = input.file_type.as_deref().filter(|t| !t.is_empty());

        let cmd = if on_path("rg") {
            ripgrep(&input.pattern, target, file_type)
        } else {
            tracing::debug!("ripgrep not found, falling back to grep");
            grep(&input.pattern, target)
        };

        run_search(cmd, context.working_dir(), context.file_operation_timeout()).await
    }
}

fn ripgrep(pattern: &str, path: &str, file_type: Option<&str>) -> Command {
    let mut cmd = Command::new("rg");
    cmd.arg("-n")
        .arg("--color=never")
        .arg("-m")
        .arg(MAX_SEARCH_RESULTS.to_string());
    if let Some(t) = file_type {
        cmd.arg("-t").arg(t);
    }
    cmd.arg("--").arg(pattern).arg(path);
    cmd
}

fn grep(pattern: &str, path: &str) -> Command {
    let mut cmd = Command::new("grep");
    cmd.arg("-rn").arg("--").arg(pattern).arg(path);
    cmd
}

async fn run_search(mut cmd: Command, working_dir: &Path, timeout: Duration) -> ToolResult {
    cmd.current_dir(working_dir);
    let output = match output_with_timeout(cmd, timeout).await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            return ToolResult::error(format!(
                "Error: search timed out ({}s limit)",
                timeout.as_secs()
            ));
        }
        Err(e) => return ToolResult::error(format!("Error: {}", e)),
    };

    // Both tools exit 1 for "no matches" and 2 for real errors.
    if output.status.code() == Some(2) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return ToolResult::error(format!("Error: {}", stderr.trim()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let result = stdout.trim();
    if result.is_empty() {
        return ToolResult::success("No matches found");
    }

    ToolResult::success(limit_lines(result, MAX_SEARCH_RESULTS))
}

fn limit_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max {
        return text.to_string();
    }
    format!(
        "{}\n[Truncated: showing first {} matches]",
        lines[..max].join("\n"),
        max
    )
}
