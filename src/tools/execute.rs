//! execute_command - shell command execution behind the permission manager.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::process::Command;

use super::SchemaTool;
use super::context::ExecutionContext;
use super::process::{output_with_timeout, truncate_in_place};
use crate::agent::Approval;
use crate::types::ToolResult;

const MAX_OUTPUT: usize = 30_000;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteCommandInput {
    /// The shell command to execute (e.g., 'ls -la', 'git status', 'npm install')
    pub command: String,
    /// Brief explanation of why this command is needed to accomplish the user's request
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteCommandTool;

#[async_trait]
impl SchemaTool for ExecuteCommandTool {
    type Input = ExecuteCommandInput;

    const NAME: &'static str = "execute_command";
    const DESCRIPTION: &'static str = "Execute a shell command in the user's terminal and return the output. \
        Use this to help users with system tasks, file operations, git commands, package management, \
        and other terminal operations. The command will run in the user's current working directory.";

    async fn handle(&self, input: ExecuteCommandInput, context: &ExecutionContext) -> ToolResult {
        let command = input.command.trim();
        let permissions = context.permissions();
        let decision = permissions.check(command);

        if decision.is_denied() {
            tracing::warn!(command, reason = %decision.reason, "Command blocked");
            return ToolResult::error(format!("Command blocked: {}", decision.reason));
        }

        if decision.needs_confirmation() {
            match context
                .approver()
                .confirm_command(command, &input.reasoning)
                .await
            {
                Approval::Denied => {
                    tracing::info!(command, "Command denied by user");
                    return ToolResult::error("Command execution denied by user");
                }
                Approval::Approved(approval) => {
                    if let Err(e) = permissions.add_to_allowlist(command, approval) {
                        tracing::warn!(command, error = %e, "Failed to save permission");
                    }
                }
            }
        }

        run_shell(command, context.working_dir(), context.command_timeout()).await
    }
}

/// Run `command` through `bash -c` and render the outcome for the model.
pub async fn run_shell(command: &str, working_dir: &Path, timeout: Duration) -> ToolResult {
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(command).current_dir(working_dir);

    tracing::debug!(command, timeout_secs = timeout.as_secs(), "Executing command");
    let output = match output_with_timeout(cmd, timeout).await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            tracing::warn!(command, "Command timed out");
            return ToolResult::error(format!(
                "Command timed out after {} seconds",
                timeout.as_secs()
            ));
        }
        Err(e) => return ToolResult::error(format!("Failed to execute command: {}", e)),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut combined = String::new();
    if !stdout.is_empty() {
        combined.push_str(&stdout);
    }
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(&stderr);
    }

    if truncate_in_place(&mut combined, MAX_OUTPUT) {
        combined.push_str("\n... (output truncated)");
    }

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        return ToolResult::error(format!("Exit code: {}\n{}", code, combined));
    }

    if combined.is_empty() {
        return ToolResult::success("Command executed successfully (no output)");
    }
    ToolResult::success(combined)
}
