//! User confirmation for commands and file changes.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use async_trait::async_trait;

use crate::permissions::ApprovalType;

/// Answer to a command confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Denied,
    Approved(ApprovalType),
}

impl Approval {
    pub fn is_approved(&self) -> bool {
        matches!(self, Approval::Approved(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Write,
    Edit,
    Delete,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOperation::Write => write!(f, "write"),
            FileOperation::Edit => write!(f, "edit"),
            FileOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Decides on actions the permission engine cannot settle alone.
#[async_trait]
pub trait Approver: Send + Sync {
    /// Asked when a command needs confirmation. `reasoning` is the model's
    /// explanation of why it wants to run the command.
    async fn confirm_command(&self, command: &str, reasoning: &str) -> Approval;

    /// Asked before a file is written, edited or deleted. `preview` carries
    /// a diff or summary when one is available.
    async fn confirm_file(
        &self,
        operation: FileOperation,
        path: &Path,
        preview: Option<&str>,
    ) -> bool;
}

/// Refuses everything. Used when no interactive approver is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllApprover;

#[async_trait]
impl Approver for DenyAllApprover {
    async fn confirm_command(&self, _command: &str, _reasoning: &str) -> Approval {
        Approval::Denied
    }

    async fn confirm_file(
        &self,
        _operation: FileOperation,
        _path: &Path,
        _preview: Option<&str>,
    ) -> bool {
        false
    }
}

/// Prompts on stderr and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalApprover;

impl TerminalApprover {
    async fn ask(prompt: String) -> Option<String> {
        tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{}", prompt);
            let _ = stderr.flush();

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).ok()?;
            Some(line.trim().to_ascii_lowercase())
        })
        .await
        .ok()
        .flatten()
    }
}

/// Empty or unrecognized answers deny.
fn parse_command_answer(answer: &str) -> Approval {
    answer
        .parse::<ApprovalType>()
        .map(Approval::Approved)
        .unwrap_or(Approval::Denied)
}

fn parse_yes(answer: &str) -> bool {
    matches!(answer, "y" | "yes")
}

#[async_trait]
impl Approver for TerminalApprover {
    async fn confirm_command(&self, command: &str, reasoning: &str) -> Approval {
        let mut prompt = format!("\nCommand: {}\n", command);
        if !reasoning.is_empty() {
            prompt.push_str(&format!("Reason:  {}\n", reasoning));
        }
        prompt.push_str("Allow? [y]es once / [s]ession / [a]lways / [N]o: ");

        match Self::ask(prompt).await {
            Some(answer) => parse_command_answer(&answer),
            None => Approval::Denied,
        }
    }

    async fn confirm_file(
        &self,
        operation: FileOperation,
        path: &Path,
        preview: Option<&str>,
    ) -> bool {
        let mut prompt = format!("\n{} {}\n", operation, path.display());
        if let Some(preview) = preview {
            prompt.push_str(preview);
            if !preview.ends_with('\n') {
                prompt.push('\n');
            }
        }
        prompt.push_str("Proceed? [y/N]: ");

        Self::ask(prompt).await.is_some_and(|a| parse_yes(&a))
    }
}
