//! Execution context for tool operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{Approver, DenyAllApprover};
use crate::config::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_FILE_OPERATION_TIMEOUT};
use crate::permissions::PermissionManager;
use crate::security::{SecurityError, check_path_safe, resolve_path};
use crate::types::ToolResult;

/// Everything a tool needs from its surroundings: where relative paths are
/// anchored, who decides on commands, and how long child processes may run.
#[derive(Clone)]
pub struct ExecutionContext {
    working_dir: PathBuf,
    permissions: Arc<PermissionManager>,
    approver: Arc<dyn Approver>,
    command_timeout: Duration,
    file_operation_timeout: Duration,
}

impl ExecutionContext {
    /// Context with a deny-everything approver and default timeouts.
    pub fn new(working_dir: impl Into<PathBuf>, permissions: Arc<PermissionManager>) -> Self {
        Self {
            working_dir: working_dir.into(),
            permissions,
            approver: Arc::new(DenyAllApprover),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            file_operation_timeout: DEFAULT_FILE_OPERATION_TIMEOUT,
        }
    }

    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = approver;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_file_operation_timeout(mut self, timeout: Duration) -> Self {
        self.file_operation_timeout = timeout;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    pub fn approver(&self) -> &dyn Approver {
        self.approver.as_ref()
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn file_operation_timeout(&self) -> Duration {
        self.file_operation_timeout
    }

    /// Absolute form of a tool-supplied path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        resolve_path(Path::new(path), &self.working_dir)
    }

    /// Resolve a path that is about to be modified, refusing protected
    /// locations.
    pub fn check_path(&self, path: &str) -> Result<PathBuf, SecurityError> {
        check_path_safe(Path::new(path), &self.working_dir)
    }

    /// [`check_path`](Self::check_path) with the refusal already rendered
    /// as the tool result the model sees.
    pub fn try_check_path(&self, path: &str) -> Result<PathBuf, ToolResult> {
        self.check_path(path)
            .map_err(|e| ToolResult::error(format!("Blocked: {}", e)))
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("working_dir", &self.working_dir)
            .field("command_timeout", &self.command_timeout)
            .field("file_operation_timeout", &self.file_operation_timeout)
            .finish_non_exhaustive()
    }
}
