//! Agent core structure and construction.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::approval::{Approver, DenyAllApprover};
use super::config::AgentConfig;
use crate::client::ChatProvider;
use crate::config::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_FILE_OPERATION_TIMEOUT};
use crate::permissions::PermissionManager;
use crate::tools::{ExecutionContext, Plan, Tool, ToolRegistry, UpdatePlanTool};

/// Drives conversation turns against a chat provider with the built-in tools.
///
/// An agent holds no conversation state of its own; each
/// [`run_turn`](Agent::run_turn) works on a caller-owned
/// [`Conversation`](super::Conversation).
pub struct Agent {
    pub(crate) provider: Arc<dyn ChatProvider>,
    pub(crate) config: AgentConfig,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) plan: Arc<UpdatePlanTool>,
    pub(crate) context: ExecutionContext,
}

impl Agent {
    pub fn builder(provider: Arc<dyn ChatProvider>) -> AgentBuilder {
        AgentBuilder::new(provider)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn permissions(&self) -> &PermissionManager {
        self.context.permissions()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// The plan most recently published through `update_plan`.
    pub fn current_plan(&self) -> Option<Plan> {
        self.plan.current()
    }

    pub fn clear_plan(&self) {
        self.plan.clear();
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("tools", &self.tools.names())
            .field("working_dir", &self.context.working_dir())
            .finish()
    }
}

pub struct AgentBuilder {
    provider: Arc<dyn ChatProvider>,
    config: AgentConfig,
    permissions: Option<Arc<PermissionManager>>,
    approver: Arc<dyn Approver>,
    working_dir: Option<PathBuf>,
    command_timeout: Duration,
    file_operation_timeout: Duration,
    extra_tools: Vec<Arc<dyn Tool>>,
}

impl AgentBuilder {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            config: AgentConfig::default(),
            permissions: None,
            approver: Arc::new(DenyAllApprover),
            working_dir: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            file_operation_timeout: DEFAULT_FILE_OPERATION_TIMEOUT,
            extra_tools: Vec::new(),
        }
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn permissions(mut self, permissions: Arc<PermissionManager>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = approver;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn file_operation_timeout(mut self, timeout: Duration) -> Self {
        self.file_operation_timeout = timeout;
        self
    }

    /// Add a tool, replacing a built-in one of the same name.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.extra_tools.push(tool);
        self
    }

    /// Without explicit permissions, rules are loaded from the global
    /// settings file and the working directory's project settings.
    pub fn build(self) -> crate::Result<Agent> {
        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        let permissions = match self.permissions {
            Some(permissions) => permissions,
            None => Arc::new(PermissionManager::load_for(&working_dir)?),
        };

        let plan = Arc::new(UpdatePlanTool::new());
        let mut tools = ToolRegistry::with_plan(Arc::clone(&plan));
        for tool in self.extra_tools {
            tools.register(tool);
        }

        let context = ExecutionContext::new(working_dir, permissions)
            .with_approver(self.approver)
            .with_command_timeout(self.command_timeout)
            .with_file_operation_timeout(self.file_operation_timeout);

        tracing::debug!(
            provider = self.provider.name(),
            model = %self.config.model,
            tools = tools.len(),
            "Agent built"
        );

        Ok(Agent {
            provider: self.provider,
            config: self.config,
            tools: Arc::new(tools),
            plan,
            context,
        })
    }
}
