//! Permission manager: the single authority a shell command passes through.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use super::classifier::{RiskLevel, classify};
use super::matcher::{MatchResult, PermissionRule, check_rules};
use super::store::{PermissionStore, SettingsError, SettingsPaths};

/// How long a user approval of a command lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    /// This invocation only.
    Once,
    /// Until the process exits or the session allowlist is cleared.
    Session,
    /// Persisted as an exact-match allow rule in the global settings.
    Always,
}

impl fmt::Display for ApprovalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalType::Once => write!(f, "once"),
            ApprovalType::Session => write!(f, "session"),
            ApprovalType::Always => write!(f, "always"),
        }
    }
}

impl FromStr for ApprovalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "once" | "y" | "yes" => Ok(ApprovalType::Once),
            "session" | "s" => Ok(ApprovalType::Session),
            "always" | "a" => Ok(ApprovalType::Always),
            _ => Err(format!("unknown approval type: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionStatus {
    Allowed,
    NeedsConfirmation,
    Denied,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionResult {
    pub status: PermissionStatus,
    pub reason: String,
    pub risk: Option<RiskLevel>,
}

impl PermissionResult {
    pub fn allowed(reason: impl Into<String>) -> Self {
        Self::with_status(PermissionStatus::Allowed, reason)
    }

    pub fn confirm(reason: impl Into<String>) -> Self {
        Self::with_status(PermissionStatus::NeedsConfirmation, reason)
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::with_status(PermissionStatus::Denied, reason)
    }

    fn with_status(status: PermissionStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            risk: None,
        }
    }

    fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.status == PermissionStatus::Allowed
    }

    pub fn needs_confirmation(&self) -> bool {
        self.status == PermissionStatus::NeedsConfirmation
    }

    pub fn is_denied(&self) -> bool {
        self.status == PermissionStatus::Denied
    }
}

/// Snapshot of the effective permission state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PermissionSummary {
    pub auto_allow_safe_commands: bool,
    pub dangerous_enabled: bool,
    pub session_count: usize,
    pub global_path: PathBuf,
    pub project_path: Option<PathBuf>,
    pub allow_rules: usize,
    pub deny_rules: usize,
}

#[derive(Debug)]
struct ManagerState {
    store: PermissionStore,
    session: HashSet<String>,
}

/// Combines the classifier, the rule matcher and the settings store into one
/// allow / confirm / deny decision. One lock guards the store and the session
/// allowlist: checks share it, mutations take it exclusively.
#[derive(Debug)]
pub struct PermissionManager {
    state: RwLock<ManagerState>,
}

impl PermissionManager {
    pub fn new(store: PermissionStore) -> Self {
        Self {
            state: RwLock::new(ManagerState {
                store,
                session: HashSet::new(),
            }),
        }
    }

    pub fn load(paths: SettingsPaths) -> Result<Self, SettingsError> {
        Ok(Self::new(PermissionStore::load(paths)?))
    }

    /// Load settings from the standard global location and `project_dir`.
    pub fn load_for(project_dir: &Path) -> Result<Self, SettingsError> {
        Self::load(SettingsPaths::standard(project_dir)?)
    }

    /// Load settings for the current working directory.
    pub fn load_default() -> Result<Self, SettingsError> {
        let cwd = std::env::current_dir().map_err(|source| SettingsError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        Self::load_for(&cwd)
    }

    fn read(&self) -> RwLockReadGuard<'_, ManagerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ManagerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn check(&self, command: &str) -> PermissionResult {
        let command = command.trim();
        let result = self.evaluate(command);
        tracing::debug!(
            command,
            status = ?result.status,
            reason = %result.reason,
            "Permission check"
        );
        result
    }

    fn evaluate(&self, command: &str) -> PermissionResult {
        let state = self.read();

        if state.session.contains(command) {
            return PermissionResult::allowed("Allowed for this session");
        }

        if state.store.is_approved(command) {
            return PermissionResult::allowed("Previously approved");
        }

        let allow: Vec<PermissionRule> = state.store.allow_rules().cloned().collect();
        let deny: Vec<PermissionRule> = state.store.deny_rules().cloned().collect();
        match check_rules(command, &allow, &deny) {
            MatchResult::Deny => return PermissionResult::denied("Command blocked by deny rule"),
            MatchResult::Allow => return PermissionResult::allowed("Allowed by permission rule"),
            MatchResult::NoMatch => {}
        }

        let risk = classify(command);
        let result = match risk {
            RiskLevel::Safe if state.store.auto_allow_safe_commands() => {
                PermissionResult::allowed(risk.description())
            }
            RiskLevel::Safe => PermissionResult::confirm("Confirmation required"),
            RiskLevel::NeedsConfirm => PermissionResult::confirm(risk.description()),
            RiskLevel::Dangerous if state.store.dangerous_enabled() => {
                PermissionResult::confirm(
                    "Dangerous command (requires explicit confirmation)",
                )
            }
            RiskLevel::Dangerous => PermissionResult::denied(
                "Dangerous command blocked (use /allow-dangerous to enable)",
            ),
        };
        result.with_risk(risk)
    }

    /// Record a user approval. `Always` persists an exact-match allow rule.
    pub fn add_to_allowlist(
        &self,
        command: &str,
        approval: ApprovalType,
    ) -> Result<(), SettingsError> {
        let command = command.trim();
        let mut state = self.write();
        match approval {
            ApprovalType::Once => Ok(()),
            ApprovalType::Session => {
                state.session.insert(command.to_string());
                tracing::info!(command, "Command allowed for this session");
                Ok(())
            }
            ApprovalType::Always => {
                state.store.remember_approval(command);
                state
                    .store
                    .add_rule(PermissionRule::command(command), false);
                tracing::info!(command, "Command added to global allowlist");
                state.store.save()
            }
        }
    }

    /// Parse `pattern` (optionally `Tool(pattern)`) and persist it as an allow
    /// or deny rule.
    pub fn add_pattern_rule(
        &self,
        pattern: &str,
        deny: bool,
    ) -> Result<PermissionRule, SettingsError> {
        let rule = PermissionRule::parse(pattern);
        let mut state = self.write();
        state.store.add_rule(rule.clone(), deny);
        tracing::info!(rule = %rule.format(), deny, "Permission rule added");
        state.store.save()?;
        Ok(rule)
    }

    pub fn enable_dangerous(&self) -> Result<(), SettingsError> {
        self.set_dangerous(true)
    }

    pub fn disable_dangerous(&self) -> Result<(), SettingsError> {
        self.set_dangerous(false)
    }

    fn set_dangerous(&self, enabled: bool) -> Result<(), SettingsError> {
        let mut state = self.write();
        state.store.set_dangerous_enabled(enabled);
        tracing::info!(enabled, "Dangerous commands toggled");
        state.store.save()
    }

    pub fn set_auto_allow_safe(&self, enabled: bool) -> Result<(), SettingsError> {
        let mut state = self.write();
        state.store.set_auto_allow_safe(enabled);
        state.store.save()
    }

    pub fn dangerous_enabled(&self) -> bool {
        self.read().store.dangerous_enabled()
    }

    pub fn clear_session(&self) {
        self.write().session.clear();
    }

    pub fn allow_rules(&self) -> Vec<String> {
        self.read()
            .store
            .allow_rules()
            .map(PermissionRule::format)
            .collect()
    }

    pub fn deny_rules(&self) -> Vec<String> {
        self.read()
            .store
            .deny_rules()
            .map(PermissionRule::format)
            .collect()
    }

    pub fn summary(&self) -> PermissionSummary {
        let state = self.read();
        PermissionSummary {
            auto_allow_safe_commands: state.store.auto_allow_safe_commands(),
            dangerous_enabled: state.store.dangerous_enabled(),
            session_count: state.session.len(),
            global_path: state.store.paths().global.clone(),
            project_path: state.store.paths().project.clone(),
            allow_rules: state.store.allow_rules().count(),
            deny_rules: state.store.deny_rules().count(),
        }
    }

    pub fn reload(&self) -> Result<(), SettingsError> {
        self.write().store.reload()
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.read().store.save()
    }
}
