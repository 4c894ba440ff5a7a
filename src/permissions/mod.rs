//! Permission system for controlling shell command execution.
//!
//! Every command requested by the model goes through
//! [`PermissionManager::check`], which evaluates in order: the session
//! allowlist, previously approved commands, deny rules, allow rules, and
//! finally the command's [`RiskLevel`].

mod classifier;
mod manager;
mod matcher;
mod store;

pub use classifier::{RiskLevel, classify};
pub use manager::{
    ApprovalType, PermissionManager, PermissionResult, PermissionStatus, PermissionSummary,
};
pub use matcher::{DEFAULT_TOOL, MatchResult, PermissionRule, check_rules, matches_pattern};
pub use store::{
    PermissionStore, RuleSet, SETTINGS_FILE, SettingsError, SettingsFile, SettingsPaths,
};
