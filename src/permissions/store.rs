//! Persistent permission settings with global and project scopes.
//!
//! Loads settings from (lowest to highest priority):
//! 1. Global settings: `<data_dir>/ai-agent/settings.json`
//! 2. Project settings: `.ai-agent/settings.json` in the working directory
//!
//! Rule lists are unioned (global first). Behaviour toggles set in the project
//! file override the global ones.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::matcher::PermissionRule;
use crate::config;

pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_AUTO_ALLOW_SAFE: bool = true;
const DEFAULT_DANGEROUS_ENABLED: bool = false;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write settings {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not determine the user data directory")]
    NoDataDir,

    #[error("no project settings path configured")]
    NoProject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub allow: Vec<PermissionRule>,
    #[serde(default)]
    pub deny: Vec<PermissionRule>,
}

/// On-disk shape of a settings file. Toggles are optional so a project file
/// only overrides what it actually sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub permissions: RuleSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_allow_safe_commands: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangerous_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPaths {
    pub global: PathBuf,
    pub project: Option<PathBuf>,
}

impl SettingsPaths {
    pub fn new(global: impl Into<PathBuf>, project: Option<PathBuf>) -> Self {
        Self {
            global: global.into(),
            project,
        }
    }

    /// Standard locations for the user data directory and `project_dir`.
    pub fn standard(project_dir: &Path) -> Result<Self, SettingsError> {
        let data_dir = config::data_dir().ok_or(SettingsError::NoDataDir)?;
        Ok(Self {
            global: data_dir.join(SETTINGS_FILE),
            project: Some(config::project_config_dir(project_dir).join(SETTINGS_FILE)),
        })
    }
}

#[derive(Debug)]
pub struct PermissionStore {
    paths: SettingsPaths,
    global: SettingsFile,
    project: Option<SettingsFile>,
    approved: HashSet<String>,
}

impl PermissionStore {
    pub fn load(paths: SettingsPaths) -> Result<Self, SettingsError> {
        let mut store = Self {
            paths,
            global: SettingsFile::default(),
            project: None,
            approved: HashSet::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Store backed by the given paths without touching the filesystem.
    pub fn in_memory(paths: SettingsPaths) -> Self {
        Self {
            paths,
            global: SettingsFile::default(),
            project: None,
            approved: HashSet::new(),
        }
    }

    /// Re-read both files. A broken global file is an error; a broken project
    /// file is skipped with a warning.
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        self.global = read_settings(&self.paths.global)?.unwrap_or_default();
        self.project = match &self.paths.project {
            Some(path) => match read_settings(path) {
                Ok(project) => project,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unreadable project settings");
                    None
                }
            },
            None => None,
        };
        tracing::debug!(
            global = %self.paths.global.display(),
            has_project = self.project.is_some(),
            allow = self.allow_rules().count(),
            deny = self.deny_rules().count(),
            "Loaded permission settings"
        );
        Ok(())
    }

    /// Write the global settings file, materializing default toggles.
    pub fn save(&self) -> Result<(), SettingsError> {
        let mut global = self.global.clone();
        global
            .auto_allow_safe_commands
            .get_or_insert(DEFAULT_AUTO_ALLOW_SAFE);
        global
            .dangerous_enabled
            .get_or_insert(DEFAULT_DANGEROUS_ENABLED);
        write_settings(&self.paths.global, &global)
    }

    pub fn save_project(&self) -> Result<(), SettingsError> {
        let path = self.paths.project.as_ref().ok_or(SettingsError::NoProject)?;
        write_settings(path, &self.project.clone().unwrap_or_default())
    }

    pub fn paths(&self) -> &SettingsPaths {
        &self.paths
    }

    pub fn global(&self) -> &SettingsFile {
        &self.global
    }

    pub fn project(&self) -> Option<&SettingsFile> {
        self.project.as_ref()
    }

    pub fn auto_allow_safe_commands(&self) -> bool {
        self.toggle(|s| s.auto_allow_safe_commands, DEFAULT_AUTO_ALLOW_SAFE)
    }

    pub fn dangerous_enabled(&self) -> bool {
        self.toggle(|s| s.dangerous_enabled, DEFAULT_DANGEROUS_ENABLED)
    }

    fn toggle(&self, get: impl Fn(&SettingsFile) -> Option<bool>, default: bool) -> bool {
        self.project
            .as_ref()
            .and_then(&get)
            .or_else(|| get(&self.global))
            .unwrap_or(default)
    }

    /// Set the toggle globally. A project value, if present, is updated in
    /// memory too so the change takes effect for this process.
    pub fn set_auto_allow_safe(&mut self, enabled: bool) {
        self.global.auto_allow_safe_commands = Some(enabled);
        if let Some(project) = self.project.as_mut()
            && project.auto_allow_safe_commands.is_some()
        {
            project.auto_allow_safe_commands = Some(enabled);
        }
    }

    pub fn set_dangerous_enabled(&mut self, enabled: bool) {
        self.global.dangerous_enabled = Some(enabled);
        if let Some(project) = self.project.as_mut()
            && project.dangerous_enabled.is_some()
        {
            project.dangerous_enabled = Some(enabled);
        }
    }

    pub fn allow_rules(&self) -> impl Iterator<Item = &PermissionRule> {
        self.global
            .permissions
            .allow
            .iter()
            .chain(self.project.iter().flat_map(|p| p.permissions.allow.iter()))
    }

    pub fn deny_rules(&self) -> impl Iterator<Item = &PermissionRule> {
        self.global
            .permissions
            .deny
            .iter()
            .chain(self.project.iter().flat_map(|p| p.permissions.deny.iter()))
    }

    /// Append a rule to the global list. Duplicates are ignored.
    pub fn add_rule(&mut self, rule: PermissionRule, deny: bool) -> bool {
        let list = if deny {
            &mut self.global.permissions.deny
        } else {
            &mut self.global.permissions.allow
        };
        if list.contains(&rule) {
            return false;
        }
        list.push(rule);
        true
    }

    pub fn is_approved(&self, command: &str) -> bool {
        self.approved.contains(command)
    }

    pub fn remember_approval(&mut self, command: impl Into<String>) {
        self.approved.insert(command.into());
    }
}

fn read_settings(path: &Path) -> Result<Option<SettingsFile>, SettingsError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn write_settings(path: &Path, settings: &SettingsFile) -> Result<(), SettingsError> {
    let write_err = |source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).map_err(write_err)
}
