//! Application configuration and well-known filesystem locations.
//!
//! ```rust,no_run
//! use ai_agent::config::AppConfig;
//!
//! # fn example() -> ai_agent::Result<()> {
//! let config = AppConfig::from_env()?;
//! println!("provider: {}, model: {}", config.provider, config.model);
//! # Ok(())
//! # }
//! ```

mod app;

pub use app::{AppConfig, ProviderKind, SearchProvider};

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const APP_NAME: &str = "ai-agent";

pub const DEFAULT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_SYSTEM_MESSAGE: &str = "Be precise and concise.";
pub const DEFAULT_ACCOUNT_TYPE: &str = "individual";

pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FILE_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_OAUTH_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_PROVIDER: &str = "AI_PROVIDER";
pub const ENV_MODEL: &str = "AI_MODEL";
pub const ENV_MAX_TOOL_ROUNDS: &str = "AI_MAX_TOOL_ROUNDS";
pub const ENV_COPILOT_ACCOUNT_TYPE: &str = "COPILOT_ACCOUNT_TYPE";
pub const ENV_AZURE_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_AZURE_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_TAVILY_API_KEYS: &str = "TAVILY_API_KEYS";
pub const ENV_LINKUP_API_KEYS: &str = "LINKUP_API_KEYS";
pub const ENV_BRAVE_API_KEYS: &str = "BRAVE_API_KEYS";
pub const ENV_WEB_SEARCH_PROVIDER: &str = "WEB_SEARCH_PROVIDER";

/// Errors that can occur while building the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The key with invalid value
        key: String,
        /// Error message
        message: String,
    },

    /// Required value missing
    #[error("{key} not set. {hint}")]
    Missing {
        key: &'static str,
        hint: &'static str,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Per-user data directory, e.g. `~/.local/share/ai-agent` on Linux.
pub fn data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.data_dir().join(APP_NAME))
}

/// Project-local configuration directory inside `project_dir`.
pub fn project_config_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(format!(".{}", APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_config_dir() {
        assert_eq!(
            project_config_dir(Path::new("/work/repo")),
            PathBuf::from("/work/repo/.ai-agent")
        );
    }

    #[test]
    fn test_data_dir_is_app_scoped() {
        if let Some(dir) = data_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
