//! Runtime configuration assembled from defaults and environment variables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use super::*;
use crate::agent::AgentConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    /// Azure when an endpoint and key are configured, Copilot otherwise.
    #[default]
    Auto,
    Copilot,
    Azure,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Auto => write!(f, "auto"),
            ProviderKind::Copilot => write!(f, "copilot"),
            ProviderKind::Azure => write!(f, "azure"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(ProviderKind::Auto),
            "copilot" | "github" => Ok(ProviderKind::Copilot),
            "azure" => Ok(ProviderKind::Azure),
            other => Err(ConfigError::InvalidValue {
                key: ENV_PROVIDER.to_string(),
                message: format!("unknown provider '{}', use 'copilot' or 'azure'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SearchProvider {
    #[default]
    Tavily,
    Linkup,
    Brave,
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchProvider::Tavily => write!(f, "tavily"),
            SearchProvider::Linkup => write!(f, "linkup"),
            SearchProvider::Brave => write!(f, "brave"),
        }
    }
}

impl FromStr for SearchProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tavily" => Ok(SearchProvider::Tavily),
            "linkup" => Ok(SearchProvider::Linkup),
            "brave" => Ok(SearchProvider::Brave),
            other => Err(ConfigError::InvalidValue {
                key: ENV_WEB_SEARCH_PROVIDER.to_string(),
                message: format!(
                    "invalid search provider '{}', use 'tavily', 'linkup', or 'brave'",
                    other
                ),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub system_message: String,
    pub account_type: String,
    pub azure_endpoint: Option<String>,
    pub azure_api_key: Option<SecretString>,
    pub stream: bool,
    pub max_tool_rounds: Option<usize>,
    pub api_timeout: Duration,
    pub command_timeout: Duration,
    pub file_operation_timeout: Duration,
    pub oauth_timeout: Duration,
    pub search_provider: SearchProvider,
    pub tavily_keys: Vec<String>,
    pub linkup_keys: Vec<String>,
    pub brave_keys: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Auto,
            model: DEFAULT_MODEL.to_string(),
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            account_type: DEFAULT_ACCOUNT_TYPE.to_string(),
            azure_endpoint: None,
            azure_api_key: None,
            stream: true,
            max_tool_rounds: None,
            api_timeout: DEFAULT_API_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            file_operation_timeout: DEFAULT_FILE_OPERATION_TIMEOUT,
            oauth_timeout: DEFAULT_OAUTH_TIMEOUT,
            search_provider: SearchProvider::Tavily,
            tavily_keys: Vec::new(),
            linkup_keys: Vec::new(),
            brave_keys: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with process environment variables, then validated.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(provider) = get(ENV_PROVIDER) {
            config.provider = provider.parse()?;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(account_type) = get(ENV_COPILOT_ACCOUNT_TYPE) {
            config.account_type = account_type;
        }
        config.azure_endpoint = get(ENV_AZURE_ENDPOINT).map(|e| e.trim_end_matches('/').to_string());
        config.azure_api_key = get(ENV_AZURE_API_KEY).map(SecretString::from);
        if let Some(rounds) = get(ENV_MAX_TOOL_ROUNDS) {
            let rounds = rounds
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: ENV_MAX_TOOL_ROUNDS.to_string(),
                    message: e.to_string(),
                })?;
            config.max_tool_rounds = Some(rounds);
        }

        config.tavily_keys = split_keys(get(ENV_TAVILY_API_KEYS));
        config.linkup_keys = split_keys(get(ENV_LINKUP_API_KEYS));
        config.brave_keys = split_keys(get(ENV_BRAVE_API_KEYS));
        config.search_provider = match get(ENV_WEB_SEARCH_PROVIDER) {
            Some(provider) => provider.parse()?,
            None => config.detect_search_provider(),
        };

        config.validate()?;
        Ok(config)
    }

    fn detect_search_provider(&self) -> SearchProvider {
        [
            SearchProvider::Tavily,
            SearchProvider::Linkup,
            SearchProvider::Brave,
        ]
        .into_iter()
        .find(|p| !self.search_keys(*p).is_empty())
        .unwrap_or_default()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.provider == ProviderKind::Azure {
            if self.azure_endpoint.is_none() {
                return Err(ConfigError::Missing {
                    key: ENV_AZURE_ENDPOINT,
                    hint: "Set it to use the azure provider",
                });
            }
            if self.azure_api_key.is_none() {
                return Err(ConfigError::Missing {
                    key: ENV_AZURE_API_KEY,
                    hint: "Set it to use the azure provider",
                });
            }
        }
        if self.max_tool_rounds == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: ENV_MAX_TOOL_ROUNDS.to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Provider actually used once `Auto` is resolved.
    pub fn resolved_provider(&self) -> ProviderKind {
        match self.provider {
            ProviderKind::Auto if self.azure_endpoint.is_some() && self.azure_api_key.is_some() => {
                ProviderKind::Azure
            }
            ProviderKind::Auto => ProviderKind::Copilot,
            other => other,
        }
    }

    pub fn search_keys(&self, provider: SearchProvider) -> &[String] {
        match provider {
            SearchProvider::Tavily => &self.tavily_keys,
            SearchProvider::Linkup => &self.linkup_keys,
            SearchProvider::Brave => &self.brave_keys,
        }
    }

    pub fn copilot_base_url(&self) -> String {
        if self.account_type.is_empty() || self.account_type == DEFAULT_ACCOUNT_TYPE {
            "https://api.githubcopilot.com".to_string()
        } else {
            format!("https://api.{}.githubcopilot.com", self.account_type)
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            model: self.model.clone(),
            stream: self.stream,
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

fn split_keys(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
