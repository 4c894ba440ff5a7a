//! # ai-agent
//!
//! Interactive agent core: a tool-execution loop that lets a chat model read,
//! write, search and delete files and run shell commands, gated by a command
//! permission engine.
//!
//! The crate is organised leaves first:
//!
//! - [`permissions`]: risk classifier, rule matcher, persistent rule store
//!   and the permission manager every command passes through.
//! - [`client`]: SSE stream assembly, retry policy and the Copilot / Azure
//!   chat providers.
//! - [`auth`]: background credential refresh for short-lived bearer tokens.
//! - [`search`]: web-search backends with API-key rotation.
//! - [`tools`]: the fixed tool catalog exposed to the model.
//! - [`agent`]: the loop that ties everything together.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ai_agent::agent::{Agent, Conversation, TerminalApprover};
//! use ai_agent::config::AppConfig;
//! use ai_agent::permissions::PermissionManager;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> ai_agent::Result<()> {
//! let config = AppConfig::from_env()?;
//! let provider = ai_agent::client::create_provider(&config).await?;
//! let permissions = Arc::new(PermissionManager::load_default()?);
//! let agent = Agent::builder(provider)
//!     .config(config.agent_config())
//!     .permissions(permissions)
//!     .approver(Arc::new(TerminalApprover))
//!     .build()?;
//!
//! let mut conversation = Conversation::new(&config.system_message);
//! let answer = agent
//!     .run_turn(&mut conversation, "List the files here", &mut |chunk: &str| print!("{chunk}"), &CancellationToken::new())
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod agent;
pub mod auth;
pub mod client;
pub mod config;
pub mod permissions;
pub mod search;
pub mod security;
pub mod tools;
pub mod types;

pub use agent::{Agent, AgentBuilder, AgentConfig, Approval, Approver, Conversation, SlashCommand};
pub use client::{ChatProvider, ExponentialBackoff, Resilience, RetryConfig};
pub use permissions::{ApprovalType, PermissionManager, RiskLevel};
pub use tools::{ExecutionContext, SchemaTool, Tool, ToolRegistry};
pub use types::{ChatRequest, ChatResponse, Message, Role, ToolCall, ToolResult};

/// Error type for ai-agent operations.
///
/// Tool-level failures never surface here; they are returned to the model as
/// [`ToolResult`] text so the conversation can continue.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// API returned an error response.
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    /// Credential is missing, invalid or expired.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Network connectivity or request failed.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Permission settings could not be loaded or saved.
    #[error(transparent)]
    Settings(#[from] permissions::SettingsError),

    /// Streaming response error.
    #[error("Stream error: {0}")]
    Stream(String),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Operation exceeded timeout.
    #[error("Operation timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(std::time::Duration),

    /// Transient failures persisted through every retry attempt.
    #[error("max retry attempts ({attempts}) exceeded: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Every configured API key of a search provider was rejected.
    #[error("{source} (no more {provider} API keys available)")]
    KeysExhausted {
        provider: String,
        #[source]
        source: Box<Error>,
    },

    /// The model kept requesting tools past the configured round limit.
    #[error("tool call round limit ({limit}) reached")]
    ToolRoundLimit { limit: usize },
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Authentication or authorization failures (401, 403)
    Authorization,
    /// Configuration, parsing, or setup errors
    Configuration,
    /// Network, rate limit, or transient errors that may succeed on retry
    Transient,
    /// Caller-initiated cancellation
    Cancelled,
    /// Internal errors (IO, JSON, unexpected states)
    Internal,
    /// Resource limits (timeouts, exhausted retries or keys, round limits)
    ResourceLimit,
}

/// HTTP statuses worth retrying with backoff.
pub const RETRYABLE_STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504];

impl Error {
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            message: message.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Auth { .. } => ErrorCategory::Authorization,
            Error::Api {
                status: Some(401 | 403),
                ..
            } => ErrorCategory::Authorization,
            Error::Api {
                status: Some(status),
                ..
            } if RETRYABLE_STATUS_CODES.contains(status) => ErrorCategory::Transient,
            Error::Network(_) => ErrorCategory::Transient,

            Error::Config(_) | Error::Settings(_) => ErrorCategory::Configuration,

            Error::Cancelled => ErrorCategory::Cancelled,

            Error::Timeout(_)
            | Error::RetriesExhausted { .. }
            | Error::KeysExhausted { .. }
            | Error::ToolRoundLimit { .. } => ErrorCategory::ResourceLimit,

            Error::Api { .. } | Error::Io(_) | Error::Json(_) | Error::Stream(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn is_authorization_error(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }

    pub fn is_cancelled(&self) -> bool {
        self.category() == ErrorCategory::Cancelled
    }

    /// Only curated HTTP statuses are retried; transport failures are not,
    /// since a request may already have reached the server.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Api { status: Some(status), .. } if RETRYABLE_STATUS_CODES.contains(status)
        )
    }

    /// HTTP status behind this error, looking through retry wrappers.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => *status,
            Error::RetriesExhausted { source, .. } | Error::KeysExhausted { source, .. } => {
                source.status_code()
            }
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::InvalidValue { key, message } => {
                Error::Config(format!("Invalid value for {}: {}", key, message))
            }
            config::ConfigError::Missing { key, hint } => {
                Error::Config(format!("{} not set. {}", key, hint))
            }
            config::ConfigError::Io(e) => Error::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::api(401, "Copilot token expired or invalid");
        assert!(err.to_string().contains("Copilot token expired"));
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(Error::api(429, "rate limited").is_retryable());
        assert!(Error::api(503, "unavailable").is_retryable());
        assert!(!Error::api(400, "bad request").is_retryable());
        assert!(!Error::api(501, "not implemented").is_retryable());
        assert!(!Error::auth("Invalid token").is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_status_code_through_wrappers() {
        let err = Error::RetriesExhausted {
            attempts: 3,
            source: Box::new(Error::api(502, "bad gateway")),
        };
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(
            err.to_string(),
            "max retry attempts (3) exceeded: bad gateway"
        );
        assert_eq!(err.category(), ErrorCategory::ResourceLimit);
    }

    #[test]
    fn test_categories() {
        assert!(Error::api(403, "denied").is_authorization_error());
        assert!(Error::Cancelled.is_cancelled());
        assert_eq!(Error::Config("x".into()).category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_config_error_conversion() {
        let err: Error = config::ConfigError::Missing {
            key: "AZURE_OPENAI_ENDPOINT",
            hint: "Set it to your Azure OpenAI resource URL",
        }
        .into();
        assert!(matches!(err, Error::Config(_)));
    }
}
