//! Short-lived bearer credentials and their background refresh.
//!
//! - [`TokenSource`]: issues a fresh credential on demand.
//! - [`TokenManager`]: caches the current credential, refreshes it before
//!   expiry and owns the background refresh task.
//! - [`CopilotTokenSource`]: exchanges a stored GitHub token for a Copilot
//!   API token.
//! - [`DeviceFlow`]: obtains that GitHub token through OAuth device
//!   authorization.

pub mod copilot;
pub mod device;
mod manager;
mod source;
mod storage;

pub use copilot::CopilotTokenSource;
pub use device::{DeviceCode, DeviceFlow, is_logged_in, login, logout};
pub use manager::{DEFAULT_REFRESH_MARGIN, DEFAULT_RETRY_DELAY, TokenManager};
pub use source::{IssuedToken, TokenSource};
pub use storage::{
    GITHUB_TOKEN_FILE, delete_github_token, delete_github_token_at, github_token_path,
    load_github_token, load_github_token_at, save_github_token, save_github_token_at,
};
