//! Agent execution engine.
//!
//! [`Agent::run_turn`] sends the conversation and tool catalog to the model,
//! executes requested tool calls sequentially and loops until the model
//! answers without tools.

mod approval;
mod commands;
mod config;
mod conversation;
mod execution;
mod executor;

pub use approval::{Approval, Approver, DenyAllApprover, FileOperation, TerminalApprover};
pub use commands::SlashCommand;
pub use config::AgentConfig;
pub use conversation::Conversation;
pub use executor::{Agent, AgentBuilder};
