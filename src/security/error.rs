//! Security error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    /// The path resolves into a protected system directory.
    #[error("path {prefix} is protected")]
    ProtectedPath { prefix: String, path: PathBuf },

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
