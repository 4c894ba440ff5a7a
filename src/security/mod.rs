//! Filesystem safety checks for tool operations.
//!
//! Mutating file tools (write, edit, delete) refuse paths that resolve into
//! protected system directories. Resolution follows symlinks, so a link in a
//! user directory pointing at `/etc` is caught as well.

pub mod path;

mod error;

pub use error::SecurityError;
pub use path::{PROTECTED_PATHS, check_path_safe, normalize_path, resolve_path};
