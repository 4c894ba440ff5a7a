//! Built-in tools exposed to the model.
//!
//! File-modifying tools refuse protected system directories and ask the
//! [`Approver`](crate::agent::Approver) before touching disk; shell commands
//! go through the [`PermissionManager`](crate::permissions::PermissionManager).

mod context;
mod delete;
mod edit;
mod execute;
mod list;
mod plan;
mod process;
mod read;
mod registry;
mod search;
mod traits;
mod write;

#[cfg(test)]
pub(crate) mod testing;

pub use context::ExecutionContext;
pub use delete::{DeleteFileInput, DeleteFileTool};
pub use edit::{EditFileInput, EditFileTool, generate_diff};
pub use execute::{ExecuteCommandInput, ExecuteCommandTool, run_shell};
pub use list::{ListDirectoryInput, ListDirectoryTool};
pub use plan::{Plan, PlanItem, PlanStatus, UpdatePlanTool};
pub use read::{MAX_READ_BYTES, ReadFileInput, ReadFileTool};
pub use registry::ToolRegistry;
pub use search::{MAX_SEARCH_RESULTS, SearchFilesInput, SearchFilesTool};
pub use traits::{SchemaTool, Tool};
pub use write::{WriteFileInput, WriteFileTool};
