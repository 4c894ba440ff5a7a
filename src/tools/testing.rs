//! Test utilities for tools module.

#[cfg(test)]
pub mod helpers {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::agent::{Approval, Approver, FileOperation};
    use crate::permissions::{PermissionManager, PermissionStore, SettingsPaths};
    use crate::tools::ExecutionContext;

    /// Approver with fixed answers that records what it was asked.
    #[derive(Debug)]
    pub struct StaticApprover {
        pub command: Approval,
        pub files: bool,
        pub asked: Mutex<Vec<String>>,
    }

    impl StaticApprover {
        pub fn new(command: Approval, files: bool) -> Self {
            Self {
                command,
                files,
                asked: Mutex::new(Vec::new()),
            }
        }

        pub fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Approver for StaticApprover {
        async fn confirm_command(&self, command: &str, _reasoning: &str) -> Approval {
            self.asked.lock().unwrap().push(command.to_string());
            self.command
        }

        async fn confirm_file(
            &self,
            operation: FileOperation,
            path: &Path,
            _preview: Option<&str>,
        ) -> bool {
            self.asked
                .lock()
                .unwrap()
                .push(format!("{} {}", operation, path.display()));
            self.files
        }
    }

    pub struct TestContext {
        _dir: TempDir,
        pub permissions: Arc<PermissionManager>,
        pub approver: Arc<StaticApprover>,
        pub context: ExecutionContext,
    }

    impl TestContext {
        /// Approves everything once.
        pub fn new() -> Self {
            Self::with_approver(StaticApprover::new(
                Approval::Approved(crate::permissions::ApprovalType::Once),
                true,
            ))
        }

        pub fn with_approver(approver: StaticApprover) -> Self {
            let dir = tempfile::tempdir().expect("Failed to create temp directory");
            let root = std::fs::canonicalize(dir.path()).expect("Failed to canonicalize path");
            let paths = SettingsPaths::new(
                root.join(".settings/global.json"),
                Some(root.join(".settings/project.json")),
            );
            let permissions = Arc::new(PermissionManager::new(PermissionStore::in_memory(paths)));
            let approver = Arc::new(approver);
            let context = ExecutionContext::new(&root, Arc::clone(&permissions))
                .with_approver(approver.clone());
            Self {
                _dir: dir,
                permissions,
                approver,
                context,
            }
        }

        pub fn root(&self) -> PathBuf {
            self.context.working_dir().to_path_buf()
        }

        pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
            let path = self.root().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create parent directories");
            }
            std::fs::write(&path, content).expect("Failed to write file");
            path
        }

        pub fn read_file(&self, name: &str) -> String {
            std::fs::read_to_string(self.root().join(name)).expect("Failed to read file")
        }
    }

    impl Default for TestContext {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::helpers::TestContext;

    #[test]
    fn test_root_removed_on_drop() {
        let ctx = TestContext::new();
        let root = ctx.root();
        assert!(root.is_dir());

        drop(ctx);
        assert!(!root.exists());
    }
}
