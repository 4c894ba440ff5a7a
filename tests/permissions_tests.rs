//! Security & Permissions Tests
//!
//! Permission decisions over real settings files, approvals that persist
//! across reloads, and path-safety enforcement in file tools.
//!
//! Run: cargo test --test permissions_tests

use std::path::Path;
use std::sync::Arc;

use ai_agent::permissions::{ApprovalType, PermissionManager, PermissionStatus, SettingsPaths};
use tempfile::tempdir;

fn paths(root: &Path) -> SettingsPaths {
    SettingsPaths::new(
        root.join("global/settings.json"),
        Some(root.join("project/.ai-agent/settings.json")),
    )
}

fn write_json(path: &Path, value: serde_json::Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

// =============================================================================
// Permissions
// =============================================================================

mod permission_tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let dir = tempdir().unwrap();
        let manager = PermissionManager::load(paths(dir.path())).unwrap();

        assert!(manager.check("ls -la").is_allowed());
        assert!(manager.check("git status").is_allowed());
        assert!(manager.check("mkdir build").needs_confirmation());

        let dangerous = manager.check("rm -rf /");
        assert!(dangerous.is_denied());
        assert_eq!(
            dangerous.reason,
            "Dangerous command blocked (use /allow-dangerous to enable)"
        );
    }

    #[test]
    fn test_project_rules_union_and_override() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        write_json(
            &paths.global,
            serde_json::json!({
                "permissions": {"allow": [{"pattern": "npm run *"}], "deny": []}
            }),
        );
        write_json(
            paths.project.as_ref().unwrap(),
            serde_json::json!({
                "permissions": {"allow": [], "deny": [{"pattern": "npm run deploy"}]},
                "auto_allow_safe_commands": false
            }),
        );

        let manager = PermissionManager::load(paths).unwrap();
        assert!(manager.check("npm run test").is_allowed());
        assert!(manager.check("npm run deploy").is_denied());
        assert_eq!(
            manager.check("ls").status,
            PermissionStatus::NeedsConfirmation
        );
    }

    #[test]
    fn test_hand_written_wrapped_rule_applies() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        write_json(
            &paths.global,
            serde_json::json!({
                "permissions": {"allow": [], "deny": [{"pattern": "Bash(git:*)"}]}
            }),
        );

        let manager = PermissionManager::load(paths).unwrap();
        let result = manager.check("git status");
        assert!(result.is_denied());
        assert_eq!(result.reason, "Command blocked by deny rule");
        assert!(manager.check("ls").is_allowed());
    }

    #[test]
    fn test_always_approval_survives_reload() {
        let dir = tempdir().unwrap();
        let manager = PermissionManager::load(paths(dir.path())).unwrap();

        assert!(manager.check("cargo build").needs_confirmation());
        manager
            .add_to_allowlist("cargo build", ApprovalType::Always)
            .unwrap();
        assert!(manager.check("cargo build").is_allowed());

        let reloaded = PermissionManager::load(paths(dir.path())).unwrap();
        assert!(reloaded.check("cargo build").is_allowed());
        assert!(reloaded.allow_rules().contains(&"cargo build".to_string()));
    }

    #[test]
    fn test_session_approval_not_persisted() {
        let dir = tempdir().unwrap();
        let manager = PermissionManager::load(paths(dir.path())).unwrap();

        manager
            .add_to_allowlist("make install", ApprovalType::Session)
            .unwrap();
        assert!(manager.check("make install").is_allowed());
        assert_eq!(manager.summary().session_count, 1);

        manager.clear_session();
        assert!(manager.check("make install").needs_confirmation());

        let reloaded = PermissionManager::load(paths(dir.path())).unwrap();
        assert!(reloaded.check("make install").needs_confirmation());
    }

    #[test]
    fn test_dangerous_toggle_still_confirms() {
        let dir = tempdir().unwrap();
        let manager = PermissionManager::load(paths(dir.path())).unwrap();

        manager.enable_dangerous().unwrap();
        assert!(manager.check("sudo reboot").needs_confirmation());

        manager.disable_dangerous().unwrap();
        assert!(manager.check("sudo reboot").is_denied());
    }

    #[test]
    fn test_pattern_rules_persist() {
        let dir = tempdir().unwrap();
        let manager = PermissionManager::load(paths(dir.path())).unwrap();

        manager.add_pattern_rule("docker:*", false).unwrap();
        manager.add_pattern_rule("docker rm *", true).unwrap();

        let reloaded = PermissionManager::load(paths(dir.path())).unwrap();
        assert!(reloaded.check("docker ps").is_allowed());
        assert!(reloaded.check("docker rm web").is_denied());
        assert_eq!(reloaded.deny_rules(), vec!["docker rm *".to_string()]);
    }
}

// =============================================================================
// Path safety
// =============================================================================

mod path_safety_tests {
    use super::*;
    use ai_agent::agent::{Approval, Approver, FileOperation};
    use ai_agent::permissions::PermissionStore;
    use ai_agent::tools::{DeleteFileTool, ExecutionContext, Tool, WriteFileTool};
    use async_trait::async_trait;

    struct YesApprover;

    #[async_trait]
    impl Approver for YesApprover {
        async fn confirm_command(&self, _: &str, _: &str) -> Approval {
            Approval::Approved(ApprovalType::Once)
        }

        async fn confirm_file(&self, _: FileOperation, _: &Path, _: Option<&str>) -> bool {
            true
        }
    }

    fn context(root: &Path) -> ExecutionContext {
        let manager = PermissionManager::new(PermissionStore::in_memory(paths(root)));
        ExecutionContext::new(root, Arc::new(manager)).with_approver(Arc::new(YesApprover))
    }

    #[tokio::test]
    async fn test_write_to_protected_dir_blocked() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let result = WriteFileTool
            .execute(
                serde_json::json!({"path": "/etc/ai-agent-test.conf", "content": "x"}),
                &ctx,
            )
            .await;
        assert!(result.is_error());
        assert!(result.text().starts_with("Blocked:"));
        assert!(!Path::new("/etc/ai-agent-test.conf").exists());
    }

    #[tokio::test]
    async fn test_traversal_into_protected_dir_blocked() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let escape = format!(
            "{}/../../../../../../usr/bin/ai-agent-test",
            dir.path().display()
        );
        let result = WriteFileTool
            .execute(serde_json::json!({"path": escape, "content": "x"}), &ctx)
            .await;
        assert!(result.text().starts_with("Blocked:"));
    }

    #[tokio::test]
    async fn test_delete_requires_dangerous_mode() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("old.log");
        std::fs::write(&file, "log").unwrap();
        let ctx = context(dir.path());

        let result = DeleteFileTool
            .execute(serde_json::json!({"path": "old.log"}), &ctx)
            .await;
        assert!(result.text().starts_with("Delete blocked"));
        assert!(file.exists());

        ctx.permissions().enable_dangerous().unwrap();
        let result = DeleteFileTool
            .execute(serde_json::json!({"path": "old.log"}), &ctx)
            .await;
        assert!(!result.is_error(), "{}", result.text());
        assert!(!file.exists());
    }
}
