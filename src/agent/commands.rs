//! Slash commands for the interactive session.

use std::fmt::Write;

use super::conversation::Conversation;
use super::executor::Agent;
use crate::Result;

/// A parsed `/command` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// `/allow <pattern>`: persistent allow rule.
    Allow(String),
    /// `/deny <pattern>`: persistent deny rule.
    Deny(String),
    AllowDangerous,
    DisallowDangerous,
    ShowPermissions,
    ClearSession,
    Clear,
    Plan,
    Help,
    Unknown(String),
}

impl SlashCommand {
    /// Parse `input` as a slash command. Returns `None` for ordinary chat input.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if !input.starts_with('/') {
            return None;
        }

        let (name, arg) = match input.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (input, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "/allow" => SlashCommand::Allow(arg.to_string()),
            "/deny" => SlashCommand::Deny(arg.to_string()),
            "/allow-dangerous" => SlashCommand::AllowDangerous,
            "/disallow-dangerous" => SlashCommand::DisallowDangerous,
            "/show-permissions" => SlashCommand::ShowPermissions,
            "/clear-session" => SlashCommand::ClearSession,
            "/clear" | "/c" => SlashCommand::Clear,
            "/plan" => SlashCommand::Plan,
            "/help" | "/h" => SlashCommand::Help,
            other => SlashCommand::Unknown(other.to_string()),
        };
        Some(command)
    }

    /// Execute against `agent` and `conversation`, returning the text to show
    /// the user. Only settings persistence failures are errors.
    pub fn apply(&self, agent: &Agent, conversation: &mut Conversation) -> Result<String> {
        let permissions = agent.permissions();
        let message = match self {
            SlashCommand::Allow(pattern) if pattern.is_empty() => ALLOW_USAGE.to_string(),
            SlashCommand::Allow(pattern) => {
                permissions.add_pattern_rule(pattern, false)?;
                format!("✓ Added allow rule: {}", pattern)
            }
            SlashCommand::Deny(pattern) if pattern.is_empty() => DENY_USAGE.to_string(),
            SlashCommand::Deny(pattern) => {
                permissions.add_pattern_rule(pattern, true)?;
                format!(
                    "✓ Added deny rule: {} (takes precedence over allow rules)",
                    pattern
                )
            }
            SlashCommand::AllowDangerous => {
                permissions.enable_dangerous()?;
                "⚠️  Dangerous commands enabled\n\
                 Note: You will still be asked to confirm before execution"
                    .to_string()
            }
            SlashCommand::DisallowDangerous => {
                permissions.disable_dangerous()?;
                "Dangerous commands disabled".to_string()
            }
            SlashCommand::ShowPermissions => show_permissions(agent),
            SlashCommand::ClearSession => {
                permissions.clear_session();
                "Session allowlist cleared.".to_string()
            }
            SlashCommand::Clear => {
                conversation.clear();
                agent.clear_plan();
                "Conversation cleared.".to_string()
            }
            SlashCommand::Plan => match agent.current_plan() {
                Some(plan) => plan.to_string(),
                None => "No active plan.".to_string(),
            },
            SlashCommand::Help => HELP.to_string(),
            SlashCommand::Unknown(name) => {
                format!("Unknown command: {}\nType /help for available commands", name)
            }
        };
        Ok(message)
    }
}

const ALLOW_USAGE: &str = "Usage: /allow <pattern>
Examples:
  /allow git:*         Allow all git commands
  /allow npm run *     Allow npm run with any script
  /allow ls -la        Allow specific command";

const DENY_USAGE: &str = "Usage: /deny <pattern>
Examples:
  /deny rm *           Block all rm commands
  /deny curl *         Block all curl commands";

const HELP: &str = "Commands:
  /clear, /c               Clear conversation history
  /plan                    Show current task plan/checklist
  /allow-dangerous         Allow dangerous commands (with confirmation)
  /disallow-dangerous      Block dangerous commands again
  /show-permissions        Show permission settings and rules
  /allow <pattern>         Add persistent allow rule (e.g., git:*)
  /deny <pattern>          Add persistent deny rule (takes precedence)
  /clear-session           Clear session-only permissions
  /help, /h                Show this help";

fn show_permissions(agent: &Agent) -> String {
    let permissions = agent.permissions();
    let summary = permissions.summary();
    let on_off = |b: bool| if b { "enabled" } else { "disabled" };

    let mut out = String::from("Permission settings:\n");
    let _ = writeln!(
        out,
        "  Auto-allow safe commands: {}",
        on_off(summary.auto_allow_safe_commands)
    );
    let _ = writeln!(
        out,
        "  Dangerous commands:       {}",
        on_off(summary.dangerous_enabled)
    );
    let _ = writeln!(out, "  Session approvals:        {}", summary.session_count);
    let _ = writeln!(out, "  Global settings:          {}", summary.global_path.display());
    if let Some(project) = &summary.project_path {
        let _ = writeln!(out, "  Project settings:         {}", project.display());
    }

    for (title, rules) in [
        ("Allow rules", permissions.allow_rules()),
        ("Deny rules", permissions.deny_rules()),
    ] {
        let _ = writeln!(out, "\n{}:", title);
        if rules.is_empty() {
            out.push_str("  (none)\n");
        }
        for rule in rules {
            let _ = writeln!(out, "  {}", rule);
        }
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::client::{ChatProvider, TextSink};
    use crate::permissions::{PermissionManager, PermissionStore, SettingsPaths};
    use crate::types::{ChatRequest, ChatResponse, Message};

    struct SilentProvider;

    #[async_trait]
    impl ChatProvider for SilentProvider {
        fn name(&self) -> &str {
            "silent"
        }

        async fn query(&self, _: ChatRequest, _: &CancellationToken) -> Result<ChatResponse> {
            Ok(ChatResponse::from_message(Message::assistant("")))
        }

        async fn query_streaming(
            &self,
            request: ChatRequest,
            _: &mut TextSink<'_>,
            cancel: &CancellationToken,
        ) -> Result<ChatResponse> {
            self.query(request, cancel).await
        }
    }

    fn agent(dir: &tempfile::TempDir) -> Agent {
        let paths = SettingsPaths::new(
            dir.path().join("global.json"),
            Some(dir.path().join("project.json")),
        );
        Agent::builder(Arc::new(SilentProvider))
            .permissions(Arc::new(PermissionManager::new(PermissionStore::in_memory(
                paths,
            ))))
            .working_dir(dir.path())
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(SlashCommand::parse("hello"), None);
        assert_eq!(
            SlashCommand::parse("/allow git:*"),
            Some(SlashCommand::Allow("git:*".into()))
        );
        assert_eq!(
            SlashCommand::parse("  /deny   rm * "),
            Some(SlashCommand::Deny("rm *".into()))
        );
        assert_eq!(SlashCommand::parse("/allow"), Some(SlashCommand::Allow(String::new())));
        assert_eq!(SlashCommand::parse("/C"), Some(SlashCommand::Clear));
        assert_eq!(
            SlashCommand::parse("/allow-dangerous"),
            Some(SlashCommand::AllowDangerous)
        );
        assert_eq!(
            SlashCommand::parse("/nope"),
            Some(SlashCommand::Unknown("/nope".into()))
        );
    }

    #[test]
    fn test_rules_and_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir);
        let mut conversation = Conversation::new("sys");

        let msg = SlashCommand::Allow("git:*".into())
            .apply(&agent, &mut conversation)
            .unwrap();
        assert_eq!(msg, "✓ Added allow rule: git:*");
        assert!(agent.permissions().check("git status --short").is_allowed());

        let msg = SlashCommand::Deny("git push*".into())
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(msg.contains("takes precedence"));
        assert!(agent.permissions().check("git push origin").is_denied());

        let usage = SlashCommand::Allow(String::new())
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(usage.starts_with("Usage: /allow <pattern>"));

        SlashCommand::AllowDangerous
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(agent.permissions().dangerous_enabled());
        SlashCommand::DisallowDangerous
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(!agent.permissions().dangerous_enabled());

        let shown = SlashCommand::ShowPermissions
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(shown.contains("git:*"));
        assert!(shown.contains("git push*"));
    }

    #[test]
    fn test_rules_with_shell_parentheses() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir);
        let mut conversation = Conversation::new("sys");
        let permissions = agent.permissions();

        SlashCommand::parse("/allow echo $(touch stamp)")
            .unwrap()
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(permissions.check("echo $(touch stamp)").is_allowed());
        assert!(permissions.check("touch stamp").needs_confirmation());
        assert_eq!(
            permissions.allow_rules(),
            vec!["echo $(touch stamp)".to_string()]
        );

        SlashCommand::parse(r#"/deny python -c "print(1)""#)
            .unwrap()
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(permissions.check(r#"python -c "print(1)""#).is_denied());
        assert_eq!(
            permissions.deny_rules(),
            vec![r#"python -c "print(1)""#.to_string()]
        );

        SlashCommand::parse("/deny Bash(curl:*)")
            .unwrap()
            .apply(&agent, &mut conversation)
            .unwrap();
        assert!(permissions.check("curl https://example.com").is_denied());
    }

    #[test]
    fn test_clear_and_plan() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir);
        let mut conversation =
            Conversation::from_messages(vec![Message::system("sys"), Message::user("hi")]);

        assert_eq!(
            SlashCommand::Plan.apply(&agent, &mut conversation).unwrap(),
            "No active plan."
        );
        assert_eq!(
            SlashCommand::Clear.apply(&agent, &mut conversation).unwrap(),
            "Conversation cleared."
        );
        assert_eq!(conversation.len(), 1);
        assert!(
            SlashCommand::Unknown("/x".into())
                .apply(&agent, &mut conversation)
                .unwrap()
                .starts_with("Unknown command: /x")
        );
    }
}
