//! Permission rules and command pattern matching.
//!
//! A rule pattern is one of:
//! - an exact command string,
//! - a colon-scoped pattern `prefix:suffix` (`git:*`, `npm:install`),
//! - a glob where `*` matches any run of characters (`rm -rf *`),
//! - a bare prefix that matches the command or the command followed by
//!   arguments (`cargo build`).
//!
//! Any of these may be wrapped as `Tool(pattern)`.

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOOL: &str = "Bash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub pattern: String,
    #[serde(default)]
    pub tool: String,
}

impl PermissionRule {
    pub fn new(pattern: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            tool: tool.into(),
        }
    }

    /// Exact-match rule for a shell command.
    pub fn command(pattern: impl Into<String>) -> Self {
        Self::new(pattern, DEFAULT_TOOL)
    }

    /// Parse `Tool(inner)` into its parts; anything else is a shell pattern.
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim();
        match parse_scope(pattern) {
            Some((tool, inner)) => Self::new(inner, tool),
            None => Self::command(pattern),
        }
    }

    /// Inverse of [`PermissionRule::parse`].
    pub fn format(&self) -> String {
        if self.tool.is_empty() || self.tool == DEFAULT_TOOL {
            self.pattern.clone()
        } else {
            format!("{}({})", self.tool, self.pattern)
        }
    }

    pub fn matches(&self, command: &str) -> bool {
        matches_pattern(command, self)
    }
}

/// Split `Tool(inner)`. The tool name must be an identifier and the wrapper
/// must close the string, so shell text such as `echo $(date)` stays whole.
fn parse_scope(s: &str) -> Option<(&str, &str)> {
    let (tool, inner) = s.strip_suffix(')')?.split_once('(')?;
    let mut chars = tool.chars();
    let is_ident = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_ident.then_some((tool, inner))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Allow,
    Deny,
    NoMatch,
}

/// Evaluate deny rules first, then allow rules.
pub fn check_rules(command: &str, allow: &[PermissionRule], deny: &[PermissionRule]) -> MatchResult {
    if deny.iter().any(|rule| rule.matches(command)) {
        return MatchResult::Deny;
    }
    if allow.iter().any(|rule| rule.matches(command)) {
        return MatchResult::Allow;
    }
    MatchResult::NoMatch
}

pub fn matches_pattern(command: &str, rule: &PermissionRule) -> bool {
    let command = command.trim();
    let pattern = rule.pattern.trim();
    let pattern = parse_scope(pattern).map_or(pattern, |(_, inner)| inner);

    if command == pattern {
        return true;
    }

    if let Some((prefix, suffix)) = pattern.split_once(':') {
        return matches_colon(command, prefix, suffix);
    }

    if pattern.contains('*') {
        return matches_glob(command, pattern);
    }

    matches_prefix(command, pattern)
}

fn matches_colon(command: &str, prefix: &str, suffix: &str) -> bool {
    if !matches_prefix(command, prefix) {
        return false;
    }

    let rest = command[prefix.len()..].strip_prefix(' ').unwrap_or_default();
    if suffix == "*" {
        return true;
    }
    if suffix.contains('*') {
        return matches_glob(rest, suffix);
    }
    rest == suffix || rest.split_whitespace().next() == Some(suffix)
}

fn matches_glob(command: &str, pattern: &str) -> bool {
    let regex = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    Regex::new(&regex)
        .map(|re| re.is_match(command))
        .unwrap_or(false)
}

fn matches_prefix(command: &str, pattern: &str) -> bool {
    command == pattern
        || command
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with(' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str) -> PermissionRule {
        PermissionRule::command(pattern)
    }

    #[test]
    fn test_exact_match() {
        assert!(rule("npm test").matches("npm test"));
        assert!(rule("npm test").matches("  npm test  "));
    }

    #[test]
    fn test_colon_wildcard() {
        let r = rule("git:*");
        assert!(r.matches("git status"));
        assert!(r.matches("git"));
        assert!(r.matches("git commit -m x"));
        assert!(!r.matches("gitignore"));
    }

    #[test]
    fn test_colon_exact_suffix() {
        let r = rule("npm:install");
        assert!(r.matches("npm install"));
        assert!(r.matches("npm install lodash"));
        assert!(!r.matches("npm uninstall lodash"));
        assert!(!r.matches("npm"));
    }

    #[test]
    fn test_colon_glob_suffix() {
        let r = rule("docker:run *");
        assert!(r.matches("docker run alpine"));
        assert!(!r.matches("docker ps"));
    }

    #[test]
    fn test_glob() {
        let r = rule("rm -rf *");
        assert!(r.matches("rm -rf /tmp"));
        assert!(!r.matches("rm file"));

        let r = rule("echo a+b *");
        assert!(r.matches("echo a+b hello"));
        assert!(!r.matches("echo aab hello"));
    }

    #[test]
    fn test_prefix() {
        let r = rule("cargo build");
        assert!(r.matches("cargo build --release"));
        assert!(r.matches("cargo build"));
        assert!(!r.matches("cargo builder"));
    }

    #[test]
    fn test_tool_qualified() {
        let r = PermissionRule::new("Bash(git:*)", "Bash");
        assert!(r.matches("git push"));
    }

    #[test]
    fn test_deny_takes_precedence() {
        let allow = vec![rule("rm:*")];
        let deny = vec![rule("rm -rf *")];
        assert_eq!(check_rules("rm -rf /tmp", &allow, &deny), MatchResult::Deny);
        assert_eq!(check_rules("rm file.txt", &allow, &deny), MatchResult::Allow);
        assert_eq!(check_rules("ls", &allow, &deny), MatchResult::NoMatch);
    }

    #[test]
    fn test_parse_and_format() {
        let parsed = PermissionRule::parse("Read(/tmp/*)");
        assert_eq!(parsed, PermissionRule::new("/tmp/*", "Read"));
        assert_eq!(parsed.format(), "Read(/tmp/*)");

        let parsed = PermissionRule::parse("git:*");
        assert_eq!(parsed.tool, "Bash");
        assert_eq!(parsed.format(), "git:*");

        assert_eq!(PermissionRule::new("ls", "").format(), "ls");
    }

    #[test]
    fn test_wrapper_without_tool_field() {
        let r = PermissionRule::new("Bash(git:*)", "");
        assert!(r.matches("git status"));
        assert!(!r.matches("gh pr list"));
    }

    #[test]
    fn test_shell_parentheses_are_not_a_wrapper() {
        let parsed = PermissionRule::parse("echo $(date)");
        assert_eq!(parsed, PermissionRule::command("echo $(date)"));
        assert!(parsed.matches("echo $(date)"));
        assert!(!parsed.matches("date -s 2000-01-01"));

        let parsed = PermissionRule::parse(r#"python -c "print(1)""#);
        assert_eq!(parsed.pattern, r#"python -c "print(1)""#);
        assert_eq!(parsed.tool, "Bash");

        let parsed = PermissionRule::parse("(ls)");
        assert_eq!(parsed.pattern, "(ls)");
        assert_eq!(parsed.format(), "(ls)");
    }
}
