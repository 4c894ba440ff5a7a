//! Shell command risk classification.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    NeedsConfirm,
    Dangerous,
}

impl RiskLevel {
    pub fn description(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "Safe read-only command",
            RiskLevel::NeedsConfirm => "Command may modify system state",
            RiskLevel::Dangerous => "Potentially dangerous command",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "safe"),
            RiskLevel::NeedsConfirm => write!(f, "needs_confirm"),
            RiskLevel::Dangerous => write!(f, "dangerous"),
        }
    }
}

const SAFE_COMMANDS: &[&str] = &[
    "ls", "cat", "pwd", "echo", "head", "tail", "grep", "find", "which", "whoami", "date", "wc",
    "sort", "uniq", "diff", "env", "printenv", "df", "du", "ps", "top", "tree", "file", "stat",
    "basename", "dirname", "realpath", "ping", "traceroute", "nslookup", "dig",
];

const SAFE_PATTERNS: &[&str] = &[
    r"^git\s+(status|log|diff|branch|show|remote)",
    r"^npm\s+(list|ls|view|info|outdated)",
    r"^pip\s+(list|show|freeze)",
    r"^cargo\s+(tree|search|check)",
    r"^go\s+(list|version|env)",
    r"^docker\s+(ps|images|inspect|logs)",
    r"^kubectl\s+(get|describe|logs)",
];

const DANGEROUS_PATTERNS: &[&str] = &[
    r"rm\s+(-[rf]*\s+)?/",
    r"\bsudo\b",
    r"\bsu\b",
    r"dd\s+if=",
    r"mkfs",
    r":\(\)\{",
    r"curl.*\|\s*(sh|bash|zsh)",
    r"wget.*\|\s*(sh|bash|zsh)",
    r">\s*/dev/sd",
    r"chmod.*777",
    r"chown.*-R\s+",
    r"\beval\b",
    r"\bsource\b",
    r"\bexec\b",
    r">\s*/etc/",
    r"rm\s+-rf\s+[~$]",
    r">\s*/dev/null\s*2>&1\s*&",
    r"\|.*base64.*-d",
    r"python.*-c.*exec",
    r"perl.*-e",
    r"ruby.*-e",
];

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid command pattern"))
        .collect()
}

fn dangerous_regexes() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile_all(DANGEROUS_PATTERNS))
}

fn safe_regexes() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile_all(SAFE_PATTERNS))
}

fn chaining_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[;&|]{1,2}").expect("valid chaining regex"))
}

/// Classify a shell command. Pure and independent of stored settings.
///
/// Dangerous patterns win over everything, then chaining operators force a
/// confirmation, then the read-only allowlist applies.
pub fn classify(command: &str) -> RiskLevel {
    let command = command.trim();
    if command.is_empty() {
        return RiskLevel::Dangerous;
    }

    if dangerous_regexes().iter().any(|re| re.is_match(command)) {
        return RiskLevel::Dangerous;
    }

    if chaining_regex().is_match(command) {
        return RiskLevel::NeedsConfirm;
    }

    let first = command.split_whitespace().next().unwrap_or_default();
    if SAFE_COMMANDS.contains(&first) || safe_regexes().iter().any(|re| re.is_match(command)) {
        return RiskLevel::Safe;
    }

    RiskLevel::NeedsConfirm
}
