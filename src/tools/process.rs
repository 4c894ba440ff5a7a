//! Child-process helpers shared by the shell-backed tools.

use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// The child is killed when the timeout elapses; that case is reported as
/// an [`io::ErrorKind::TimedOut`] error.
pub(crate) async fn output_with_timeout(mut cmd: Command, timeout: Duration) -> io::Result<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("timed out after {}s", timeout.as_secs()),
        )),
    }
}

/// Cut `text` to at most `max` bytes without splitting a character.
/// Returns whether anything was removed.
pub(crate) fn truncate_in_place(text: &mut String, max: usize) -> bool {
    if text.len() <= max {
        return false;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    true
}

/// Whether `program` can be found on `PATH`.
pub(crate) fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundary() {
        let mut text = "aé".to_string();
        assert!(truncate_in_place(&mut text, 2));
        assert_eq!(text, "a");

        let mut short = "abc".to_string();
        assert!(!truncate_in_place(&mut short, 10));
        assert_eq!(short, "abc");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = output_with_timeout(cmd, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_on_path() {
        assert!(on_path("sh"));
        assert!(!on_path("definitely-not-a-real-binary-name"));
    }
}
