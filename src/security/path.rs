//! Path normalization and protected-directory checks.

use std::path::{Component, Path, PathBuf};

use super::SecurityError;

/// System directories no file tool may modify.
pub const PROTECTED_PATHS: &[&str] = &[
    "/etc/", "/usr/", "/bin/", "/sbin/", "/boot/", "/sys/", "/proc/", "/dev/", "/var/", "/lib/",
    "/System/", "/Library/",
];

/// Lexically remove `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(
                        components.last(),
                        Some(Component::RootDir) | Some(Component::Prefix(_))
                    )
                {
                    components.pop();
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Absolute, normalized form of `path`; relative paths are taken from `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Follow symlinks where possible. A file that does not exist yet is
/// resolved through its parent directory.
fn real_path(path: &Path) -> PathBuf {
    if let Ok(real) = std::fs::canonicalize(path) {
        return real;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn protected_prefix(path: &Path) -> Option<&'static str> {
    let text = path.to_string_lossy();
    PROTECTED_PATHS.iter().copied().find(|prefix| {
        let dir = prefix.trim_end_matches('/');
        let aliased = format!("/private{}", prefix);
        text.starts_with(prefix)
            || text == dir
            || text.starts_with(&aliased)
            || text == aliased.trim_end_matches('/')
    })
}

/// Reject paths that land in a protected directory, before or after symlink
/// resolution. Returns the absolute path to operate on.
pub fn check_path_safe(path: &Path, base: &Path) -> Result<PathBuf, SecurityError> {
    if path.as_os_str().is_empty() {
        return Err(SecurityError::InvalidPath("empty path".into()));
    }

    let absolute = resolve_path(path, base);
    let real = real_path(&absolute);

    if let Some(prefix) = protected_prefix(&absolute).or_else(|| protected_prefix(&real)) {
        tracing::debug!(path = %absolute.display(), prefix, "Protected path rejected");
        return Err(SecurityError::ProtectedPath {
            prefix: prefix.to_string(),
            path: absolute,
        });
    }

    Ok(absolute)
}
