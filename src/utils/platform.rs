//! Platform-specific helpers
//!
//! Git executable naming and expansion of user-supplied paths (`~/` and
//! `$VAR` / `${VAR}`) for the command-line path arguments.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Name of the git executable on this platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Expands `~` and environment variables in a user-supplied path.
///
/// # Errors
///
/// Fails when the path references an undefined environment variable or the
/// home directory cannot be determined.
///
/// # Examples
///
/// ```rust,no_run
/// use deps2git::utils::platform::resolve_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let mirrors = resolve_path("~/git-cache")?;
/// let out = resolve_path("$OUT_DIR/.DEPS.git")?;
/// # Ok(())
/// # }
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_command_name() {
        if is_windows() {
            assert_eq!(get_git_command(), "git.exe");
        } else {
            assert_eq!(get_git_command(), "git");
        }
    }

    #[test]
    fn test_resolve_plain_path_unchanged() {
        assert_eq!(resolve_path("relative/DEPS").unwrap(), PathBuf::from("relative/DEPS"));
    }

    #[test]
    fn test_resolve_undefined_variable_fails() {
        assert!(resolve_path("$DEPS2GIT_SURELY_UNDEFINED_VARIABLE/x").is_err());
    }
}
