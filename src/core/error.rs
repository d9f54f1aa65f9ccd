//! Error handling for deps2git
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`DepsError`]) so callers can match on the
//!    failure mode, e.g. the mirror manager retries only on
//!    [`DepsError::TransferInterrupted`].
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and an
//!    actionable suggestion when an error reaches the command line.
//!
//! # Error Categories
//!
//! - **Translation**: [`DepsError::UnmatchedUrl`], [`DepsError::MissingOverrideVariable`]
//! - **Rule sets**: [`DepsError::RuleSetLoad`], [`DepsError::UnknownRuleSet`], [`DepsError::InvalidRule`]
//! - **Manifest**: [`DepsError::ManifestParse`]
//! - **Git / mirrors**: [`DepsError::GitNotFound`], [`DepsError::GitCommandError`],
//!   [`DepsError::GitCloneFailed`], [`DepsError::TransferInterrupted`],
//!   [`DepsError::RevisionNotFound`], [`DepsError::UnknownGitHost`]
//! - **Invocation**: [`DepsError::ConflictingOptions`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use deps2git::core::{DepsError, user_friendly_error};
//!
//! let error = DepsError::UnmatchedUrl {
//!     path: "src/third_party/foo".to_string(),
//!     url: "svn://example.org/foo/trunk".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for deps2git operations.
///
/// Every variant is fatal to a conversion run except
/// [`TransferInterrupted`](DepsError::TransferInterrupted), which the mirror
/// manager recovers from once by re-cloning.
#[derive(Error, Debug, Clone)]
pub enum DepsError {
    /// No rule in any active rule set classified the URL
    #[error("No translation rule matches '{url}' (dependency '{path}')")]
    UnmatchedUrl {
        /// Dependency path as written in the input manifest
        path: String,
        /// Legacy URL that no rule matched
        url: String,
    },

    /// An override names a variable that the input manifest does not define
    #[error("Missing DEPS variable '{variable}' required by override for '{path}'")]
    MissingOverrideVariable {
        /// Dependency path carrying the override
        path: String,
        /// Name of the variable that was expected in the legacy `vars`
        variable: String,
    },

    /// The manifest file is not valid DEPS syntax
    #[error("Invalid DEPS syntax in {file} at line {line}, column {column}: {reason}")]
    ManifestParse {
        /// File being parsed
        file: String,
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
        /// What the parser expected or found
        reason: String,
    },

    /// Command-line options that cannot be combined
    #[error("Conflicting options: {message}")]
    ConflictingOptions {
        /// Which options conflict
        message: String,
    },

    /// An extension rule-set file could not be read or decoded
    #[error("Failed to load rule set from {path}: {reason}")]
    RuleSetLoad {
        /// Path of the rule-set file
        path: String,
        /// Underlying read or decode failure
        reason: String,
    },

    /// A rule inside a rule set is malformed
    #[error("Invalid rule {rule}: {reason}")]
    InvalidRule {
        /// Identifier of the rule (index and matcher)
        rule: String,
        /// Why the rule was rejected
        reason: String,
    },

    /// The deprecated `--type` selector names an unknown rule set
    #[error("Unknown DEPS type '{name}'")]
    UnknownRuleSet {
        /// Selector that was given
        name: String,
    },

    /// A translated URL does not live on the host its rule set declares
    #[error("Unknown git server for '{url}' (expected host {host})")]
    UnknownGitHost {
        /// Translated destination URL
        url: String,
        /// Host declared by the rule that produced the URL
        host: String,
    },

    /// No commit carries the requested legacy revision
    #[error("No commit for revision {revision} of {url} on {reference}")]
    RevisionNotFound {
        /// Legacy revision that was searched for
        revision: String,
        /// Destination repository URL
        url: String,
        /// Ref the search ran against
        reference: String,
    },

    /// Git executable not available
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// Git command failed
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git subcommand that failed
        operation: String,
        /// Error output from the git command
        stderr: String,
    },

    /// Cloning a repository failed
    #[error("Failed to clone repository: {url}")]
    GitCloneFailed {
        /// URL that failed to clone
        url: String,
        /// Error output from git
        reason: String,
    },

    /// A git process died mid-transfer or found a corrupt object store
    #[error("Git {operation} was interrupted or hit an incomplete repository")]
    TransferInterrupted {
        /// The git subcommand that failed
        operation: String,
        /// Error output (or termination signal) from git
        reason: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl DepsError {
    /// Whether the mirror manager should discard the mirror and retry once.
    #[must_use]
    pub const fn is_transfer_interrupted(&self) -> bool {
        matches!(self, Self::TransferInterrupted { .. })
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show the main message in red, optional details in
/// yellow and an optional suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DepsError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: DepsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// The whole `anyhow` chain is searched for a [`DepsError`] so context added
/// with `.with_context(..)` on the way up does not hide the typed cause. The
/// outer context messages are kept as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(deps_error) = error.chain().find_map(|cause| cause.downcast_ref::<DepsError>()) {
        let mut ctx = create_error_context(deps_error.clone());
        let outer: Vec<String> = error
            .chain()
            .take_while(|cause| cause.downcast_ref::<DepsError>().is_none())
            .map(std::string::ToString::to_string)
            .collect();
        if !outer.is_empty() && ctx.details.is_none() {
            ctx.details = Some(outer.join(": "));
        } else if !outer.is_empty() {
            ctx.details = ctx.details.map(|d| format!("{}\n{d}", outer.join(": ")));
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(DepsError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the input, output and mirror paths");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(DepsError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error - include the full chain for diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(DepsError::Other {
        message,
    })
}

fn create_error_context(error: DepsError) -> ErrorContext {
    match &error {
        DepsError::UnmatchedUrl {
            url, ..
        } => ErrorContext::new(error.clone())
            .with_details(format!(
                "Every legacy URL must be classified explicitly; '{url}' was not translated or excluded by any rule"
            ))
            .with_suggestion(
                "Add an exact, prefix or regex rule (or an exclude rule) for this URL to an --extra-rules file",
            ),
        DepsError::MissingOverrideVariable {
            variable, ..
        } => ErrorContext::new(error.clone())
            .with_details(format!(
                "The dependency is pinned through the variable '{variable}', which must be defined in the input vars"
            ))
            .with_suggestion(format!("Add '{variable}' to the vars section of the input DEPS file")),
        DepsError::ManifestParse {
            ..
        } => ErrorContext::new(error.clone()).with_suggestion(
            "Check quotes, brackets and commas near the reported position; only Python literals and Var() are accepted",
        ),
        DepsError::ConflictingOptions {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Run 'deps2git --help' to see which options can be combined"),
        DepsError::RuleSetLoad {
            ..
        }
        | DepsError::InvalidRule {
            ..
        } => ErrorContext::new(error.clone()).with_suggestion(
            "Each [[rules]] entry needs exactly one of exact/prefix/regex and either repo or exclude = true",
        ),
        DepsError::UnknownRuleSet {
            ..
        } => ErrorContext::new(error.clone())
            .with_details("--type is deprecated; only the built-in 'public' rule set is available by name")
            .with_suggestion("Use --extra-rules <file> to supply additional rules"),
        DepsError::UnknownGitHost {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Make the rule's repo template produce a URL under the rule set's git_host"),
        DepsError::RevisionNotFound {
            ..
        } => ErrorContext::new(error.clone())
            .with_details("The Git mirror has no commit with a matching git-svn-id trailer")
            .with_suggestion(
                "Check that the mirror is up to date and that the branch override (if any) is correct",
            ),
        DepsError::GitNotFound => ErrorContext::new(error.clone())
            .with_suggestion("Install git and make sure it is on your PATH")
            .with_details("deps2git drives the system git binary to clone and search mirrors"),
        DepsError::GitCloneFailed {
            url, ..
        } => ErrorContext::new(error.clone())
            .with_details(format!("git clone of {url} failed"))
            .with_suggestion("Check the URL, your network connection and your git credentials"),
        DepsError::GitCommandError {
            stderr, ..
        }
        | DepsError::TransferInterrupted {
            reason: stderr, ..
        } => {
            let ctx = ErrorContext::new(error.clone());
            if stderr.trim().is_empty() {
                ctx
            } else {
                ctx.with_details(stderr.trim().to_string())
            }
        }
        DepsError::Other {
            ..
        } => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_unmatched_url_message() {
        let err = DepsError::UnmatchedUrl {
            path: "src/foo".to_string(),
            url: "svn://x/foo".to_string(),
        };
        assert_eq!(err.to_string(), "No translation rule matches 'svn://x/foo' (dependency 'src/foo')");
    }

    #[test]
    fn test_user_friendly_error_finds_typed_cause_under_context() {
        let err: anyhow::Result<()> = Err(DepsError::MissingOverrideVariable {
            path: "src/third_party/ffmpeg".to_string(),
            variable: "ffmpeg_hash".to_string(),
        }
        .into());
        let err = err.context("Converting deps").unwrap_err();

        let ctx = user_friendly_error(err);
        assert!(matches!(ctx.error, DepsError::MissingOverrideVariable { .. }));
        assert!(ctx.suggestion.as_deref().unwrap().contains("ffmpeg_hash"));
        assert!(ctx.details.as_deref().unwrap().starts_with("Converting deps"));
    }

    #[test]
    fn test_user_friendly_error_generic_chain() {
        let err = anyhow::anyhow!("root").context("outer");
        let ctx = user_friendly_error(err);
        let text = ctx.to_string();
        assert!(text.contains("outer"));
        assert!(text.contains("Caused by:"));
        assert!(text.contains("root"));
    }

    #[test]
    fn test_transfer_interrupted_is_detectable() {
        let err = DepsError::TransferInterrupted {
            operation: "log".to_string(),
            reason: "fatal: bad object".to_string(),
        };
        assert!(err.is_transfer_interrupted());
        assert!(!DepsError::GitNotFound.is_transfer_interrupted());
    }

    #[test]
    fn test_missing_file_gets_path_suggestion() {
        let err = std::fs::read_to_string("/nonexistent/deps2git/DEPS")
            .context("Failed to read DEPS file: /nonexistent/deps2git/DEPS")
            .unwrap_err();

        let ctx = user_friendly_error(err);
        assert!(ctx.error.to_string().contains("Failed to read DEPS file"));
        assert!(ctx.suggestion.as_deref().unwrap().contains("file or directory exists"));
    }
}
