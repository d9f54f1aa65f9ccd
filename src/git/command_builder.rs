//! Type-safe Git command builder for consistent command execution
//!
//! Every git invocation in deps2git goes through [`GitCommand`], which owns
//! timeout handling, logging and the translation of failed processes into
//! [`DepsError`] variants. In particular this is the only place that looks at
//! git's stderr to decide whether a failure was an interrupted transfer.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::{GIT_CLONE_TIMEOUT, GIT_FETCH_TIMEOUT, GIT_PING_TIMEOUT};
use crate::core::DepsError;
use crate::utils::platform::get_git_command;

/// stderr fragments git prints when an object store is incomplete, which is
/// what a clone or fetch killed mid-transfer leaves behind.
const INTERRUPTED_TRANSFER_SIGNATURES: &[&str] = &[
    "bad object",
    "missing blob",
    "unable to read",
    "is corrupt",
    "early eof",
    "index-pack failed",
    "did not send all necessary objects",
];

/// Builder for constructing and executing Git commands.
///
/// # Examples
///
/// ```rust,no_run
/// use deps2git::git::command_builder::GitCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let head = GitCommand::new()
///     .args(["rev-parse", "HEAD"])
///     .current_dir("/path/to/repo")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// New commands default to a 5 minute timeout with output captured.
pub struct GitCommand {
    /// Command arguments passed to git
    args: Vec<String>,

    /// Working directory, passed to git as `-C <dir>`
    current_dir: Option<PathBuf>,

    /// Environment variables to set for the git process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Context string included in log lines (usually the dependency path)
    context: Option<String>,

    /// For clone commands, the URL for error messages
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            clone_url: None,
            current_dir: None,
            // Never block on a credential prompt; a missing mirror must fail.
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout_duration: Some(Duration::from_secs(300)),
            context: None,
        }
    }
}

impl GitCommand {
    /// Creates a new Git command builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working directory for the command.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context for logging (e.g., dependency path)
    ///
    /// Log lines are prefixed with `(<context>)`, which keeps the output of
    /// concurrent pre-cache clones apart.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn log_prefix(&self) -> String {
        self.context.as_ref().map(|ctx| format!("({ctx}) ")).unwrap_or_default()
    }

    /// Execute the command and return the output
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let start = std::time::Instant::now();
        let git_command = get_git_command();
        let mut cmd = Command::new(git_command);
        let prefix = self.log_prefix();

        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.clone());
        cmd.args(&full_args);

        tracing::debug!(target: "git", "{}Executing command: {} {}", prefix, git_command, full_args.join(" "));

        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let operation = self.args.first().cloned().unwrap_or_else(|| "unknown".to_string());

        let output_future = cmd.output();
        let output = if let Some(duration) = self.timeout_duration {
            if let Ok(result) = timeout(duration, output_future).await {
                result.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        anyhow::Error::from(DepsError::GitNotFound)
                    } else {
                        anyhow::Error::from(e)
                            .context(format!("Failed to execute git {}", full_args.join(" ")))
                    }
                })?
            } else {
                tracing::warn!(
                    target: "git",
                    "{}Command timed out after {} seconds: git {}",
                    prefix,
                    duration.as_secs(),
                    full_args.join(" ")
                );
                return Err(DepsError::TransferInterrupted {
                    operation,
                    reason: format!(
                        "git {} timed out after {} seconds",
                        full_args.join(" "),
                        duration.as_secs()
                    ),
                }
                .into());
            }
        } else {
            output_future
                .await
                .with_context(|| format!("Failed to execute git {}", full_args.join(" ")))?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();

            tracing::debug!(
                target: "git",
                "{}Command failed with exit code: {:?}",
                prefix,
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "git", "{}Error: {}", prefix, stderr.trim());
            }

            let reason = if stderr.is_empty() {
                stdout
            } else {
                stderr
            };
            return Err(classify_failure(
                operation,
                self.clone_url,
                output.status.code(),
                reason,
            )
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !stdout.is_empty() {
            tracing::trace!(target: "git", "{}{}", prefix, stdout.trim());
        }
        if !stderr.is_empty() {
            tracing::debug!(target: "git", "{}{}", prefix, stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "git::perf", "{}Git {} took {:.2}s", prefix, operation, elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "git::perf", "{}Git {} took {}ms", prefix, operation, elapsed.as_millis());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Execute the command and return only stdout as a trimmed string
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Execute the command and check for success
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Maps a failed git process onto the matching [`DepsError`].
///
/// A process with no exit code was killed by a signal; together with the
/// corrupt-object messages in [`INTERRUPTED_TRANSFER_SIGNATURES`] this is what
/// an interrupted clone looks like.
fn classify_failure(
    operation: String,
    clone_url: Option<String>,
    exit_code: Option<i32>,
    reason: String,
) -> DepsError {
    let lowered = reason.to_lowercase();
    let interrupted = exit_code.is_none()
        || INTERRUPTED_TRANSFER_SIGNATURES.iter().any(|signature| lowered.contains(signature));

    if interrupted {
        return DepsError::TransferInterrupted {
            operation,
            reason: if reason.is_empty() {
                "terminated by signal".to_string()
            } else {
                reason
            },
        };
    }

    if operation == "clone" {
        return DepsError::GitCloneFailed {
            url: clone_url.unwrap_or_else(|| "unknown".to_string()),
            reason,
        };
    }

    DepsError::GitCommandError {
        operation,
        stderr: reason,
    }
}

/// Output from a Git command
pub struct GitCommandOutput {
    /// Standard output from the Git command
    pub stdout: String,
    /// Standard error output from the Git command
    pub stderr: String,
}

// Convenience builders for the operations deps2git needs

impl GitCommand {
    /// `git clone --mirror`, optionally shallow.
    ///
    /// A mirror keeps every ref namespace (`refs/heads`, `refs/branch-heads`,
    /// ...) so revisions on release branches can be searched without extra
    /// refspecs.
    pub fn clone_mirror(url: &str, target: impl AsRef<Path>, depth: Option<u32>) -> Self {
        let mut cmd = Self::new().args(["clone", "--mirror", "--progress"]);
        if let Some(depth) = depth {
            cmd = cmd.arg("--depth").arg(depth.to_string());
        }
        cmd = cmd.arg(url).arg(target.as_ref().display().to_string());
        cmd.clone_url = Some(url.to_string());
        cmd.with_timeout(Some(GIT_CLONE_TIMEOUT))
    }

    /// `git clone --no-checkout` producing a regular working clone.
    pub fn clone_checkout(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new()
            .args(["clone", "--no-checkout", "--progress", url])
            .arg(target.as_ref().display().to_string());
        cmd.clone_url = Some(url.to_string());
        cmd.with_timeout(Some(GIT_CLONE_TIMEOUT))
    }

    /// Fetch for a mirror clone: the remote's refspec already covers all refs.
    pub fn fetch_mirror() -> Self {
        Self::new()
            .args(["fetch", "--prune", "--force", "origin"])
            .with_timeout(Some(GIT_FETCH_TIMEOUT))
    }

    /// Fetch for a working clone, also mapping release branches into
    /// `refs/remotes/branch-heads/*`.
    pub fn fetch_checkout() -> Self {
        Self::new()
            .args([
                "fetch",
                "--force",
                "origin",
                "+refs/heads/*:refs/remotes/origin/*",
                "+refs/branch-heads/*:refs/remotes/branch-heads/*",
            ])
            .with_timeout(Some(GIT_FETCH_TIMEOUT))
    }

    /// `git ls-remote` used as a reachability probe.
    pub fn ls_remote(url: &str) -> Self {
        Self::new()
            .args(["ls-remote", "--heads", url])
            .with_timeout(Some(GIT_PING_TIMEOUT))
    }

    /// Finds the newest commit on `reference` whose `git-svn-id` trailer
    /// names `revision`.
    pub fn svn_search(revision: &str, reference: &str) -> Self {
        Self::new().args([
            "log".to_string(),
            "-E".to_string(),
            "-1".to_string(),
            "--format=%H".to_string(),
            format!("--grep=^git-svn-id: [^@]*@{revision} [-0-9a-f]+$"),
            reference.to_string(),
            "--".to_string(),
        ])
    }
}
