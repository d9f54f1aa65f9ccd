//! Git operations wrapper for deps2git
//!
//! deps2git never embeds a Git implementation. Like the rest of the gclient
//! tooling it drives the system `git` binary, so SSH agents, credential
//! helpers and `url.<base>.insteadOf` rewrites configured by the user keep
//! working for mirror clones.
//!
//! [`GitRepo`] is a thin handle over a local repository path exposing the
//! handful of operations the mirror manager needs:
//!
//! - [`GitRepo::clone_mirror`] / [`GitRepo::clone_checkout`] to create a mirror
//! - [`GitRepo::fetch`] to update it
//! - [`GitRepo::search_svn_revision`] to map an SVN revision to a commit
//! - [`GitRepo::ping`] to check that a remote exists
//!
//! All operations are async and spawn git as a child process through
//! [`command_builder::GitCommand`].

pub mod command_builder;

#[cfg(test)]
mod tests;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::DepsError;
use command_builder::GitCommand;

/// Flavour of a local clone, which decides how it is fetched and which ref
/// namespace holds the branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneKind {
    /// `git clone --mirror`: branches live under `refs/heads/*` and
    /// `refs/branch-heads/*` exactly as on the remote.
    Mirror,
    /// Regular working clone: branches live under `refs/remotes/origin/*` and
    /// `refs/remotes/branch-heads/*`.
    Checkout,
}

/// Handle to a local Git repository.
///
/// The constructor does not touch the filesystem; use
/// [`is_git_repo`](Self::is_git_repo) to validate the path first.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
    kind: CloneKind,
}

impl GitRepo {
    /// Creates a handle for an existing local repository.
    pub fn new(path: impl AsRef<Path>, kind: CloneKind) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind,
        }
    }

    /// Path of the repository on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Which kind of clone this handle refers to.
    pub const fn kind(&self) -> CloneKind {
        self.kind
    }

    /// Clones `url` as a bare mirror into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::GitCloneFailed`] when git rejects the clone and
    /// [`DepsError::TransferInterrupted`] when the transfer dies midway.
    pub async fn clone_mirror(
        url: &str,
        target: impl AsRef<Path>,
        depth: Option<u32>,
        context: Option<&str>,
    ) -> Result<Self> {
        let target = target.as_ref();
        let mut cmd = GitCommand::clone_mirror(url, target, depth);
        if let Some(ctx) = context {
            cmd = cmd.with_context(ctx);
        }
        cmd.execute_success().await?;
        Ok(Self::new(target, CloneKind::Mirror))
    }

    /// Clones `url` as a working clone into `target` without checking out
    /// files.
    pub async fn clone_checkout(
        url: &str,
        target: impl AsRef<Path>,
        context: Option<&str>,
    ) -> Result<Self> {
        let target = target.as_ref();
        let mut cmd = GitCommand::clone_checkout(url, target);
        if let Some(ctx) = context {
            cmd = cmd.with_context(ctx);
        }
        cmd.execute_success().await?;
        Ok(Self::new(target, CloneKind::Checkout))
    }

    /// Fetches new history from `origin`.
    ///
    /// Repeating a fetch is always safe.
    pub async fn fetch(&self, context: Option<&str>) -> Result<()> {
        let mut cmd = match self.kind {
            CloneKind::Mirror => GitCommand::fetch_mirror(),
            CloneKind::Checkout => GitCommand::fetch_checkout(),
        }
        .current_dir(&self.path);
        if let Some(ctx) = context {
            cmd = cmd.with_context(ctx);
        }
        cmd.execute_success().await
    }

    /// Searches `reference` for the commit converted from SVN `revision`.
    ///
    /// Returns `Ok(None)` when the history contains no matching `git-svn-id`
    /// trailer.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::TransferInterrupted`] when the object store is
    /// incomplete, which is how a clone killed mid-transfer shows up here.
    pub async fn search_svn_revision(
        &self,
        revision: &str,
        reference: &str,
        context: Option<&str>,
    ) -> Result<Option<String>> {
        let mut cmd = GitCommand::svn_search(revision, reference).current_dir(&self.path);
        if let Some(ctx) = context {
            cmd = cmd.with_context(ctx);
        }
        let stdout = match cmd.execute_stdout().await {
            Ok(stdout) => stdout,
            // The branch does not exist in this clone
            Err(e) if is_unknown_revision(&e) => return Ok(None),
            Err(e) => return Err(e),
        };
        let commit = stdout.lines().next().map(str::trim).unwrap_or_default();
        if commit.is_empty() {
            Ok(None)
        } else {
            Ok(Some(commit.to_string()))
        }
    }

    /// Returns true when `url` answers `git ls-remote`.
    ///
    /// Any failure (unknown host, missing repository, timeout) counts as
    /// unreachable; the reason is logged at debug level.
    pub async fn ping(url: &str) -> bool {
        match GitCommand::ls_remote(url).execute_success().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(target: "git", "ls-remote {} failed: {:#}", url, e);
                false
            }
        }
    }

    /// Checks whether the path holds a Git repository (bare or not).
    pub fn is_git_repo(&self) -> bool {
        is_valid_git_repo(&self.path)
    }
}

fn is_unknown_revision(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<DepsError>(),
        Some(DepsError::GitCommandError { stderr, .. })
            if stderr.contains("bad revision") || stderr.contains("unknown revision")
    )
}

/// Checks for a working clone (`.git` entry) or a bare repository
/// (`HEAD` + `objects/` + `refs/`).
pub fn is_valid_git_repo(path: &Path) -> bool {
    if path.join(".git").exists() {
        return true;
    }
    path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
}

/// Runs `git --version` synchronously.
#[must_use]
pub fn is_git_installed() -> bool {
    std::process::Command::new(crate::utils::platform::get_git_command())
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Ensures Git is available on the system.
///
/// # Errors
///
/// Returns [`DepsError::GitNotFound`] when git cannot be executed.
pub fn ensure_git_available() -> Result<()> {
    if !is_git_installed() {
        return Err(DepsError::GitNotFound.into());
    }
    Ok(())
}
