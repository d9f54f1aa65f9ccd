//! Git test helper utilities
//!
//! Builds small local repositories whose commits carry `git-svn-id:` trailers,
//! the way `git svn` leaves them, so revision search can be exercised against
//! `file://` remotes.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Repository UUID used in generated `git-svn-id` trailers.
pub const SVN_REPOSITORY_UUID: &str = "0039d316-1c4b-4281-b951-d872f2087c98";

/// Git command wrapper for tests
///
/// Use this instead of raw `std::process::Command` when preparing fixture
/// repositories.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    /// Create a new TestGit instance for the given repository path
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Creates the directory, runs `git init` and points HEAD at `master`
    /// regardless of the local `init.defaultBranch`.
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.repo_path)
            .with_context(|| format!("Failed to create {}", self.repo_path.display()))?;
        self.run_git_command(&["init"], "Failed to initialize git repository")?;
        self.run_git_command(&["symbolic-ref", "HEAD", "refs/heads/master"], "Failed to set HEAD to master")?;
        self.config_user()
    }

    /// Configure git user for tests
    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(&["config", "user.email", "test@deps2git.example"], "Failed to configure git user email")?;
        self.run_git_command(&["config", "user.name", "Test User"], "Failed to configure git user name")?;
        self.run_git_command(&["config", "commit.gpgsign", "false"], "Failed to disable commit signing")?;
        Ok(())
    }

    /// Commits a change as if imported by `git svn` from `svn_url@revision`,
    /// returning the new commit id.
    pub fn commit_svn_revision(&self, svn_url: &str, revision: u32) -> Result<String> {
        let marker = self.repo_path.join("REVISION");
        std::fs::write(&marker, format!("{revision}\n"))
            .with_context(|| format!("Failed to write {}", marker.display()))?;
        self.run_git_command(&["add", "REVISION"], "Failed to add files to git")?;

        let message = format!("Import r{revision}\n\ngit-svn-id: {svn_url}@{revision} {SVN_REPOSITORY_UUID}\n");
        self.run_git_command(&["commit", "-q", "-m", &message], "Failed to create git commit")?;
        self.rev_parse_head()
    }

    /// Create and checkout a branch
    pub fn create_branch(&self, branch_name: &str) -> Result<()> {
        self.run_git_command(&["checkout", "-q", "-b", branch_name], &format!("Failed to create branch: {branch_name}"))?;
        Ok(())
    }

    /// Checkout a branch or commit
    pub fn checkout(&self, ref_name: &str) -> Result<()> {
        self.run_git_command(&["checkout", "-q", ref_name], &format!("Failed to checkout: {ref_name}"))?;
        Ok(())
    }

    /// Points `refs/branch-heads/<name>` at `commit`, the namespace release
    /// branches are published under.
    pub fn set_branch_head(&self, name: &str, commit: &str) -> Result<()> {
        let reference = format!("refs/branch-heads/{name}");
        self.run_git_command(&["update-ref", &reference, commit], &format!("Failed to update {reference}"))?;
        Ok(())
    }

    /// Get current commit SHA
    pub fn rev_parse_head(&self) -> Result<String> {
        let output = self.run_git_command(&["rev-parse", "HEAD"], "Failed to get current commit SHA")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Return the repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// `file://` URL of the repository.
    pub fn file_url(&self) -> String {
        file_url(&self.repo_path)
    }
}

/// `file://` URL for a local path, with forward slashes on every platform.
pub fn file_url(path: &Path) -> String {
    let path = path.display().to_string().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}
