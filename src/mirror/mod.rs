//! Repository mirror manager
//!
//! Maps SVN revisions to Git commit ids by searching local clones of the
//! destination repositories for `git-svn-id:` trailers. Clones are created
//! lazily on first reference and updated on later ones.
//!
//! # Modes
//!
//! | mode | on disk | revision search ref |
//! |------|---------|---------------------|
//! | [`MirrorMode::Disabled`] | nothing | none, returns `xxx-r<rev>` |
//! | [`MirrorMode::SharedMirror`] | `root/<escaped url>` bare mirrors | `refs/heads/<default>` or `refs/branch-heads/<b>` |
//! | [`MirrorMode::PerCheckout`] | `root/<dependency path>` clones | `refs/remotes/origin/<default>` or `refs/remotes/branch-heads/<b>` |
//!
//! Shared mirrors are keyed by URL so every checkout on the machine can reuse
//! them; see [`mirror_dir_name`] for the escaping.
//!
//! # Fetch once per run
//!
//! A [`MirrorManager`] remembers which clones it already created or fetched
//! and never fetches the same one twice. Clones of the manager share that
//! record, so the pre-cache phase and the conversion phase cooperate.
//!
//! # Recovery
//!
//! A shared mirror whose clone was killed mid-transfer has an incomplete
//! object store and fails the revision search with
//! [`DepsError::TransferInterrupted`]. The manager then deletes the mirror,
//! clones it again and repeats the search once.

pub mod precache;


use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::constants::{DEFAULT_BRANCH, PLACEHOLDER_REVISION_PREFIX, SHALLOW_CLONE_DEPTH};
use crate::core::DepsError;
use crate::git::{CloneKind, GitRepo};
use crate::utils::fs::{ensure_dir, is_empty_dir, remove_path};

pub use precache::{PrecacheOptions, PrecacheSummary, precache};

/// Where (and whether) revisions are resolved against local clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorMode {
    /// Never touch the disk; revisions become `xxx-r<rev>` placeholders.
    Disabled,
    /// One bare mirror per destination URL under `root`.
    SharedMirror {
        /// Directory holding the mirrors
        root: PathBuf,
        /// Clone with limited history depth
        shallow: bool,
    },
    /// One working clone per dependency at `root/<dependency path>`.
    PerCheckout {
        /// Checkout root
        root: PathBuf,
    },
}

/// Directory name of the shared mirror for `url`.
///
/// Drops the scheme and a trailing `.git`, escapes `-` as `--` and `/` as
/// `-`, and appends `.git`, so distinct URLs never collide:
///
/// ```rust
/// use deps2git::mirror::mirror_dir_name;
///
/// assert_eq!(
///     mirror_dir_name("http://git.chromium.org/chromium/deps/lib-foo.git"),
///     "git.chromium.org-chromium-deps-lib--foo.git"
/// );
/// ```
pub fn mirror_dir_name(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let without_suffix = without_scheme.strip_suffix(".git").unwrap_or(without_scheme);
    let escaped = without_suffix.replace('-', "--").replace('/', "-");
    format!("{escaped}.git")
}

/// Resolves SVN revisions against lazily maintained clones.
#[derive(Debug, Clone)]
pub struct MirrorManager {
    mode: MirrorMode,
    default_branch: String,
    /// Clones already created or fetched during this run
    fetched_repos: Arc<RwLock<HashSet<PathBuf>>>,
}

impl MirrorManager {
    /// Creates a manager searching the `master` branch by default.
    pub fn new(mode: MirrorMode) -> Self {
        Self {
            mode,
            default_branch: DEFAULT_BRANCH.to_string(),
            fetched_repos: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Searches `branch` when a translation carries no branch override.
    #[must_use]
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    /// The configured mode.
    pub const fn mode(&self) -> &MirrorMode {
        &self.mode
    }

    /// Branch searched without an override.
    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Local clone location for a dependency, or `None` when disabled.
    pub fn clone_path(&self, url: &str, dep_path: &str) -> Option<PathBuf> {
        match &self.mode {
            MirrorMode::Disabled => None,
            MirrorMode::SharedMirror {
                root, ..
            } => Some(root.join(mirror_dir_name(url))),
            MirrorMode::PerCheckout {
                root,
            } => Some(root.join(dep_path)),
        }
    }

    const fn clone_kind(&self) -> CloneKind {
        match self.mode {
            MirrorMode::PerCheckout {
                ..
            } => CloneKind::Checkout,
            _ => CloneKind::Mirror,
        }
    }

    /// The ref a revision search walks for the given clone kind and branch.
    pub fn search_ref(&self, kind: CloneKind, branch: Option<&str>) -> String {
        match (kind, branch) {
            (CloneKind::Mirror, None) => format!("refs/heads/{}", self.default_branch),
            (CloneKind::Mirror, Some(branch)) => format!("refs/branch-heads/{branch}"),
            (CloneKind::Checkout, None) => format!("refs/remotes/origin/{}", self.default_branch),
            (CloneKind::Checkout, Some(branch)) => format!("refs/remotes/branch-heads/{branch}"),
        }
    }

    /// Makes sure an up-to-date clone of `url` exists and returns it.
    ///
    /// A missing or empty directory is cloned; a directory that is not a
    /// repository is removed and cloned. An existing clone is fetched unless
    /// this manager already did so during the run. A failed fetch is logged
    /// and the existing state is used.
    ///
    /// # Errors
    ///
    /// Fails in [`MirrorMode::Disabled`] and when the clone fails.
    pub async fn ensure_mirror(&self, url: &str, dep_path: &str) -> Result<GitRepo> {
        let Some(target) = self.clone_path(url, dep_path) else {
            return Err(DepsError::Other {
                message: "mirroring is disabled".to_string(),
            }
            .into());
        };
        let kind = self.clone_kind();

        if self.fetched_repos.read().await.contains(&target) {
            tracing::debug!(target: "deps2git::mirror", "Skipping fetch for {} (already fetched in this run)", url);
            return Ok(GitRepo::new(&target, kind));
        }

        let repo = GitRepo::new(&target, kind);
        if target.exists() && !is_empty_dir(&target).await.unwrap_or(false) {
            if repo.is_git_repo() {
                tracing::debug!(target: "deps2git::mirror", "Fetching updates for {} into {}", url, target.display());
                if let Err(e) = repo.fetch(Some(dep_path)).await {
                    tracing::warn!(target: "deps2git::mirror", "Failed to fetch updates for {}: {:#}", url, e);
                }
                self.fetched_repos.write().await.insert(target);
                return Ok(repo);
            }
            tracing::warn!(
                target: "deps2git::mirror",
                "Removing {} which is not a git repository",
                target.display()
            );
            remove_path(&target).await?;
        }

        self.clone_fresh(url, &target, dep_path).await
    }

    async fn clone_fresh(&self, url: &str, target: &Path, dep_path: &str) -> Result<GitRepo> {
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        // An empty directory left behind would make git refuse the clone
        remove_path(target).await?;

        tracing::info!(target: "deps2git::mirror", "Cloning {} into {}", url, target.display());
        let repo = match &self.mode {
            MirrorMode::SharedMirror {
                shallow, ..
            } => {
                let depth = shallow.then_some(SHALLOW_CLONE_DEPTH);
                GitRepo::clone_mirror(url, target, depth, Some(dep_path)).await
            }
            _ => GitRepo::clone_checkout(url, target, Some(dep_path)).await,
        }
        .with_context(|| format!("Failed to clone {url}"))?;

        // A plain clone does not map refs/branch-heads/*
        if repo.kind() == CloneKind::Checkout {
            repo.fetch(Some(dep_path)).await.with_context(|| format!("Failed to fetch {url}"))?;
        }

        self.fetched_repos.write().await.insert(target.to_path_buf());
        Ok(repo)
    }

    /// Maps SVN `revision` of the repository at `url` to a commit id.
    ///
    /// `host` is the Git host the translation rule produced `url` from and
    /// `branch` the rule's branch override.
    ///
    /// # Errors
    ///
    /// - [`DepsError::UnknownGitHost`] when `url` is not on `host`
    /// - [`DepsError::RevisionNotFound`] when no commit carries the revision
    /// - clone and git failures, with the dependency path attached
    pub async fn resolve_revision(
        &self,
        revision: &str,
        url: &str,
        dep_path: &str,
        host: &str,
        branch: Option<&str>,
    ) -> Result<String> {
        if !url.starts_with(host) {
            return Err(DepsError::UnknownGitHost {
                url: url.to_string(),
                host: host.to_string(),
            }
            .into());
        }

        if self.mode == MirrorMode::Disabled {
            return Ok(format!("{PLACEHOLDER_REVISION_PREFIX}{revision}"));
        }

        let repo = self.ensure_mirror(url, dep_path).await?;
        let reference = self.search_ref(repo.kind(), branch);

        let result = match self.search(&repo, revision, url, &reference, dep_path).await {
            Err(e) if is_transfer_interrupted(&e) && matches!(self.mode, MirrorMode::SharedMirror { .. }) => {
                tracing::warn!(
                    target: "deps2git::mirror",
                    "Mirror {} looks corrupt ({:#}); cloning it again",
                    repo.path().display(),
                    e
                );
                remove_path(repo.path()).await?;
                self.fetched_repos.write().await.remove(repo.path());
                let repo = self.clone_fresh(url, repo.path(), dep_path).await?;
                self.search(&repo, revision, url, &reference, dep_path).await
            }
            result => result,
        };
        result.with_context(|| format!("Failed to resolve {dep_path} ({url}) at r{revision}"))
    }

    async fn search(
        &self,
        repo: &GitRepo,
        revision: &str,
        url: &str,
        reference: &str,
        dep_path: &str,
    ) -> Result<String> {
        match repo.search_svn_revision(revision, reference, Some(dep_path)).await? {
            Some(commit) => {
                tracing::debug!(target: "deps2git::mirror", "{}@{} is {}", url, revision, commit);
                Ok(commit)
            }
            None => Err(DepsError::RevisionNotFound {
                revision: revision.to_string(),
                url: url.to_string(),
                reference: reference.to_string(),
            }
            .into()),
        }
    }
}

fn is_transfer_interrupted(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<DepsError>())
        .any(DepsError::is_transfer_interrupted)
}
