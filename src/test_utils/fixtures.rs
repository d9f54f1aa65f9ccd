//! Fixture repositories with imported SVN history

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::git_helper::TestGit;

/// A non-bare repository on `master` with one commit per SVN revision.
pub struct SvnHistoryRepo {
    git: TestGit,
    svn_url: String,
    commits: BTreeMap<u32, String>,
}

impl SvnHistoryRepo {
    /// Creates the repository at `path` and commits `revisions` in order.
    pub fn create(path: impl Into<PathBuf>, svn_url: &str, revisions: &[u32]) -> Result<Self> {
        let git = TestGit::new(path);
        git.init()?;
        let mut repo = Self {
            git,
            svn_url: svn_url.to_string(),
            commits: BTreeMap::new(),
        };
        for &revision in revisions {
            repo.commit(revision)?;
        }
        Ok(repo)
    }

    /// Adds a commit for `revision` on the current branch.
    pub fn commit(&mut self, revision: u32) -> Result<String> {
        let sha = self.git.commit_svn_revision(&self.svn_url, revision)?;
        self.commits.insert(revision, sha.clone());
        Ok(sha)
    }

    /// Commit id created for `revision`, if any.
    pub fn commit_for(&self, revision: u32) -> Option<&str> {
        self.commits.get(&revision).map(String::as_str)
    }

    /// Underlying git helper.
    pub const fn git(&self) -> &TestGit {
        &self.git
    }

    /// `file://` URL of the repository.
    pub fn url(&self) -> String {
        self.git.file_url()
    }
}
