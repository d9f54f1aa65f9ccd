//! Shared helpers for the integration tests

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use deps2git::test_utils::{SvnHistoryRepo, file_url};

/// A scratch project directory with an upstream area for fixture repos.
pub struct TestProject {
    temp: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("project")).unwrap();
        fs::create_dir_all(temp.path().join("upstream")).unwrap();
        Self {
            temp,
        }
    }

    /// Working directory the binary runs in.
    pub fn dir(&self) -> PathBuf {
        self.temp.path().join("project")
    }

    pub fn upstream_dir(&self) -> PathBuf {
        self.temp.path().join("upstream")
    }

    /// Git host of the local upstream area, with a trailing slash.
    pub fn upstream_host(&self) -> String {
        format!("{}/", file_url(&self.upstream_dir()))
    }

    /// Creates `upstream/<name>.git` with one commit per revision.
    pub fn upstream_repo(&self, name: &str, revisions: &[u32]) -> SvnHistoryRepo {
        let svn_url = format!("svn://svn.example.org/trunk/deps/third_party/{name}");
        SvnHistoryRepo::create(self.upstream_dir().join(format!("{name}.git")), &svn_url, revisions).unwrap()
    }

    pub fn write_deps(&self, content: &str) {
        fs::write(self.dir().join("DEPS"), content).unwrap();
    }

    /// Writes `rules.toml` mapping `/trunk/deps/third_party/<name>` to the
    /// upstream area.
    pub fn write_local_rules(&self) -> PathBuf {
        let rules = format!(
            "name = \"local\"\ngit_host = \"{}\"\n\n[[rules]]\nprefix = \"/trunk/deps/third_party/\"\nrepo = \"$1.git\"\n",
            self.upstream_host()
        );
        let path = self.dir().join("rules.toml");
        fs::write(&path, rules).unwrap();
        path
    }

    /// The binary, running in the project directory with progress off.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("deps2git").unwrap();
        cmd.current_dir(self.dir())
            .env("DEPS2GIT_NO_PROGRESS", "1")
            .env_remove("DEPS2GIT_CACHE_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir().join(".DEPS.git")
    }

    pub fn read_output(&self) -> String {
        fs::read_to_string(self.output_path()).unwrap()
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir().join(relative)
    }
}
