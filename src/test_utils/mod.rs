//! Test utilities for deps2git
//!
//! Helpers shared by unit and integration tests:
//! - [`init_test_logging`] installs a tracing subscriber once per process
//! - [`TestGit`] prepares fixture repositories with `git-svn-id` history
//! - [`SvnHistoryRepo`] bundles a fixture repository with its revision map
//!
//! # Example
//!
//! ```rust,no_run
//! use deps2git::test_utils::SvnHistoryRepo;
//!
//! # fn example() -> anyhow::Result<()> {
//! let temp = tempfile::TempDir::new()?;
//! let repo = SvnHistoryRepo::create(temp.path().join("libfoo"), "svn://svn.example.org/trunk/libfoo", &[100, 101])?;
//! assert!(repo.commit_for(101).is_some());
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod git_helper;

pub use fixtures::SvnHistoryRepo;
pub use git_helper::{TestGit, file_url};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Respects `RUST_LOG` when no level is given; without either, logging stays
/// off.
///
/// ```bash
/// RUST_LOG=deps2git=debug,git=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
