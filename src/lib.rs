//! deps2git - convert Subversion-based gclient DEPS manifests to Git
//!
//! A legacy `DEPS` file pins every dependency to an SVN URL and revision.
//! deps2git rewrites it into `.DEPS.git`, where each dependency points at its
//! Git mirror and, when local mirrors are available, at the Git commit that
//! imported the pinned SVN revision.
//!
//! # Architecture Overview
//!
//! A run is a straight pipeline:
//!
//! 1. [`manifest`] parses the input into a [`manifest::DepsFile`].
//! 2. [`rules`] translates each SVN URL to a Git URL (or excludes it).
//! 3. [`mirror`] keeps local clones and searches them for `git-svn-id`
//!    trailers to map SVN revisions to commit ids.
//! 4. [`convert`] drives the per-entry steps, optional reachability
//!    verification and the pre-cache phase.
//! 5. [`manifest`] writes the result with `Var()` substitutions.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line flags and exit codes
//! - [`convert`] - Conversion orchestration and URL verification
//! - [`core`] - Error types and user-facing error rendering
//! - [`git`] - Thin async wrapper around the system `git` binary
//! - [`manifest`] - DEPS reader, writer and variable handling
//! - [`mirror`] - Mirror modes, clone management and revision search
//! - [`rules`] - Ordered translation rule sets and TOML rule files
//! - [`utils`] - Filesystem, path and progress helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use deps2git::convert::Converter;
//! use deps2git::manifest::DepsFile;
//! use deps2git::mirror::{MirrorManager, MirrorMode};
//! use deps2git::rules::{RuleEngine, public};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let legacy = DepsFile::load(Path::new("DEPS"))?;
//! let engine = RuleEngine::new(public::rule_set());
//! let mirrors = MirrorManager::new(MirrorMode::Disabled);
//!
//! let result = Converter::new(engine, mirrors).convert(legacy).await?;
//! result.manifest.save(Path::new(".DEPS.git"))?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod constants;
pub mod convert;
pub mod core;
pub mod git;
pub mod manifest;
pub mod mirror;
pub mod rules;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
