//! Command-line interface for deps2git.
//!
//! deps2git is a single command: it reads a legacy `DEPS` manifest, converts
//! every dependency and writes `.DEPS.git`.
//!
//! # Mirror modes
//!
//! | Flags | Mode | Revisions |
//! |-------|------|-----------|
//! | (none) | disabled | `xxx-r<rev>` placeholders |
//! | `--cache-dir DIR` | shared mirrors under `DIR` | real commit ids |
//! | `--cache-dir DIR --shallow` | shallow shared mirrors | real commit ids |
//! | `--repos DIR` | one checkout per dependency path | real commit ids |
//!
//! # Exit codes
//!
//! - `0`: the output manifest was written
//! - `1`: a fatal error aborted the run; nothing was written
//! - `2`: some destination URLs failed `--verify`; the manifest is not
//!   written, the `--json` report is
//!
//! # Examples
//!
//! ```bash
//! # Placeholder revisions, no git access
//! deps2git --deps DEPS --out .DEPS.git
//!
//! # Real commit ids from shared mirrors, with reachability checks
//! deps2git --cache-dir ~/.cache/deps2git --verify --json failures.json
//!
//! # Extra rules for private repositories
//! deps2git --extra-rules ./internal_rules.toml --repos ./checkout
//! ```

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::constants::{DEFAULT_BRANCH, DEFAULT_HEARTBEAT_INTERVAL, MANUAL_STEPS_URL};
use crate::convert::{Converter, GitProbe, Verifier};
use crate::core::DepsError;
use crate::git::ensure_git_available;
use crate::manifest::DepsFile;
use crate::mirror::{MirrorManager, MirrorMode, PrecacheOptions};
use crate::rules::{RuleEngine, loader, public};
use crate::utils::fs::atomic_write;
use crate::utils::platform::resolve_path;

/// Exit code when some destination URLs failed verification.
pub const EXIT_VERIFY_FAILED: i32 = 2;

/// Runtime settings derived from the verbosity and progress flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether progress bars may be drawn
    pub show_progress: bool,
}

/// Convert a Subversion-based DEPS file into a Git-based one.
#[derive(Parser, Debug)]
#[command(
    name = "deps2git",
    about = "Convert a Subversion-based DEPS file into a Git-based .DEPS.git",
    version,
    long_about = "deps2git translates every SVN dependency of a gclient DEPS manifest to its \
                  Git mirror and, when mirrors are available, replaces SVN revisions with \
                  the matching Git commit ids."
)]
pub struct Cli {
    /// Input DEPS file
    #[arg(short, long, default_value = "DEPS", value_name = "FILE")]
    deps: String,

    /// Output file
    #[arg(short, long, default_value = ".DEPS.git", value_name = "FILE")]
    out: String,

    /// TOML file with rules that take precedence over the built-in ones
    #[arg(short, long = "extra-rules", value_name = "FILE")]
    extra_rules: Option<String>,

    /// Built-in rule set to use (deprecated, only `public` exists)
    #[arg(short = 't', long = "type", value_name = "NAME")]
    deps_type: Option<String>,

    /// Directory holding shared bare mirrors, one per repository
    #[arg(short, long, env = "DEPS2GIT_CACHE_DIR", value_name = "DIR")]
    cache_dir: Option<String>,

    /// Directory holding one checkout per dependency path
    #[arg(short, long, value_name = "DIR")]
    repos: Option<String>,

    /// Create shared mirrors as shallow clones (requires --cache-dir)
    #[arg(long)]
    shallow: bool,

    /// Check that every destination repository exists with `git ls-remote`
    #[arg(long)]
    verify: bool,

    /// Write a JSON report of verification failures to FILE
    #[arg(long, value_name = "FILE")]
    json: Option<String>,

    /// Branch searched when a rule does not name one
    #[arg(long, default_value = DEFAULT_BRANCH, value_name = "BRANCH")]
    default_branch: String,

    /// Maximum number of mirrors cloned or fetched at once
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(usize))]
    max_parallel: Option<usize>,

    /// Seconds without progress before pending mirrors are logged
    #[arg(long, default_value_t = DEFAULT_HEARTBEAT_INTERVAL.as_secs(), value_name = "SECS")]
    heartbeat_secs: u64,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
}

/// Content of the `--json` report.
#[derive(Debug, Serialize)]
struct FailureReport<'a> {
    generated_at: String,
    input: String,
    failed_urls: &'a BTreeSet<String>,
}

impl Cli {
    /// Logging and progress settings for this invocation.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };
        CliConfig {
            log_level: log_level.to_string(),
            show_progress: !self.no_progress && !self.quiet,
        }
    }

    /// Rejects option combinations that have no meaning together.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::ConflictingOptions`] naming the offending flags.
    pub fn validate(&self) -> Result<(), DepsError> {
        let conflict = |message: &str| {
            Err(DepsError::ConflictingOptions {
                message: message.to_string(),
            })
        };
        if self.extra_rules.is_some() && self.deps_type.is_some() {
            return conflict("--extra-rules and --type cannot be used together");
        }
        if self.cache_dir.is_some() && self.repos.is_some() {
            return conflict("--cache-dir and --repos cannot be used together");
        }
        if self.shallow && self.cache_dir.is_none() {
            return conflict("--shallow requires --cache-dir");
        }
        if self.verbose && self.quiet {
            return conflict("--verbose and --quiet cannot be used together");
        }
        if self.max_parallel == Some(0) {
            return conflict("--max-parallel must be at least 1");
        }
        Ok(())
    }

    /// Runs the conversion and returns the process exit code.
    ///
    /// # Errors
    ///
    /// Any fatal condition; nothing is written in that case.
    pub async fn execute(self) -> Result<i32> {
        self.validate()?;
        if let Some(name) = &self.deps_type {
            tracing::warn!("--type is deprecated; use --extra-rules instead");
            tracing::debug!("Using built-in rule set '{}'", name);
        }

        let deps_path = resolve_path(&self.deps)?;
        let out_path = resolve_path(&self.out)?;
        let engine = self.rule_engine()?;
        let mode = self.mirror_mode()?;

        if self.verify || !matches!(mode, MirrorMode::Disabled) {
            ensure_git_available()?;
        }

        let legacy = DepsFile::load(&deps_path)?;
        tracing::info!("Converting {} ({} dependencies)", deps_path.display(), legacy.entry_count());

        let mirrors = MirrorManager::new(mode).with_default_branch(self.default_branch.clone());
        let converter = Converter::new(engine, mirrors).with_precache_options(self.precache_options());
        let result = if self.verify {
            converter.with_verifier(Verifier::new(GitProbe)).convert(legacy).await?
        } else {
            converter.convert(legacy).await?
        };

        if let Some(json) = &self.json {
            let report_path = resolve_path(json)?;
            write_report(&report_path, &deps_path, &result.failed_urls)?;
        }

        if !result.is_clean() {
            eprintln!("{}", "The following dependencies could not be verified:".red().bold());
            for url in &result.failed_urls {
                eprintln!("  {url}");
            }
            eprintln!("{} {}", "Manual steps may be required, see".yellow(), MANUAL_STEPS_URL);
            return Ok(EXIT_VERIFY_FAILED);
        }

        result.manifest.save(&out_path)?;
        tracing::info!("Wrote {}", out_path.display());
        Ok(0)
    }

    fn rule_engine(&self) -> Result<RuleEngine> {
        let base = match &self.deps_type {
            Some(name) => loader::named(name)?,
            None => public::rule_set(),
        };
        let mut engine = RuleEngine::new(base);
        if let Some(file) = &self.extra_rules {
            let path = resolve_path(file)?;
            let extension = loader::load_file(&path, public::GIT_HOST)?;
            tracing::info!("Loaded {} extra rules from {}", extension.len(), path.display());
            engine = engine.with_extension(extension);
        }
        Ok(engine)
    }

    fn mirror_mode(&self) -> Result<MirrorMode> {
        let mode = match (&self.cache_dir, &self.repos) {
            (Some(dir), _) => MirrorMode::SharedMirror {
                root: resolve_path(dir)?,
                shallow: self.shallow,
            },
            (None, Some(dir)) => MirrorMode::PerCheckout {
                root: resolve_path(dir)?,
            },
            (None, None) => MirrorMode::Disabled,
        };
        Ok(mode)
    }

    fn precache_options(&self) -> PrecacheOptions {
        PrecacheOptions {
            max_parallel: self.max_parallel,
            heartbeat: Duration::from_secs(self.heartbeat_secs.max(1)),
            show_progress: self.build_config().show_progress,
        }
    }
}

fn write_report(path: &Path, input: &Path, failed_urls: &BTreeSet<String>) -> Result<()> {
    let report = FailureReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        input: input.display().to_string(),
        failed_urls,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize failure report")?;
    atomic_write(path, format!("{json}\n").as_bytes())
        .with_context(|| format!("Failed to write failure report to {}", path.display()))?;
    tracing::debug!("Wrote failure report to {}", path.display());
    Ok(())
}
