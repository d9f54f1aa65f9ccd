//! Concurrent warm-up of shared mirrors
//!
//! Before any entry is converted, every distinct destination repository is
//! cloned or fetched in parallel so the sequential conversion phase only
//! runs local `git log` searches. Failures here are not fatal: they are
//! logged and resolution reports them later with full context.

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use super::{MirrorManager, MirrorMode};
use crate::constants::DEFAULT_HEARTBEAT_INTERVAL;
use crate::utils::progress::ProgressBar;

/// Tuning for [`precache`].
#[derive(Debug, Clone)]
pub struct PrecacheOptions {
    /// Upper bound on concurrent git processes; `None` runs one task per mirror
    pub max_parallel: Option<usize>,
    /// Log the still-pending mirrors when nothing finished for this long
    pub heartbeat: Duration,
    /// Draw a progress bar
    pub show_progress: bool,
}

impl Default for PrecacheOptions {
    fn default() -> Self {
        Self {
            max_parallel: None,
            heartbeat: DEFAULT_HEARTBEAT_INTERVAL,
            show_progress: true,
        }
    }
}

/// Outcome of a pre-cache pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrecacheSummary {
    /// Mirrors cloned or fetched successfully
    pub succeeded: usize,
    /// `(url, error)` for every mirror that could not be prepared
    pub failed: Vec<(String, String)>,
    /// Heartbeat intervals that passed without a mirror finishing
    pub heartbeats: usize,
}

/// Clones or fetches the mirrors of all `(url, dependency path)` targets.
///
/// Only [`MirrorMode::SharedMirror`] is pre-cached; in other modes this is a
/// no-op. Targets sharing a mirror directory are prepared once.
pub async fn precache(
    manager: &MirrorManager,
    targets: impl IntoIterator<Item = (String, String)>,
    options: &PrecacheOptions,
) -> PrecacheSummary {
    if !matches!(manager.mode(), MirrorMode::SharedMirror { .. }) {
        return PrecacheSummary::default();
    }

    let mut unique: BTreeMap<PathBuf, (String, String)> = BTreeMap::new();
    for (url, path) in targets {
        if let Some(dir) = manager.clone_path(&url, &path) {
            unique.entry(dir).or_insert((url, path));
        }
    }
    if unique.is_empty() {
        return PrecacheSummary::default();
    }

    let total = unique.len();
    let concurrency = options.max_parallel.unwrap_or(total).clamp(1, total);
    tracing::info!(target: "deps2git::mirror", "Pre-caching {} mirrors ({} at a time)", total, concurrency);

    let progress = if options.show_progress {
        ProgressBar::new(total as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_prefix("Mirroring");

    let mut pending: BTreeSet<String> = unique.values().map(|(url, _)| url.clone()).collect();
    let mut summary = PrecacheSummary::default();

    let mut results = std::pin::pin!(
        stream::iter(unique.into_values())
            .map(|(url, path)| {
                let manager = manager.clone();
                async move {
                    let result = manager.ensure_mirror(&url, &path).await;
                    (url, result)
                }
            })
            .buffer_unordered(concurrency)
    );

    loop {
        match tokio::time::timeout(options.heartbeat, results.next()).await {
            Ok(Some((url, result))) => {
                pending.remove(&url);
                match result {
                    Ok(_) => summary.succeeded += 1,
                    Err(e) => {
                        tracing::warn!(target: "deps2git::mirror", "Failed to pre-cache {}: {:#}", url, e);
                        summary.failed.push((url.clone(), format!("{e:#}")));
                    }
                }
                progress.set_message(url);
                progress.inc(1);
            }
            Ok(None) => break,
            Err(_) => {
                summary.heartbeats += 1;
                let waiting: Vec<&str> = pending.iter().map(String::as_str).collect();
                tracing::info!(
                    target: "deps2git::mirror",
                    "Still waiting on {} mirrors: {}",
                    waiting.len(),
                    waiting.join(", ")
                );
            }
        }
    }

    progress.finish_and_clear();
    tracing::debug!(
        target: "deps2git::mirror",
        "Pre-cache finished: {} ready, {} failed",
        summary.succeeded,
        summary.failed.len()
    );
    summary
}
