//! Progress indicators for long-running operations
//!
//! The pre-cache phase clones many repositories at once; a single bar counts
//! finished mirrors and names the last one. Bars are hidden when
//! `DEPS2GIT_NO_PROGRESS` is set; callers also pass `--no-progress` through.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// Environment variable that disables all progress output.
pub const NO_PROGRESS_ENV: &str = "DEPS2GIT_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
///
/// Cloning is cheap (the indicatif bar is reference counted), so the bar can
/// be handed to concurrent tasks.
///
/// ```rust
/// use deps2git::utils::progress::ProgressBar;
///
/// let progress = ProgressBar::new(3);
/// progress.set_prefix("Mirroring");
/// progress.inc(1);
/// progress.finish_and_clear();
/// ```
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a bar for `len` units of work.
    pub fn new(len: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Creates a bar that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Sets the trailing message.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Sets the bold prefix shown before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Advances the bar.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_tracks_position() {
        let bar = ProgressBar::hidden();
        bar.set_prefix("Mirroring");
        bar.set_message("repo.git");
        bar.inc(2);
        assert_eq!(bar.position(), 2);
        bar.finish_and_clear();
    }

    #[test]
    fn test_clones_share_state() {
        let bar = ProgressBar::hidden();
        let other = bar.clone();
        other.inc(1);
        assert_eq!(bar.position(), 1);
    }
}
