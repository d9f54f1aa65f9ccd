//! Reachability verification of destination URLs
//!
//! A destination that was never mirrored to the Git host makes the converted
//! manifest unusable, so conversion can ping every destination before
//! trusting it. Pings are retried with exponential backoff (0.5s, 1s, 2s,
//! 4s by default) and results are remembered for the rest of the run.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio_retry::Retry;

use crate::constants::{VERIFY_ATTEMPTS, VERIFY_INITIAL_BACKOFF_MS};
use crate::git::GitRepo;

/// Answers whether a remote repository exists.
pub trait Probe: Send + Sync {
    /// Returns true when `url` is reachable.
    fn ping(&self, url: &str) -> impl Future<Output = bool> + Send;
}

/// Probes with `git ls-remote`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitProbe;

impl Probe for GitProbe {
    async fn ping(&self, url: &str) -> bool {
        GitRepo::ping(url).await
    }
}

/// Retrying, memoizing URL verifier.
#[derive(Debug)]
pub struct Verifier<P: Probe> {
    probe: P,
    attempts: usize,
    initial_backoff: Duration,
    results: HashMap<String, bool>,
}

impl<P: Probe> Verifier<P> {
    /// Creates a verifier making up to five attempts per URL.
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            attempts: VERIFY_ATTEMPTS,
            initial_backoff: Duration::from_millis(VERIFY_INITIAL_BACKOFF_MS),
            results: HashMap::new(),
        }
    }

    /// Delay before the second attempt; doubled after each further failure.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Total number of attempts per URL (at least one).
    #[must_use]
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// The probe in use.
    pub const fn probe(&self) -> &P {
        &self.probe
    }

    /// Verifies `url`, pinging it only the first time it is seen.
    pub async fn verify(&mut self, url: &str) -> bool {
        if let Some(&known) = self.results.get(url) {
            return known;
        }
        let reachable = self.ping_with_retry(url).await;
        if reachable {
            tracing::debug!(target: "deps2git::verify", "{} is reachable", url);
        } else {
            tracing::warn!(target: "deps2git::verify", "{} is unreachable after {} attempts", url, self.attempts);
        }
        self.results.insert(url.to_string(), reachable);
        reachable
    }

    async fn ping_with_retry(&self, url: &str) -> bool {
        let strategy = backoff_delays(self.initial_backoff, self.attempts - 1);

        let mut attempt = 0usize;
        Retry::spawn(strategy, || {
            attempt += 1;
            let current = attempt;
            async move {
                if self.probe.ping(url).await {
                    Ok(())
                } else {
                    tracing::debug!(target: "deps2git::verify", "Ping {} of {} failed for {}", current, self.attempts, url);
                    Err(())
                }
            }
        })
        .await
        .is_ok()
    }
}

/// Delays between attempts: `initial`, `2 * initial`, `4 * initial`, ...
fn backoff_delays(initial: Duration, retries: usize) -> impl Iterator<Item = Duration> {
    (0..retries).map(move |n| {
        let shift = u32::try_from(n).unwrap_or(u32::MAX);
        initial.saturating_mul(2u32.saturating_pow(shift))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingProbe {
        succeed_on: Option<usize>,
        calls: Mutex<usize>,
    }

    impl Probe for CountingProbe {
        async fn ping(&self, _url: &str) -> bool {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            self.succeed_on.is_some_and(|n| *calls >= n)
        }
    }

    fn calls(verifier: &Verifier<CountingProbe>) -> usize {
        *verifier.probe().calls.lock().unwrap()
    }

    #[tokio::test]
    async fn test_gives_up_after_five_attempts() {
        let mut verifier = Verifier::new(CountingProbe::default()).with_initial_backoff(Duration::from_millis(1));
        assert!(!verifier.verify("http://h/missing.git").await);
        assert_eq!(calls(&verifier), 5);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let probe = CountingProbe {
            succeed_on: Some(3),
            ..Default::default()
        };
        let mut verifier = Verifier::new(probe).with_initial_backoff(Duration::from_millis(1));
        assert!(verifier.verify("http://h/flaky.git").await);
        assert_eq!(calls(&verifier), 3);
    }

    #[tokio::test]
    async fn test_results_are_memoized() {
        let mut verifier = Verifier::new(CountingProbe::default())
            .with_initial_backoff(Duration::from_millis(1))
            .with_attempts(2);
        assert!(!verifier.verify("http://h/a.git").await);
        assert!(!verifier.verify("http://h/a.git").await);
        assert_eq!(calls(&verifier), 2);
    }

    #[test]
    fn test_default_backoff_schedule() {
        let delays: Vec<_> =
            backoff_delays(Duration::from_millis(VERIFY_INITIAL_BACKOFF_MS), VERIFY_ATTEMPTS - 1).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[test]
    fn test_short_backoff_is_not_truncated() {
        let millis = |initial: u64| -> Vec<u128> {
            backoff_delays(Duration::from_millis(initial), 4).map(|d| d.as_millis()).collect()
        };
        assert_eq!(millis(1), vec![1, 2, 4, 8]);
        assert_eq!(millis(3), vec![3, 6, 12, 24]);

        let micros: Vec<_> = backoff_delays(Duration::from_micros(300), 2).collect();
        assert_eq!(micros, vec![Duration::from_micros(300), Duration::from_micros(600)]);
        assert_eq!(backoff_delays(Duration::from_secs(1), 0).count(), 0);
    }
}
