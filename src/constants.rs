//! Global constants used throughout deps2git.
//!
//! Timeouts, retry parameters and naming markers that are shared between the
//! mirror manager, the converter and the manifest writer live here so the
//! magic numbers stay discoverable.

use std::time::Duration;

/// Number of reachability probes made for a destination URL before it is
/// recorded as failed.
pub const VERIFY_ATTEMPTS: usize = 5;

/// Delay before the second reachability probe (500ms), doubled after every
/// further failure.
pub const VERIFY_INITIAL_BACKOFF_MS: u64 = 500;

/// Timeout for Git fetch operations (5 minutes).
///
/// Mirrors of large repositories can take a while to update.
pub const GIT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for Git clone operations (1 hour).
///
/// The first mirror clone of a large repository transfers its entire history.
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Timeout for `git ls-remote` reachability probes (30 seconds).
pub const GIT_PING_TIMEOUT: Duration = Duration::from_secs(30);

/// History depth used for shallow mirror clones.
pub const SHALLOW_CLONE_DEPTH: u32 = 10_000;

/// Interval without any pre-cache progress after which a heartbeat is logged.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Branch searched when a translation carries no branch override.
pub const DEFAULT_BRANCH: &str = "master";

/// Revision marker meaning "whatever the tip is"; never resolved.
pub const HEAD_REVISION: &str = "HEAD";

/// Prefix of placeholder revisions emitted when mirroring is disabled.
pub const PLACEHOLDER_REVISION_PREFIX: &str = "xxx-r";

/// Prefix of the token that stands in for a revision held by a variable.
///
/// `url@VARIFY_name` is rendered by the writer as `url' + Var('name')`.
pub const VARIFY_MARKER_PREFIX: &str = "VARIFY_";

/// Reserved variable carrying the destination Git host.
pub const GIT_URL_VAR: &str = "git_url";

/// Reserved variable carrying the WebKit repository URL.
pub const WEBKIT_URL_VAR: &str = "webkit_url";

/// Page describing how to roll and fix converted DEPS by hand.
pub const MANUAL_STEPS_URL: &str = "http://code.google.com/p/chromium/wiki/UsingNewGit";
