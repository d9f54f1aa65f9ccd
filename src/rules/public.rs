//! The built-in `public` rule set
//!
//! Maps the public Chromium SVN layout onto `http://git.chromium.org/`.
//! URLs under `http://src.chromium.org/svn` are matched on the path that
//! follows it, so `/trunk/deps/...` in the rules below also covers the fully
//! qualified form.

use super::{PatternRule, RuleSet};
use crate::core::DepsError;

/// Name accepted by `--type`.
pub const NAME: &str = "public";

/// Git host every public rule points at.
pub const GIT_HOST: &str = "http://git.chromium.org/";

/// Prefix removed from SVN URLs before matching.
pub const SVN_PREFIX: &str = "http://src.chromium.org/svn";

/// Repository the `webkit_url` variable names.
pub const WEBKIT_URL: &str = "http://git.chromium.org/external/WebKit_trimmed.git";

const WEBKIT_TRUNK: &str = "http://svn.webkit.org/repository/webkit/trunk";

/// Builds the public rule set.
pub fn rule_set() -> RuleSet {
    match build() {
        Ok(set) => set,
        // The patterns below are fixed; a failure here is a programming error
        Err(e) => unreachable!("built-in public rule set is invalid: {e}"),
    }
}

fn build() -> Result<RuleSet, DepsError> {
    let set = RuleSet::new(NAME, GIT_HOST)
        .with_strip_prefix(SVN_PREFIX)
        .with_webkit_url(WEBKIT_URL)
        .override_variable("src/third_party/ffmpeg", "ffmpeg_hash")
        // Repositories that do not follow the directory layout
        .rule(PatternRule::exact("/trunk/deps/page_cycler/acid3", "chromium/deps/acid3.git"))
        .rule(PatternRule::exact("/trunk/deps/canvas_bench", "chromium/canvas_bench.git"))
        .rule(PatternRule::exact(
            "/trunk/deps/gpu/software_rendering_list",
            "chromium/deps/gpu/software_rendering_list.git",
        ))
        .rule(PatternRule::exact("/trunk/tools/third_party/python_26", "chromium/deps/python_26.git"))
        .rule(PatternRule::exact("/trunk/deps/support", "chromium/support.git"))
        .rule(PatternRule::exact("/trunk/deps/frame_rate/content", "chromium/frame_rate/content.git"))
        .rule(PatternRule::exact("svn://svn.chromium.org/jsoncpp/trunk/jsoncpp", "external/jsoncpp/jsoncpp.git"))
        .rule(PatternRule::exact("/trunk/deps/third_party/ffmpeg", "chromium/third_party/ffmpeg.git"))
        .rule(PatternRule::exact("http://webrtc.googlecode.com/svn/stable/src", "external/webrtc/stable/src.git"))
        // Not mirrored
        .rule(PatternRule::exclude_exact("http://selenium.googlecode.com/svn/trunk/py/test"))
        .rule(PatternRule::exclude_exact("/trunk/deps/reference_builds/chrome"))
        // Hosted projects
        .rule(PatternRule::regex(r"^https?://(.*)\.svn\.sourceforge\.net/svnroot/(.*)/trunk(.*)", "external/$2$3.git")?)
        .rule(PatternRule::regex(r"^https?://(.*)\.googlecode\.com/svn/trunk(.*)", "external/$1$2.git")?)
        .rule(PatternRule::regex(r"^https?://(.*)\.googlecode\.com/svn/branches/(.*)", "external/$1/$2.git")?)
        .rule(PatternRule::regex(r"^http://src\.chromium\.org/native_client/trunk/(.*)", "native_client/$1.git")?)
        // Chromium trees
        .rule(PatternRule::regex(r"^/trunk/((src|tools)/.*)", "chromium/$1.git")?)
        // WebKit: the trimmed mirror plus the public API headers
        .rule(
            PatternRule::exact(&format!("{WEBKIT_TRUNK}/Source"), "external/WebKit_trimmed.git")
                .with_path("src/third_party/WebKit"),
        )
        .rule(PatternRule::exact(
            &format!("{WEBKIT_TRUNK}/Source/WebKit/chromium/public"),
            "external/WebKit/Source/WebKit/chromium/public.git",
        ))
        .rule(PatternRule::exact(
            &format!("{WEBKIT_TRUNK}/Source/Platform/chromium/public"),
            "external/WebKit/Source/Platform/chromium/public.git",
        ))
        .rule(PatternRule::exclude_exact("/trunk/deps/third_party/WebKit"))
        .rule(PatternRule::exclude_prefix("http://svn.webkit.org"))
        // Everything else under deps/
        .rule(PatternRule::prefix("/trunk/deps/third_party/", "chromium/deps/$1.git"))
        .rule(PatternRule::prefix("/trunk/deps/reference_builds/", "chromium/reference_builds/$1.git"));

    Ok(set)
}
