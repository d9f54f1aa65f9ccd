//! URL translation rule engine
//!
//! Translates a legacy `(dependency path, SVN URL)` pair into the Git location
//! that replaces it. Translation is driven by ordered rule sets:
//!
//! - A [`RuleSet`] is an ordered list of [`TranslationRule`]s plus the Git host
//!   its rules point at and the override variables it declares.
//! - A [`RuleEngine`] holds the base rule set and an optional extension set.
//!   The extension is consulted first, so its rules win.
//! - Inside a set the **first** rule that returns something other than
//!   [`MatchResult::NoMatch`] decides. Rule order therefore encodes
//!   specificity: special cases and narrow carve-outs come before the broad
//!   prefix rules that would otherwise swallow them.
//!
//! A URL that no rule classifies is an error ([`DepsError::UnmatchedUrl`]).
//! Dropping a dependency must be spelled out with an exclude rule, which
//! yields [`Outcome::Excluded`]. The only URLs that skip the rules are those
//! already ending in `.git`.
//!
//! # Example
//!
//! ```rust
//! use deps2git::rules::{Outcome, RuleEngine, public};
//!
//! let engine = RuleEngine::new(public::rule_set());
//! match engine.translate("src/third_party/libfoo", "/trunk/deps/third_party/libfoo")? {
//!     Outcome::Translated(t) => {
//!         assert_eq!(t.url, "http://git.chromium.org/chromium/deps/libfoo.git");
//!     }
//!     Outcome::Excluded => unreachable!(),
//! }
//! # Ok::<(), deps2git::core::DepsError>(())
//! ```

pub mod loader;
pub mod public;


use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::DepsError;

/// Dependency path → name of the variable that pins it.
pub type OverrideMap = BTreeMap<String, String>;

/// Suffix marking a URL that is already a Git repository URL.
pub const NATIVE_SUFFIX: &str = ".git";

/// A successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Destination path in the converted manifest (usually unchanged)
    pub path: String,
    /// Destination Git URL
    pub url: String,
    /// Git host the URL lives on; for native URLs the URL itself
    pub host: String,
    /// Branch to resolve revisions on instead of the default branch
    pub branch: Option<String>,
    /// The legacy URL already was a Git URL and bypassed the rules
    pub native: bool,
}

/// What a single rule (or rule set) says about a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// The rule rewrote the dependency
    Translated(Translation),
    /// The rule deliberately drops the dependency
    Excluded,
    /// The rule does not apply; try the next one
    NoMatch,
}

/// Final classification of a dependency by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rewrite the dependency to this location
    Translated(Translation),
    /// Leave the dependency out of the converted manifest
    Excluded,
}

/// A matcher mapping `(path, url)` to a [`MatchResult`].
///
/// `host` is the Git host of the rule set the rule belongs to; a rule may
/// prepend it to a relative repository name.
pub trait TranslationRule: Send + Sync + fmt::Debug {
    /// Classifies `url` (already stripped of the rule set's prefix).
    fn apply(&self, path: &str, url: &str, host: &str) -> MatchResult;
}

/// What a [`PatternRule`] does once its pattern matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Rewrite to a repository; `repo` may reference captures as `$1`.
    Translate {
        /// Repository template, relative to the host unless it has a scheme
        repo: String,
        /// Replacement dependency path
        path: Option<String>,
        /// Replacement host for this rule only
        host: Option<String>,
        /// Branch override for revision lookups
        branch: Option<String>,
    },
    /// Drop the dependency.
    Exclude,
}

/// A regex-backed rule. Exact and prefix rules compile to anchored regexes,
/// so every rule kind shares one code path.
#[derive(Debug, Clone)]
pub struct PatternRule {
    description: String,
    pattern: Regex,
    action: RuleAction,
}

impl PatternRule {
    fn build(description: String, pattern: &str, action: RuleAction) -> Result<Self, DepsError> {
        let pattern = Regex::new(pattern).map_err(|e| DepsError::InvalidRule {
            rule: description.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            description,
            pattern,
            action,
        })
    }

    fn translate_action(repo: &str) -> RuleAction {
        RuleAction::Translate {
            repo: repo.to_string(),
            path: None,
            host: None,
            branch: None,
        }
    }

    /// Matches `url` exactly and rewrites it to `repo`.
    pub fn exact(url: &str, repo: &str) -> Self {
        Self::exact_with(url, Self::translate_action(repo))
    }

    /// Matches `url` exactly and drops the dependency.
    pub fn exclude_exact(url: &str) -> Self {
        Self::exact_with(url, RuleAction::Exclude)
    }

    fn exact_with(url: &str, action: RuleAction) -> Self {
        let pattern = Regex::new(&format!("^{}$", regex::escape(url)))
            .unwrap_or_else(|_| unreachable!("escaped literal is always a valid regex"));
        Self {
            description: format!("exact '{url}'"),
            pattern,
            action,
        }
    }

    /// Matches URLs starting with `prefix`; the remainder is `$1` in `repo`.
    pub fn prefix(prefix: &str, repo: &str) -> Self {
        Self::prefix_with(prefix, Self::translate_action(repo))
    }

    /// Drops every dependency whose URL starts with `prefix`.
    pub fn exclude_prefix(prefix: &str) -> Self {
        Self::prefix_with(prefix, RuleAction::Exclude)
    }

    fn prefix_with(prefix: &str, action: RuleAction) -> Self {
        let pattern = Regex::new(&format!("^{}(.*)$", regex::escape(prefix)))
            .unwrap_or_else(|_| unreachable!("escaped literal is always a valid regex"));
        Self {
            description: format!("prefix '{prefix}'"),
            pattern,
            action,
        }
    }

    /// Matches `pattern` (anchored at the start of the URL) and rewrites it
    /// to `repo`, expanding `$n` captures.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::InvalidRule`] when `pattern` does not compile.
    pub fn regex(pattern: &str, repo: &str) -> Result<Self, DepsError> {
        Self::regex_with(pattern, Self::translate_action(repo))
    }

    /// Drops every dependency whose URL matches `pattern`.
    pub fn exclude_regex(pattern: &str) -> Result<Self, DepsError> {
        Self::regex_with(pattern, RuleAction::Exclude)
    }

    fn regex_with(pattern: &str, action: RuleAction) -> Result<Self, DepsError> {
        let anchored = if pattern.starts_with('^') {
            pattern.to_string()
        } else {
            format!("^(?:{pattern})")
        };
        Self::build(format!("regex '{pattern}'"), &anchored, action)
    }

    /// Replaces the dependency path for matches of this rule.
    #[must_use]
    pub fn with_path(mut self, new_path: &str) -> Self {
        if let RuleAction::Translate {
            path, ..
        } = &mut self.action
        {
            *path = Some(new_path.to_string());
        }
        self
    }

    /// Uses `new_host` instead of the rule set's host.
    #[must_use]
    pub fn with_host(mut self, new_host: &str) -> Self {
        if let RuleAction::Translate {
            host, ..
        } = &mut self.action
        {
            *host = Some(new_host.to_string());
        }
        self
    }

    /// Resolves revisions on `new_branch` instead of the default branch.
    #[must_use]
    pub fn with_branch(mut self, new_branch: &str) -> Self {
        if let RuleAction::Translate {
            branch, ..
        } = &mut self.action
        {
            *branch = Some(new_branch.to_string());
        }
        self
    }

    /// Human readable form used in logs and errors.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// What the rule does on a match.
    pub const fn action(&self) -> &RuleAction {
        &self.action
    }

    fn expand(captures: &Captures<'_>, template: &str) -> String {
        let mut expanded = String::new();
        captures.expand(template, &mut expanded);
        expanded
    }
}

impl TranslationRule for PatternRule {
    fn apply(&self, path: &str, url: &str, host: &str) -> MatchResult {
        let Some(captures) = self.pattern.captures(url) else {
            return MatchResult::NoMatch;
        };

        match &self.action {
            RuleAction::Exclude => MatchResult::Excluded,
            RuleAction::Translate {
                repo,
                path: new_path,
                host: rule_host,
                branch,
            } => {
                let host = rule_host.as_deref().unwrap_or(host);
                let repo = Self::expand(&captures, repo);
                let url = if repo.contains("://") {
                    repo
                } else {
                    format!("{host}{repo}")
                };
                MatchResult::Translated(Translation {
                    path: new_path.clone().unwrap_or_else(|| path.to_string()),
                    url,
                    host: host.to_string(),
                    branch: branch.clone(),
                    native: false,
                })
            }
        }
    }
}

/// An ordered, named collection of rules sharing one Git host.
#[derive(Debug)]
pub struct RuleSet {
    name: String,
    git_host: String,
    strip_prefix: Option<String>,
    webkit_url: Option<String>,
    rules: Vec<Box<dyn TranslationRule>>,
    overrides: OverrideMap,
}

impl RuleSet {
    /// Creates an empty rule set whose rules point at `git_host`.
    ///
    /// The host is used verbatim as a prefix, so it normally ends in `/`.
    pub fn new(name: impl Into<String>, git_host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            git_host: git_host.into(),
            strip_prefix: None,
            webkit_url: None,
            rules: Vec::new(),
            overrides: OverrideMap::new(),
        }
    }

    /// Rewrites URLs under `prefix` to the path that follows it before any
    /// rule runs (e.g. `http://host/svn/trunk/x` → `/trunk/x`).
    #[must_use]
    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    /// Declares the repository that the `webkit_url` variable points at.
    #[must_use]
    pub fn with_webkit_url(mut self, url: impl Into<String>) -> Self {
        self.webkit_url = Some(url.into());
        self
    }

    /// Appends a rule; rules are tried in insertion order.
    #[must_use]
    pub fn rule(mut self, rule: impl TranslationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Appends a boxed rule.
    pub fn push_rule(&mut self, rule: Box<dyn TranslationRule>) {
        self.rules.push(rule);
    }

    /// Pins `path` through the variable `variable` instead of a commit id.
    #[must_use]
    pub fn override_variable(mut self, path: impl Into<String>, variable: impl Into<String>) -> Self {
        self.overrides.insert(path.into(), variable.into());
        self
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Git host prefix of this set's rules.
    pub fn git_host(&self) -> &str {
        &self.git_host
    }

    /// Repository URL bound to the `webkit_url` variable, if declared.
    pub fn webkit_url(&self) -> Option<&str> {
        self.webkit_url.as_deref()
    }

    /// Override variables declared by this set.
    pub const fn overrides(&self) -> &OverrideMap {
        &self.overrides
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn normalize<'a>(&self, url: &'a str) -> &'a str {
        if let Some(prefix) = &self.strip_prefix
            && let Some(rest) = url.strip_prefix(prefix.as_str())
            && rest.starts_with('/')
        {
            return rest;
        }
        url
    }

    /// Runs the rules in order and returns the first decisive result.
    pub fn apply(&self, path: &str, url: &str) -> MatchResult {
        let url = self.normalize(url);
        for rule in &self.rules {
            match rule.apply(path, url, &self.git_host) {
                MatchResult::NoMatch => {}
                decided => {
                    tracing::trace!(target: "deps2git::rules", "{} matched {:?} in '{}'", url, rule, self.name);
                    return decided;
                }
            }
        }
        MatchResult::NoMatch
    }
}

/// Base rule set plus an optional extension consulted before it.
#[derive(Debug)]
pub struct RuleEngine {
    /// In precedence order: extension (if any) first, base last
    sets: Vec<RuleSet>,
}

impl RuleEngine {
    /// Creates an engine with only the base rule set.
    pub fn new(base: RuleSet) -> Self {
        Self {
            sets: vec![base],
        }
    }

    /// Adds an extension rule set that takes precedence over the base set.
    #[must_use]
    pub fn with_extension(mut self, extension: RuleSet) -> Self {
        self.sets.insert(0, extension);
        self
    }

    /// The base rule set.
    pub fn base(&self) -> &RuleSet {
        // `sets` always holds the base set as its last element
        &self.sets[self.sets.len() - 1]
    }

    /// Classifies one dependency.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::UnmatchedUrl`] when no rule in any set matches and
    /// the URL does not already end in `.git`.
    pub fn translate(&self, path: &str, url: &str) -> Result<Outcome, DepsError> {
        if url.ends_with(NATIVE_SUFFIX) {
            return Ok(Outcome::Translated(Translation {
                path: path.to_string(),
                url: url.to_string(),
                host: url.to_string(),
                branch: None,
                native: true,
            }));
        }

        for set in &self.sets {
            match set.apply(path, url) {
                MatchResult::Translated(translation) => return Ok(Outcome::Translated(translation)),
                MatchResult::Excluded => return Ok(Outcome::Excluded),
                MatchResult::NoMatch => {}
            }
        }

        Err(DepsError::UnmatchedUrl {
            path: path.to_string(),
            url: url.to_string(),
        })
    }

    /// Override variables of all sets; the extension wins on collisions.
    pub fn overrides(&self) -> OverrideMap {
        let mut merged = OverrideMap::new();
        for set in self.sets.iter().rev() {
            merged.extend(set.overrides().iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// The two reserved variables every converted manifest starts with:
    /// `git_url` (base host without trailing slash) and `webkit_url`.
    pub fn reserved_variables(&self) -> Vec<(String, String)> {
        let base = self.base();
        let git_url = base.git_host().trim_end_matches('/').to_string();
        let webkit_url =
            base.webkit_url().map_or_else(|| format!("{git_url}/external/WebKit_trimmed.git"), str::to_string);
        vec![
            (crate::constants::GIT_URL_VAR.to_string(), git_url),
            (crate::constants::WEBKIT_URL_VAR.to_string(), webkit_url),
        ]
    }
}
