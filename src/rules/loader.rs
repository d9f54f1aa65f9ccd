//! Loading rule sets by name or from TOML files
//!
//! An extension rule file looks like this:
//!
//! ```toml
//! name = "internal"
//! git_host = "https://git.example.org/"
//! strip_prefix = "svn://svn.example.org/repo"
//!
//! [overrides]
//! "src/third_party/foo" = "foo_revision"
//!
//! [[rules]]
//! exact = "/trunk/deps/bar"
//! repo = "mirrors/bar.git"
//!
//! [[rules]]
//! prefix = "/trunk/deps/"
//! repo = "deps/$1.git"
//! branch = "stable"
//!
//! [[rules]]
//! regex = "^/legacy/.*"
//! exclude = true
//! ```
//!
//! Each rule has exactly one of `exact`, `prefix` or `regex`, and either a
//! `repo` template or `exclude = true`. Rules keep file order.

use serde::Deserialize;
use std::path::Path;

use super::{PatternRule, RuleSet, public};
use crate::core::DepsError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSetFile {
    name: Option<String>,
    git_host: Option<String>,
    strip_prefix: Option<String>,
    #[serde(default)]
    overrides: super::OverrideMap,
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    exact: Option<String>,
    prefix: Option<String>,
    regex: Option<String>,
    repo: Option<String>,
    path: Option<String>,
    host: Option<String>,
    branch: Option<String>,
    #[serde(default)]
    exclude: bool,
}

/// Returns the built-in rule set called `name`.
///
/// # Errors
///
/// Returns [`DepsError::UnknownRuleSet`] for anything but `public`.
pub fn named(name: &str) -> Result<RuleSet, DepsError> {
    match name {
        public::NAME => Ok(public::rule_set()),
        other => Err(DepsError::UnknownRuleSet {
            name: other.to_string(),
        }),
    }
}

/// Reads an extension rule set from a TOML file.
///
/// `default_host` is used when the file has no `git_host`.
pub fn load_file(path: &Path, default_host: &str) -> Result<RuleSet, DepsError> {
    let content = std::fs::read_to_string(path).map_err(|e| DepsError::RuleSetLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let fallback_name = path.file_stem().map_or_else(|| "extension".to_string(), |s| s.to_string_lossy().into_owned());
    parse(&content, &path.display().to_string(), &fallback_name, default_host)
}

/// Parses an extension rule set from TOML text. `source` names the origin
/// in error messages.
pub fn parse(content: &str, source: &str, fallback_name: &str, default_host: &str) -> Result<RuleSet, DepsError> {
    let file: RuleSetFile = toml::from_str(content).map_err(|e| DepsError::RuleSetLoad {
        path: source.to_string(),
        reason: e.to_string(),
    })?;

    let mut set = RuleSet::new(
        file.name.unwrap_or_else(|| fallback_name.to_string()),
        file.git_host.unwrap_or_else(|| default_host.to_string()),
    );
    if let Some(prefix) = file.strip_prefix {
        set = set.with_strip_prefix(prefix);
    }
    for (path, variable) in file.overrides {
        set = set.override_variable(path, variable);
    }
    for (index, entry) in file.rules.into_iter().enumerate() {
        let rule = build_rule(index + 1, entry)?;
        set.push_rule(Box::new(rule));
    }

    tracing::debug!(target: "deps2git::rules", "Loaded rule set '{}' with {} rules from {}", set.name(), set.len(), source);
    Ok(set)
}

fn build_rule(number: usize, entry: RuleEntry) -> Result<PatternRule, DepsError> {
    let invalid = |reason: &str| DepsError::InvalidRule {
        rule: format!("#{number}"),
        reason: reason.to_string(),
    };

    let rule = match (entry.exact.as_deref(), entry.prefix.as_deref(), entry.regex.as_deref()) {
        (Some(exact), None, None) => match (&entry.repo, entry.exclude) {
            (Some(repo), false) => PatternRule::exact(exact, repo),
            (None, true) => PatternRule::exclude_exact(exact),
            _ => return Err(invalid("needs exactly one of 'repo' or 'exclude = true'")),
        },
        (None, Some(prefix), None) => match (&entry.repo, entry.exclude) {
            (Some(repo), false) => PatternRule::prefix(prefix, repo),
            (None, true) => PatternRule::exclude_prefix(prefix),
            _ => return Err(invalid("needs exactly one of 'repo' or 'exclude = true'")),
        },
        (None, None, Some(pattern)) => {
            let compiled = match (&entry.repo, entry.exclude) {
                (Some(repo), false) => PatternRule::regex(pattern, repo),
                (None, true) => PatternRule::exclude_regex(pattern),
                _ => return Err(invalid("needs exactly one of 'repo' or 'exclude = true'")),
            };
            compiled.map_err(|e| match e {
                DepsError::InvalidRule {
                    reason, ..
                } => invalid(&reason),
                other => other,
            })?
        }
        _ => return Err(invalid("needs exactly one of 'exact', 'prefix' or 'regex'")),
    };

    if entry.exclude && (entry.path.is_some() || entry.host.is_some() || entry.branch.is_some()) {
        return Err(invalid("'path', 'host' and 'branch' do not apply to exclude rules"));
    }

    let mut rule = rule;
    if let Some(path) = &entry.path {
        rule = rule.with_path(path);
    }
    if let Some(host) = &entry.host {
        rule = rule.with_host(host);
    }
    if let Some(branch) = &entry.branch {
        rule = rule.with_branch(branch);
    }
    Ok(rule)
}
