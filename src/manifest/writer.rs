//! DEPS writer
//!
//! Output layout:
//!
//! ```text
//! # DO NOT EDIT EXCEPT FOR LOCAL TESTING.
//! # THIS IS A GENERATED FILE.
//! # ALL MANUAL CHANGES WILL BE OVERWRITTEN.
//! # SEE http://code.google.com/p/chromium/wiki/UsingNewGit
//! # FOR HOW TO ROLL DEPS
//! vars = {...}
//!
//! deps = {...}
//!
//! deps_os = {...}
//!
//! include_rules = [...]
//!
//! skip_child_includes = [...]
//!
//! hooks = [...]
//! ```
//!
//! Dependency locations are rendered as expressions rather than plain
//! strings so a mirror can be swapped in by editing one variable:
//!
//! | location | rendered |
//! |----------|----------|
//! | `<webkit_url>@rev` | `Var('webkit_url') + '@rev'` |
//! | `<git_url>/x.git@rev` | `Var('git_url') + '/x.git@rev'` |
//! | `...@VARIFY_name` | `... + Var('name')` |

use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

use super::variables::split_token;
use super::{DepsFile, DepsMap, Value};
use crate::constants::{GIT_URL_VAR, MANUAL_STEPS_URL, WEBKIT_URL_VAR};
use crate::utils::fs::atomic_write;

const INDENT: usize = 4;

/// The generated-file banner placed at the top of every output.
pub fn banner() -> String {
    format!(
        "# DO NOT EDIT EXCEPT FOR LOCAL TESTING.\n\
         # THIS IS A GENERATED FILE.\n\
         # ALL MANUAL CHANGES WILL BE OVERWRITTEN.\n\
         # SEE {MANUAL_STEPS_URL}\n\
         # FOR HOW TO ROLL DEPS\n"
    )
}

/// Renders `deps` as DEPS text.
pub fn render_deps(deps: &DepsFile) -> String {
    let hosts = HostVars {
        git_url: deps.vars.get(GIT_URL_VAR).filter(|v| !v.is_empty()),
        webkit_url: deps.vars.get(WEBKIT_URL_VAR).filter(|v| !v.is_empty()),
    };

    let mut out = banner();

    out.push_str("vars = {\n");
    for (name, value) in deps.vars.iter() {
        let _ = writeln!(out, "{}{}: {},", pad(INDENT), quote(name), quote(value));
    }
    out.push_str("}\n\n");

    out.push_str("deps = ");
    render_deps_map(&mut out, &deps.deps, 0, &hosts);
    out.push_str("\n\n");

    out.push_str("deps_os = {\n");
    for (os, partition) in &deps.deps_os {
        let _ = write!(out, "{}{}: ", pad(INDENT), quote(os));
        render_deps_map(&mut out, partition, INDENT, &hosts);
        out.push_str(",\n");
    }
    out.push_str("}\n\n");

    for (name, items) in [
        ("include_rules", &deps.include_rules),
        ("skip_child_includes", &deps.skip_child_includes),
    ] {
        let _ = write!(out, "{name} = ");
        render_list(&mut out, items, 0);
        out.push_str("\n\n");
    }

    out.push_str("hooks = ");
    render_list(&mut out, &deps.hooks, 0);
    out.push('\n');
    out
}

/// Renders `deps` and writes it atomically to `path`.
pub fn write_deps(path: &Path, deps: &DepsFile) -> Result<()> {
    atomic_write(path, render_deps(deps).as_bytes())?;
    tracing::debug!(target: "deps2git::manifest", "Wrote {} entries to {}", deps.entry_count(), path.display());
    Ok(())
}

struct HostVars<'a> {
    git_url: Option<&'a str>,
    webkit_url: Option<&'a str>,
}

fn pad(width: usize) -> String {
    " ".repeat(width)
}

/// Python single-quoted string literal.
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}

fn render_deps_map(out: &mut String, map: &DepsMap, indent: usize, hosts: &HostVars<'_>) {
    if map.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for (path, location) in map {
        let rendered = location.as_deref().map_or_else(|| "None".to_string(), |l| render_location(l, hosts));
        let _ = writeln!(out, "{}{}:", pad(indent + INDENT), quote(path));
        let _ = writeln!(out, "{}{},", pad(indent + 2 * INDENT), rendered);
    }
    out.push_str(&pad(indent));
    out.push('}');
}

fn render_location(location: &str, hosts: &HostVars<'_>) -> String {
    let (base, variable) = match split_token(location) {
        Some((base, name)) => (base, Some(name)),
        None => (location, None),
    };

    let mut parts: Vec<String> = Vec::new();
    let literal = if let Some(rest) = hosts.webkit_url.and_then(|url| base.strip_prefix(url))
        && (rest.is_empty() || rest.starts_with('@'))
    {
        parts.push(format!("Var('{WEBKIT_URL_VAR}')"));
        rest
    } else if let Some(rest) = hosts.git_url.and_then(|url| base.strip_prefix(url)) {
        parts.push(format!("Var('{GIT_URL_VAR}')"));
        rest
    } else {
        base
    };
    if !literal.is_empty() || parts.is_empty() {
        parts.push(quote(literal));
    }
    if let Some(name) = variable {
        parts.push(format!("Var('{name}')"));
    }
    parts.join(" + ")
}

fn render_value(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Str(s) => out.push_str(&quote(s)),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::None => out.push_str("None"),
        Value::List(items) => render_list(out, items, indent),
        Value::Dict(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (key, value) in entries {
                let _ = write!(out, "{}{}: ", pad(indent + INDENT), quote(key));
                render_value(out, value, indent + INDENT);
                out.push_str(",\n");
            }
            out.push_str(&pad(indent));
            out.push('}');
        }
    }
}

fn render_list(out: &mut String, items: &[Value], indent: usize) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push_str("[\n");
    for item in items {
        out.push_str(&pad(indent + INDENT));
        render_value(out, item, indent + INDENT);
        out.push_str(",\n");
    }
    out.push_str(&pad(indent));
    out.push(']');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> HostVars<'static> {
        HostVars {
            git_url: Some("http://git.chromium.org"),
            webkit_url: Some("http://git.chromium.org/external/WebKit_trimmed.git"),
        }
    }

    #[test]
    fn test_render_location_substitutions() {
        let hosts = hosts();
        assert_eq!(
            render_location("http://git.chromium.org/chromium/deps/libfoo.git@abc", &hosts),
            "Var('git_url') + '/chromium/deps/libfoo.git@abc'"
        );
        assert_eq!(
            render_location("http://git.chromium.org/external/WebKit_trimmed.git@VARIFY_webkit_rev", &hosts),
            "Var('webkit_url') + Var('webkit_rev')"
        );
        assert_eq!(
            render_location("http://git.chromium.org/chromium/third_party/ffmpeg.git@VARIFY_ffmpeg_hash", &hosts),
            "Var('git_url') + '/chromium/third_party/ffmpeg.git' + Var('ffmpeg_hash')"
        );
        assert_eq!(render_location("https://example.com/repo.git@deadbeef", &hosts), "'https://example.com/repo.git@deadbeef'");
    }

    #[test]
    fn test_webkit_prefix_needs_exact_repository() {
        // A sibling repository sharing the prefix is not the webkit repository
        assert_eq!(
            render_location("http://git.chromium.org/external/WebKit_trimmed.git2@abc", &hosts()),
            "Var('git_url') + '/external/WebKit_trimmed.git2@abc'"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b"), "'a\\\\b'");
    }
}
