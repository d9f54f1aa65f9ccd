//! Dependency conversion
//!
//! [`Converter::convert`] turns a legacy [`DepsFile`] into its Git
//! counterpart. Every `deps` and `deps_os` entry goes through the same steps:
//!
//! 1. `None` stays `None`.
//! 2. The location is split at the first `@` into URL and revision (`HEAD`
//!    when absent).
//! 3. The [`RuleEngine`] translates the URL; excluded entries are dropped and
//!    an unmatched URL aborts the run.
//! 4. With verification on, the destination URL is pinged (see [`verify`]);
//!    unreachable URLs are collected, not fatal.
//! 5. The revision is resolved:
//!    - `HEAD` gets no suffix,
//!    - paths with an override variable are pinned through that variable,
//!    - URLs that already were Git URLs keep their revision,
//!    - everything else is looked up by the [`MirrorManager`].
//! 6. A few well-known paths have their resolved revision moved into a
//!    variable as well (`webkit_rev`, `angle_revision`).
//!
//! In shared-mirror mode all destination repositories are pre-cached in
//! parallel before step 1 runs for the first entry.

pub mod verify;


use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::HEAD_REVISION;
use crate::core::DepsError;
use crate::manifest::variables::{normalize_pin, variable_token};
use crate::manifest::{DepsFile, DepsMap, VariableSet};
use crate::mirror::{MirrorManager, MirrorMode, PrecacheOptions, precache};
use crate::rules::{OverrideMap, Outcome, RuleEngine};

pub use verify::{GitProbe, Probe, Verifier};

/// Paths whose resolved revision is always stored in a named variable.
pub const SPECIAL_PINS: &[(&str, &str)] = &[
    ("src/third_party/WebKit", "webkit_rev"),
    ("src/third_party/WebKit/Source", "webkit_rev"),
    ("src/third_party/angle", "angle_revision"),
    ("src/third_party/angle_dx11", "angle_revision"),
];

/// Splits `url@revision` at the first `@`; the revision defaults to `HEAD`.
pub fn split_location(location: &str) -> (&str, &str) {
    location.split_once('@').unwrap_or((location, HEAD_REVISION))
}

/// Output of a conversion run.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The converted manifest; its `vars` are the outgoing variables
    pub manifest: DepsFile,
    /// Destination URLs that failed verification
    pub failed_urls: BTreeSet<String>,
}

impl ConversionResult {
    /// Variables emitted by the conversion.
    pub const fn variables(&self) -> &VariableSet {
        &self.manifest.vars
    }

    /// True when every destination passed verification (or none was run).
    pub fn is_clean(&self) -> bool {
        self.failed_urls.is_empty()
    }
}

/// Converts legacy manifests using one rule engine and mirror manager.
pub struct Converter<P: Probe = GitProbe> {
    engine: RuleEngine,
    mirrors: MirrorManager,
    overrides: OverrideMap,
    verifier: Option<Verifier<P>>,
    precache_options: PrecacheOptions,
    failed_urls: BTreeSet<String>,
}

impl Converter<GitProbe> {
    /// Creates a converter without verification.
    pub fn new(engine: RuleEngine, mirrors: MirrorManager) -> Self {
        let overrides = engine.overrides();
        Self {
            engine,
            mirrors,
            overrides,
            verifier: None,
            precache_options: PrecacheOptions::default(),
            failed_urls: BTreeSet::new(),
        }
    }
}

impl<P: Probe> Converter<P> {
    /// Verifies every destination URL with `verifier`.
    pub fn with_verifier<Q: Probe>(self, verifier: Verifier<Q>) -> Converter<Q> {
        Converter {
            engine: self.engine,
            mirrors: self.mirrors,
            overrides: self.overrides,
            verifier: Some(verifier),
            precache_options: self.precache_options,
            failed_urls: self.failed_urls,
        }
    }

    /// Tunes the shared-mirror pre-cache phase.
    #[must_use]
    pub fn with_precache_options(mut self, options: PrecacheOptions) -> Self {
        self.precache_options = options;
        self
    }

    /// Override variables in effect.
    pub const fn overrides(&self) -> &OverrideMap {
        &self.overrides
    }

    /// Converts `legacy` into a Git manifest.
    ///
    /// # Errors
    ///
    /// Any fatal condition aborts the whole run: unmatched URLs, missing
    /// override variables and revision resolution failures. Verification
    /// failures are reported in [`ConversionResult::failed_urls`] instead.
    pub async fn convert(mut self, legacy: DepsFile) -> Result<ConversionResult> {
        let mut variables: VariableSet = self.engine.reserved_variables().into_iter().collect();

        if matches!(self.mirrors.mode(), MirrorMode::SharedMirror { .. }) {
            let targets = self.precache_targets(&legacy)?;
            let summary = precache(&self.mirrors, targets, &self.precache_options).await;
            if !summary.failed.is_empty() {
                tracing::warn!(
                    target: "deps2git::convert",
                    "{} mirrors could not be pre-cached; resolution will retry them",
                    summary.failed.len()
                );
            }
        }

        let deps = self.convert_section(&legacy.deps, &legacy.vars, &mut variables).await?;
        let mut deps_os = BTreeMap::new();
        for (os, partition) in &legacy.deps_os {
            let converted = self
                .convert_section(partition, &legacy.vars, &mut variables)
                .await
                .with_context(|| format!("Failed to convert deps_os['{os}']"))?;
            deps_os.insert(os.clone(), converted);
        }

        let manifest = DepsFile {
            vars: variables,
            deps,
            deps_os,
            include_rules: legacy.include_rules,
            skip_child_includes: legacy.skip_child_includes,
            hooks: legacy.hooks,
        };
        tracing::info!(
            target: "deps2git::convert",
            "Converted {} of {} dependencies",
            manifest.entry_count(),
            legacy.deps.len() + legacy.deps_os.values().map(BTreeMap::len).sum::<usize>()
        );

        Ok(ConversionResult {
            manifest,
            failed_urls: self.failed_urls,
        })
    }

    /// Every `(url, path)` the pre-cache phase should prepare.
    fn precache_targets(&self, legacy: &DepsFile) -> Result<Vec<(String, String)>> {
        let mut targets = Vec::new();
        let sections = std::iter::once(&legacy.deps).chain(legacy.deps_os.values());
        for (path, location) in sections.flat_map(|section| section.iter()) {
            let Some(location) = location else {
                continue;
            };
            let (url, _) = split_location(location);
            if let Outcome::Translated(t) = self.engine.translate(path, url)?
                && !t.native
            {
                targets.push((t.url, t.path));
            }
        }
        Ok(targets)
    }

    /// Converts one `deps` mapping. Override and pinned variables are added
    /// to `variables`; verification failures accumulate on the converter.
    pub async fn convert_section(
        &mut self,
        entries: &DepsMap,
        legacy_vars: &VariableSet,
        variables: &mut VariableSet,
    ) -> Result<DepsMap> {
        let mut converted = DepsMap::new();

        for (path, location) in entries {
            let Some(location) = location else {
                converted.insert(path.clone(), None);
                continue;
            };

            let (url, revision) = split_location(location);
            let translation = match self.engine.translate(path, url)? {
                Outcome::Translated(translation) => translation,
                Outcome::Excluded => {
                    tracing::debug!(target: "deps2git::convert", "Dropping excluded dependency {} ({})", path, url);
                    continue;
                }
            };

            let reachable = match self.verifier.as_mut() {
                Some(verifier) => verifier.verify(&translation.url).await,
                None => true,
            };
            if !reachable {
                self.failed_urls.insert(translation.url.clone());
            }

            let mut suffix = if revision == HEAD_REVISION {
                None
            } else if let Some(variable) = self.overrides.get(path) {
                let value = legacy_vars.get(variable).ok_or_else(|| DepsError::MissingOverrideVariable {
                    path: path.clone(),
                    variable: variable.clone(),
                })?;
                variables.set(variable.clone(), normalize_pin(value));
                Some(variable_token(variable))
            } else if translation.native || !reachable {
                // Nothing to search in an unreachable repository
                Some(revision.to_string())
            } else {
                let commit = self
                    .mirrors
                    .resolve_revision(
                        revision,
                        &translation.url,
                        &translation.path,
                        &translation.host,
                        translation.branch.as_deref(),
                    )
                    .await?;
                Some(commit)
            };

            if revision != HEAD_REVISION
                && !self.overrides.contains_key(path)
                && let Some((_, variable)) = SPECIAL_PINS.iter().find(|(pinned, _)| *pinned == path.as_str())
                && let Some(resolved) = suffix.take()
            {
                variables.set(*variable, normalize_pin(&resolved));
                suffix = Some(variable_token(variable));
            }

            let new_location = match suffix {
                Some(suffix) => format!("{}@{}", translation.url, suffix),
                None => translation.url.clone(),
            };
            tracing::debug!(target: "deps2git::convert", "{} -> {} = {}", path, translation.path, new_location);

            if converted.insert(translation.path.clone(), Some(new_location)).is_some() {
                tracing::warn!(
                    target: "deps2git::convert",
                    "Several dependencies map to {}; keeping the one from {}",
                    translation.path,
                    path
                );
            }
        }

        Ok(converted)
    }
}
