use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::analyzer::Analyzer;
use crate::expand::ArchiveKind;
use crate::release::Release;

/// An ordered map of `project_id` -> [`Release`].
///
/// Iteration is always sorted key order, never insertion order; the
/// serializers and the refresh diff both rely on this. The collection
/// exclusively owns its Releases.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReleaseCollection {
    releases: BTreeMap<String, Release>,
}

impl ReleaseCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn clear(&mut self) {
        self.releases.clear();
    }

    pub fn get(&self, project_id: &str) -> Option<&Release> {
        self.releases.get(project_id)
    }

    pub fn contains(&self, project_id: &str) -> bool {
        self.releases.contains_key(project_id)
    }

    /// Insert a complete Release, replacing any entry under the same key.
    pub fn insert(&mut self, release: Release) {
        self.releases.insert(release.project_id.clone(), release);
    }

    pub fn remove(&mut self, project_id: &str) -> Option<Release> {
        self.releases.remove(project_id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.releases.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Release> {
        self.releases.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Release)> {
        self.releases.iter()
    }

    /// Replace the collection with the analysis of every qualifying
    /// package in `folder`. Packages are analyzed in parallel; a failed
    /// package is logged and skipped, never inserted partially.
    pub fn import_dir(
        &mut self,
        folder: &Path,
        analyzer: &Analyzer,
        prefixes: &[String],
    ) -> Result<()> {
        info!(folder = %folder.display(), "analyzing release folder");
        let names = qualifying_names(folder, prefixes)
            .with_context(|| format!("failed to list release folder '{}'", folder.display()))?;
        self.clear();
        self.analyze_all(folder, names.into_iter().collect(), analyzer);
        Ok(())
    }

    /// Analyze the given package file names under `folder` in parallel
    /// and insert every Release produced.
    pub fn analyze_all(&mut self, folder: &Path, names: Vec<String>, analyzer: &Analyzer) {
        let analyzed: Vec<Release> = names
            .par_iter()
            .filter_map(|name| match analyzer.analyze(&folder.join(name)) {
                Ok(release) => Some(release),
                Err(e) => {
                    warn!(package = %name, error = %e, "package analysis failed");
                    None
                }
            })
            .collect();
        for release in analyzed {
            self.insert(release);
        }
    }
}

/// True when `name` follows the release-package naming convention:
/// a recognized prefix and a supported archive extension.
pub fn is_package_name(name: &str, prefixes: &[String]) -> bool {
    let lower = name.to_ascii_lowercase();
    prefixes
        .iter()
        .any(|p| lower.starts_with(&p.to_ascii_lowercase()))
        && ArchiveKind::from_name(name).is_some()
}

/// The sorted set of qualifying package file names currently in `folder`.
pub fn qualifying_names(folder: &Path, prefixes: &[String]) -> std::io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_package_name(&name, prefixes) {
            names.insert(name);
        }
    }
    Ok(names)
}
