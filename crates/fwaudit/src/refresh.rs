use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use fwaudit_core::collection::qualifying_names;
use fwaudit_core::{Analyzer, Config, ReleaseCollection};

/// Populate a collection from a directory of packages or a snapshot file.
pub fn import_any(path: &Path, analyzer: &Analyzer, config: &Config) -> Result<ReleaseCollection> {
    if path.is_dir() {
        let mut collection = ReleaseCollection::new();
        collection.import_dir(path, analyzer, &config.packages.prefixes)?;
        Ok(collection)
    } else {
        fwaudit_report::import_snapshot(path)
    }
}

/// Diff-based incremental refresh of one `{folder, snapshot}` task pair.
///
/// With an existing snapshot, only the difference against the folder is
/// touched: keys whose source package disappeared are evicted, packages
/// without a key are analyzed and inserted, everything else is left as
/// persisted. Without a snapshot the folder is imported in full. The
/// refreshed collection is exported back to the snapshot and all its
/// companion formats; the refresh succeeds only if every export does.
pub fn refresh(
    folder: &Path,
    snapshot: &Path,
    analyzer: &Analyzer,
    config: &Config,
) -> Result<ReleaseCollection> {
    let mut collection;
    if snapshot.exists() {
        collection = fwaudit_report::import_snapshot(snapshot)?;
        let current = qualifying_names(folder, &config.packages.prefixes)
            .with_context(|| format!("failed to list release folder '{}'", folder.display()))?;
        let stale: Vec<String> = collection
            .keys()
            .filter(|key| !current.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            info!(package = %key, "source package removed, evicting");
            collection.remove(&key);
        }
        let fresh: Vec<String> = current
            .into_iter()
            .filter(|name| !collection.contains(name))
            .collect();
        if !fresh.is_empty() {
            info!(count = fresh.len(), "analyzing new packages");
        }
        collection.analyze_all(folder, fresh, analyzer);
    } else if folder.is_dir() {
        collection = ReleaseCollection::new();
        collection.import_dir(folder, analyzer, &config.packages.prefixes)?;
    } else {
        info!("nothing to do");
        bail!(
            "neither snapshot '{}' nor folder '{}' exists",
            snapshot.display(),
            folder.display()
        );
    }
    fwaudit_report::export_all(&collection, snapshot, config)?;
    info!(releases = collection.len(), "all done");
    Ok(collection)
}
