use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use fwaudit_core::error::AuditError;
use fwaudit_core::{Release, ReleaseCollection};

use crate::write_file;

/// Snapshot as a flat object mapping `project_id` -> record.
pub fn export_json(collection: &ReleaseCollection, path: &Path) -> Result<()> {
    let map: BTreeMap<&String, &Release> = collection.iter().collect();
    let content =
        serde_json::to_string_pretty(&map).context("failed to serialize JSON snapshot")?;
    write_file(path, &content)
}

/// Rebuild a collection from a JSON snapshot.
///
/// A record missing an expected field is logged and skipped; the rest of
/// the snapshot still loads.
pub fn import_json(path: &Path) -> Result<ReleaseCollection> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot '{}'", path.display()))?;
    let records: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&content).context("failed to parse JSON snapshot")?;
    let mut collection = ReleaseCollection::new();
    for (id, value) in records {
        match serde_json::from_value::<Release>(value) {
            Ok(release) => collection.insert(release),
            Err(e) => {
                let err = AuditError::PartialRecord {
                    id,
                    detail: e.to_string(),
                };
                warn!(error = %err, "partial snapshot record");
            }
        }
    }
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwaudit_core::scan::ScanFacts;

    fn sample() -> ReleaseCollection {
        let mut facts = ScanFacts::default();
        facts.project_model = Some("ModelX".to_string());
        facts.translate_text.insert("English".to_string());
        facts.translate_text.insert("Russian".to_string());
        facts.sd_size = Some("1.25 GB".to_string());
        let mut collection = ReleaseCollection::new();
        collection.insert(Release::from_facts("lux2_100.zip", &facts));
        collection.insert(Release::from_facts("sg_200.7z", &ScanFacts::default()));
        collection
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("snapshot.json");
        let original = sample();
        export_json(&original, &target).unwrap();
        let imported = import_json(&target).unwrap();
        assert_eq!(original, imported);
    }

    #[test]
    fn test_import_skips_partial_record() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("snapshot.json");
        let mut map: serde_json::Map<String, serde_json::Value> = serde_json::Map::new();
        let good = Release::from_facts("lux2_good.zip", &ScanFacts::default());
        map.insert(
            "lux2_good.zip".to_string(),
            serde_json::to_value(&good).unwrap(),
        );
        map.insert(
            "lux2_bad.zip".to_string(),
            serde_json::json!({"project_id": "lux2_bad.zip"}),
        );
        std::fs::write(&target, serde_json::to_string(&map).unwrap()).unwrap();

        let imported = import_json(&target).unwrap();
        assert_eq!(imported.len(), 1);
        assert!(imported.contains("lux2_good.zip"));
        assert!(!imported.contains("lux2_bad.zip"));
    }
}
