//! Serializers for the release collection.
//!
//! `export` dispatches on the output extension; `export_all` writes the
//! snapshot format plus its companion formats on the same base name,
//! attempting every format regardless of earlier failures. Snapshot
//! import (JSON or XML) skips records with missing fields instead of
//! corrupting the collection.

pub mod html;
pub mod json;
pub mod text;
pub mod xml;

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use fwaudit_core::config::Config;
use fwaudit_core::ReleaseCollection;

/// Shared stylesheet written next to XML exports as `style.css`.
pub(crate) const CSS_STYLE: &str = "\
body {
    font-family: 'Helvetica Neue', Arial, Helvetica, sans-serif;
    font-size: 14px;
    line-height: 18px;
    color: #393939;
}
td {
    font-size: 12px;
    border: 1px solid silver;
    vertical-align: top;
    padding: 5px;
}
.header {
    font-size: 14px;
    font-weight: bold;
    color: #f6f6f6;
    background-color: #23719f;
}
.header2 {
    font-size: 14px;
    font-weight: bold;
    color: #f6f6f6;
    background-color: #46b946;
}
.dimmed {
    background-color: #dbdbdb;
}
";

/// Export the collection to `path`, picking the serializer by extension.
pub fn export(collection: &ReleaseCollection, path: &Path, config: &Config) -> Result<()> {
    let ext = extension(path);
    match ext.as_str() {
        "txt" => {
            info!(file = %path.display(), "exporting text report");
            text::export_text(collection, path)
        }
        "json" => {
            info!(file = %path.display(), "exporting JSON snapshot");
            json::export_json(collection, path)
        }
        "xml" => {
            info!(file = %path.display(), "exporting XML snapshot");
            xml::export_xml(collection, path)
        }
        "htm" | "html" => {
            info!(file = %path.display(), "exporting HTML summary");
            html::export_html(collection, path, config)
        }
        other => {
            warn!(
                extension = other,
                "not an export format; known formats are TXT, JSON, XML, and HTML"
            );
            bail!("unknown export format '.{other}'")
        }
    }
}

/// Export every companion format on `base`'s file stem.
///
/// Each format write is attempted regardless of earlier failures; the
/// call succeeds only if all of them do.
pub fn export_all(collection: &ReleaseCollection, base: &Path, config: &Config) -> Result<()> {
    let stem = base.with_extension("");
    let mut failed: Vec<String> = Vec::new();
    for ext in ["xml", "html", "txt", "json"] {
        let target = stem.with_extension(ext);
        if let Err(e) = export(collection, &target, config) {
            error!(file = %target.display(), error = %e, "export failed");
            failed.push(format!(".{ext}"));
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        bail!("export failed for {}", failed.join(", "))
    }
}

/// Import a snapshot file (JSON or XML) into a fresh collection.
pub fn import_snapshot(path: &Path) -> Result<ReleaseCollection> {
    let ext = extension(path);
    match ext.as_str() {
        "json" => {
            info!(file = %path.display(), "importing JSON snapshot");
            json::import_json(path)
        }
        "xml" => {
            info!(file = %path.display(), "importing XML snapshot");
            xml::import_xml(path)
        }
        other => {
            warn!(
                extension = other,
                "not a snapshot format; known formats are JSON and XML"
            );
            bail!("unknown snapshot format '.{other}'")
        }
    }
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("failed to write '{}'", path.display()))
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Escape a value for XML/HTML text and attribute positions.
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwaudit_core::release::Release;
    use fwaudit_core::scan::ScanFacts;

    fn collection() -> ReleaseCollection {
        let mut c = ReleaseCollection::new();
        c.insert(Release::from_facts("lux2_100.zip", &ScanFacts::default()));
        c
    }

    #[test]
    fn test_export_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.pdf");
        let err = export(&collection(), &target, &Config::default()).unwrap_err();
        assert!(err.to_string().contains(".pdf"), "got {err}");
        assert!(!target.exists(), "nothing should be written");
    }

    #[test]
    fn test_import_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.csv");
        std::fs::write(&target, b"x").unwrap();
        assert!(import_snapshot(&target).is_err());
    }

    #[test]
    fn test_export_all_writes_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("report.xml");
        export_all(&collection(), &base, &Config::default()).unwrap();
        for ext in ["xml", "html", "txt", "json"] {
            assert!(
                dir.path().join(format!("report.{ext}")).exists(),
                "missing report.{ext}"
            );
        }
        // XML export brings its stylesheet and the shared CSS asset
        assert!(dir.path().join("report.xslt").exists());
        assert!(dir.path().join("style.css").exists());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(escape("plain"), "plain");
    }
}
