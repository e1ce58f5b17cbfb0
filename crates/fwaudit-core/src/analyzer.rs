use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::AuditError;
use crate::expand::Expander;
use crate::release::Release;
use crate::scan::{ScanFacts, Scanner};
use crate::scratch::ScratchDir;

/// Turns one package file into a [`Release`].
///
/// Compiled once from configuration and shared across workers; each
/// `analyze` call owns its scratch directory for the package's lifetime.
#[derive(Debug)]
pub struct Analyzer {
    scanner: Scanner,
}

impl Analyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            scanner: Scanner::new(config),
        }
    }

    /// Expand `package` into a scratch directory, scan it, and fold the
    /// results into a `Release` keyed by the package file name.
    ///
    /// An unsupported top-level format is fatal for this package. Failed
    /// nested extractions inside the scan are logged there and the
    /// Release carries whatever was observed before them.
    pub fn analyze(&self, package: &Path) -> Result<Release, AuditError> {
        let name = package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(package = %name, "analyzing package");
        let scratch = ScratchDir::new()?;
        Expander::new(self.scanner.tools()).unpack(package, scratch.path())?;
        let mut facts = ScanFacts::default();
        self.scanner.scan(scratch.path(), &mut facts);
        Ok(Release::from_facts(&name, &facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;

    fn write_package(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let enc = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(enc);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_analyze_package_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("lux2_700.tar.gz");
        write_package(
            &package,
            &[
                ("system/build.prop", b"ro.product.model=ModelX\n" as &[u8]),
                ("system/app/foo.apk", b""),
                ("system/app/Dictionary_Ml.apk", b""),
                ("data/c_en_ru.txt", b""),
                ("data/svox-abcdeffr12345.pil", b""),
            ],
        );

        let analyzer = Analyzer::new(&Config::default());
        let release = analyzer.analyze(&package).unwrap();
        assert_eq!(release.project_id, "lux2_700.tar.gz");
        assert_eq!(release.project_model, "ModelX");
        assert_eq!(release.apps_vendor, "Dictionary");
        assert_eq!(release.apps_other, "foo");
        assert_eq!(release.translate_text, "English, Russian");
        assert_eq!(release.tts_voices, "French");
        // Unobserved buckets still render
        assert_eq!(release.sd_size, "-");
        assert_eq!(release.speech_typing, "-");
    }

    #[test]
    fn test_analyze_unsupported_format_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("lux2_700.rar");
        std::fs::write(&package, b"payload").unwrap();
        let analyzer = Analyzer::new(&Config::default());
        let err = analyzer.analyze(&package).unwrap_err();
        assert!(matches!(err, AuditError::UnsupportedFormat(_)), "got {err:?}");
    }
}
