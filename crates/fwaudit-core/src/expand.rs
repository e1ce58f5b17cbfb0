use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::AuditError;
use crate::tools::{ToolCommand, ToolSet};

/// Container formats recognized for release packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Self-extracting archive (`.exe`); 7z reads past the stub.
    SelfExtracting,
    SevenZip,
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Recognize a container by file name, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if lower.ends_with(".exe") {
            Some(ArchiveKind::SelfExtracting)
        } else if lower.ends_with(".7z") {
            Some(ArchiveKind::SevenZip)
        } else if lower.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// Extracts archive containers into caller-owned directories.
pub struct Expander<'a> {
    tools: &'a ToolSet,
}

impl<'a> Expander<'a> {
    pub fn new(tools: &'a ToolSet) -> Self {
        Self { tools }
    }

    /// Unpack `archive` into `dest`.
    ///
    /// An unrecognized extension is `UnsupportedFormat`: fatal for a
    /// top-level package, a logged skip when the caller is scanning
    /// nested content.
    pub fn unpack(&self, archive: &Path, dest: &Path) -> Result<(), AuditError> {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = ArchiveKind::from_name(&name)
            .ok_or_else(|| AuditError::UnsupportedFormat(name.clone()))?;
        debug!(archive = %archive.display(), ?kind, dest = %dest.display(), "unpacking");
        match kind {
            ArchiveKind::SelfExtracting | ArchiveKind::SevenZip => self.unpack_7z(archive, dest),
            ArchiveKind::Zip => self.unpack_zip(archive, dest),
            ArchiveKind::TarGz => unpack_tar_gz(archive, dest),
        }
    }

    fn unpack_7z(&self, archive: &Path, dest: &Path) -> Result<(), AuditError> {
        ToolCommand::new(&self.tools.sevenzip)
            .arg("x")
            .arg("-y")
            .arg(format!("-o{}", dest.display()))
            .arg_path(archive)
            .timeout(self.tools.timeout)
            .run()
            .map(|_| ())
    }

    fn unpack_zip(&self, archive: &Path, dest: &Path) -> Result<(), AuditError> {
        ToolCommand::new(&self.tools.unzip)
            .arg("-o")
            .arg("-q")
            .arg_path(archive)
            .arg("-d")
            .arg_path(dest)
            .timeout(self.tools.timeout)
            .run()
            .map(|_| ())
    }
}

// Gzip-compressed tarballs unpack in-process; no external tool involved.
fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<(), AuditError> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.unpack(dest)?;
    Ok(())
}
