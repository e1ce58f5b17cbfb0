//! Scoped scratch directories and loop-mounted disk images.
//!
//! Every scratch directory is owned by exactly one scope and recursively
//! deleted on every exit path. Nested scans hold a stack of these owned
//! directories, released in reverse order of acquisition as the scopes
//! unwind.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::AuditError;
use crate::tools::{ToolCommand, ToolSet};

/// An ephemeral working directory, recursively deleted on drop.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("fwaudit-").tempdir()?;
        debug!(path = %dir.path().display(), "acquired scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

// Only one loop-mount slot exists system-wide, so every mount across
// every concurrently-running task serializes on this mutex.
static MOUNT_SLOT: Mutex<()> = Mutex::new(());

/// A raw filesystem image mounted onto an owned scratch mount point.
///
/// Dropping unmounts (with one retry) and removes the mount point.
/// Unmount failures are logged, never escalated.
#[derive(Debug)]
pub struct ImageMount {
    dir: ScratchDir,
    unmount: String,
    timeout: Duration,
    _slot: MutexGuard<'static, ()>,
}

impl ImageMount {
    /// Acquire the global mount slot and mount `image`.
    ///
    /// On mount failure the unmount tool is still attempted before the
    /// mount point is removed; a failed mount command may have left a
    /// half-attached filesystem.
    pub fn mount(image: &Path, tools: &ToolSet) -> Result<Self, AuditError> {
        let slot = MOUNT_SLOT.lock().unwrap_or_else(|e| e.into_inner());
        let dir = ScratchDir::new()?;
        debug!(image = %image.display(), mount = %dir.path().display(), "mounting image");
        let mounted = ToolCommand::new(&tools.mount)
            .arg_path(image)
            .arg_path(dir.path())
            .timeout(tools.timeout)
            .run();
        match mounted {
            Ok(_) => Ok(Self {
                dir,
                unmount: tools.unmount.clone(),
                timeout: tools.timeout,
                _slot: slot,
            }),
            Err(e) => {
                if let Err(unmount_err) = run_unmount(&tools.unmount, dir.path(), tools.timeout) {
                    debug!(error = %unmount_err, "unmount after failed mount");
                }
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for ImageMount {
    fn drop(&mut self) {
        for attempt in 0..2 {
            match run_unmount(&self.unmount, self.dir.path(), self.timeout) {
                Ok(()) => return,
                Err(e) => {
                    if attempt == 0 {
                        std::thread::sleep(Duration::from_millis(500));
                    } else {
                        warn!(
                            mount = %self.dir.path().display(),
                            error = %e,
                            "failed to unmount image"
                        );
                    }
                }
            }
        }
    }
}

fn run_unmount(unmount: &str, mount_point: &Path, timeout: Duration) -> Result<(), AuditError> {
    ToolCommand::new(unmount)
        .arg("-u")
        .arg_path(mount_point)
        .timeout(timeout)
        .run()
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let path = {
            let scratch = ScratchDir::new().unwrap();
            std::fs::write(scratch.path().join("probe"), b"x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists(), "scratch directory should be removed");
    }

    #[test]
    fn test_scratch_dir_removed_on_unwind() {
        let probe = std::sync::Arc::new(Mutex::new(None));
        let probe2 = probe.clone();
        let result = std::panic::catch_unwind(move || {
            let scratch = ScratchDir::new().unwrap();
            *probe2.lock().unwrap() = Some(scratch.path().to_path_buf());
            panic!("unwind");
        });
        assert!(result.is_err());
        let path = probe.lock().unwrap().take().unwrap();
        assert!(!path.exists(), "scratch directory should be removed on panic");
    }

    #[test]
    fn test_failed_mount_reports_and_cleans_up() {
        let tools = ToolSet {
            mount: "fwaudit-no-such-mount-tool".to_string(),
            unmount: "fwaudit-no-such-unmount-tool".to_string(),
            ..ToolSet::default()
        };
        let err = ImageMount::mount(Path::new("missing.img"), &tools).unwrap_err();
        assert!(err.is_tool_error(), "got {err:?}");
    }

    #[test]
    fn test_mount_slot_serializes() {
        // Both mounts fail fast on a missing tool; the point is that
        // neither deadlocks while contending for the single slot.
        let tools = ToolSet {
            mount: "fwaudit-no-such-mount-tool".to_string(),
            unmount: "fwaudit-no-such-unmount-tool".to_string(),
            ..ToolSet::default()
        };
        let tools2 = tools.clone();
        let handle = std::thread::spawn(move || {
            ImageMount::mount(Path::new("a.img"), &tools2).is_err()
        });
        assert!(ImageMount::mount(Path::new("b.img"), &tools).is_err());
        assert!(handle.join().unwrap());
    }
}
