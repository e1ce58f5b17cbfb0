use thiserror::Error;

/// Error taxonomy for package analysis and snapshot handling.
///
/// Only `UnsupportedFormat` on a top-level package is fatal for that
/// package. Everything else is recovered where it occurs: the affected
/// subtree or record is skipped and the surrounding operation keeps the
/// partial results it already has.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("unsupported package format: '{0}'")]
    UnsupportedFormat(String),

    #[error("external tool '{0}' not found")]
    ToolMissing(String),

    #[error("external tool '{tool}' failed with status {code:?}: {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("external tool '{tool}' timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    #[error("snapshot record '{id}' skipped: {detail}")]
    PartialRecord { id: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AuditError {
    /// True for errors raised by invoking an external unpack/mount tool.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            AuditError::ToolMissing(_)
                | AuditError::ToolFailed { .. }
                | AuditError::ToolTimeout { .. }
        )
    }
}
