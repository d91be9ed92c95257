use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that abort a FastDL update run.
///
/// Filesystem and compression failures are treated alike by the run: both stop
/// the remaining projects and categories and surface their message verbatim to
/// the observer. Nothing is retried and nothing already written is rolled back.
///
/// Throttle rejections and missing source categories are *not* errors; see
/// [`crate::gate::TriggerDecision`] and the orchestrator's skip notices.
///
/// # Examples
///
/// ```
/// use fastdl_core::error::SyncError;
///
/// let err = SyncError::Compression {
///     file: "bhop/materials/wood.vtf".into(),
///     detail: "bzip2 exited with status 2".to_string(),
/// };
/// assert!(err.to_string().contains("wood.vtf"));
/// ```
#[derive(Error, Debug)]
pub enum SyncError {
    /// A filesystem operation failed.
    ///
    /// Covers unreadable directories, permission errors and disk-full
    /// conditions while copying. `op` names the operation that failed.
    #[error("Failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external compressor failed for a file.
    #[error("Compression failed for {}: {detail}", .file.display())]
    Compression { file: PathBuf, detail: String },

    /// Configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be parsed.
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl SyncError {
    /// Builds an [`SyncError::Io`] for the given operation and path.
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SyncError::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns a message with a remediation hint, for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Io { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                format!("{}\n   Check the permissions of the source and output trees.", self)
            }
            SyncError::Compression { .. } => {
                format!("{}\n   Is bzip2 installed and on PATH?", self)
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if the error came from the filesystem rather than the compressor.
    pub fn is_filesystem(&self) -> bool {
        matches!(self, SyncError::Io { .. })
    }
}
