//! Compressor adapter.
//!
//! Each eligible file is compressed in place by an external program, which
//! replaces `file` with `file.<suffix>`. The [`Compressor`] trait keeps the
//! format decision out of the pipeline.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::SyncError;
use crate::event::{EventSink, ProgressEvent};

/// Failure of a single compression.
#[derive(Error, Debug)]
pub enum CompressError {
    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("{program} exited with {status}{}", fmt_stderr(.stderr))]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("{0}")]
    Other(String),
}

fn fmt_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Compresses one file, replacing it with a compressed artifact.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compresses `path` in place and returns the artifact's path.
    async fn compress(&self, path: &Path) -> Result<PathBuf, CompressError>;

    /// Suffix (without the dot) appended to compressed files.
    fn suffix(&self) -> &str;
}

/// Runs `bzip2 -f <file>` (or a compatible program).
#[derive(Debug, Clone)]
pub struct Bzip2Compressor {
    program: String,
    suffix: String,
}

impl Bzip2Compressor {
    pub fn new(program: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            suffix: suffix.into(),
        }
    }
}

impl Default for Bzip2Compressor {
    fn default() -> Self {
        Self::new("bzip2", "bz2")
    }
}

#[async_trait]
impl Compressor for Bzip2Compressor {
    async fn compress(&self, path: &Path) -> Result<PathBuf, CompressError> {
        debug!(program = %self.program, path = %path.display(), "Running compressor");
        let output = Command::new(&self.program)
            .arg("-f")
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CompressError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CompressError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(artifact_path(path, &self.suffix))
    }

    fn suffix(&self) -> &str {
        &self.suffix
    }
}

/// `file.ext` -> `file.ext.<suffix>`.
pub fn artifact_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Compresses `file` and reports the outcome to `sink`.
///
/// `display` is the path shown to the observer (relative to the output root).
/// A failure is reported as an `error` event and returned; the caller aborts
/// the run.
pub async fn compress_and_report(
    compressor: &dyn Compressor,
    file: &Path,
    display: &Path,
    sink: &dyn EventSink,
) -> Result<PathBuf, SyncError> {
    match compressor.compress(file).await {
        Ok(artifact) => {
            sink.emit(ProgressEvent::progress(format!(
                "Compressed: {}",
                artifact_path(display, compressor.suffix()).display()
            )));
            Ok(artifact)
        }
        Err(e) => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            error!(file = %file.display(), error = %e, "Compression failed");
            sink.emit(ProgressEvent::error(format!(
                "Compression failed for {}: {}",
                name, e
            )));
            Err(SyncError::Compression {
                file: display.to_path_buf(),
                detail: e.to_string(),
            })
        }
    }
}
