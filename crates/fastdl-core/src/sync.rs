//! Tree synchronizer.
//!
//! Mirrors one source category folder into its destination, depth first.
//! Directories are recreated, map files are skipped and every other file is
//! copied and handed to the [`Compressor`](crate::compress::Compressor).

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::compress::{compress_and_report, Compressor};
use crate::error::SyncError;
use crate::event::{EventSink, ProgressEvent};

/// What the synchronizer did with one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Directory mirrored and descended into.
    Directory,
    /// File copied and compressed.
    Compressed,
    /// File left out (excluded extension or symlink).
    Skipped,
}

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub projects: usize,
    pub categories_synced: usize,
    pub categories_skipped: usize,
    pub directories: usize,
    pub copied: usize,
    pub compressed: usize,
    pub skipped: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry outcome, incrementing the matching counters.
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Directory => self.directories += 1,
            SyncOutcome::Compressed => {
                self.copied += 1;
                self.compressed += 1;
            }
            SyncOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Total number of files looked at (copied or skipped).
    pub fn files(&self) -> usize {
        self.copied + self.skipped
    }
}

/// Type of a directory entry, as reported by the listing (links not followed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
}

/// A directory entry seen during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Lists `dir` in the order the filesystem returns entries.
pub async fn list_entries(dir: &Path) -> Result<Vec<FileEntry>, SyncError> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SyncError::io("read directory", dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| SyncError::io("read directory", dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| SyncError::io("inspect", entry.path(), e))?;
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            kind,
        });
    }
    Ok(entries)
}

/// Everything a walk needs besides the two directories.
pub struct SyncContext<'a> {
    pub compressor: &'a dyn Compressor,
    pub sink: &'a dyn EventSink,
    /// Paths in events are shown relative to this directory.
    pub output_root: &'a Path,
    /// Extension (without dot) of files that are never copied.
    pub excluded_extension: &'a str,
}

/// Returns true if `name` ends in `.<extension>`, ignoring ASCII case.
pub fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

impl SyncContext<'_> {
    fn display<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.output_root).unwrap_or(path)
    }
}

/// Mirrors `src` into `dst`, which must already exist.
///
/// Stops at the first failure; files already written stay in place.
pub fn sync_tree<'a>(
    src: &'a Path,
    dst: &'a Path,
    ctx: &'a SyncContext<'a>,
    report: &'a mut RunReport,
) -> BoxFuture<'a, Result<(), SyncError>> {
    Box::pin(async move {
        debug!(src = %src.display(), dst = %dst.display(), "Syncing directory");

        for entry in list_entries(src).await? {
            let dst_path = dst.join(&entry.name);
            let outcome = match entry.kind {
                EntryKind::Directory => {
                    tokio::fs::create_dir_all(&dst_path)
                        .await
                        .map_err(|e| SyncError::io("create directory", &dst_path, e))?;
                    sync_tree(&entry.path, &dst_path, ctx, report).await?;
                    SyncOutcome::Directory
                }
                EntryKind::Symlink => {
                    ctx.sink
                        .emit(ProgressEvent::progress(format!("Skipping symlink: {}", entry.name)));
                    SyncOutcome::Skipped
                }
                EntryKind::File if has_extension(&entry.name, ctx.excluded_extension) => {
                    ctx.sink
                        .emit(ProgressEvent::progress(format!("Skipping map file: {}", entry.name)));
                    SyncOutcome::Skipped
                }
                EntryKind::File => {
                    tokio::fs::copy(&entry.path, &dst_path)
                        .await
                        .map_err(|e| SyncError::io("copy", &entry.path, e))?;
                    let shown = ctx.display(&dst_path);
                    trace!(file = %shown.display(), "Copied");
                    ctx.sink
                        .emit(ProgressEvent::progress(format!("Copied: {}", shown.display())));
                    compress_and_report(ctx.compressor, &dst_path, shown, ctx.sink).await?;
                    SyncOutcome::Compressed
                }
            };
            report.record(outcome);
        }
        Ok(())
    })
}
