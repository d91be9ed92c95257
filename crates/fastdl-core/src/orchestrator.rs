//! Run orchestrator: one full pass over every project and asset category.

use std::path::Path;

use tracing::{error, info, info_span, Instrument};

use crate::compress::Compressor;
use crate::config::FastDlConfig;
use crate::error::SyncError;
use crate::event::{EventSink, ProgressEvent};
use crate::sync::{sync_tree, RunReport, SyncContext};

pub const STARTED_MESSAGE: &str = "FastDL update started";
pub const DONE_MESSAGE: &str = "All FastDL updates complete";

/// Rebuilds every configured category of every configured project.
///
/// Projects and categories are processed strictly in configuration order.
/// Each destination category is deleted and recreated before it is filled;
/// a missing source category leaves it empty. On success a single `done`
/// event is emitted. On failure the run stops where it is, the observer
/// gets an `error` event and the error is returned; nothing is rolled back.
pub async fn run_update(
    config: &FastDlConfig,
    compressor: &dyn Compressor,
    sink: &dyn EventSink,
) -> Result<RunReport, SyncError> {
    match run_projects(config, compressor, sink).await {
        Ok(report) => {
            sink.emit(ProgressEvent::done(DONE_MESSAGE));
            info!(?report, "FastDL update complete");
            Ok(report)
        }
        Err(e) => {
            error!(error = %e, "FastDL update aborted");
            // The compressor adapter already told the observer which file failed.
            if !matches!(e, SyncError::Compression { .. }) {
                sink.emit(ProgressEvent::error(e.to_string()));
            }
            Err(e)
        }
    }
}

async fn run_projects(
    config: &FastDlConfig,
    compressor: &dyn Compressor,
    sink: &dyn EventSink,
) -> Result<RunReport, SyncError> {
    config.validate()?;
    sink.emit(ProgressEvent::progress(STARTED_MESSAGE));

    let ctx = SyncContext {
        compressor,
        sink,
        output_root: &config.output_root,
        excluded_extension: &config.excluded_extension,
    };
    let mut report = RunReport::new();

    for project in config.projects() {
        let span = info_span!("project", project = %project.name);
        async {
            sink.emit(ProgressEvent::progress(format!(
                "--- Starting {} ---",
                project.name
            )));

            for category in &config.categories {
                let src = project.source_root.join(category);
                let dst = project.dest_root.join(category);

                recreate_dir(&dst).await?;

                if !path_exists(&src).await? {
                    info!(category = %category, src = %src.display(), "Source category missing");
                    sink.emit(ProgressEvent::progress(format!(
                        "No {}/{}/{}, skipping",
                        project.name, config.game_dir, category
                    )));
                    report.categories_skipped += 1;
                    continue;
                }

                sink.emit(ProgressEvent::progress(format!(
                    "Processing {}/{}",
                    project.name, category
                )));
                sync_tree(&src, &dst, &ctx, &mut report).await?;
                report.categories_synced += 1;
            }

            sink.emit(ProgressEvent::progress(format!("Finished {}", project.name)));
            report.projects += 1;
            Ok::<(), SyncError>(())
        }
        .instrument(span)
        .await?;
    }

    Ok(report)
}

/// Removes `dir` with its contents if present and creates it again, empty.
/// Missing parents are created.
async fn recreate_dir(dir: &Path) -> Result<(), SyncError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(SyncError::io("remove", dir, e)),
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SyncError::io("create directory", dir, e))
}

async fn path_exists(path: &Path) -> Result<bool, SyncError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| SyncError::io("check", path, e))
}
