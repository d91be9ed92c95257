//! End-to-end runs of the update pipeline against temporary directory trees.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fastdl_core::compress::artifact_path;
use fastdl_core::{
    run_update, CompressError, Compressor, EventKind, FastDlConfig, MemorySink, SyncError,
};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Stands in for bzip2: renames `file` to `file.bz2`.
#[derive(Default)]
struct RenameCompressor {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    seen: Mutex<Vec<PathBuf>>,
}

impl RenameCompressor {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Compressor for RenameCompressor {
    async fn compress(&self, path: &Path) -> Result<PathBuf, CompressError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().push(path.to_path_buf());
        if self.fail_on_call == Some(call) {
            return Err(CompressError::Other("simulated bzip2 failure".to_string()));
        }
        let target = artifact_path(path, "bz2");
        tokio::fs::rename(path, &target)
            .await
            .map_err(|e| CompressError::Other(e.to_string()))?;
        Ok(target)
    }

    fn suffix(&self) -> &str {
        "bz2"
    }
}

struct Fixture {
    root: TempDir,
    config: FastDlConfig,
}

impl Fixture {
    fn new(projects: &[&str], categories: &[&str]) -> Self {
        let root = tempfile::tempdir().unwrap();
        let config = FastDlConfig {
            sources_root: root.path().join("servers"),
            output_root: root.path().join("fastdl"),
            projects: projects.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            ..FastDlConfig::default()
        };
        Self { root, config }
    }

    fn source_file(&self, project: &str, rel: &str, content: &[u8]) {
        let path = self
            .config
            .sources_root
            .join(project)
            .join(&self.config.game_dir)
            .join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn dest(&self, project: &str, category: &str) -> PathBuf {
        self.config.output_root.join(project).join(category)
    }
}

/// Relative paths of every file and directory under `dir`.
fn snapshot(dir: &Path) -> BTreeSet<String> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeSet<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let rel = path.strip_prefix(base).unwrap().to_string_lossy().into_owned();
            out.insert(rel);
            if path.is_dir() {
                walk(base, &path, out);
            }
        }
    }
    let mut out = BTreeSet::new();
    walk(dir, dir, &mut out);
    out
}

#[tokio::test]
async fn test_copies_and_compresses_skipping_map_files() {
    let fx = Fixture::new(&["alpha"], &["materials"]);
    fx.source_file("alpha", "materials/wood.vtf", b"wood");
    fx.source_file("alpha", "materials/rock.vtf", b"rock");
    fx.source_file("alpha", "materials/level1.bsp", b"map");

    let compressor = RenameCompressor::default();
    let sink = MemorySink::new();
    let report = run_update(&fx.config, &compressor, &sink).await.unwrap();

    let dest = fx.dest("alpha", "materials");
    assert_eq!(
        snapshot(&dest),
        BTreeSet::from(["rock.vtf.bz2".to_string(), "wood.vtf.bz2".to_string()])
    );
    assert_eq!(std::fs::read(dest.join("wood.vtf.bz2")).unwrap(), b"wood");

    let progress = sink.messages(EventKind::Progress);
    assert!(progress.contains(&"Skipping map file: level1.bsp".to_string()));
    for name in ["wood.vtf", "rock.vtf"] {
        assert!(progress.contains(&format!("Copied: alpha/materials/{}", name)));
        assert!(progress.contains(&format!("Compressed: alpha/materials/{}.bz2", name)));
    }
    assert!(!progress.iter().any(|m| m.contains("Copied: alpha/materials/level1")));
    assert_eq!(sink.messages(EventKind::Done), vec!["All FastDL updates complete"]);
    assert!(sink.messages(EventKind::Error).is_empty());

    assert_eq!(report.copied, 2);
    assert_eq!(report.compressed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.categories_synced, 1);
}

#[tokio::test]
async fn test_every_file_mirrored_recursively_without_originals() {
    let fx = Fixture::new(&["alpha", "beta"], &["materials", "sound"]);
    fx.source_file("alpha", "materials/models/player/skin.vtf", b"1");
    fx.source_file("alpha", "materials/models/player/skin.vmt", b"2");
    fx.source_file("alpha", "sound/ambient/wind.wav", b"3");
    fx.source_file("alpha", "sound/ambient/Secret.BSP", b"4");
    fx.source_file("beta", "materials/decals/logo.vtf", b"5");

    let compressor = RenameCompressor::default();
    let sink = MemorySink::new();
    run_update(&fx.config, &compressor, &sink).await.unwrap();

    assert_eq!(
        snapshot(&fx.dest("alpha", "materials")),
        BTreeSet::from([
            "models".to_string(),
            "models/player".to_string(),
            "models/player/skin.vmt.bz2".to_string(),
            "models/player/skin.vtf.bz2".to_string(),
        ])
    );
    assert_eq!(
        snapshot(&fx.dest("alpha", "sound")),
        BTreeSet::from(["ambient".to_string(), "ambient/wind.wav.bz2".to_string()])
    );
    assert_eq!(
        snapshot(&fx.dest("beta", "materials")),
        BTreeSet::from(["decals".to_string(), "decals/logo.vtf.bz2".to_string()])
    );
    assert!(snapshot(&fx.dest("beta", "sound")).is_empty());
    assert_eq!(compressor.seen().len(), 4);
}

#[tokio::test]
async fn test_missing_source_category_creates_empty_destination() {
    let fx = Fixture::new(&["alpha"], &["materials", "sound"]);
    fx.source_file("alpha", "materials/wood.vtf", b"wood");

    let sink = MemorySink::new();
    run_update(&fx.config, &RenameCompressor::default(), &sink)
        .await
        .unwrap();

    let sound = fx.dest("alpha", "sound");
    assert!(sound.is_dir());
    assert!(snapshot(&sound).is_empty());

    let progress = sink.messages(EventKind::Progress);
    let sound_notices: Vec<_> = progress.iter().filter(|m| m.contains("sound")).collect();
    assert_eq!(sound_notices, vec!["No alpha/cstrike/sound, skipping"]);
    assert_eq!(sink.messages(EventKind::Done).len(), 1);
}

#[tokio::test]
async fn test_compression_failure_aborts_run() {
    let fx = Fixture::new(&["alpha", "beta"], &["materials", "sound"]);
    fx.source_file("alpha", "materials/one.vtf", b"1");
    fx.source_file("alpha", "materials/two.vtf", b"2");
    fx.source_file("alpha", "materials/three.vtf", b"3");
    fx.source_file("alpha", "sound/late.wav", b"4");
    fx.source_file("beta", "materials/never.vtf", b"5");

    let compressor = RenameCompressor::failing_on(2);
    let sink = MemorySink::new();
    let err = run_update(&fx.config, &compressor, &sink).await.unwrap_err();

    assert!(matches!(err, SyncError::Compression { .. }));

    let seen = compressor.seen();
    assert_eq!(seen.len(), 2);
    let failed_name = seen[1].file_name().unwrap().to_string_lossy().into_owned();

    let copies: Vec<_> = sink
        .messages(EventKind::Progress)
        .into_iter()
        .filter(|m| m.starts_with("Copied: "))
        .collect();
    assert_eq!(copies.len(), 2);
    assert!(copies[1].ends_with(&failed_name));

    let errors = sink.messages(EventKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with(&format!("Compression failed for {}", failed_name)));
    assert!(errors[0].contains("simulated bzip2 failure"));
    assert!(sink.messages(EventKind::Done).is_empty());

    // Third file, later categories and later projects were never touched.
    assert_eq!(snapshot(&fx.dest("alpha", "materials")).len(), 2);
    assert!(!fx.dest("alpha", "sound").exists());
    assert!(!fx.dest("beta", "materials").exists());
}

#[tokio::test]
async fn test_filesystem_failure_reports_error_event() {
    let fx = Fixture::new(&["alpha"], &["materials"]);
    // A regular file where the category directory should be.
    fx.source_file("alpha", "materials", b"not a directory");

    let sink = MemorySink::new();
    let err = run_update(&fx.config, &RenameCompressor::default(), &sink)
        .await
        .unwrap_err();

    assert!(err.is_filesystem());
    assert_eq!(sink.messages(EventKind::Error), vec![err.to_string()]);
    assert!(sink.messages(EventKind::Done).is_empty());
}

#[tokio::test]
async fn test_rerun_produces_same_tree() {
    let fx = Fixture::new(&["alpha"], &["materials", "sound"]);
    fx.source_file("alpha", "materials/wood.vtf", b"wood");
    fx.source_file("alpha", "materials/maps/level1.bsp", b"map");
    fx.source_file("alpha", "sound/step.wav", b"step");

    run_update(&fx.config, &RenameCompressor::default(), &MemorySink::new())
        .await
        .unwrap();
    let first = snapshot(&fx.config.output_root);

    // Leftovers from an older source tree disappear on the next run.
    std::fs::write(fx.dest("alpha", "materials").join("stale.vtf.bz2"), b"old").unwrap();

    run_update(&fx.config, &RenameCompressor::default(), &MemorySink::new())
        .await
        .unwrap();
    let second = snapshot(&fx.config.output_root);

    assert_eq!(first, second);
    assert!(first.contains("alpha/materials/maps"));
    assert!(!first.iter().any(|p| p.contains("level1")));
}

#[tokio::test]
async fn test_project_destination_folder_is_kept() {
    let fx = Fixture::new(&["alpha"], &["materials"]);
    let keep = fx.config.output_root.join("alpha/maps/readme.txt");
    std::fs::create_dir_all(keep.parent().unwrap()).unwrap();
    std::fs::write(&keep, b"served as-is").unwrap();

    run_update(&fx.config, &RenameCompressor::default(), &MemorySink::new())
        .await
        .unwrap();

    assert!(keep.is_file());
    assert!(fx.root.path().join("fastdl/alpha/materials").is_dir());
}
