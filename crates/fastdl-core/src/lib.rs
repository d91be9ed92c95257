//! FastDL Core - mirrors game asset trees into a compressed download tree.
//!
//! A run walks every configured project and asset category, copies files into
//! the output tree, compresses them with bzip2 and reports each step to an
//! [`EventSink`]. The [`TriggerGate`] keeps runs at least one cooldown apart.

pub mod compress;
pub mod config;
pub mod error;
pub mod event;
pub mod gate;
pub mod orchestrator;
pub mod service;
pub mod sync;

pub use compress::{Bzip2Compressor, CompressError, Compressor};
pub use config::{default_config_path, FastDlConfig, Project};
pub use error::SyncError;
pub use event::{EventKind, EventSink, MemorySink, ProgressEvent, TracingSink};
pub use gate::{TriggerDecision, TriggerGate};
pub use orchestrator::run_update;
pub use service::{TriggerOutcome, Updater};
pub use sync::{sync_tree, FileEntry, RunReport, SyncContext, SyncOutcome};
