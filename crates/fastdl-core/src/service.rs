//! The updater service ties the gate, the configuration and the compressor
//! together. Both the HTTP server and the CLI trigger runs through it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::compress::{Bzip2Compressor, Compressor};
use crate::config::FastDlConfig;
use crate::error::SyncError;
use crate::event::{EventSink, ProgressEvent};
use crate::gate::{TriggerDecision, TriggerGate};
use crate::orchestrator::run_update;
use crate::sync::RunReport;

/// What happened to a trigger.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// Cooldown still active; nothing ran.
    Rejected { wait_secs: u64 },
    /// The run was accepted and has finished, successfully or not.
    Completed(Result<RunReport, SyncError>),
}

impl TriggerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TriggerOutcome::Completed(Ok(_)))
    }
}

/// Process-wide updater. Clone the `Arc`, not the updater.
pub struct Updater {
    config: FastDlConfig,
    gate: TriggerGate,
    compressor: Arc<dyn Compressor>,
}

impl Updater {
    /// Builds an updater running the configured bzip2 program.
    pub fn new(config: FastDlConfig) -> Self {
        let compressor = Bzip2Compressor::new(&config.compressor, &config.compressed_suffix);
        Self::with_compressor(config, Arc::new(compressor))
    }

    pub fn with_compressor(config: FastDlConfig, compressor: Arc<dyn Compressor>) -> Self {
        let gate = TriggerGate::new(config.cooldown());
        Self {
            config,
            gate,
            compressor,
        }
    }

    pub fn config(&self) -> &FastDlConfig {
        &self.config
    }

    /// Handles one trigger at `now`.
    ///
    /// A rejection is reported to `sink` as a single `error` event. An
    /// accepted trigger runs to completion before this returns.
    pub async fn trigger(&self, now: DateTime<Utc>, sink: &dyn EventSink) -> TriggerOutcome {
        match self.gate.request_run(now) {
            TriggerDecision::Rejected { wait_secs } => {
                warn!(
                    wait_secs,
                    last_run = ?self.gate.last_run(),
                    "Update requested during cooldown"
                );
                sink.emit(ProgressEvent::error(format!(
                    "Please wait {}s before running again.",
                    wait_secs
                )));
                TriggerOutcome::Rejected { wait_secs }
            }
            TriggerDecision::Accepted => {
                let result = run_update(&self.config, self.compressor.as_ref(), sink).await;
                TriggerOutcome::Completed(result)
            }
        }
    }

    /// [`trigger`](Self::trigger) at the current time.
    pub async fn trigger_now(&self, sink: &dyn EventSink) -> TriggerOutcome {
        self.trigger(Utc::now(), sink).await
    }
}
