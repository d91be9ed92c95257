//! Trigger gate: at most one accepted run per cooldown window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Result of asking the gate for a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// The run may start; the gate recorded its start time.
    Accepted,
    /// A previous run started too recently.
    Rejected { wait_secs: u64 },
}

/// Owns the timestamp of the last accepted run.
///
/// One instance per process, shared behind an `Arc`. The stamp is set the
/// moment a run is accepted, so requests arriving while that run is still
/// going are rejected until the cooldown elapses. A run that outlives the
/// cooldown does not block the next one.
#[derive(Debug)]
pub struct TriggerGate {
    cooldown: Duration,
    last_run: Mutex<Option<DateTime<Utc>>>,
}

impl TriggerGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_run: Mutex::new(None),
        }
    }

    /// Start time of the last accepted run, if any.
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        *self.last_run.lock()
    }

    /// Accepts and records a run at `now`, or reports how long to wait.
    ///
    /// The wait is rounded up to whole seconds. A `now` earlier than the
    /// recorded stamp counts as no time elapsed, so the stamp never moves
    /// backwards.
    pub fn request_run(&self, now: DateTime<Utc>) -> TriggerDecision {
        let mut last_run = self.last_run.lock();

        if let Some(last) = *last_run {
            let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                let wait_secs = remaining.as_nanos().div_ceil(1_000_000_000) as u64;
                debug!(wait_secs, "Run rejected, cooldown active");
                return TriggerDecision::Rejected { wait_secs };
            }
        }

        *last_run = Some(now);
        info!(started_at = %now, "Run accepted");
        TriggerDecision::Accepted
    }
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::DEFAULT_COOLDOWN_SECS))
    }
}
