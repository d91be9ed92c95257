use std::sync::Arc;

use fastdl_core::Updater;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single updater of this process; owns the trigger gate.
    pub updater: Arc<Updater>,
}

impl AppState {
    pub fn new(updater: Arc<Updater>) -> Self {
        Self { updater }
    }
}
