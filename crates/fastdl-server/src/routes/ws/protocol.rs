//! Messages from the observer to the server. Server-to-client messages are
//! serialized [`ProgressEvent`](fastdl_core::ProgressEvent)s.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request a FastDL update run.
    #[serde(alias = "startUpdate")]
    StartUpdate,
}
