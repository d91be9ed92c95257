//! WebSocket observer channel.
//!
//! A client sends `{"type":"start_update"}` to request a run and receives
//! every progress event of that run as `{"type":"progress","message":"..."}`.
//! Rejections and failures arrive as `error` events, a finished run as a
//! single `done` event.

mod connection;
mod protocol;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};

use crate::state::AppState;

pub use connection::dispatch;
pub use protocol::ClientMessage;

/// GET /ws - WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| connection::handle_socket(socket, state))
}
