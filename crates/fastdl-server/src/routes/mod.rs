pub mod health;
pub mod ws;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/ws", get(ws::ws_handler))
}
