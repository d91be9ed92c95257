//! FastDL Server - exposes the download tree over HTTP and accepts update
//! requests over a WebSocket.

pub mod routes;
pub mod state;

use anyhow::Result;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the router: API routes plus one static mount per project at
/// `/<project>`, serving whatever is currently on disk.
pub fn create_router(state: AppState) -> Router {
    let mut router = routes::api_router();

    for project in state.updater.config().projects() {
        tracing::debug!(
            project = %project.name,
            dir = %project.dest_root.display(),
            "Mounting static files"
        );
        router = router.nest_service(&format!("/{}", project.name), ServeDir::new(&project.dest_root));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("FastDL updater listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
