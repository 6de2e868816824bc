pub mod assets;
pub mod config;
pub mod error;
pub mod logs;
pub mod prompt;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes::not_found;
use crate::state::AppState;

/// Largest accepted request body (log uploads).
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build the axum Router with the UI assets, the three phase endpoints and
/// a 404 fallback. A known path with the wrong method is also a 404.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Chat client
        .route("/", get(assets::index).fallback(not_found))
        .route("/style.css", get(assets::stylesheet).fallback(not_found))
        .route("/app.js", get(assets::script).fallback(not_found))
        // Workflow phases
        .route(
            "/api/upload-log",
            post(routes::phases::upload_log).fallback(not_found),
        )
        .route(
            "/api/confirm-root-cause",
            post(routes::phases::confirm_root_cause).fallback(not_found),
        )
        .route(
            "/api/confirm-fix-plan",
            post(routes::phases::confirm_fix_plan).fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the control panel on a pre-bound listener.
///
/// Taking a bound `TcpListener` lets the caller read the actual port first
/// (useful when binding port 0).
pub async fn serve_on(
    state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let port = listener.local_addr()?.port();
    let app = build_router(state);

    tracing::info!("bugfix control panel listening on http://localhost:{port}");

    if open_browser {
        let url = format!("http://localhost:{port}");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
