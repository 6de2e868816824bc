use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::error::AppError;
use crate::state::AppState;

/// Copy of `public/` compiled into the binary, served when the configured
/// public directory does not hold an asset.
#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/../../public/"]
struct BundledAssets;

pub const INDEX: &str = "index.html";
pub const STYLESHEET: &str = "style.css";
pub const SCRIPT: &str = "app.js";

fn content_type(asset: &str) -> &'static str {
    match asset {
        INDEX => "text/html; charset=utf-8",
        STYLESHEET => "text/css; charset=utf-8",
        SCRIPT => "application/javascript; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// GET /
pub async fn index(State(app): State<AppState>) -> Result<Response, AppError> {
    serve(&app, INDEX).await
}

/// GET /style.css
pub async fn stylesheet(State(app): State<AppState>) -> Result<Response, AppError> {
    serve(&app, STYLESHEET).await
}

/// GET /app.js
pub async fn script(State(app): State<AppState>) -> Result<Response, AppError> {
    serve(&app, SCRIPT).await
}

/// Read `asset` from disk on every request, verbatim.
async fn serve(app: &AppState, asset: &'static str) -> Result<Response, AppError> {
    let body = match tokio::fs::read(app.config.public_path(asset)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            match <BundledAssets as Embed>::get(asset) {
                Some(content) => content.data.into_owned(),
                None => return Ok((StatusCode::NOT_FOUND, "Not found").into_response()),
            }
        }
        Err(e) => return Err(e.into()),
    };
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type(asset))],
        body,
    )
        .into_response())
}
