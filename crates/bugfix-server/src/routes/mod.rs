pub mod phases;

use axum::http::StatusCode;

/// Fallback for every unmatched method and path.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
