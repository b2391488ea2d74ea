//! Health check route.

use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

/// Liveness probe, served on both `/` and `/health`.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        "ok",
    )
}
