//! API route modules.

pub mod buffer;
pub mod health;
pub mod proxy;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::api::server::AppState;

/// Create the main router with all routes.
///
/// Unknown paths and unsupported methods both get a plain 404.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(health::health_check)
                .post(proxy::proxy_request)
                .fallback(not_found),
        )
        .route("/health", get(health::health_check).fallback(not_found))
        .route("/buffer", get(buffer::buffer_get).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
