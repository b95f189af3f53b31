//! Route definitions and router construction.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;
use crate::ws;

/// Build the application router.
///
/// The dashboard UI is served separately and connects cross-origin, so CORS
/// is permissive.
pub fn create_router(ctx: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws::process_ws))
        .layer(cors)
        .with_state(ctx)
}

async fn health() -> &'static str {
    "OK"
}
