use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_check, serve_snippet, tracking_decision, AppState};

/// Stable public URL of the generated snippet
pub const SNIPPET_PATH: &str = "/hotjar/hotjar.script.js";

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/tracking", get(tracking_decision))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        );

    Router::new()
        .route("/health", get(health_check))
        .route(SNIPPET_PATH, get(serve_snippet))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
