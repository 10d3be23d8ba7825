//! docpanel gateway - HTTP CRUD over a collection store

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    http::HeaderValue,
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CORS for the configured origins; any origin when none are listed
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|s| {
            let parsed = s.parse::<HeaderValue>();
            if parsed.is_err() {
                tracing::warn!(origin = %s, "invalid CORS origin ignored");
            }
            parsed.ok()
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the gateway router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/databases", get(handlers::list_databases))
        .route(
            "/api/data",
            get(handlers::list_documents)
                .post(handlers::insert_document)
                .put(handlers::update_in_body)
                .delete(handlers::delete_many),
        )
        .route("/api/data/bulk", put(handlers::bulk_update))
        .route(
            "/api/data/:id",
            put(handlers::update_by_id).delete(handlers::delete_one),
        )
        .route("/api/add-field-all", put(handlers::set_field_all))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
