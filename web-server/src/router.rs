//! Router construction for the places web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::routes;
use crate::state::AppState;

/// Build the full axum router: same-origin API, view model, static page.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    // CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::api::health))
        // Upstream relay
        .route("/api/places", get(routes::api::list_places))
        .route("/api/places/types", get(routes::api::place_types))
        .route("/api/places/:id", get(routes::api::get_place))
        // Cached view model
        .route("/api/view", get(routes::view::view_model))
        .route("/api/cache/invalidate", post(routes::api::invalidate_cache))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
