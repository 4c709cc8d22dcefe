// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Page and user actions
        .route("/", get(crate::handlers::page::page_handler))
        .route("/users/reload", post(crate::handlers::users::reload_handler))
        .route("/cards/{id}/click", post(crate::handlers::cards::click_handler))
        .route("/cards/{id}/toggle", post(crate::handlers::cards::toggle_handler))
        .route("/maps/{id}/retry", post(crate::handlers::maps::retry_handler))
        .route("/viewport", post(crate::handlers::viewport::viewport_handler))

        // JSON views
        .route("/api/page", get(crate::handlers::page::page_snapshot_handler))
        .route("/api/maps/{id}", get(crate::handlers::maps::map_view_handler))

        // Tile proxy
        .route("/tiles/{z}/{x}/{y}", get(crate::handlers::tiles::tile_handler))

        .route("/health", get(crate::handlers::health::health_handler))

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .with_state(state)
}
