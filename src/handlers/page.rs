use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
};

use crate::core::state::AppState;
use crate::models::responses::PageSnapshot;
use crate::render::page::render_page;

/// The directory page
///
/// GET /
pub async fn page_handler(State(state): State<AppState>) -> impl IntoResponse {
    let doc = state.document.read().await;
    Html(render_page(&doc, &state.maps))
}

/// JSON snapshot of the page
///
/// GET /api/page
pub async fn page_snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    let doc = state.document.read().await;
    Json(PageSnapshot::capture(&doc, state.maps.ids()))
}
