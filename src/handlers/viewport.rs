use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    response::Json,
};
use serde::Serialize;

use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::directory::events::on_resize;
use crate::maps::layout::Size;
use crate::models::responses::ViewportForm;

#[derive(Debug, Serialize)]
pub struct ViewportResponse {
    pub viewport: Size,
    pub resized_maps: usize,
}

/// Window resize. Accepts a JSON body or a urlencoded form with `width`
/// and `height`.
///
/// POST /viewport
pub async fn viewport_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ViewportResponse>, PageError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);

    let form: ViewportForm = if is_json {
        serde_json::from_slice(&body).map_err(|e| PageError::InvalidViewport(e.to_string()))?
    } else {
        serde_urlencoded::from_bytes(&body)
            .map_err(|e| PageError::InvalidViewport(e.to_string()))?
    };

    let viewport = Size::from(form);
    let resized_maps = on_resize(&state, viewport).await;

    Ok(Json(ViewportResponse {
        viewport,
        resized_maps,
    }))
}
