use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Redirect},
};

use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::directory::map_lifecycle::retry_map;
use crate::models::user::UserId;

/// Retry a map that failed to build. A no-op for collapsed or unknown cards.
///
/// POST /maps/{id}/retry
pub async fn retry_handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Redirect {
    retry_map(&state, user_id).await;
    Redirect::to(&format!("/#card-{}", user_id))
}

/// Current view of a live map
///
/// GET /api/maps/{id}
pub async fn map_view_handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, PageError> {
    let view = state
        .maps
        .get(user_id)
        .ok_or(PageError::MapNotFound(user_id))?;

    Ok(Json(view))
}
