use axum::{extract::State, response::Redirect};
use tracing::info;

use crate::core::state::AppState;
use crate::directory::loader::load_users;

/// Re-fetch the user list. The fetch runs in the background; the client is
/// sent back to the page, which shows the loading indicator meanwhile.
///
/// POST /users/reload
pub async fn reload_handler(State(state): State<AppState>) -> Redirect {
    info!("User list reload requested");

    tokio::spawn(async move {
        load_users(&state).await;
    });

    Redirect::to("/")
}
