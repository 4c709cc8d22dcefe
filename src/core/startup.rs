use tokio::task::JoinHandle;
use tracing::info;

use crate::core::state::AppState;
use crate::directory::loader::load_users;

/// Page-ready: fetch and render the user list once, in the background
pub fn trigger_initial_load(state: &AppState) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        info!("Running initial user load");
        load_users(&state).await;
    })
}
