use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::state::AppState;
use crate::directory::cards::build_card;
use crate::models::user::UserRecord;
use crate::stores::document::Document;

/// Fetch the user list and render it.
///
/// Failures never propagate: they end up as an error panel with a retry
/// control. Concurrent calls are not de-duplicated; whichever finishes last
/// owns the page.
pub async fn load_users(state: &AppState) {
    {
        let mut doc = state.document.write().await;
        doc.begin_loading();
    }
    // Cards are gone, so are their mounts
    state.maps.clear();

    info!(endpoint = %state.api_client.endpoint(), "Fetching users");

    let result = state.api_client.fetch_users().await;

    let mut doc = state.document.write().await;
    doc.hide_loading();

    match result {
        Ok(users) => {
            info!(users = users.len(), "Users fetched");
            // Maps built for cards of an overlapping load die with those cards
            state.maps.clear();
            render_users(&mut doc, users);
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch users");
            doc.show_error(format!("Failed to load users: {}", e));
        }
    }
}

/// Replace the container content with one card per user, in list order.
/// Records repeating an id already rendered are skipped.
pub fn render_users(doc: &mut Document, users: Vec<UserRecord>) {
    let mut seen = HashSet::with_capacity(users.len());
    let mut cards = Vec::with_capacity(users.len());

    for user in users {
        if !seen.insert(user.id) {
            warn!(user_id = user.id, "Duplicate user id in list, skipping");
            continue;
        }
        cards.push(build_card(Arc::new(user)));
    }

    doc.show_cards(cards);
}
