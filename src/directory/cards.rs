use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::directory::map_lifecycle::{schedule_init, schedule_invalidate};
use crate::maps::layout::{mount_size, Size};
use crate::models::user::{UserId, UserRecord};
use crate::stores::document::{Card, MapState};

/// Where a click on a card landed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickOrigin {
    #[default]
    Card,
    /// Inside the map mount (panning, zooming)
    #[serde(rename = "map")]
    MapMount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Expanded,
    Collapsed,
    Ignored,
}

/// Result of a toggle. `init` is the scheduled map construction, if any.
pub struct Toggled {
    pub outcome: ToggleOutcome,
    pub init: Option<JoinHandle<MapState>>,
}

/// Build the card for one user. Cards start collapsed with no map.
pub fn build_card(user: Arc<UserRecord>) -> Card {
    Card::new(user)
}

/// Click handler for a card. Clicks inside the map mount never toggle.
pub async fn on_card_click(
    state: &AppState,
    user_id: UserId,
    origin: ClickOrigin,
) -> Result<Toggled, PageError> {
    if origin == ClickOrigin::MapMount {
        debug!(user_id, "Click inside map mount ignored");
        return Ok(Toggled {
            outcome: ToggleOutcome::Ignored,
            init: None,
        });
    }

    toggle_card(state, user_id).await
}

/// Expand or collapse a card.
///
/// Expanding collapses every other expanded card first, so at most one card
/// is expanded at a time. Collapsing keeps the card's map in the registry.
pub async fn toggle_card(state: &AppState, user_id: UserId) -> Result<Toggled, PageError> {
    let layout = &state.config.layout;
    let mut doc = state.document.write().await;
    let viewport = doc.viewport();

    let was_expanded = doc
        .card(user_id)
        .ok_or(PageError::CardNotFound(user_id))?
        .is_expanded();

    if was_expanded {
        if let Some(card) = doc.card_mut(user_id) {
            card.set_expanded(false, Size::default());
        }
        info!(user_id, "Card collapsed");
        return Ok(Toggled {
            outcome: ToggleOutcome::Collapsed,
            init: None,
        });
    }

    for other in doc
        .cards_mut()
        .iter_mut()
        .filter(|card| card.is_expanded() && card.id() != user_id)
    {
        other.set_expanded(false, Size::default());
        debug!(user_id = other.id(), "Collapsed to make room");
        if state.maps.contains(other.id()) {
            schedule_invalidate(state, other.id());
        }
    }

    let (user, epoch) = match doc.card_mut(user_id) {
        Some(card) => {
            card.set_expanded(true, mount_size(true, viewport, layout));
            (Arc::clone(card.user()), card.epoch())
        }
        None => return Err(PageError::CardNotFound(user_id)),
    };
    drop(doc);

    info!(user_id, epoch, "Card expanded");

    Ok(Toggled {
        outcome: ToggleOutcome::Expanded,
        init: Some(schedule_init(state, user, epoch)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_users, state_with_users};

    async fn expanded_ids(state: &AppState) -> Vec<UserId> {
        let doc = state.document.read().await;
        doc.cards()
            .iter()
            .filter(|card| card.is_expanded())
            .map(|card| card.id())
            .collect()
    }

    #[tokio::test]
    async fn test_expand_then_collapse() {
        let state = state_with_users(sample_users(3)).await;

        let toggled = toggle_card(&state, 2).await.unwrap();
        assert_eq!(toggled.outcome, ToggleOutcome::Expanded);
        assert_eq!(expanded_ids(&state).await, vec![2]);

        let toggled = toggle_card(&state, 2).await.unwrap();
        assert_eq!(toggled.outcome, ToggleOutcome::Collapsed);
        assert!(toggled.init.is_none());
        assert!(expanded_ids(&state).await.is_empty());
    }

    #[tokio::test]
    async fn test_expanding_one_collapses_the_other() {
        let state = state_with_users(sample_users(3)).await;

        toggle_card(&state, 1).await.unwrap();
        toggle_card(&state, 3).await.unwrap();

        assert_eq!(expanded_ids(&state).await, vec![3]);
    }

    #[tokio::test]
    async fn test_collapse_keeps_registry_entry() {
        let state = state_with_users(sample_users(2)).await;

        let toggled = toggle_card(&state, 1).await.unwrap();
        assert_eq!(toggled.init.unwrap().await.unwrap(), MapState::Ready);

        toggle_card(&state, 2).await.unwrap();

        assert!(state.maps.contains(1));
        let doc = state.document.read().await;
        assert_eq!(doc.card(1).unwrap().map_state(), &MapState::Ready);
        assert_eq!(doc.card(1).unwrap().mount_size(), Size::default());
    }

    #[tokio::test]
    async fn test_collapsed_sibling_map_is_invalidated() {
        let state = state_with_users(sample_users(2)).await;

        let toggled = toggle_card(&state, 1).await.unwrap();
        toggled.init.unwrap().await.unwrap();
        assert!(state.maps.get(1).unwrap().size.is_nonzero());

        toggle_card(&state, 2).await.unwrap();

        crate::test_support::wait_until(|| {
            state.maps.get(1).map(|view| view.size) == Some(Size::default())
        })
        .await;
    }

    #[tokio::test]
    async fn test_click_inside_map_is_ignored() {
        let state = state_with_users(sample_users(1)).await;

        let toggled = on_card_click(&state, 1, ClickOrigin::MapMount).await.unwrap();
        assert_eq!(toggled.outcome, ToggleOutcome::Ignored);
        assert!(expanded_ids(&state).await.is_empty());

        let toggled = on_card_click(&state, 1, ClickOrigin::Card).await.unwrap();
        assert_eq!(toggled.outcome, ToggleOutcome::Expanded);
    }

    #[tokio::test]
    async fn test_unknown_card() {
        let state = state_with_users(sample_users(1)).await;
        assert!(matches!(
            toggle_card(&state, 99).await,
            Err(PageError::CardNotFound(99))
        ));
    }

    #[test]
    fn test_click_origin_from_form_value() {
        let origin: ClickOrigin = serde_json::from_str(r#""map""#).unwrap();
        assert_eq!(origin, ClickOrigin::MapMount);
        let origin: ClickOrigin = serde_json::from_str(r#""card""#).unwrap();
        assert_eq!(origin, ClickOrigin::Card);
    }
}
