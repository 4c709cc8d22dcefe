use std::collections::HashMap;
use tracing::debug;

use crate::core::state::AppState;
use crate::maps::layout::{mount_size, Size};

/// Window resize: re-lay out every mount and invalidate every live map.
/// Returns how many maps accepted the new size.
pub async fn on_resize(state: &AppState, viewport: Size) -> usize {
    let layout = &state.config.layout;

    let sizes: HashMap<_, _> = {
        let mut doc = state.document.write().await;
        doc.set_viewport(viewport);
        doc.cards_mut()
            .iter_mut()
            .map(|card| {
                let size = mount_size(card.is_expanded(), viewport, layout);
                card.set_mount_size(size);
                (card.id(), size)
            })
            .collect()
    };

    let resized = state
        .maps
        .resize_all(|user_id| sizes.get(&user_id).copied().unwrap_or_default());

    debug!(
        width = viewport.width,
        height = viewport.height,
        maps = resized,
        "Viewport resized"
    );

    resized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::cards::toggle_card;
    use crate::stores::document::MapState;
    use crate::test_support::{sample_users, state_with_users};
    use std::time::Duration;

    #[tokio::test]
    async fn test_resize_updates_live_maps() {
        let state = state_with_users(sample_users(2)).await;
        let toggled = toggle_card(&state, 1).await.unwrap();
        toggled.init.unwrap().await.unwrap();
        // Let the post-construction re-measure run first
        tokio::time::sleep(Duration::from_millis(30)).await;

        let resized = on_resize(&state, Size::new(400, 700)).await;

        assert_eq!(resized, 1);
        assert_eq!(state.maps.get(1).unwrap().size, Size::new(352, 300));
        let doc = state.document.read().await;
        assert_eq!(doc.viewport(), Size::new(400, 700));
        assert_eq!(doc.card(2).unwrap().mount_size(), Size::default());
    }

    #[tokio::test]
    async fn test_resize_unblocks_pending_map() {
        let state = state_with_users(sample_users(1)).await;
        on_resize(&state, Size::default()).await;

        let toggled = toggle_card(&state, 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        on_resize(&state, Size::new(1024, 768)).await;

        assert_eq!(toggled.init.unwrap().await.unwrap(), MapState::Ready);
        assert_eq!(state.maps.get(1).unwrap().size, Size::new(720, 300));
    }

    #[tokio::test]
    async fn test_resize_without_maps() {
        let state = state_with_users(sample_users(3)).await;
        assert_eq!(on_resize(&state, Size::new(800, 600)).await, 0);
    }
}
