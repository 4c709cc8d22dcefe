use axum::{
    extract::{Path, State},
    response::Redirect,
    Form,
};
use serde::Deserialize;

use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::directory::cards::{on_card_click, toggle_card, ClickOrigin};
use crate::models::user::UserId;

#[derive(Debug, Deserialize)]
pub struct ClickForm {
    #[serde(default)]
    pub origin: ClickOrigin,
}

fn back_to_card(user_id: UserId) -> Redirect {
    Redirect::to(&format!("/#card-{}", user_id))
}

/// Click anywhere on a card
///
/// POST /cards/{id}/click
pub async fn click_handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Form(form): Form<ClickForm>,
) -> Result<Redirect, PageError> {
    on_card_click(&state, user_id, form.origin).await?;
    Ok(back_to_card(user_id))
}

/// Toggle a card regardless of where the click landed
///
/// POST /cards/{id}/toggle
pub async fn toggle_handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Redirect, PageError> {
    toggle_card(&state, user_id).await?;
    Ok(back_to_card(user_id))
}

#[cfg(test)]
mod tests {
    use crate::core::routes::build_router;
    use crate::core::state::AppState;
    use crate::stores::document::MapState;
    use crate::test_support::{sample_users, state_with_users, wait_until_async};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    async fn post_form(state: &AppState, uri: &str, form: &str) -> axum::response::Response {
        build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_click_expands_and_builds_map() {
        let state = state_with_users(sample_users(3)).await;

        let response = post_form(&state, "/cards/2/click", "origin=card").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/#card-2");

        wait_until_async(|| {
            let state = state.clone();
            async move {
                let doc = state.document.read().await;
                doc.card(2).map(|card| card.map_state() == &MapState::Ready) == Some(true)
            }
        })
        .await;
        assert!(state.maps.contains(2));
    }

    #[tokio::test]
    async fn test_click_inside_map_does_not_toggle() {
        let state = state_with_users(sample_users(1)).await;

        let response = post_form(&state, "/cards/1/click", "origin=map").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let doc = state.document.read().await;
        assert!(!doc.card(1).unwrap().is_expanded());
    }

    #[tokio::test]
    async fn test_toggle_twice_collapses() {
        let state = state_with_users(sample_users(2)).await;

        post_form(&state, "/cards/1/toggle", "").await;
        post_form(&state, "/cards/1/toggle", "").await;

        let doc = state.document.read().await;
        assert!(doc.cards().iter().all(|card| !card.is_expanded()));
    }

    #[tokio::test]
    async fn test_unknown_card_is_not_found() {
        let state = state_with_users(sample_users(1)).await;
        let response = post_form(&state, "/cards/42/click", "origin=card").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
