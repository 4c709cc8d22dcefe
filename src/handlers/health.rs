use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::core::state::AppState;
use crate::models::responses::HealthResponse;

/// Health check handler
///
/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();

    let cards = state.document.read().await.cards().len();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            timestamp,
            cards,
            live_maps: state.maps.len(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_users, state_with_users};

    #[tokio::test]
    async fn test_health_handler() {
        let state = state_with_users(Vec::new()).await;
        let response = health_handler(State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_response_counts_cards() {
        use axum::body::Body;
        use http_body_util::BodyExt;

        let state = state_with_users(sample_users(3)).await;
        let response = health_handler(State(state)).await.into_response();

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, StatusCode::OK);

        let body = Body::new(body);
        let bytes = body.collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(health.status, "ok");
        assert!(health.timestamp > 0);
        assert_eq!(health.cards, 3);
        assert_eq!(health.live_maps, 0);
    }
}
