use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::maps::tiles::TileCoord;

/// Parse `{z}/{x}/{y}` path segments. `y` may carry a `.png` suffix.
fn parse_coord(z: &str, x: &str, y: &str) -> Option<TileCoord> {
    let y = y.strip_suffix(".png").unwrap_or(y);
    Some(TileCoord {
        z: z.parse().ok()?,
        x: x.parse().ok()?,
        y: y.parse().ok()?,
    })
}

/// Tile proxy. Upstream failures are answered with a transparent tile.
///
/// GET /tiles/{z}/{x}/{y}
pub async fn tile_handler(
    State(state): State<AppState>,
    Path((z, x, y)): Path<(String, String, String)>,
) -> Result<Response, PageError> {
    let coord = parse_coord(&z, &x, &y)
        .ok_or_else(|| PageError::InvalidTile(format!("{}/{}/{}", z, x, y)))?;

    if !coord.is_valid(state.tiles.provider().max_zoom) {
        return Err(PageError::InvalidTile(format!(
            "{}/{}/{} is outside the tile grid",
            coord.z, coord.x, coord.y
        )));
    }

    let tile = state.tiles.fetch_tile(coord).await;

    let mut response = (StatusCode::OK, tile.bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(if tile.fallback {
            "no-store"
        } else {
            "public, max-age=86400"
        }),
    );
    if tile.fallback {
        headers.insert("x-tile-fallback", HeaderValue::from_static("1"));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routes::build_router;
    use crate::test_support::{serve, state_with_config, test_config};
    use axum::body::Body;
    use axum::http::Request;
    use axum::{routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_tile(state: AppState, uri: &str) -> Response {
        build_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn test_parse_coord() {
        assert_eq!(
            parse_coord("10", "301", "385.png"),
            Some(TileCoord { z: 10, x: 301, y: 385 })
        );
        assert_eq!(parse_coord("10", "-1", "3"), None);
    }

    #[tokio::test]
    async fn test_tile_proxied_from_upstream() {
        let upstream = serve(Router::new().route(
            "/{z}/{x}/{y}",
            get(|| async { vec![0x89u8, b'P', b'N', b'G'] }),
        ))
        .await;
        let mut config = test_config("http://127.0.0.1:9/users");
        config.map.tile_url = format!("{}/{{z}}/{{x}}/{{y}}", upstream);
        let state = state_with_config(Vec::new(), config).await;

        let response = get_tile(state, "/tiles/3/1/2").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert!(response.headers().get("x-tile-fallback").is_none());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_tile_failure_serves_fallback() {
        let mut config = test_config("http://127.0.0.1:9/users");
        config.map.tile_url = "http://127.0.0.1:9/{z}/{x}/{y}.png".to_string();
        let state = state_with_config(Vec::new(), config).await;
        let expected = state.tiles.fallback().bytes;

        let response = get_tile(state, "/tiles/3/1/2").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-tile-fallback"], "1");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, expected);
    }

    #[tokio::test]
    async fn test_tile_outside_grid_rejected() {
        let state = state_with_config(Vec::new(), test_config("http://127.0.0.1:9/users")).await;
        let response = get_tile(state.clone(), "/tiles/2/4/0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get_tile(state, "/tiles/abc/0/0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
