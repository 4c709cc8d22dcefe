use axum::{
    http::{HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::core::error::PageError;

pub async fn fallback_handler(headers: HeaderMap, uri: Uri) -> Response {
    // Check if this is a browser request
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let is_browser = user_agent.contains("Mozilla")
        || user_agent.contains("Chrome")
        || user_agent.contains("Safari")
        || user_agent.contains("Firefox")
        || user_agent.contains("Edge");

    if is_browser {
        let html = "<p>Page not found. <a href=\"/\">Back to the directory</a></p>";

        return (StatusCode::NOT_FOUND, Html(html)).into_response();
    }

    PageError::RouteNotFound(uri.path().to_string()).into_response()
}
