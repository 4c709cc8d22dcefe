// Centralized error handling for the directory

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::responses::ErrorResponse;
use crate::models::user::UserId;

/// Errors that can occur while fetching the user list
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    #[error("Malformed user list: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised while building or maintaining a map widget
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Invalid coordinates for map display (lat: {lat}, lng: {lng})")]
    InvalidCoordinates { lat: String, lng: String },

    #[error("{0}")]
    Construction(String),

    #[error("Map container never received a size")]
    LayoutTimeout,

    #[error("Failed to remove map: {0}")]
    Removal(String),
}

impl MapError {
    /// Message shown in the inline map error panel
    pub fn panel_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "Failed to create map".to_string()
        } else {
            message
        }
    }
}

/// Errors returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum PageError {
    #[error("No card rendered for user {0}")]
    CardNotFound(UserId),

    #[error("No live map for user {0}")]
    MapNotFound(UserId),

    #[error("Invalid tile: {0}")]
    InvalidTile(String),

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid endpoint: {0}")]
    RouteNotFound(String),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = match &self {
            PageError::CardNotFound(_) => StatusCode::NOT_FOUND,
            PageError::MapNotFound(_) => StatusCode::NOT_FOUND,
            PageError::InvalidTile(_) => StatusCode::BAD_REQUEST,
            PageError::InvalidViewport(_) => StatusCode::BAD_REQUEST,
            PageError::RouteNotFound(_) => StatusCode::NOT_FOUND,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
