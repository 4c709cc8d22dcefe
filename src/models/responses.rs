use serde::{Deserialize, Serialize};

use crate::maps::layout::Size;
use crate::models::user::UserId;
use crate::stores::document::{Card, Document, MapState};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub cards: usize,
    pub live_maps: usize,
}

/// Width and height posted by the client on window resize
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewportForm {
    pub width: u32,
    pub height: u32,
}

impl From<ViewportForm> for Size {
    fn from(form: ViewportForm) -> Self {
        Size::new(form.width, form.height)
    }
}

#[derive(Debug, Serialize)]
pub struct CardSnapshot {
    pub id: UserId,
    pub name: Option<String>,
    pub expanded: bool,
    pub mount_id: String,
    pub mount_size: Size,
    pub spinner_visible: bool,
    pub map: MapState,
}

impl From<&Card> for CardSnapshot {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id(),
            name: card.user().name.clone(),
            expanded: card.is_expanded(),
            mount_id: card.mount_id(),
            mount_size: card.mount_size(),
            spinner_visible: card.spinner_visible(),
            map: card.map_state().clone(),
        }
    }
}

/// JSON view of the whole page
#[derive(Debug, Serialize)]
pub struct PageSnapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub viewport: Size,
    pub cards: Vec<CardSnapshot>,
    pub live_maps: Vec<UserId>,
}

impl PageSnapshot {
    pub fn capture(doc: &Document, live_maps: Vec<UserId>) -> Self {
        Self {
            loading: doc.is_loading(),
            error: doc.error_message().map(str::to_string),
            viewport: doc.viewport(),
            cards: doc.cards().iter().map(CardSnapshot::from).collect(),
            live_maps,
        }
    }
}
