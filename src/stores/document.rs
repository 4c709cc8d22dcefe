use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::maps::layout::{MountLayout, Size};
use crate::models::user::{UserId, UserRecord};

/// Lifecycle of the map inside one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MapState {
    Absent,
    Loading,
    Ready,
    Errored { message: String },
}

/// What the users container currently shows
#[derive(Debug)]
pub enum Content {
    Empty,
    Cards(Vec<Card>),
    Error(String),
}

// Epochs are unique across every card ever built, so a card rebuilt by a
// reload never repeats an epoch of the card it replaced.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// One rendered user card
///
/// The card owns the record it was built from so retries can rebuild the
/// map without refetching. Every expand or collapse takes a fresh `epoch`;
/// scheduled map initialisations carry the epoch they were scheduled under.
#[derive(Debug)]
pub struct Card {
    user: Arc<UserRecord>,
    expanded: bool,
    map_state: MapState,
    epoch: u64,
    mount: watch::Sender<MountLayout>,
}

impl Card {
    pub fn new(user: Arc<UserRecord>) -> Self {
        let epoch = next_epoch();
        let (mount, _) = watch::channel(MountLayout {
            size: Size::default(),
            epoch,
        });
        Self {
            user,
            expanded: false,
            map_state: MapState::Absent,
            epoch,
            mount,
        }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn user(&self) -> &Arc<UserRecord> {
        &self.user
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn map_state(&self) -> &MapState {
        &self.map_state
    }

    pub fn spinner_visible(&self) -> bool {
        self.map_state == MapState::Loading
    }

    /// Message of the inline map error panel, if one is shown
    pub fn error_panel(&self) -> Option<&str> {
        match &self.map_state {
            MapState::Errored { message } => Some(message),
            _ => None,
        }
    }

    pub fn mount_id(&self) -> String {
        format!("user-{}", self.user.id)
    }

    pub fn spinner_id(&self) -> String {
        format!("loading-{}", self.user.id)
    }

    pub fn mount_size(&self) -> Size {
        self.mount.borrow().size
    }

    /// Subscribe to the mount's layout box
    pub fn subscribe(&self) -> watch::Receiver<MountLayout> {
        self.mount.subscribe()
    }

    /// Expand or collapse, starting a new epoch
    pub fn set_expanded(&mut self, expanded: bool, mount_size: Size) {
        self.expanded = expanded;
        self.epoch = next_epoch();
        self.mount.send_replace(MountLayout {
            size: mount_size,
            epoch: self.epoch,
        });
    }

    /// Publish a new mount size without changing the epoch
    pub fn set_mount_size(&mut self, size: Size) {
        let epoch = self.epoch;
        self.mount.send_replace(MountLayout { size, epoch });
    }

    pub fn set_map_state(&mut self, state: MapState) {
        self.map_state = state;
    }
}

/// The page: a loading indicator and the users container
#[derive(Debug)]
pub struct Document {
    loading_visible: bool,
    content: Content,
    viewport: Size,
}

impl Document {
    pub fn new(viewport: Size) -> Self {
        Self {
            loading_visible: false,
            content: Content::Empty,
            viewport,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading_visible
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Show the loading indicator and drop whatever was rendered
    pub fn begin_loading(&mut self) {
        self.loading_visible = true;
        self.content = Content::Empty;
    }

    pub fn hide_loading(&mut self) {
        self.loading_visible = false;
    }

    /// Replace the container content with `cards`
    pub fn show_cards(&mut self, cards: Vec<Card>) {
        self.content = Content::Cards(cards);
    }

    /// Replace the container content with an error panel
    pub fn show_error(&mut self, message: String) {
        self.content = Content::Error(message);
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.content {
            Content::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn cards(&self) -> &[Card] {
        match &self.content {
            Content::Cards(cards) => cards,
            _ => &[],
        }
    }

    pub fn cards_mut(&mut self) -> &mut [Card] {
        match &mut self.content {
            Content::Cards(cards) => cards,
            _ => &mut [],
        }
    }

    pub fn card(&self, user_id: UserId) -> Option<&Card> {
        self.cards().iter().find(|card| card.id() == user_id)
    }

    pub fn card_mut(&mut self, user_id: UserId) -> Option<&mut Card> {
        self.cards_mut().iter_mut().find(|card| card.id() == user_id)
    }

    /// Show the inline map error panel for a card, replacing any existing one.
    /// The loading spinner is hidden. Returns false when the card is gone.
    pub fn show_map_error(&mut self, user_id: UserId, message: impl Into<String>) -> bool {
        match self.card_mut(user_id) {
            Some(card) => {
                card.set_map_state(MapState::Errored {
                    message: message.into(),
                });
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId) -> Arc<UserRecord> {
        Arc::new(serde_json::from_value(serde_json::json!({ "id": id })).unwrap())
    }

    #[test]
    fn test_new_card_is_collapsed_and_absent() {
        let card = Card::new(user(4));
        assert!(!card.is_expanded());
        assert_eq!(card.map_state(), &MapState::Absent);
        assert_eq!(card.mount_id(), "user-4");
        assert_eq!(card.spinner_id(), "loading-4");
        assert_eq!(card.mount_size(), Size::default());
    }

    #[test]
    fn test_expand_bumps_epoch_and_publishes_size() {
        let mut card = Card::new(user(1));
        let rx = card.subscribe();
        let initial = card.epoch();

        card.set_expanded(true, Size::new(720, 300));

        let expanded = card.epoch();
        assert_ne!(expanded, initial);
        assert_eq!(rx.borrow().size, Size::new(720, 300));
        assert_eq!(rx.borrow().epoch, expanded);

        card.set_mount_size(Size::new(300, 300));
        assert_eq!(rx.borrow().epoch, expanded);
        assert_eq!(card.mount_size(), Size::new(300, 300));
    }

    #[test]
    fn test_rebuilt_card_never_repeats_epochs() {
        let mut old = Card::new(user(1));
        old.set_expanded(true, Size::new(720, 300));

        let mut rebuilt = Card::new(user(1));
        assert_ne!(rebuilt.epoch(), old.epoch());
        rebuilt.set_expanded(true, Size::new(720, 300));
        assert_ne!(rebuilt.epoch(), old.epoch());
        assert!(rebuilt.epoch() > old.epoch());
    }

    #[test]
    fn test_map_error_replaces_previous_panel() {
        let mut doc = Document::new(Size::new(1280, 800));
        doc.show_cards(vec![Card::new(user(1))]);
        doc.card_mut(1).unwrap().set_map_state(MapState::Loading);

        assert!(doc.show_map_error(1, "first"));
        assert!(doc.show_map_error(1, "second"));

        let card = doc.card(1).unwrap();
        assert_eq!(card.error_panel(), Some("second"));
        assert!(!card.spinner_visible());
        assert!(!doc.show_map_error(2, "missing"));
    }

    #[test]
    fn test_loading_clears_content() {
        let mut doc = Document::new(Size::new(1280, 800));
        doc.show_cards(vec![Card::new(user(1)), Card::new(user(2))]);

        doc.begin_loading();
        assert!(doc.is_loading());
        assert!(doc.cards().is_empty());

        doc.hide_loading();
        doc.show_error("boom".to_string());
        assert!(!doc.is_loading());
        assert_eq!(doc.error_message(), Some("boom"));
    }
}
