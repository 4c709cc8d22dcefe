//! Lazy construction, teardown and re-measuring of per-card map widgets.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::error::MapError;
use crate::core::state::AppState;
use crate::maps::layout::{wait_for_mount, LayoutWait};
use crate::maps::tiles::LatLng;
use crate::maps::widget::{MapSpec, Marker};
use crate::models::user::{Coordinate, UserId, UserRecord};
use crate::render::escape::escape_opt;
use crate::stores::document::{Document, MapState};

/// Build the map for `user` once its mount is measurable.
///
/// `epoch` is the card epoch the initialisation was scheduled under; if the
/// card has been collapsed or re-expanded since, the initialisation is
/// abandoned. Returns the state the card's map ended in.
pub async fn init_map(state: &AppState, user: Arc<UserRecord>, epoch: u64) -> MapState {
    let user_id = user.id;

    let mut mount = {
        let mut doc = state.document.write().await;
        let Some(card) = doc.card_mut(user_id) else {
            debug!(user_id, "Map mount missing, skipping initialisation");
            return MapState::Absent;
        };
        if card.epoch() != epoch {
            debug!(user_id, epoch, current = card.epoch(), "Stale map initialisation dropped");
            return MapState::Absent;
        }
        card.set_map_state(MapState::Loading);
        card.subscribe()
    };

    // Rapid re-expansion can leave a widget behind
    if state.maps.destroy(user_id) {
        debug!(user_id, "Previous map destroyed before re-initialisation");
    }

    let Some((lat, lng)) = user.coordinates() else {
        let err = MapError::InvalidCoordinates {
            lat: coordinate_text(user.address.geo.lat.as_ref()),
            lng: coordinate_text(user.address.geo.lng.as_ref()),
        };
        warn!(user_id, error = %err, "Cannot build map");
        return fail(state, user_id, epoch, err).await;
    };

    let layout = &state.config.layout;
    let size = match wait_for_mount(&mut mount, epoch, layout.ready_timeout()).await {
        LayoutWait::Ready(size) => size,
        LayoutWait::Superseded => {
            debug!(user_id, "Card changed while waiting for layout");
            abandon(&mut *state.document.write().await, user_id);
            return MapState::Absent;
        }
        LayoutWait::TimedOut => {
            warn!(user_id, timeout_ms = layout.ready_timeout_ms, "Map container never got a size");
            return fail(state, user_id, epoch, MapError::LayoutTimeout).await;
        }
    };

    let center = LatLng::new(lat, lng);
    let zoom = state.config.map.initial_zoom;
    let spec = MapSpec {
        mount_id: format!("user-{}", user_id),
        center,
        zoom,
        size,
        marker: Marker {
            position: center,
            popup_html: popup_html(&user),
        },
    };

    let mut widget = match state.engine.create(spec) {
        Ok(widget) => widget,
        Err(e) => {
            error!(user_id, error = %e, "Map construction failed");
            return fail(state, user_id, epoch, e).await;
        }
    };

    {
        let mut doc = state.document.write().await;
        let current = doc.card(user_id).map(|card| card.epoch());
        if current != Some(epoch) {
            debug!(user_id, "Card changed during map construction, discarding widget");
            if let Err(e) = widget.remove() {
                debug!(user_id, error = %e, "Ignoring map teardown failure");
            }
            abandon(&mut doc, user_id);
            return MapState::Absent;
        }

        let evicted = state.maps.create(user_id, widget);
        for evicted_id in evicted {
            debug!(user_id = evicted_id, "Map evicted from registry");
            if let Some(card) = doc.card_mut(evicted_id) {
                card.set_map_state(MapState::Absent);
            }
        }

        if let Some(card) = doc.card_mut(user_id) {
            card.set_map_state(MapState::Ready);
        }
    }

    info!(user_id, lat, lng, zoom, width = size.width, height = size.height, "Map ready");

    schedule_remeasure(state, user_id, center, zoom);

    MapState::Ready
}

/// Run [`init_map`] after the expand settle delay
pub fn schedule_init(state: &AppState, user: Arc<UserRecord>, epoch: u64) -> JoinHandle<MapState> {
    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(state.config.layout.expand_settle()).await;
        init_map(&state, user, epoch).await
    })
}

/// Retry a failed map. Only acts on expanded cards; returns `None` otherwise.
pub async fn retry_map(state: &AppState, user_id: UserId) -> Option<JoinHandle<MapState>> {
    let (user, epoch) = {
        let mut doc = state.document.write().await;
        let card = doc.card_mut(user_id)?;
        if !card.is_expanded() {
            debug!(user_id, "Retry ignored for collapsed card");
            return None;
        }
        if card.error_panel().is_some() {
            card.set_map_state(MapState::Absent);
        }
        (Arc::clone(card.user()), card.epoch())
    };

    info!(user_id, "Retrying map");

    let state = state.clone();
    Some(tokio::spawn(async move { init_map(&state, user, epoch).await }))
}

/// Ask a collapsed card's map to re-measure once the collapse has settled
pub fn schedule_invalidate(state: &AppState, user_id: UserId) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(state.config.layout.collapse_settle()).await;
        let size = {
            let doc = state.document.read().await;
            doc.card(user_id).map(|card| card.mount_size()).unwrap_or_default()
        };
        if let Err(e) = state.maps.invalidate(user_id, size) {
            debug!(user_id, error = %e, "Ignoring size invalidation failure");
        }
    })
}

/// Force a re-measure and re-centre once the new map has settled
fn schedule_remeasure(state: &AppState, user_id: UserId, center: LatLng, zoom: u8) {
    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(state.config.layout.remeasure()).await;
        let size = {
            let doc = state.document.read().await;
            match doc.card(user_id) {
                Some(card) => card.mount_size(),
                None => return,
            }
        };
        if let Err(e) = state.maps.remeasure(user_id, size, center, zoom) {
            warn!(user_id, error = %e, "Map re-measure failed");
        }
    });
}

async fn fail(state: &AppState, user_id: UserId, epoch: u64, err: MapError) -> MapState {
    let message = err.panel_message();
    let mut doc = state.document.write().await;

    let current = doc.card(user_id).map(|card| card.epoch());
    if current == Some(epoch) {
        doc.show_map_error(user_id, message.clone());
        MapState::Errored { message }
    } else {
        abandon(&mut doc, user_id);
        MapState::Absent
    }
}

/// Clear the spinner of a card whose initialisation was abandoned.
/// Expanded cards are left alone: a newer initialisation owns them.
fn abandon(doc: &mut Document, user_id: UserId) {
    if let Some(card) = doc.card_mut(user_id) {
        if !card.is_expanded() && card.spinner_visible() {
            card.set_map_state(MapState::Absent);
        }
    }
}

/// Popup text for a user's marker, escaped
pub fn popup_html(user: &UserRecord) -> String {
    format!(
        "{}<br>{}, {}",
        escape_opt(user.name.as_deref()),
        escape_opt(user.address.street.as_deref()),
        escape_opt(user.address.city.as_deref()),
    )
}

fn coordinate_text(coordinate: Option<&Coordinate>) -> String {
    coordinate.map(|c| c.to_string()).unwrap_or_default()
}
