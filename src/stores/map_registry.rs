use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::core::error::MapError;
use crate::maps::layout::Size;
use crate::maps::tiles::LatLng;
use crate::maps::widget::{MapView, MapWidget};
use crate::models::user::UserId;

struct MapEntry {
    widget: Box<dyn MapWidget>,
    seq: u64,
}

/// Live map widgets keyed by user id
///
/// Holds at most one widget per user. Creating a widget for a user that
/// already has one destroys the old widget first. When the registry is full
/// the oldest widget is evicted.
pub struct MapRegistry {
    maps: DashMap<UserId, MapEntry>,
    capacity: usize,
    next_seq: AtomicU64,
}

impl MapRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            maps: DashMap::with_capacity(capacity),
            capacity: capacity.max(1),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.maps.contains_key(&user_id)
    }

    /// Snapshot of a live widget
    pub fn get(&self, user_id: UserId) -> Option<MapView> {
        self.maps.get(&user_id).map(|entry| entry.widget.view())
    }

    /// Register a widget for `user_id`.
    /// Returns the users whose widgets were evicted to make room.
    pub fn create(&self, user_id: UserId, widget: Box<dyn MapWidget>) -> Vec<UserId> {
        self.destroy(user_id);

        let mut evicted = Vec::new();
        while self.maps.len() >= self.capacity {
            let oldest = self
                .maps
                .iter()
                .min_by_key(|entry| entry.value().seq)
                .map(|entry| *entry.key());

            match oldest {
                Some(oldest) => {
                    self.destroy(oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.maps.insert(user_id, MapEntry { widget, seq });

        evicted
    }

    /// Remove and tear down the widget for `user_id`.
    /// Teardown errors are swallowed. Returns whether a widget existed.
    pub fn destroy(&self, user_id: UserId) -> bool {
        match self.maps.remove(&user_id) {
            Some((_, mut entry)) => {
                if let Err(e) = entry.widget.remove() {
                    debug!(user_id, error = %e, "Ignoring map teardown failure");
                }
                true
            }
            None => false,
        }
    }

    /// Ask one widget to re-measure its container
    pub fn invalidate(&self, user_id: UserId, size: Size) -> Result<(), MapError> {
        match self.maps.get_mut(&user_id) {
            Some(mut entry) => entry.widget.invalidate_size(size),
            None => Ok(()),
        }
    }

    /// Re-measure and re-centre one widget
    pub fn remeasure(&self, user_id: UserId, size: Size, center: LatLng, zoom: u8) -> Result<(), MapError> {
        match self.maps.get_mut(&user_id) {
            Some(mut entry) => {
                entry.widget.invalidate_size(size)?;
                entry.widget.set_view(center, zoom)
            }
            None => Ok(()),
        }
    }

    /// Invalidate the size of every widget, using `size_of` to find each
    /// mount's current size. Failures are swallowed.
    /// Returns the number of widgets that accepted the new size.
    pub fn resize_all<F>(&self, size_of: F) -> usize
    where
        F: Fn(UserId) -> Size,
    {
        let mut resized = 0;
        for mut entry in self.maps.iter_mut() {
            let user_id = *entry.key();
            match entry.value_mut().widget.invalidate_size(size_of(user_id)) {
                Ok(()) => resized += 1,
                Err(e) => debug!(user_id, error = %e, "Ignoring map resize failure"),
            }
        }
        resized
    }

    /// Tear down every widget
    pub fn clear(&self) {
        let ids: Vec<UserId> = self.maps.iter().map(|entry| *entry.key()).collect();
        for user_id in ids {
            self.destroy(user_id);
        }
    }

    pub fn ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.maps.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
