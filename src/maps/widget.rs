//! Map widgets: a tile layer plus a marker, sized to a mount region.

use serde::Serialize;
use std::sync::Arc;

use crate::core::error::MapError;
use crate::maps::layout::Size;
use crate::maps::tiles::{container_point, visible_tiles, LatLng, PlacedTile, TileProvider};

/// Pin with a popup. `popup_html` must already be escaped.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    pub popup_html: String,
}

/// Everything needed to build a widget inside a mount
#[derive(Debug, Clone)]
pub struct MapSpec {
    pub mount_id: String,
    pub center: LatLng,
    pub zoom: u8,
    pub size: Size,
    pub marker: Marker,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewTile {
    pub left: i64,
    pub top: i64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerView {
    pub left: i64,
    pub top: i64,
    pub popup_html: String,
}

/// Renderable state of a widget
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub mount_id: String,
    pub center: LatLng,
    pub zoom: u8,
    pub size: Size,
    pub tiles: Vec<ViewTile>,
    pub marker: Option<MarkerView>,
    pub attribution: String,
}

/// A live map attached to a mount
pub trait MapWidget: Send + Sync {
    /// Re-centre the map
    fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<(), MapError>;

    /// Re-measure the container and recompute what is visible
    fn invalidate_size(&mut self, size: Size) -> Result<(), MapError>;

    fn view(&self) -> MapView;

    /// Detach from the mount. The widget is unusable afterwards.
    fn remove(&mut self) -> Result<(), MapError>;
}

/// Factory for map widgets
pub trait MapEngine: Send + Sync {
    fn create(&self, spec: MapSpec) -> Result<Box<dyn MapWidget>, MapError>;
}

/// Slippy map backed by a raster [`TileProvider`]
pub struct TileMap {
    mount_id: String,
    center: LatLng,
    zoom: u8,
    size: Size,
    marker: Marker,
    provider: Arc<TileProvider>,
    tiles: Vec<PlacedTile>,
    removed: bool,
}

impl TileMap {
    fn ensure_attached(&self) -> Result<(), MapError> {
        if self.removed {
            return Err(MapError::Construction(format!(
                "map in {} has been removed",
                self.mount_id
            )));
        }
        Ok(())
    }

    fn refresh_tiles(&mut self) {
        self.tiles = visible_tiles(self.center, self.zoom, self.size);
    }
}

impl MapWidget for TileMap {
    fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<(), MapError> {
        self.ensure_attached()?;
        if zoom > self.provider.max_zoom {
            return Err(MapError::Construction(format!(
                "zoom {} exceeds provider maximum {}",
                zoom, self.provider.max_zoom
            )));
        }
        self.center = center;
        self.zoom = zoom;
        self.refresh_tiles();
        Ok(())
    }

    fn invalidate_size(&mut self, size: Size) -> Result<(), MapError> {
        self.ensure_attached()?;
        if self.size != size {
            self.size = size;
            self.refresh_tiles();
        }
        Ok(())
    }

    fn view(&self) -> MapView {
        let tiles = self
            .tiles
            .iter()
            .map(|tile| ViewTile {
                left: tile.left,
                top: tile.top,
                url: TileProvider::proxy_path(tile.coord),
            })
            .collect();

        let marker = if self.size.is_nonzero() {
            let (left, top) =
                container_point(self.marker.position, self.center, self.zoom, self.size);
            Some(MarkerView {
                left,
                top,
                popup_html: self.marker.popup_html.clone(),
            })
        } else {
            None
        };

        MapView {
            mount_id: self.mount_id.clone(),
            center: self.center,
            zoom: self.zoom,
            size: self.size,
            tiles,
            marker,
            attribution: self.provider.attribution.clone(),
        }
    }

    fn remove(&mut self) -> Result<(), MapError> {
        if self.removed {
            return Err(MapError::Removal(format!(
                "map in {} was already removed",
                self.mount_id
            )));
        }
        self.removed = true;
        self.tiles.clear();
        Ok(())
    }
}

/// Builds [`TileMap`]s against the configured provider
pub struct TileMapEngine {
    provider: Arc<TileProvider>,
}

impl TileMapEngine {
    pub fn new(provider: Arc<TileProvider>) -> Self {
        Self { provider }
    }
}

impl MapEngine for TileMapEngine {
    fn create(&self, spec: MapSpec) -> Result<Box<dyn MapWidget>, MapError> {
        if !spec.size.is_nonzero() {
            return Err(MapError::Construction(format!(
                "map container {} has no size",
                spec.mount_id
            )));
        }

        if spec.zoom > self.provider.max_zoom {
            return Err(MapError::Construction(format!(
                "zoom {} exceeds provider maximum {}",
                spec.zoom, self.provider.max_zoom
            )));
        }

        if !spec.center.lat.is_finite() || !spec.center.lng.is_finite() {
            return Err(MapError::Construction("map center is not finite".to_string()));
        }

        let mut map = TileMap {
            mount_id: spec.mount_id,
            center: spec.center,
            zoom: spec.zoom,
            size: spec.size,
            marker: spec.marker,
            provider: Arc::clone(&self.provider),
            tiles: Vec::new(),
            removed: false,
        };
        map.refresh_tiles();

        Ok(Box::new(map))
    }
}
