//! Web Mercator tile math and the raster tile provider definition.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::config::MapConfig;
use crate::maps::layout::Size;

pub const TILE_SIZE: u32 = 256;

/// Latitude limit of the Web Mercator projection
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

// 1x1 transparent PNG served in place of tiles that fail to load
const TRANSPARENT_TILE_HEX: &str = "89504e470d0a1a0a0000000d4948445200000001000000010804000000b51c0c020000000b4944415478da6364600000000600023081d02f0000000049454e44ae426082";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Pixel position in the world bitmap at a given zoom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Whether the tile exists at its zoom level
    pub fn is_valid(&self, max_zoom: u8) -> bool {
        if self.z > max_zoom {
            return false;
        }
        let n = tiles_per_axis(self.z);
        u64::from(self.x) < n && u64::from(self.y) < n
    }
}

/// A tile placed inside a map container, offsets relative to its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedTile {
    pub coord: TileCoord,
    pub left: i64,
    pub top: i64,
}

fn tiles_per_axis(zoom: u8) -> u64 {
    1u64 << zoom
}

fn world_size(zoom: u8) -> f64 {
    (tiles_per_axis(zoom) * u64::from(TILE_SIZE)) as f64
}

/// Project a coordinate to world pixels.
pub fn project(position: LatLng, zoom: u8) -> WorldPoint {
    let size = world_size(zoom);
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (position.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;

    WorldPoint { x, y }
}

/// Inverse of [`project`].
pub fn unproject(point: WorldPoint, zoom: u8) -> LatLng {
    let size = world_size(zoom);
    let lng = point.x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * point.y / size;
    let lat = n.sinh().atan().to_degrees();

    LatLng::new(lat, lng)
}

/// Tiles needed to cover a container of `size` centred on `center`.
///
/// Columns wrap around the antimeridian; rows outside the world are skipped.
pub fn visible_tiles(center: LatLng, zoom: u8, size: Size) -> Vec<PlacedTile> {
    if !size.is_nonzero() {
        return Vec::new();
    }

    let origin = top_left(center, zoom, size);
    let tile = f64::from(TILE_SIZE);
    let n = tiles_per_axis(zoom) as i64;

    let first_col = (origin.x / tile).floor() as i64;
    let last_col = ((origin.x + f64::from(size.width) - 1.0) / tile).floor() as i64;
    let first_row = (origin.y / tile).floor() as i64;
    let last_row = ((origin.y + f64::from(size.height) - 1.0) / tile).floor() as i64;

    let mut placed = Vec::new();
    for row in first_row..=last_row {
        if row < 0 || row >= n {
            continue;
        }
        for col in first_col..=last_col {
            let wrapped = col.rem_euclid(n);
            placed.push(PlacedTile {
                coord: TileCoord {
                    z: zoom,
                    x: wrapped as u32,
                    y: row as u32,
                },
                left: col * i64::from(TILE_SIZE) - origin.x.round() as i64,
                top: row * i64::from(TILE_SIZE) - origin.y.round() as i64,
            });
        }
    }

    placed
}

/// Pixel offset of `position` inside a container of `size` centred on `center`
pub fn container_point(position: LatLng, center: LatLng, zoom: u8, size: Size) -> (i64, i64) {
    let origin = top_left(center, zoom, size);
    let point = project(position, zoom);
    (
        (point.x - origin.x).round() as i64,
        (point.y - origin.y).round() as i64,
    )
}

fn top_left(center: LatLng, zoom: u8, size: Size) -> WorldPoint {
    let c = project(center, zoom);
    WorldPoint {
        x: c.x - f64::from(size.width) / 2.0,
        y: c.y - f64::from(size.height) / 2.0,
    }
}

/// The single raster tile source used by every map
#[derive(Debug, Clone)]
pub struct TileProvider {
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub attribution: String,
    pub max_zoom: u8,
    error_tile: Vec<u8>,
}

impl TileProvider {
    pub fn from_config(config: &MapConfig) -> Result<Self> {
        let error_tile = hex::decode(TRANSPARENT_TILE_HEX)
            .context("Failed to decode fallback tile")?;

        Ok(Self {
            url_template: config.tile_url.clone(),
            subdomains: config.subdomains.clone(),
            attribution: config.attribution.clone(),
            max_zoom: config.max_zoom,
            error_tile,
        })
    }

    /// Upstream URL for a tile. Subdomains rotate on `(x + y) % n`.
    pub fn upstream_url(&self, coord: TileCoord) -> String {
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let index = (u64::from(coord.x) + u64::from(coord.y)) % self.subdomains.len() as u64;
            self.subdomains[index as usize].as_str()
        };

        self.url_template
            .replace("{s}", subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    /// Path of the tile on this server's tile proxy
    pub fn proxy_path(coord: TileCoord) -> String {
        format!("/tiles/{}/{}/{}", coord.z, coord.x, coord.y)
    }

    /// Transparent PNG used when a tile cannot be loaded
    pub fn error_tile(&self) -> &[u8] {
        &self.error_tile
    }
}
