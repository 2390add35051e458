//! Slippy-map tile addressing.
//!
//! Tiles follow the XYZ (Web Mercator, top-left origin) scheme used by
//! OpenStreetMap-style map widgets.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tile edge length in pixels.
pub const TILE_SIZE: usize = 256;

/// Latitude limit of the Web Mercator square.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along each axis at this zoom.
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.z
    }

    /// Whether x and y fall inside the grid for this zoom.
    pub fn is_valid(&self) -> bool {
        self.z < 32 && self.x < self.tiles_per_axis() && self.y < self.tiles_per_axis()
    }

    /// Geographic bounds of this tile.
    pub fn bounds(&self) -> BoundingBox {
        tile_to_latlon_bounds(self)
    }

    /// Relative path used when writing tiles to disk: `z/x/y.png`.
    pub fn file_path(&self) -> String {
        format!("{}/{}/{}.png", self.z, self.x, self.y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Convert lat/lon to the tile containing it.
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileCoord {
    let (px, py) = latlon_to_world_pixel(lat, lon, zoom, 1);
    let max_index = (1u32 << zoom) - 1;

    TileCoord {
        z: zoom,
        x: (px.floor().max(0.0) as u32).min(max_index),
        y: (py.floor().max(0.0) as u32).min(max_index),
    }
}

/// Convert tile coordinates to lat/lon bounds.
pub fn tile_to_latlon_bounds(coord: &TileCoord) -> BoundingBox {
    let n = (1u64 << coord.z) as f64;

    let lon_min = coord.x as f64 / n * 360.0 - 180.0;
    let lon_max = (coord.x + 1) as f64 / n * 360.0 - 180.0;

    let lat_max = (PI * (1.0 - 2.0 * coord.y as f64 / n))
        .sinh()
        .atan()
        .to_degrees();
    let lat_min = (PI * (1.0 - 2.0 * (coord.y + 1) as f64 / n))
        .sinh()
        .atan()
        .to_degrees();

    BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
}

/// Position of a lat/lon in world pixel space at a zoom, for a given tile size.
fn latlon_to_world_pixel(lat: f64, lon: f64, zoom: u32, tile_size: usize) -> (f64, f64) {
    let world = (1u64 << zoom) as f64 * tile_size as f64;
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let lat_rad = lat.to_radians();

    let x = (lon + 180.0) / 360.0 * world;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * world;
    (x, y)
}

/// Tiles covering a viewport of `width`×`height` pixels centered on a point.
///
/// Tiles outside the world grid are dropped; longitude does not wrap.
pub fn tiles_in_view(
    center_lat: f64,
    center_lon: f64,
    zoom: u32,
    width: u32,
    height: u32,
    tile_size: usize,
) -> Vec<TileCoord> {
    let (cx, cy) = latlon_to_world_pixel(center_lat, center_lon, zoom, tile_size);
    let half_w = width as f64 / 2.0;
    let half_h = height as f64 / 2.0;
    let max_index = ((1u64 << zoom) - 1) as f64;
    let tile = tile_size as f64;

    let x_min = ((cx - half_w) / tile).floor().clamp(0.0, max_index) as u32;
    let x_max = (((cx + half_w) / tile).ceil() - 1.0).clamp(0.0, max_index) as u32;
    let y_min = ((cy - half_h) / tile).floor().clamp(0.0, max_index) as u32;
    let y_max = (((cy + half_h) / tile).ceil() - 1.0).clamp(0.0, max_index) as u32;

    let mut tiles = Vec::new();
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            tiles.push(TileCoord::new(zoom, x, y));
        }
    }
    tiles
}
