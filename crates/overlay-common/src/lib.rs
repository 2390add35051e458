//! Common types shared across the icing overlay crates.

pub mod bbox;
pub mod error;
pub mod raster;
pub mod tile;

pub use bbox::BoundingBox;
pub use error::{OverlayError, OverlayResult};
pub use raster::Raster;
pub use tile::{TileCoord, TILE_SIZE};
