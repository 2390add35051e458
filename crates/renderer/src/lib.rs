//! Raster-to-tile colorization for map overlays.
//!
//! Pipeline, leaf first:
//! - [`palette`]: named color ramps with per-palette closed-form curves
//! - [`sampler`]: normalized value + transparency policy → RGBA
//! - [`accessor`]: geo ↔ pixel mapping over a decoded raster
//! - [`tile`]: per-tile rendering into an RGBA buffer
//! - [`legend`]: legend gradient stops and reduced color ramps
//! - [`layer`]: the dynamic overlay layer a map widget pulls tiles from
//! - [`png`]: PNG encoding for rendered tiles

pub mod accessor;
pub mod layer;
pub mod legend;
pub mod palette;
pub mod png;
pub mod sampler;
pub mod tile;

pub use accessor::{RasterAccessor, RasterSource};
pub use layer::{render_tiles, DisplayState, DynamicRasterLayer, RenderSnapshot, TileHost};
pub use legend::{build_legend, build_reduced_ramp, GradientStop, Legend, TRANSPARENT_HEX};
pub use palette::{Color, Palette};
pub use sampler::{sample, TransparencyPolicy};
pub use tile::{render_tile, TileBuffer};
