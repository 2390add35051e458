//! Per-tile rendering.

use overlay_common::BoundingBox;

use crate::accessor::RasterSource;
use crate::palette::{Color, Palette};
use crate::png::{self, PngResult};
use crate::sampler::{sample, TransparencyPolicy};

/// Square RGBA tile, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBuffer {
    size: usize,
    pixels: Vec<u8>,
}

impl TileBuffer {
    /// All-zero (fully transparent) tile.
    pub fn transparent(size: usize) -> Self {
        Self {
            size,
            pixels: vec![0; size * size * 4],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the tile.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let i = (y * self.size + x) * 4;
        Some(Color::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn opaque_pixel_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    pub fn to_png(&self) -> PngResult<Vec<u8>> {
        png::encode_auto(&self.pixels, self.size, self.size)
    }
}

/// Opacity outside `[0, 1]` is clamped; non-finite opacity is treated as 1.
pub fn sanitize_opacity(opacity: f64) -> f64 {
    if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Render one tile.
///
/// Each destination pixel center is mapped linearly into `tile_bounds`
/// (west→east along x, north→south along y), looked up in `raster` by nearest
/// neighbour and colored with `palette`. Out-of-range and nodata pixels stay
/// transparent. Colored pixels get `alpha = floor(alpha * opacity)`.
///
/// Tiles that do not overlap the raster are returned transparent without
/// touching any sample.
pub fn render_tile<R: RasterSource + ?Sized>(
    raster: &R,
    tile_bounds: &BoundingBox,
    tile_size: usize,
    palette: Palette,
    policy: &TransparencyPolicy,
    opacity: f64,
) -> TileBuffer {
    let mut tile = TileBuffer::transparent(tile_size);
    if tile_size == 0 || !raster.bounds_overlap(tile_bounds) {
        return tile;
    }

    let opacity = sanitize_opacity(opacity);
    let lon_step = tile_bounds.width() / tile_size as f64;
    let lat_step = tile_bounds.height() / tile_size as f64;

    for (py, row) in tile.pixels.chunks_exact_mut(tile_size * 4).enumerate() {
        let lat = tile_bounds.north - (py as f64 + 0.5) * lat_step;

        for (px, out) in row.chunks_exact_mut(4).enumerate() {
            let lon = tile_bounds.west + (px as f64 + 0.5) * lon_step;

            let (rx, ry) = raster.geo_to_pixel(lon, lat);
            let Some(value) = raster.sample_at(rx, ry) else {
                continue;
            };

            let color = sample(value, palette, policy);
            let alpha = (color.a as f64 * opacity).floor() as u8;
            if alpha == 0 {
                continue;
            }
            out.copy_from_slice(&[color.r, color.g, color.b, alpha]);
        }
    }

    tile
}
