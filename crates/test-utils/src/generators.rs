//! Synthetic raster generators.
//!
//! These generators create predictable rasters whose rendered output can be
//! verified exactly.

use overlay_common::{BoundingBox, Raster};

/// Creates a raster where every sample has the same value.
///
/// # Example
///
/// ```
/// use test_utils::{uniform_raster, bbox};
///
/// let raster = uniform_raster(100, 100, 0.5, bbox::SOUTH_AMERICA);
/// assert_eq!(raster.samples().len(), 10_000);
/// ```
pub fn uniform_raster(width: usize, height: usize, value: f32, bbox: BoundingBox) -> Raster {
    Raster::new(vec![value; width * height], width, height, bbox).expect("valid uniform raster")
}

/// Creates a raster whose values rise linearly from 0 at the western edge
/// to 1 at the eastern edge.
///
/// Column `c` holds `c / (width - 1)`.
pub fn east_gradient_raster(width: usize, height: usize, bbox: BoundingBox) -> Raster {
    let denom = (width.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(col as f32 / denom);
        }
    }
    Raster::new(data, width, height, bbox).expect("valid gradient raster")
}

/// Creates a raster with predictable values: `col * 1000 + row`.
///
/// Useful to check which source pixel a lookup resolved to.
pub fn indexed_raster(width: usize, height: usize, bbox: BoundingBox) -> Raster {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    Raster::new(data, width, height, bbox).expect("valid indexed raster")
}
