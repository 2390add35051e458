//! Decoded single-band rasters.

use crate::{BoundingBox, OverlayError, OverlayResult};

/// A single-band grid of samples with its geographic extent.
///
/// Samples are row-major with row 0 at the northern edge. A raster is
/// immutable once built; a new selection replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    samples: Vec<f32>,
    width: usize,
    height: usize,
    bbox: BoundingBox,
    nodata: Option<f32>,
}

impl Raster {
    /// Build a raster, checking that the sample count matches the dimensions
    /// and that the bounding box is ordered.
    pub fn new(
        samples: Vec<f32>,
        width: usize,
        height: usize,
        bbox: BoundingBox,
    ) -> OverlayResult<Self> {
        if width == 0 || height == 0 {
            return Err(OverlayError::InvalidRaster(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let expected = width.checked_mul(height).ok_or_else(|| {
            OverlayError::InvalidRaster(format!("dimensions overflow: {}x{}", width, height))
        })?;
        if samples.len() != expected {
            return Err(OverlayError::InvalidRaster(format!(
                "expected {} samples for {}x{}, got {}",
                expected,
                width,
                height,
                samples.len()
            )));
        }

        if !bbox.is_valid() {
            return Err(OverlayError::InvalidRaster(format!(
                "bounding box must satisfy west < east and south < north, got {}",
                bbox
            )));
        }

        Ok(Self {
            samples,
            width,
            height,
            bbox,
            nodata: None,
        })
    }

    /// Mark a sentinel value as "no data".
    pub fn with_nodata(mut self, nodata: Option<f32>) -> Self {
        self.nodata = nodata.filter(|v| !v.is_nan());
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at a column/row, or `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.samples.get(row * self.width + col).copied()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(-60.0, -40.0, -40.0, -10.0)
    }

    #[test]
    fn test_rejects_sample_count_mismatch() {
        let err = Raster::new(vec![0.0; 5], 2, 3, bbox()).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidRaster(_)));
    }

    #[test]
    fn test_rejects_inverted_bbox() {
        let inverted = BoundingBox::new(-40.0, -40.0, -60.0, -10.0);
        assert!(Raster::new(vec![0.0; 4], 2, 2, inverted).is_err());
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(Raster::new(vec![], 0, 3, bbox()).is_err());
    }

    #[test]
    fn test_get_is_row_major() {
        let raster = Raster::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 3, 2, bbox()).unwrap();
        assert_eq!(raster.get(0, 0), Some(0.0));
        assert_eq!(raster.get(2, 0), Some(2.0));
        assert_eq!(raster.get(0, 1), Some(3.0));
        assert_eq!(raster.get(3, 0), None);
        assert_eq!(raster.get(0, 2), None);
    }
}
