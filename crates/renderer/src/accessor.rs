//! Geo ↔ pixel mapping over a decoded raster.

use overlay_common::{BoundingBox, Raster};

/// Anything the tile renderer can sample from.
///
/// Implemented by [`RasterAccessor`]; tests substitute counting stubs.
pub trait RasterSource {
    /// Geographic extent of the data.
    fn bounds(&self) -> BoundingBox;

    /// Nearest-neighbour pixel for a lon/lat. May lie outside the grid.
    fn geo_to_pixel(&self, lon: f64, lat: f64) -> (i64, i64);

    /// Sample at a pixel, or `None` when the pixel is outside the grid or
    /// holds the nodata value.
    fn sample_at(&self, px: i64, py: i64) -> Option<f32>;

    /// Rectangle overlap with the data extent.
    ///
    /// Longitudes are compared as plain numbers; boxes crossing the ±180°
    /// meridian are not wrapped.
    fn bounds_overlap(&self, other: &BoundingBox) -> bool {
        self.bounds().intersects(other)
    }
}

/// Borrowing accessor over a [`Raster`].
#[derive(Debug, Clone, Copy)]
pub struct RasterAccessor<'a> {
    raster: &'a Raster,
}

impl<'a> RasterAccessor<'a> {
    pub fn new(raster: &'a Raster) -> Self {
        Self { raster }
    }

    /// Geographic center of a pixel. Inverse of [`RasterSource::geo_to_pixel`].
    pub fn pixel_center(&self, px: i64, py: i64) -> (f64, f64) {
        let bbox = self.raster.bbox();
        let lon = bbox.west + (px as f64 + 0.5) * bbox.width() / self.raster.width() as f64;
        let lat = bbox.north - (py as f64 + 0.5) * bbox.height() / self.raster.height() as f64;
        (lon, lat)
    }
}

impl RasterSource for RasterAccessor<'_> {
    fn bounds(&self) -> BoundingBox {
        *self.raster.bbox()
    }

    #[inline]
    fn geo_to_pixel(&self, lon: f64, lat: f64) -> (i64, i64) {
        let bbox = self.raster.bbox();
        let px = ((lon - bbox.west) * self.raster.width() as f64 / bbox.width()).floor();
        let py = ((bbox.north - lat) * self.raster.height() as f64 / bbox.height()).floor();

        // NaN coordinates land outside the grid
        let px = if px.is_finite() { px as i64 } else { -1 };
        let py = if py.is_finite() { py as i64 } else { -1 };
        (px, py)
    }

    #[inline]
    fn sample_at(&self, px: i64, py: i64) -> Option<f32> {
        if px < 0 || py < 0 {
            return None;
        }
        let value = self.raster.get(px as usize, py as usize)?;
        match self.raster.nodata() {
            Some(nodata) if value == nodata => None,
            _ => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster() -> Raster {
        // 4x2 grid, values = col + 10 * row
        let samples = (0..2)
            .flat_map(|row| (0..4).map(move |col| (col + 10 * row) as f32))
            .collect();
        Raster::new(samples, 4, 2, BoundingBox::new(0.0, 0.0, 40.0, 20.0)).unwrap()
    }

    #[test]
    fn test_geo_to_pixel_corners() {
        let r = raster();
        let acc = RasterAccessor::new(&r);
        assert_eq!(acc.geo_to_pixel(0.0, 20.0), (0, 0));
        assert_eq!(acc.geo_to_pixel(39.9, 0.1), (3, 1));
        // east/south edges fall one past the grid
        assert_eq!(acc.geo_to_pixel(40.0, 0.0), (4, 2));
        assert_eq!(acc.geo_to_pixel(-0.1, 20.1), (-1, -1));
    }

    #[test]
    fn test_sample_at_bounds_checked() {
        let r = raster();
        let acc = RasterAccessor::new(&r);
        assert_eq!(acc.sample_at(2, 1), Some(12.0));
        assert_eq!(acc.sample_at(4, 0), None);
        assert_eq!(acc.sample_at(0, 2), None);
        assert_eq!(acc.sample_at(-1, 0), None);
    }

    #[test]
    fn test_nodata_is_none() {
        let r = raster().with_nodata(Some(11.0));
        let acc = RasterAccessor::new(&r);
        assert_eq!(acc.sample_at(1, 1), None);
        assert_eq!(acc.sample_at(0, 1), Some(10.0));
    }

    #[test]
    fn test_nan_coordinates_are_out_of_range() {
        let r = raster();
        let acc = RasterAccessor::new(&r);
        let (px, py) = acc.geo_to_pixel(f64::NAN, 10.0);
        assert_eq!(acc.sample_at(px, py), None);
    }

    #[test]
    fn test_pixel_center_round_trip() {
        let r = raster();
        let acc = RasterAccessor::new(&r);
        for py in 0..2 {
            for px in 0..4 {
                let (lon, lat) = acc.pixel_center(px, py);
                assert_eq!(acc.geo_to_pixel(lon, lat), (px, py));
            }
        }
    }

    #[test]
    fn test_bounds_overlap() {
        let r = raster();
        let acc = RasterAccessor::new(&r);
        assert!(acc.bounds_overlap(&BoundingBox::new(30.0, 10.0, 50.0, 30.0)));
        assert!(!acc.bounds_overlap(&BoundingBox::new(41.0, 0.0, 50.0, 20.0)));
        assert!(!acc.bounds_overlap(&BoundingBox::new(0.0, -20.0, 40.0, -1.0)));
    }
}
