//! GeoTIFF decoder for single-band meteorological fields.
//!
//! Reads the first band of a GeoTIFF into an [`overlay_common::Raster`],
//! deriving the `(west, south, east, north)` bounding box from the GeoTIFF
//! model tags. Only axis-aligned lat/lon georeferencing is supported; no
//! map-projection math is performed.
//!
//! # Georeferencing
//!
//! The bounding box comes from, in order of preference:
//! - `ModelPixelScaleTag` + `ModelTiepointTag`
//! - `ModelTransformationTag` (without rotation terms)
//!
//! A `GDAL_NODATA` tag, when present, marks the sentinel value as no data.

mod error;
mod geotiff;

pub use error::{DecodeError, DecodeResult};
pub use geotiff::{decode, decode_file, Georeference};
