//! Error types for raster decoding.

use overlay_common::OverlayError;
use thiserror::Error;

/// Result type for decoder operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Error types for GeoTIFF decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed or unsupported TIFF container
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Neither tiepoint/pixel-scale nor a transformation matrix present
    #[error("Missing georeference: {0}")]
    MissingGeoreference(String),

    /// Rotated or sheared model transformations
    #[error("Unsupported georeference: {0}")]
    UnsupportedGeoreference(String),

    /// Decoded samples did not form a valid raster
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),
}

impl From<DecodeError> for OverlayError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::IoError(e) => OverlayError::Io(e.to_string()),
            other => OverlayError::Decode(other.to_string()),
        }
    }
}
