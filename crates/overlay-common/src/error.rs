//! Error types for the icing overlay crates.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for loading and resolving rasters.
///
/// Sampling outside a raster is not an error: it yields "no data" and renders
/// transparent.
#[derive(Debug, Error)]
pub enum OverlayError {
    // === Data Errors ===
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("No file for date {date}, run {run}, step {step}h, level {level} hPa")]
    MissingSelection {
        date: String,
        run: String,
        step: u32,
        level: u32,
    },

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl OverlayError {
    /// Whether this is a normal "nothing to render" outcome rather than a fault.
    pub fn is_missing_selection(&self) -> bool {
        matches!(self, OverlayError::MissingSelection { .. })
    }

    /// Short status line suitable for a user-visible status area.
    pub fn status_message(&self) -> &'static str {
        match self {
            OverlayError::MissingSelection { .. } => "File not found",
            OverlayError::Decode(_) | OverlayError::InvalidRaster(_) => "Failed to load file",
            OverlayError::Io(_) => "Failed to read file",
            OverlayError::Manifest(_) => "Invalid manifest",
            OverlayError::Config(_) => "Invalid configuration",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::Manifest(format!("JSON error: {}", err))
    }
}
