//! Icing overlay viewer.
//!
//! This module exposes the internal modules for testing purposes.

pub mod config;
pub mod controller;
pub mod host;
pub mod loader;

pub use config::ViewerConfig;
pub use controller::{Controller, LoadOutcome, LoadTicket, Status};
pub use host::{FrameSummary, HeadlessMap, Viewport};
pub use loader::{load_raster, FsLoader, RasterLoader};
