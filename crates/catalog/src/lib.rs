//! Catalog of available icing rasters.
//!
//! Provides:
//! - The manifest model (`date → run → step → level → path`) and selection
//!   resolution
//! - Filename parsing for the icing product naming convention
//! - Directory scanning to build a manifest from a data tree

pub mod filename;
pub mod manifest;
pub mod scan;

pub use filename::{format_date, parse_icing_filename, IcingFileInfo};
pub use manifest::{Manifest, Selection};
pub use scan::scan_directory;
