//! Common test fixtures for overlay tests.

use overlay_common::BoundingBox;
use std::path::{Path, PathBuf};

/// Common bounding box definitions for testing.
pub mod bbox {
    use super::BoundingBox;

    /// Regional icing domain over South America.
    pub const SOUTH_AMERICA: BoundingBox = BoundingBox {
        west: -60.0,
        south: -40.0,
        east: -40.0,
        north: -10.0,
    };

    /// A tile-sized window fully inside [`SOUTH_AMERICA`].
    pub const INSIDE_SOUTH_AMERICA: BoundingBox = BoundingBox {
        west: -55.0,
        south: -35.0,
        east: -45.0,
        north: -15.0,
    };

    /// Europe, disjoint from [`SOUTH_AMERICA`].
    pub const EUROPE: BoundingBox = BoundingBox {
        west: -15.0,
        south: 35.0,
        east: 45.0,
        north: 72.0,
    };
}

/// Build an icing filename for the given components.
///
/// Matches `icing_YYYYMMDDTHH_step{N}h_YYYYMMDDTHH_level{L}hPa.tif`.
pub fn icing_filename(date: &str, run: &str, step: u32, level: u32) -> String {
    format!(
        "icing_{date}T{run}_step{step}h_{date}T{run}_level{level}hPa.tif",
        date = date,
        run = run,
        step = step,
        level = level
    )
}

/// Create `<root>/<date>/step_<N>h/<filename>` and write `bytes` to it.
pub fn write_icing_file(
    root: &Path,
    date: &str,
    run: &str,
    step: u32,
    level: u32,
    bytes: &[u8],
) -> PathBuf {
    let dir = root.join(date).join(format!("step_{}h", step));
    std::fs::create_dir_all(&dir).expect("create fixture directory");
    let path = dir.join(icing_filename(date, run, step, level));
    std::fs::write(&path, bytes).expect("write fixture file");
    path
}

/// Temporary directory for filesystem fixtures.
pub fn temp_data_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}
