//! Build a manifest from a directory tree.

use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use overlay_common::{OverlayError, OverlayResult};

use crate::filename::parse_icing_filename;
use crate::manifest::{Manifest, Selection};

/// Recursively scan `root` for `.tif` files following the icing naming
/// convention.
///
/// Stored paths are relative to `root` and `/`-separated. Files that do not
/// match the convention are skipped with a warning.
pub fn scan_directory(root: impl AsRef<Path>) -> OverlayResult<Manifest> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(OverlayError::Manifest(format!(
            "data directory not found: {}",
            root.display()
        )));
    }

    let mut manifest = Manifest::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| OverlayError::Io(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("tif") {
            continue;
        }

        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            skipped += 1;
            continue;
        };
        let Some(info) = parse_icing_filename(name) else {
            warn!(file = %name, "File does not match icing naming pattern");
            skipped += 1;
            continue;
        };

        let relative = path
            .strip_prefix(root)
            .map_err(|e| OverlayError::Io(e.to_string()))?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let selection = Selection::new(info.date, info.run, info.step, info.level);
        if let Some(previous) = manifest.insert(&selection, relative.clone()) {
            warn!(
                selection = %selection,
                kept = %relative,
                replaced = %previous,
                "Duplicate file for selection"
            );
        }
        debug!(path = %relative, "Indexed raster");
    }

    info!(
        root = %root.display(),
        files = manifest.file_count(),
        dates = manifest.dates().len(),
        levels = ?manifest.levels(),
        skipped = skipped,
        "Scanned data directory"
    );

    Ok(manifest)
}
