//! Headless stand-in for the interactive map widget.
//!
//! Tracks a viewport (center, zoom, pixel size), records redraw requests from
//! the layer, and on [`HeadlessMap::flush`] renders every visible tile and
//! optionally writes it as `z/x/y.png`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Instant;

use anyhow::{Context, Result};
use overlay_common::tile::tiles_in_view;
use overlay_common::TileCoord;
use renderer::{render_tiles, DynamicRasterLayer, TileBuffer, TileHost};
use tracing::{debug, info};

use crate::config::ViewerConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of one flush.
#[derive(Debug, Default, Clone)]
pub struct FrameSummary {
    pub tiles: usize,
    /// Tiles with at least one visible pixel
    pub non_empty: usize,
    /// PNG files written
    pub written: Vec<PathBuf>,
    pub elapsed_ms: u64,
}

pub struct HeadlessMap {
    viewport: RwLock<Viewport>,
    min_zoom: u32,
    max_zoom: u32,
    tile_size: usize,
    dirty: AtomicBool,
    redraws: AtomicUsize,
}

impl HeadlessMap {
    pub fn new(viewport: Viewport, min_zoom: u32, max_zoom: u32, tile_size: usize) -> Self {
        let viewport = Viewport {
            zoom: viewport.zoom.clamp(min_zoom, max_zoom),
            ..viewport
        };
        Self {
            viewport: RwLock::new(viewport),
            min_zoom,
            max_zoom,
            tile_size,
            dirty: AtomicBool::new(false),
            redraws: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        let [lat, lon] = config.map.center;
        Self::new(
            Viewport {
                center_lat: lat,
                center_lon: lon,
                zoom: config.map.zoom,
                width: config.map.viewport_width,
                height: config.map.viewport_height,
            },
            config.map.min_zoom,
            config.map.max_zoom,
            config.tile_size,
        )
    }

    pub fn viewport(&self) -> Viewport {
        match self.viewport.read() {
            Ok(v) => *v,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Pan/zoom. Zoom is clamped to the configured range; marks the map dirty.
    pub fn set_view(&self, center_lat: f64, center_lon: f64, zoom: u32) {
        let zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        {
            let mut v = match self.viewport.write() {
                Ok(v) => v,
                Err(poisoned) => poisoned.into_inner(),
            };
            v.center_lat = center_lat;
            v.center_lon = center_lon;
            v.zoom = zoom;
        }
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn visible_tiles(&self) -> Vec<TileCoord> {
        let v = self.viewport();
        tiles_in_view(
            v.center_lat,
            v.center_lon,
            v.zoom,
            v.width,
            v.height,
            self.tile_size,
        )
    }

    /// Whether a redraw is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Total redraw requests received.
    pub fn redraw_count(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }

    /// Render all visible tiles from one layer snapshot.
    ///
    /// With `out_dir`, tiles that have visible pixels are written as
    /// `out_dir/z/x/y.png`. Clears the pending redraw.
    pub fn flush(
        &self,
        layer: &DynamicRasterLayer,
        out_dir: Option<&Path>,
    ) -> Result<(Vec<(TileCoord, TileBuffer)>, FrameSummary)> {
        self.dirty.store(false, Ordering::SeqCst);
        let start = Instant::now();

        let coords = self.visible_tiles();
        let tiles = render_tiles(&layer.snapshot(), &coords, self.tile_size);

        let mut summary = FrameSummary {
            tiles: tiles.len(),
            ..FrameSummary::default()
        };

        for (coord, tile) in &tiles {
            if tile.is_fully_transparent() {
                continue;
            }
            summary.non_empty += 1;

            if let Some(dir) = out_dir {
                let path = dir.join(coord.file_path());
                write_tile(&path, tile)?;
                debug!(tile = %coord, path = %path.display(), "Wrote tile");
                summary.written.push(path);
            }
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            tiles = summary.tiles,
            non_empty = summary.non_empty,
            written = summary.written.len(),
            elapsed_ms = summary.elapsed_ms,
            "Rendered visible tiles"
        );

        Ok((tiles, summary))
    }
}

impl TileHost for HeadlessMap {
    fn request_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
        self.dirty.store(true, Ordering::SeqCst);
    }
}

fn write_tile(path: &Path, tile: &TileBuffer) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let png = tile.to_png()?;
    std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> HeadlessMap {
        HeadlessMap::from_config(&ViewerConfig::default())
    }

    #[test]
    fn test_redraw_marks_dirty() {
        let map = map();
        assert!(!map.is_dirty());
        map.request_redraw();
        map.request_redraw();
        assert!(map.is_dirty());
        assert_eq!(map.redraw_count(), 2);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let map = map();
        map.set_view(0.0, 0.0, 20);
        assert_eq!(map.viewport().zoom, 10);
        map.set_view(0.0, 0.0, 0);
        assert_eq!(map.viewport().zoom, 3);
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let map = map();
        let tiles = map.visible_tiles();
        // 1024x768 at 256px spans 4-5 columns and 3-4 rows
        assert!(tiles.len() >= 12 && tiles.len() <= 20, "{}", tiles.len());
        assert!(tiles.iter().all(|t| t.z == 3 && t.is_valid()));
    }
}
