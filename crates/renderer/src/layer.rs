//! Dynamic raster layer: the overlay a map widget pulls tiles from.
//!
//! The layer owns the current [`DisplayState`]. Updates replace one field and
//! ask the attached [`TileHost`] to redraw its visible tiles. Tile requests
//! render from a [`RenderSnapshot`] captured once per tile (or once per batch),
//! so a render never mixes fields from two different states.

use std::sync::Arc;

use overlay_common::{Raster, TileCoord};
use rayon::prelude::*;
use tracing::debug;

use crate::accessor::RasterAccessor;
use crate::palette::Palette;
use crate::sampler::TransparencyPolicy;
use crate::tile::{render_tile, sanitize_opacity, TileBuffer};

/// Map-widget side of the tile layer contract.
///
/// The widget owns tile caching and compositing; the layer only tells it
/// when everything visible is stale.
pub trait TileHost: Send + Sync {
    fn request_redraw(&self);
}

/// What the layer currently displays.
#[derive(Debug, Clone)]
pub struct DisplayState {
    pub raster: Arc<Raster>,
    pub palette_name: String,
    pub opacity: f64,
    pub policy: TransparencyPolicy,
}

/// Immutable view of a [`DisplayState`], cheap to clone and share across
/// render threads.
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    raster: Arc<Raster>,
    palette: Palette,
    opacity: f64,
    policy: TransparencyPolicy,
}

impl RenderSnapshot {
    pub fn new(state: &DisplayState) -> Self {
        Self {
            raster: Arc::clone(&state.raster),
            palette: Palette::lookup(&state.palette_name),
            opacity: sanitize_opacity(state.opacity),
            policy: state.policy,
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Render one Web Mercator tile.
    pub fn render(&self, coord: &TileCoord, tile_size: usize) -> TileBuffer {
        render_tile(
            &RasterAccessor::new(&self.raster),
            &coord.bounds(),
            tile_size,
            self.palette,
            &self.policy,
            self.opacity,
        )
    }
}

/// Render many tiles from one snapshot in parallel.
///
/// Results keep the order of `coords`.
pub fn render_tiles(
    snapshot: &RenderSnapshot,
    coords: &[TileCoord],
    tile_size: usize,
) -> Vec<(TileCoord, TileBuffer)> {
    coords
        .par_iter()
        .map(|coord| (*coord, snapshot.render(coord, tile_size)))
        .collect()
}

pub struct DynamicRasterLayer {
    state: DisplayState,
    host: Option<Arc<dyn TileHost>>,
}

impl DynamicRasterLayer {
    pub fn new(
        raster: Arc<Raster>,
        palette_name: impl Into<String>,
        opacity: f64,
        policy: TransparencyPolicy,
    ) -> Self {
        Self {
            state: DisplayState {
                raster,
                palette_name: palette_name.into(),
                opacity: sanitize_opacity(opacity),
                policy,
            },
            host: None,
        }
    }

    /// Add the layer to a map. Triggers an initial redraw.
    pub fn attach(&mut self, host: Arc<dyn TileHost>) {
        self.host = Some(host);
        self.redraw();
    }

    /// Remove the layer from its map, if any.
    pub fn detach(&mut self) -> Option<Arc<dyn TileHost>> {
        self.host.take()
    }

    pub fn is_attached(&self) -> bool {
        self.host.is_some()
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn update_data(&mut self, raster: Arc<Raster>) {
        debug!(
            width = raster.width(),
            height = raster.height(),
            bbox = %raster.bbox(),
            "Layer data replaced"
        );
        self.state.raster = raster;
        self.redraw();
    }

    pub fn update_palette(&mut self, name: impl Into<String>) {
        self.state.palette_name = name.into();
        debug!(palette = %self.state.palette_name, "Layer palette changed");
        self.redraw();
    }

    pub fn update_opacity(&mut self, opacity: f64) {
        self.state.opacity = sanitize_opacity(opacity);
        debug!(opacity = self.state.opacity, "Layer opacity changed");
        self.redraw();
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::new(&self.state)
    }

    /// Tile hook called by the map widget for each visible tile.
    pub fn create_tile(&self, coord: &TileCoord, tile_size: usize) -> TileBuffer {
        self.snapshot().render(coord, tile_size)
    }

    fn redraw(&self) {
        if let Some(host) = &self.host {
            host.request_redraw();
        }
    }
}

impl std::fmt::Debug for DynamicRasterLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicRasterLayer")
            .field("state", &self.state)
            .field("attached", &self.host.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::BoundingBox;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHost(AtomicUsize);

    impl TileHost for CountingHost {
        fn request_redraw(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn raster() -> Arc<Raster> {
        Arc::new(
            Raster::new(vec![0.5; 4], 2, 2, BoundingBox::new(-60.0, -40.0, -40.0, -10.0)).unwrap(),
        )
    }

    #[test]
    fn test_each_update_requests_redraw() {
        let host = Arc::new(CountingHost::default());
        let mut layer = DynamicRasterLayer::new(raster(), "viridis", 0.7, TransparencyPolicy::default());

        layer.attach(host.clone());
        assert_eq!(host.0.load(Ordering::SeqCst), 1);

        layer.update_palette("magma");
        layer.update_opacity(0.3);
        layer.update_data(raster());
        assert_eq!(host.0.load(Ordering::SeqCst), 4);

        layer.detach();
        layer.update_opacity(1.0);
        assert_eq!(host.0.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let mut layer = DynamicRasterLayer::new(raster(), "viridis", 0.7, TransparencyPolicy::default());
        let snapshot = layer.snapshot();
        layer.update_palette("turbo");
        layer.update_opacity(0.1);

        assert_eq!(snapshot.palette(), Palette::Viridis);
        assert_eq!(snapshot.opacity(), 0.7);
        assert_eq!(layer.snapshot().palette(), Palette::Turbo);
    }

    #[test]
    fn test_unknown_palette_renders_as_default() {
        let layer = DynamicRasterLayer::new(raster(), "no-such-ramp", 1.0, TransparencyPolicy::default());
        assert_eq!(layer.snapshot().palette(), Palette::Viridis);
    }

    #[test]
    fn test_opacity_sanitized_on_update() {
        let mut layer = DynamicRasterLayer::new(raster(), "viridis", 5.0, TransparencyPolicy::default());
        assert_eq!(layer.state().opacity, 1.0);
        layer.update_opacity(-1.0);
        assert_eq!(layer.state().opacity, 0.0);
    }
}
