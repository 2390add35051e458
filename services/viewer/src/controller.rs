//! Selection and animation controller.
//!
//! Drives which raster the single overlay layer displays. A selection is
//! resolved through the manifest, fetched and decoded asynchronously, and on
//! success pushed into the layer with `update_data` (the layer is created on
//! the first successful load). Failures only change the status line; the map
//! keeps showing the previous raster.
//!
//! Every selection takes a new generation number. A load that completes after
//! a newer selection was made is discarded, so the last *requested* selection
//! wins rather than the last one to finish loading.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use catalog::{format_date, Manifest, Selection};
use overlay_common::{OverlayResult, Raster};
use renderer::{DynamicRasterLayer, TileHost, TransparencyPolicy};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::host::{FrameSummary, HeadlessMap};
use crate::loader::{load_raster, RasterLoader};

/// User-visible load status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading(Selection),
    Loaded(Selection),
    NotFound(Selection),
    DecodeFailed { selection: Selection, message: String },
}

impl Status {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Status::Idle => None,
            Status::Loading(s) | Status::Loaded(s) | Status::NotFound(s) => Some(s),
            Status::DecodeFailed { selection, .. } => Some(selection),
        }
    }

    /// Short status text, `None` once loaded.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Status::Idle | Status::Loaded(_) => None,
            Status::Loading(_) => Some("Loading..."),
            Status::NotFound(_) => Some("File not found"),
            Status::DecodeFailed { .. } => Some("Error loading file"),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::NotFound(_) | Status::DecodeFailed { .. })
    }

    /// Info line: date, run, step and level, plus the status label if any.
    pub fn info_line(&self) -> String {
        let Some(sel) = self.selection() else {
            return "No selection".to_string();
        };
        let date = format_date(&sel.date).unwrap_or_else(|| sel.date.clone());
        let mut line = format!(
            "Date: {} | Run: {}Z | Step: {}h | Level: {} hPa",
            date, sel.run, sel.step, sel.level
        );
        if let Some(label) = self.label() {
            line.push_str(" | ");
            line.push_str(label);
        }
        line
    }
}

/// A load in flight for one selection.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub selection: Selection,
    pub path: String,
}

/// A finished fetch + decode, not yet applied.
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub selection: Selection,
    pub result: OverlayResult<Raster>,
}

impl LoadTicket {
    pub async fn run(self, loader: Arc<dyn RasterLoader>) -> LoadOutcome {
        let result = load_raster(loader.as_ref(), &self.path).await;
        LoadOutcome {
            generation: self.generation,
            selection: self.selection,
            result,
        }
    }
}

pub struct Controller {
    manifest: Manifest,
    loader: Arc<dyn RasterLoader>,
    host: Arc<HeadlessMap>,
    layer: Option<DynamicRasterLayer>,
    palette_name: String,
    opacity: f64,
    policy: TransparencyPolicy,
    generation: u64,
    status: Status,
    out_dir: Option<PathBuf>,
    frames: Vec<FrameSummary>,
}

impl Controller {
    pub fn new(
        manifest: Manifest,
        loader: Arc<dyn RasterLoader>,
        host: Arc<HeadlessMap>,
        config: &ViewerConfig,
    ) -> Self {
        Self {
            manifest,
            loader,
            host,
            layer: None,
            palette_name: config.color_scale.clone(),
            opacity: config.opacity,
            policy: config.policy(),
            generation: 0,
            status: Status::Idle,
            out_dir: None,
            frames: Vec::new(),
        }
    }

    /// Write rendered tiles under `dir/<selection>/z/x/y.png`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn layer(&self) -> Option<&DynamicRasterLayer> {
        self.layer.as_ref()
    }

    pub fn host(&self) -> &Arc<HeadlessMap> {
        &self.host
    }

    pub fn loader(&self) -> Arc<dyn RasterLoader> {
        Arc::clone(&self.loader)
    }

    /// Summaries of every frame presented so far.
    pub fn frames(&self) -> &[FrameSummary] {
        &self.frames
    }

    /// Start a selection. Returns `None` when the manifest has no file for it.
    pub fn begin(&mut self, selection: Selection) -> Option<LoadTicket> {
        self.generation += 1;

        match self.manifest.resolve(&selection) {
            Ok(path) => {
                let ticket = LoadTicket {
                    generation: self.generation,
                    selection: selection.clone(),
                    path: path.to_string(),
                };
                info!(selection = %selection, path = %ticket.path, "Loading raster");
                self.status = Status::Loading(selection);
                Some(ticket)
            }
            Err(e) => {
                warn!(selection = %selection, status = e.status_message(), "No file for selection");
                self.status = Status::NotFound(selection);
                None
            }
        }
    }

    /// Apply a finished load. Returns `false` if it was stale and discarded.
    pub fn finish(&mut self, outcome: LoadOutcome) -> Result<bool> {
        if outcome.generation != self.generation {
            debug!(
                selection = %outcome.selection,
                generation = outcome.generation,
                latest = self.generation,
                "Discarding stale load"
            );
            return Ok(false);
        }

        match outcome.result {
            Ok(raster) => {
                let raster = Arc::new(raster);
                match &mut self.layer {
                    Some(layer) => layer.update_data(raster),
                    None => {
                        let mut layer = DynamicRasterLayer::new(
                            raster,
                            self.palette_name.clone(),
                            self.opacity,
                            self.policy,
                        );
                        layer.attach(Arc::clone(&self.host) as Arc<dyn TileHost>);
                        self.layer = Some(layer);
                    }
                }
                info!(selection = %outcome.selection, "Raster loaded");
                self.status = Status::Loaded(outcome.selection);
                self.present()?;
            }
            Err(e) => {
                warn!(
                    selection = %outcome.selection,
                    status = e.status_message(),
                    error = %e,
                    "Failed to load raster"
                );
                self.status = Status::DecodeFailed {
                    selection: outcome.selection,
                    message: e.to_string(),
                };
            }
        }

        Ok(true)
    }

    /// Resolve, load and display a selection.
    pub async fn select(&mut self, selection: Selection) -> Result<&Status> {
        if let Some(ticket) = self.begin(selection) {
            let outcome = ticket.run(self.loader()).await;
            self.finish(outcome)?;
        }
        Ok(&self.status)
    }

    pub fn update_palette(&mut self, name: &str) -> Result<()> {
        self.palette_name = name.to_string();
        if let Some(layer) = &mut self.layer {
            layer.update_palette(name);
        }
        self.present()
    }

    pub fn update_opacity(&mut self, opacity: f64) -> Result<()> {
        self.opacity = opacity;
        if let Some(layer) = &mut self.layer {
            layer.update_opacity(opacity);
        }
        self.present()
    }

    /// Re-render visible tiles if the map has a pending redraw.
    fn present(&mut self) -> Result<()> {
        let Some(layer) = &self.layer else {
            return Ok(());
        };
        if !self.host.is_dirty() {
            return Ok(());
        }

        let out_dir = match (&self.out_dir, self.status.selection()) {
            (Some(dir), Some(sel)) => Some(dir.join(frame_dir_name(sel))),
            _ => None,
        };
        let (_, summary) = self.host.flush(layer, out_dir.as_deref())?;
        self.frames.push(summary);
        Ok(())
    }

    /// Cycle through the forecast steps of `base`'s date and run, one step
    /// per tick, looping back to the first step, until `shutdown` fires or
    /// `max_frames` frames have been shown.
    ///
    /// Each tick finishes its load before the next tick is awaited; a
    /// shutdown during a load abandons it. Returns the number of frames shown.
    pub async fn animate(
        &mut self,
        base: &Selection,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
        max_frames: Option<usize>,
    ) -> Result<usize> {
        let steps = self.manifest.steps(&base.date, &base.run);
        if steps.is_empty() {
            warn!(date = %base.date, run = %base.run, "No steps to animate");
            return Ok(0);
        }

        info!(
            date = %base.date,
            run = %base.run,
            level = base.level,
            steps = steps.len(),
            interval_ms = interval.as_millis() as u64,
            "Starting animation"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut index = 0usize;
        let mut frames = 0usize;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!(frames = frames, "Stopping animation");
                    break;
                }
                _ = ticker.tick() => {
                    let selection = base.with_step(steps[index]);

                    // A pending load must not delay shutdown
                    tokio::select! {
                        _ = shutdown.recv() => {
                            info!(frames = frames, "Stopping animation during load");
                            break;
                        }
                        status = self.select(selection) => {
                            debug!(status = %status?.info_line(), "Animation frame");
                        }
                    }

                    frames += 1;
                    index = (index + 1) % steps.len();

                    if max_frames.is_some_and(|max| frames >= max) {
                        break;
                    }
                }
            }
        }

        Ok(frames)
    }
}

fn frame_dir_name(sel: &Selection) -> String {
    format!(
        "{}T{}_step{}h_level{}hPa",
        sel.date, sel.run, sel.step, sel.level
    )
}
