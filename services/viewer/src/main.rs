//! Icing overlay viewer.
//!
//! Headless front end for the colorization pipeline:
//! - `manifest`: scan a data directory and write the manifest
//! - `render`: load one selection and write its visible tiles as PNGs
//! - `legend`: print the legend and reduced color ramp as JSON
//! - `animate`: step through forecast hours on a timer until Ctrl+C

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use catalog::{scan_directory, Manifest, Selection};
use overlay_common::OverlayError;
use clap::{Args, Parser, Subcommand};
use renderer::{build_legend, build_reduced_ramp};
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use viewer::{Controller, FsLoader, HeadlessMap, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "viewer")]
#[command(about = "Icing risk overlay renderer")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "VIEWER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a data directory and write the manifest
    Manifest {
        /// Directory containing icing GeoTIFFs
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the visible tiles for one selection
    Render {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        view: ViewArgs,

        /// Directory for z/x/y.png tiles
        #[arg(short, long, default_value = "tiles")]
        out_dir: PathBuf,
    },

    /// Print legend stops and the reduced color ramp
    Legend {
        /// Palette name (defaults to the configured color scale)
        #[arg(short, long)]
        palette: Option<String>,

        /// Number of entries in the reduced ramp
        #[arg(long, default_value = "256")]
        ramp_size: usize,
    },

    /// Animate forecast steps until interrupted
    Animate {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        view: ViewArgs,

        /// Directory for per-frame tiles (no files written if omitted)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory containing icing GeoTIFFs
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Pre-built manifest; paths are resolved against --data-dir
    #[arg(short, long)]
    manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Run date (YYYYMMDD); defaults to the first available
    #[arg(long)]
    date: Option<String>,

    /// Run hour (HH); defaults to the first available
    #[arg(long)]
    run: Option<String>,

    /// Forecast step in hours; defaults to the first available
    #[arg(long)]
    step: Option<u32>,

    /// Pressure level in hPa; defaults to the configured default level
    #[arg(long)]
    level: Option<u32>,
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Palette name
    #[arg(long)]
    palette: Option<String>,

    /// Layer opacity (0-1)
    #[arg(long)]
    opacity: Option<f64>,

    /// Map zoom
    #[arg(long)]
    zoom: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = ViewerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Manifest { data_dir, output } => {
            let manifest = scan_directory(&data_dir)?;
            match output {
                Some(path) => {
                    manifest.save(&path)?;
                    info!(
                        path = %path.display(),
                        files = manifest.file_count(),
                        "Wrote manifest"
                    );
                }
                None => println!("{}", manifest.to_json()?),
            }
        }

        Commands::Legend { palette, ramp_size } => {
            let palette = palette.unwrap_or_else(|| config.color_scale.clone());
            let policy = config.policy();
            let legend = build_legend(&palette, &policy);
            let output = serde_json::json!({
                "css": legend.css_gradient(),
                "legend": legend,
                "ramp": build_reduced_ramp(&palette, &policy, ramp_size),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Render {
            source,
            selection,
            view,
            out_dir,
        } => {
            view.apply(&mut config)?;
            let manifest = load_manifest(&source)?;
            let selection = resolve_selection(&manifest, &selection, config.default_level)?;

            let mut controller = build_controller(manifest, &source.data_dir, &config)
                .with_output_dir(&out_dir);
            let status = controller.select(selection).await?;

            println!("{}", status.info_line());
            if status.is_error() {
                bail!("{}", status.info_line());
            }

            let written: usize = controller.frames().iter().map(|f| f.written.len()).sum();
            info!(out_dir = %out_dir.display(), tiles = written, "Render complete");
        }

        Commands::Animate {
            source,
            selection,
            view,
            out_dir,
            frames,
        } => {
            view.apply(&mut config)?;
            let manifest = load_manifest(&source)?;
            let base = resolve_selection(&manifest, &selection, config.default_level)?;

            let mut controller = build_controller(manifest, &source.data_dir, &config);
            if let Some(dir) = out_dir {
                controller = controller.with_output_dir(dir);
            }

            // Shutdown signal
            let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
            let shutdown_tx_clone = shutdown_tx.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received shutdown signal");
                shutdown_tx_clone.send(()).ok();
            });

            let shown = controller
                .animate(&base, config.animation_interval(), shutdown_rx, frames)
                .await?;
            info!(frames = shown, "Animation finished");
        }
    }

    Ok(())
}

impl ViewArgs {
    fn apply(&self, config: &mut ViewerConfig) -> Result<()> {
        if let Some(palette) = &self.palette {
            config.color_scale = palette.clone();
        }
        if let Some(opacity) = self.opacity {
            config.opacity = opacity;
        }
        if let Some(zoom) = self.zoom {
            config.map.zoom = zoom;
        }
        config.validate().map_err(OverlayError::Config)?;
        Ok(())
    }
}

fn load_manifest(source: &SourceArgs) -> Result<Manifest> {
    let manifest = match &source.manifest {
        Some(path) => Manifest::load(path)?,
        None => scan_directory(&source.data_dir)?,
    };
    if manifest.is_empty() {
        bail!("No icing files found in {}", source.data_dir.display());
    }
    Ok(manifest)
}

/// Fill unspecified selection fields with the first available values.
fn resolve_selection(
    manifest: &Manifest,
    args: &SelectionArgs,
    default_level: u32,
) -> Result<Selection> {
    let Some(first) = manifest.first_selection(default_level) else {
        bail!("Manifest is empty");
    };

    let date = args.date.clone().unwrap_or(first.date);
    let run = match &args.run {
        Some(run) => run.clone(),
        None => manifest
            .runs(&date)
            .first()
            .map(|r| r.to_string())
            .unwrap_or(first.run),
    };
    let step = match args.step {
        Some(step) => step,
        None => manifest
            .steps(&date, &run)
            .first()
            .copied()
            .unwrap_or(first.step),
    };
    let level = args.level.unwrap_or(first.level);

    Ok(Selection::new(date, run, step, level))
}

fn build_controller(manifest: Manifest, data_dir: &Path, config: &ViewerConfig) -> Controller {
    let loader = Arc::new(FsLoader::new(data_dir));
    let host = Arc::new(HeadlessMap::from_config(config));
    Controller::new(manifest, loader, host, config)
}
