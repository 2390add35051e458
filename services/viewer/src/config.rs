//! Viewer configuration.
//!
//! Loaded from an optional YAML file, then overridden from environment
//! variables (a `.env` file is honoured by `main`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use overlay_common::{OverlayError, TILE_SIZE};
use renderer::TransparencyPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Palette name; unknown names render as viridis
    pub color_scale: String,

    /// Normalized values at or below this render transparent
    pub transparent_threshold: f64,

    /// Width of the transparent legend band in percent
    pub legend_transparent_percent: Option<f64>,

    /// Layer opacity in `[0, 1]`
    pub opacity: f64,

    /// Preferred pressure level (hPa) for the initial selection
    pub default_level: u32,

    /// Tile edge in pixels
    pub tile_size: usize,

    pub animation: AnimationConfig,
    pub map: MapConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Delay between forecast steps
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u32,
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            color_scale: "viridis".to_string(),
            transparent_threshold: 0.0,
            legend_transparent_percent: None,
            opacity: 0.7,
            default_level: 850,
            tile_size: TILE_SIZE,
            animation: AnimationConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        // South America
        Self {
            center: [-15.0, -50.0],
            zoom: 3,
            min_zoom: 3,
            max_zoom: 10,
            viewport_width: 1024,
            viewport_height: 768,
        }
    }
}

impl ViewerConfig {
    /// Parse a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse viewer config")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// File (or defaults), then environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate().map_err(OverlayError::Config)?;
        Ok(config)
    }

    /// Override fields from `VIEWER_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            var(key).and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = var("VIEWER_COLOR_SCALE") {
            self.color_scale = v;
        }
        if let Some(v) = parsed(&var, "VIEWER_TRANSPARENT_THRESHOLD") {
            self.transparent_threshold = v;
        }
        if let Some(v) = parsed(&var, "VIEWER_LEGEND_PERCENT") {
            self.legend_transparent_percent = Some(v);
        }
        if let Some(v) = parsed(&var, "VIEWER_OPACITY") {
            self.opacity = v;
        }
        if let Some(v) = parsed(&var, "VIEWER_ANIMATION_INTERVAL_MS") {
            self.animation.interval_ms = v;
        }
        if let Some(v) = parsed(&var, "VIEWER_ZOOM") {
            self.map.zoom = v;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.transparent_threshold) {
            return Err(format!(
                "transparent_threshold must be in [0, 1], got {}",
                self.transparent_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!("opacity must be in [0, 1], got {}", self.opacity));
        }
        if let Some(p) = self.legend_transparent_percent {
            if !(0.0..=100.0).contains(&p) {
                return Err(format!(
                    "legend_transparent_percent must be in [0, 100], got {}",
                    p
                ));
            }
        }
        if self.tile_size == 0 {
            return Err("tile_size must be positive".to_string());
        }
        if self.animation.interval_ms == 0 {
            return Err("animation.interval_ms must be positive".to_string());
        }
        if self.map.min_zoom > self.map.max_zoom {
            return Err(format!(
                "map.min_zoom ({}) exceeds map.max_zoom ({})",
                self.map.min_zoom, self.map.max_zoom
            ));
        }
        if self.map.zoom < self.map.min_zoom || self.map.zoom > self.map.max_zoom {
            return Err(format!(
                "map.zoom {} outside [{}, {}]",
                self.map.zoom, self.map.min_zoom, self.map.max_zoom
            ));
        }
        let [lat, lon] = self.map.center;
        if !lat.is_finite() || !lon.is_finite() {
            return Err("map.center must be finite".to_string());
        }
        if self.map.viewport_width == 0 || self.map.viewport_height == 0 {
            return Err("map viewport must be non-empty".to_string());
        }
        Ok(())
    }

    pub fn policy(&self) -> TransparencyPolicy {
        TransparencyPolicy::new(self.transparent_threshold)
            .with_legend_percent(self.legend_transparent_percent)
    }

    pub fn animation_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.animation.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.color_scale, "viridis");
        assert_eq!(config.map.center, [-15.0, -50.0]);
        assert_eq!(config.animation.interval_ms, 1000);
        assert_eq!(config.default_level, 850);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ViewerConfig::from_yaml_str(
            "color_scale: inferno\ntransparent_threshold: 0.2\nmap:\n  zoom: 5\n",
        )
        .unwrap();
        assert_eq!(config.color_scale, "inferno");
        assert_eq!(config.transparent_threshold, 0.2);
        assert_eq!(config.map.zoom, 5);
        assert_eq!(config.map.max_zoom, 10);
        assert_eq!(config.opacity, 0.7);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VIEWER_COLOR_SCALE", "magma"),
            ("VIEWER_OPACITY", "0.4"),
            ("VIEWER_ZOOM", "not-a-number"),
            ("VIEWER_LEGEND_PERCENT", "15"),
        ]
        .into_iter()
        .collect();

        let mut config = ViewerConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.color_scale, "magma");
        assert_eq!(config.opacity, 0.4);
        assert_eq!(config.map.zoom, 3);
        assert_eq!(config.policy().legend_percent(), 15.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ViewerConfig::default();
        config.map.zoom = 11;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.opacity = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.animation.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.transparent_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reports_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"opacity: 2.0\n").unwrap();

        let err = ViewerConfig::load(Some(file.path())).unwrap_err();
        match err.downcast_ref::<OverlayError>() {
            Some(e @ OverlayError::Config(msg)) => {
                assert!(msg.contains("opacity"), "{}", msg);
                assert_eq!(e.status_message(), "Invalid configuration");
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
