//! Legend gradients and reduced color ramps.
//!
//! Both are derived from the same palette and transparency policy the tile
//! renderer uses, so the legend and any alternative backend stay consistent
//! with rendered tiles.

use serde::{Deserialize, Serialize};

use crate::palette::{Color, Palette};
use crate::sampler::TransparencyPolicy;

/// Hex sentinel for a fully transparent entry.
pub const TRANSPARENT_HEX: &str = "#00000000";

/// Normalized values labelled under the legend bar.
const LABEL_TICKS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// One legend color stop at a position in percent of the bar width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: Color,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub palette: Palette,
    pub gradient_stops: Vec<GradientStop>,
    pub labels: Vec<String>,
}

impl Legend {
    /// CSS `linear-gradient(...)` for the legend bar.
    pub fn css_gradient(&self) -> String {
        let stops: Vec<String> = self
            .gradient_stops
            .iter()
            .map(|s| format!("{} {}%", s.color.to_css(), format_percent(s.position)))
            .collect();
        format!("linear-gradient(to right, {})", stops.join(", "))
    }
}

fn format_percent(p: f64) -> String {
    let rounded = (p * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// Build the legend for a palette name.
///
/// A transparent band covers `0..legend_percent`; the palette's named stops
/// are spread evenly over the remaining width. Positions are non-decreasing
/// and end at exactly 100.
pub fn build_legend(palette_name: &str, policy: &TransparencyPolicy) -> Legend {
    let palette = Palette::lookup(palette_name);
    let band = policy.legend_percent();
    let stops = palette.stops();

    let mut gradient_stops = Vec::with_capacity(stops.len() + 2);
    gradient_stops.push(GradientStop {
        color: Color::TRANSPARENT,
        position: 0.0,
    });
    gradient_stops.push(GradientStop {
        color: Color::TRANSPARENT,
        position: band,
    });

    let last = (stops.len() - 1).max(1) as f64;
    for (i, color) in stops.iter().enumerate() {
        let position = if i + 1 == stops.len() {
            100.0
        } else {
            band + (100.0 - band) * i as f64 / last
        };
        gradient_stops.push(GradientStop {
            color: *color,
            position,
        });
    }

    let labels = LABEL_TICKS.iter().map(|v| format!("{:.2}", v)).collect();

    Legend {
        palette,
        gradient_stops,
        labels,
    }
}

/// Discrete hex ramp for backends that cannot sample the curve themselves.
///
/// The first `k` entries are [`TRANSPARENT_HEX`], where
/// `k = round(sample_count * threshold)` and at least 1 when the threshold is
/// positive. The remaining `m` entries sample the palette curve at
/// `t = 1/m, 2/m, ..., 1`.
pub fn build_reduced_ramp(
    palette_name: &str,
    policy: &TransparencyPolicy,
    sample_count: usize,
) -> Vec<String> {
    let palette = Palette::lookup(palette_name);
    let threshold = policy.threshold();

    let transparent = if threshold > 0.0 {
        ((sample_count as f64 * threshold).round() as usize)
            .max(1)
            .min(sample_count)
    } else {
        0
    };
    let colored = sample_count - transparent;

    let mut ramp = Vec::with_capacity(sample_count);
    ramp.extend(std::iter::repeat(TRANSPARENT_HEX.to_string()).take(transparent));
    ramp.extend((1..=colored).map(|i| palette.color_at(i as f64 / colored as f64).to_hex()));
    ramp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_legend_band() {
        let legend = build_legend("viridis", &TransparencyPolicy::default());
        assert_eq!(legend.gradient_stops[1].position, 10.0);
        assert_eq!(legend.gradient_stops[2].position, 10.0);
        assert_eq!(legend.gradient_stops.last().unwrap().position, 100.0);
        assert_eq!(legend.gradient_stops.len(), 2 + 5);
    }

    #[test]
    fn test_legend_unknown_palette() {
        let legend = build_legend("nope", &TransparencyPolicy::new(0.2));
        assert_eq!(legend.palette, Palette::Viridis);
        assert!((legend.gradient_stops[1].position - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels() {
        let legend = build_legend("blues", &TransparencyPolicy::default());
        assert_eq!(legend.labels, vec!["0.00", "0.25", "0.50", "0.75", "1.00"]);
    }

    #[test]
    fn test_css_gradient() {
        let legend = build_legend("viridis", &TransparencyPolicy::default());
        let css = legend.css_gradient();
        assert!(css.starts_with("linear-gradient(to right, rgba(0, 0, 0, 0) 0%"));
        assert!(css.ends_with("rgba(253, 231, 37, 1) 100%)"));
    }

    #[test]
    fn test_reduced_ramp_without_threshold() {
        let ramp = build_reduced_ramp("inferno", &TransparencyPolicy::default(), 4);
        assert_eq!(ramp.len(), 4);
        assert!(ramp.iter().all(|c| c != TRANSPARENT_HEX));
        assert_eq!(ramp[3], Palette::Inferno.color_at(1.0).to_hex());
    }

    #[test]
    fn test_reduced_ramp_small_threshold_reserves_one() {
        let ramp = build_reduced_ramp("viridis", &TransparencyPolicy::new(0.01), 10);
        assert_eq!(ramp[0], TRANSPARENT_HEX);
        assert_ne!(ramp[1], TRANSPARENT_HEX);
    }

    #[test]
    fn test_reduced_ramp_edge_counts() {
        assert!(build_reduced_ramp("viridis", &TransparencyPolicy::new(0.5), 0).is_empty());
        let all = build_reduced_ramp("viridis", &TransparencyPolicy::new(1.0), 3);
        assert!(all.iter().all(|c| c == TRANSPARENT_HEX));
    }
}
