//! Value → RGBA sampling.

use serde::{Deserialize, Serialize};

use crate::palette::{Color, Palette};

/// Legend transparent-band width used when no threshold is set.
pub const MIN_LEGEND_PERCENT: f64 = 10.0;

/// Binary transparency cutoff.
///
/// Normalized values `<= threshold` render fully transparent, everything
/// above renders fully opaque. The legend percent only affects how wide the
/// transparent band is drawn in the legend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransparencyPolicy {
    threshold: f64,
    legend_percent: Option<f64>,
}

impl TransparencyPolicy {
    /// Threshold is clamped to `[0, 1]`; NaN becomes 0.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            0.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self {
            threshold,
            legend_percent: None,
        }
    }

    /// Override the legend's transparent band width, in percent.
    pub fn with_legend_percent(mut self, percent: Option<f64>) -> Self {
        self.legend_percent = percent
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0));
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Width of the transparent legend band in `[0, 100]`.
    pub fn legend_percent(&self) -> f64 {
        match self.legend_percent {
            Some(p) => p,
            None if self.threshold > 0.0 => self.threshold * 100.0,
            None => MIN_LEGEND_PERCENT,
        }
    }
}

/// Color one normalized sample.
///
/// Non-finite values are treated as 0 and everything is clamped to `[0, 1]`
/// before the threshold test. The comparison runs at the sample's `f32`
/// precision, so a sample stored as the threshold's decimal value is
/// transparent. Alpha is either 0 or 255; opacity is applied by the tile
/// renderer.
#[inline]
pub fn sample(value: f32, palette: Palette, policy: &TransparencyPolicy) -> Color {
    let v = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };

    if v <= policy.threshold as f32 {
        return Color::TRANSPARENT;
    }

    palette.color_at(v as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threshold_hides_only_zero() {
        let policy = TransparencyPolicy::default();
        assert_eq!(sample(0.0, Palette::Viridis, &policy).a, 0);
        assert_eq!(sample(0.001, Palette::Viridis, &policy).a, 255);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = TransparencyPolicy::new(0.25);
        assert_eq!(sample(0.25, Palette::Magma, &policy), Color::TRANSPARENT);
        assert_eq!(sample(0.2501, Palette::Magma, &policy).a, 255);
    }

    #[test]
    fn test_non_finite_treated_as_zero() {
        let policy = TransparencyPolicy::new(0.0);
        assert_eq!(sample(f32::NAN, Palette::Turbo, &policy), Color::TRANSPARENT);
        assert_eq!(sample(f32::INFINITY, Palette::Turbo, &policy), Color::TRANSPARENT);

        // With a negative-free threshold of 0 the only way NaN becomes visible
        // is if it were propagated; check it matches the clamped 0 case.
        let policy = TransparencyPolicy::new(0.0);
        assert_eq!(
            sample(f32::NEG_INFINITY, Palette::Blues, &policy),
            sample(0.0, Palette::Blues, &policy)
        );
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let policy = TransparencyPolicy::new(0.0);
        assert_eq!(
            sample(4.0, Palette::Viridis, &policy),
            Palette::Viridis.color_at(1.0)
        );
        assert_eq!(sample(-1.0, Palette::Viridis, &policy), Color::TRANSPARENT);
    }

    #[test]
    fn test_legend_percent_defaults() {
        assert_eq!(TransparencyPolicy::new(0.0).legend_percent(), MIN_LEGEND_PERCENT);
        assert!((TransparencyPolicy::new(0.3).legend_percent() - 30.0).abs() < 1e-9);
        let policy = TransparencyPolicy::new(0.3).with_legend_percent(Some(5.0));
        assert_eq!(policy.legend_percent(), 5.0);
        // legend width never changes sampling
        assert_eq!(sample(0.3, Palette::Viridis, &policy).a, 0);
    }

    #[test]
    fn test_sample_at_decimal_threshold_is_transparent() {
        for threshold in [0.1, 0.3, 0.7] {
            let policy = TransparencyPolicy::new(threshold);
            let at = threshold as f32;
            let above = f32::from_bits(at.to_bits() + 1);

            assert_eq!(sample(at, Palette::Viridis, &policy), Color::TRANSPARENT, "{}", threshold);
            assert_eq!(sample(above, Palette::Viridis, &policy).a, 255, "{}", threshold);
        }
    }

    #[test]
    fn test_threshold_is_sanitized() {
        assert_eq!(TransparencyPolicy::new(f64::NAN).threshold(), 0.0);
        assert_eq!(TransparencyPolicy::new(3.0).threshold(), 1.0);
        assert_eq!(TransparencyPolicy::new(-0.5).threshold(), 0.0);
    }
}
