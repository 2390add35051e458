//! Palette table: named color ramps.
//!
//! Each palette carries two things:
//! - a short list of hand-picked RGB stops, used by the legend
//! - a closed-form `t → RGB` curve, used for every rendered pixel and for
//!   reduced ramps
//!
//! The curves are approximations of the well-known scientific ramps, not
//! colorimetric reproductions. Their exact integer output is part of the
//! visible contract, so they are expressed as fixed formulas rather than as
//! interpolation between the stops. Every channel is floored after evaluation.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb`, ignoring alpha.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// CSS `rgba(...)` notation.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            (self.a as f64 / 255.0 * 100.0).round() / 100.0
        )
    }
}

/// A named color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    Viridis,
    Blues,
    Inferno,
    Magma,
    Plasma,
    Turbo,
    Cubehelix,
}

impl Default for Palette {
    fn default() -> Self {
        Palette::DEFAULT
    }
}

const VIRIDIS_STOPS: &[Color] = &[
    Color::rgb(0x44, 0x01, 0x54),
    Color::rgb(0x3b, 0x52, 0x8b),
    Color::rgb(0x21, 0x91, 0x8c),
    Color::rgb(0x5e, 0xc9, 0x62),
    Color::rgb(0xfd, 0xe7, 0x25),
];

const BLUES_STOPS: &[Color] = &[
    Color::rgb(0xf7, 0xfb, 0xff),
    Color::rgb(0xc6, 0xdb, 0xef),
    Color::rgb(0x6b, 0xae, 0xd6),
    Color::rgb(0x21, 0x71, 0xb5),
    Color::rgb(0x08, 0x30, 0x6b),
];

const INFERNO_STOPS: &[Color] = &[
    Color::rgb(0x00, 0x00, 0x04),
    Color::rgb(0x57, 0x10, 0x6e),
    Color::rgb(0xbc, 0x37, 0x54),
    Color::rgb(0xf9, 0x8e, 0x09),
    Color::rgb(0xfc, 0xff, 0xa4),
];

const MAGMA_STOPS: &[Color] = &[
    Color::rgb(0x00, 0x00, 0x04),
    Color::rgb(0x51, 0x12, 0x7c),
    Color::rgb(0xb7, 0x37, 0x79),
    Color::rgb(0xfc, 0x89, 0x61),
    Color::rgb(0xfc, 0xfd, 0xbf),
];

const PLASMA_STOPS: &[Color] = &[
    Color::rgb(0x0d, 0x08, 0x87),
    Color::rgb(0x7e, 0x03, 0xa8),
    Color::rgb(0xcc, 0x47, 0x78),
    Color::rgb(0xf8, 0x95, 0x40),
    Color::rgb(0xf0, 0xf9, 0x21),
];

const TURBO_STOPS: &[Color] = &[
    Color::rgb(0x30, 0x12, 0x3b),
    Color::rgb(0x46, 0x86, 0xfb),
    Color::rgb(0x1a, 0xe4, 0xb6),
    Color::rgb(0xa2, 0xfc, 0x3c),
    Color::rgb(0xfa, 0xbb, 0x39),
    Color::rgb(0xe4, 0x46, 0x0a),
    Color::rgb(0x7a, 0x04, 0x03),
];

const CUBEHELIX_STOPS: &[Color] = &[
    Color::rgb(0x00, 0x00, 0x00),
    Color::rgb(0x1f, 0x66, 0x42),
    Color::rgb(0xa0, 0x79, 0x49),
    Color::rgb(0xcf, 0xa3, 0xe2),
    Color::rgb(0xff, 0xff, 0xff),
];

impl Palette {
    /// Palette used for unknown or empty names.
    pub const DEFAULT: Palette = Palette::Viridis;

    pub const ALL: [Palette; 7] = [
        Palette::Viridis,
        Palette::Blues,
        Palette::Inferno,
        Palette::Magma,
        Palette::Plasma,
        Palette::Turbo,
        Palette::Cubehelix,
    ];

    /// Find a palette by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Palette> {
        let name = name.trim();
        Palette::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Find a palette by name, falling back to [`Palette::DEFAULT`].
    ///
    /// Never fails.
    pub fn lookup(name: &str) -> Palette {
        Palette::from_name(name).unwrap_or_else(|| {
            debug!(palette = %name, fallback = Palette::DEFAULT.name(), "Unknown palette");
            Palette::DEFAULT
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Viridis => "viridis",
            Palette::Blues => "blues",
            Palette::Inferno => "inferno",
            Palette::Magma => "magma",
            Palette::Plasma => "plasma",
            Palette::Turbo => "turbo",
            Palette::Cubehelix => "cubehelix",
        }
    }

    /// Named stops shown in the legend (at least two).
    pub fn stops(&self) -> &'static [Color] {
        match self {
            Palette::Viridis => VIRIDIS_STOPS,
            Palette::Blues => BLUES_STOPS,
            Palette::Inferno => INFERNO_STOPS,
            Palette::Magma => MAGMA_STOPS,
            Palette::Plasma => PLASMA_STOPS,
            Palette::Turbo => TURBO_STOPS,
            Palette::Cubehelix => CUBEHELIX_STOPS,
        }
    }

    /// Evaluate the palette curve at `t`, clamped to `[0, 1]`.
    ///
    /// Returns an opaque color. Non-finite `t` evaluates as 0.
    pub fn color_at(&self, t: f64) -> Color {
        let [r, g, b] = self.curve(t);
        Color::rgb(channel(r), channel(g), channel(b))
    }

    /// Unfloored channel values of the curve at `t`, each in `[0, 255]` for
    /// every `t`. `t` is clamped like in [`Palette::color_at`].
    pub fn curve(&self, t: f64) -> [f64; 3] {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Palette::Viridis => viridis(t),
            Palette::Blues => blues(t),
            Palette::Inferno => inferno(t),
            Palette::Magma => magma(t),
            Palette::Plasma => plasma(t),
            Palette::Turbo => turbo(t),
            Palette::Cubehelix => cubehelix(t),
        }
    }
}

impl std::fmt::Display for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Floor a channel value and clamp it into `[0, 255]`.
#[inline(always)]
fn channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.floor().clamp(0.0, 255.0) as u8
}

fn viridis(t: f64) -> [f64; 3] {
    [
        68.0 + (253.0 - 68.0) * (1.0 - (1.0 - t).powi(2)),
        1.0 + (231.0 - 1.0) * (1.0 - (1.0 - t).powf(1.5)),
        84.0 + (37.0 - 84.0) * t.powi(2),
    ]
}

fn blues(t: f64) -> [f64; 3] {
    [
        247.0 - 239.0 * t,
        251.0 - 203.0 * t.powf(1.3),
        255.0 - 148.0 * t.powf(1.8),
    ]
}

fn inferno(t: f64) -> [f64; 3] {
    [
        252.0 * (1.0 - (1.0 - t).powf(1.8)),
        255.0 * t.powf(2.2),
        4.0 + 160.0 * t.powi(2) + 300.0 * t * (1.0 - t).powi(2),
    ]
}

fn magma(t: f64) -> [f64; 3] {
    [
        252.0 * (1.0 - (1.0 - t).powi(2)),
        253.0 * t.powf(2.4),
        4.0 + 187.0 * t.powf(1.5) + 120.0 * t * (1.0 - t),
    ]
}

fn plasma(t: f64) -> [f64; 3] {
    [
        13.0 + 227.0 * (1.0 - (1.0 - t).powf(1.6)),
        8.0 + 241.0 * t.powi(2),
        135.0 + 60.0 * (PI * t).sin() - 102.0 * t,
    ]
}

/// Gaussian bump of height 1 centered on `center`.
#[inline(always)]
fn bump(t: f64, center: f64, width: f64) -> f64 {
    (-((t - center) / width).powi(2)).exp()
}

/// Turbo as three Gaussian bumps: blue peaks first, then green, then red.
fn turbo(t: f64) -> [f64; 3] {
    [
        30.0 + 224.0 * bump(t, 0.72, 0.28),
        10.0 + 240.0 * bump(t, 0.45, 0.30),
        10.0 + 240.0 * bump(t, 0.20, 0.22),
    ]
}

/// Green's cubehelix with start 0.5, -1.5 rotations, hue 1.0, gamma 1.0.
fn cubehelix(t: f64) -> [f64; 3] {
    const START: f64 = 0.5;
    const ROTATIONS: f64 = -1.5;
    const HUE: f64 = 1.0;

    let angle = 2.0 * PI * (START / 3.0 + 1.0 + ROTATIONS * t);
    let amp = HUE * t * (1.0 - t) / 2.0;
    let (sin, cos) = angle.sin_cos();

    [
        255.0 * (t + amp * (-0.148_61 * cos + 1.782_77 * sin)),
        255.0 * (t + amp * (-0.292_27 * cos - 0.906_49 * sin)),
        255.0 * (t + amp * (1.972_94 * cos)),
    ]
}
