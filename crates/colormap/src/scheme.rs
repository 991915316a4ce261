//! Colour spectra and the multi-stop interpolation engine.
//!
//! A spectrum maps a normalised position `t` in `[0, 1]` to a colour. Palettes
//! decide how data values become positions; spectra only decide colours.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour from hue in degrees, saturation and brightness in `[0, 1]`.
    pub fn from_hsb(hue: f64, saturation: f64, brightness: f64) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let v = brightness.clamp(0.0, 1.0);

        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::new(channel(r), channel(g), channel(b))
    }

    /// Multiply every channel by `factor`, saturating at 0 and 255.
    pub fn scaled(&self, factor: f64) -> Self {
        let f = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }
}

fn channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Hue sweep span in degrees; position 0 is violet, 1 is red.
pub const HUE_SPAN_DEGREES: f64 = 280.0;
const HUE_SATURATION: f64 = 0.8;
const HUE_BRIGHTNESS: f64 = 0.8;

/// Available spectra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spectrum {
    /// Continuous hue sweep at constant saturation and brightness
    #[default]
    Hue,
    /// Blue -> Cyan -> Green -> Yellow -> Red
    Rainbow,
    /// Blue -> White -> Red (divergent data)
    BlueWhiteRed,
    /// Black -> Red -> Yellow -> White
    Thermal,
    /// Green -> Yellow -> Brown -> White (elevation)
    Terrain,
    /// White -> Cyan -> Blue (water depth)
    Water,
    /// Black -> White
    Grayscale,
}

impl Spectrum {
    /// All available spectra, useful for UI combo boxes.
    pub const ALL: &[Spectrum] = &[
        Self::Hue,
        Self::Rainbow,
        Self::BlueWhiteRed,
        Self::Thermal,
        Self::Terrain,
        Self::Water,
        Self::Grayscale,
    ];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hue => "Hue",
            Self::Rainbow => "Rainbow",
            Self::BlueWhiteRed => "Blue-White-Red",
            Self::Thermal => "Thermal",
            Self::Terrain => "Terrain",
            Self::Water => "Water",
            Self::Grayscale => "Grayscale",
        }
    }

    /// Colour at normalised position `t`; values outside `[0, 1]` are clamped.
    pub fn color_at(&self, t: f64) -> Rgb {
        match self {
            Self::Hue => {
                let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
                Rgb::from_hsb((1.0 - t) * HUE_SPAN_DEGREES, HUE_SATURATION, HUE_BRIGHTNESS)
            }
            Self::Grayscale => {
                let v = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
                Rgb::new(v, v, v)
            }
            Self::Rainbow => multi_stop(RAINBOW_STOPS, t),
            Self::BlueWhiteRed => multi_stop(BLUE_WHITE_RED_STOPS, t),
            Self::Thermal => multi_stop(THERMAL_STOPS, t),
            Self::Terrain => multi_stop(TERRAIN_STOPS, t),
            Self::Water => multi_stop(WATER_STOPS, t),
        }
    }
}

impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Spectrum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|spectrum| {
                spectrum
                    .name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .eq(key.chars())
            })
            .ok_or_else(|| format!("unknown spectrum '{}'", s))
    }
}

// ─── Color stop definitions ────────────────────────────────────────────

const RAINBOW_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 0, 48, 245),
    ColorStop::new(0.25, 0, 170, 220),
    ColorStop::new(0.50, 60, 190, 80),
    ColorStop::new(0.75, 240, 200, 30),
    ColorStop::new(1.00, 210, 30, 20),
];

const BLUE_WHITE_RED_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 33, 102, 172),
    ColorStop::new(0.25, 103, 169, 207),
    ColorStop::new(0.50, 247, 247, 247),
    ColorStop::new(0.75, 239, 138, 98),
    ColorStop::new(1.00, 178, 24, 43),
];

const THERMAL_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 0, 0, 0),
    ColorStop::new(0.35, 160, 20, 20),
    ColorStop::new(0.70, 240, 170, 20),
    ColorStop::new(1.00, 255, 255, 255),
];

const TERRAIN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 34, 139, 34),
    ColorStop::new(0.25, 144, 190, 60),
    ColorStop::new(0.50, 220, 200, 80),
    ColorStop::new(0.75, 180, 120, 60),
    ColorStop::new(1.00, 255, 255, 255),
];

const WATER_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 240, 249, 255),
    ColorStop::new(0.25, 186, 228, 250),
    ColorStop::new(0.50, 80, 180, 230),
    ColorStop::new(0.75, 30, 120, 200),
    ColorStop::new(1.00, 8, 48, 107),
];

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t.is_nan() || t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}
