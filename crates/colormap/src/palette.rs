//! Value-to-colour palettes.
//!
//! A [`Palette`] owns a display range and a spectrum. How a value becomes a
//! spectrum position depends on the palette type:
//!
//! - [`LinearPalette`]: position is the value's normalised place in the range.
//! - [`GaussianPalette`]: position is the normal CDF of the value against the
//!   mean and standard deviation of the in-range values.
//! - [`QuantilePalette`]: position is the index of the value among quantiles
//!   of the in-range values, so every colour band covers a similar share of
//!   the data.

use crate::scheme::{Rgb, Spectrum};
use serde::{Deserialize, Serialize};
use std::fmt;
use surveygrid_core::Range;

/// Maps scalar values to colours.
pub trait Palette: fmt::Debug + Send + Sync {
    /// Display range the palette was built for
    fn range(&self) -> Range;

    /// Colour for `value`. Values outside the range get the end colours.
    fn color_at(&self, value: f64) -> Rgb;
}

/// Palette types selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteType {
    #[default]
    Linear,
    Gaussian,
    Quantile,
}

impl PaletteType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Gaussian => "Gaussian",
            Self::Quantile => "Quantile",
        }
    }
}

impl fmt::Display for PaletteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build a palette of the given type.
///
/// `sorted_values` must be ascending and free of NaN; only the Gaussian and
/// Quantile palettes read it.
pub fn build_palette(
    palette_type: PaletteType,
    spectrum: Spectrum,
    sorted_values: &[f64],
    range: Range,
) -> Box<dyn Palette> {
    match palette_type {
        PaletteType::Linear => Box::new(LinearPalette::new(spectrum, range)),
        PaletteType::Gaussian => Box::new(GaussianPalette::new(spectrum, sorted_values, range)),
        PaletteType::Quantile => Box::new(QuantilePalette::new(spectrum, sorted_values, range)),
    }
}

// ─── Linear ────────────────────────────────────────────────────────────

/// Clamp, normalise, look up.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPalette {
    spectrum: Spectrum,
    range: Range,
}

impl LinearPalette {
    pub fn new(spectrum: Spectrum, range: Range) -> Self {
        Self { spectrum, range }
    }
}

impl Palette for LinearPalette {
    fn range(&self) -> Range {
        self.range
    }

    fn color_at(&self, value: f64) -> Rgb {
        self.spectrum.color_at(self.range.normalize(value))
    }
}

// ─── Gaussian ──────────────────────────────────────────────────────────

/// Number of standard deviations spread over the full spectrum
const SIGMA_RANGE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianPalette {
    spectrum: Spectrum,
    range: Range,
    mean: f64,
    stddev: f64,
}

impl GaussianPalette {
    pub fn new(spectrum: Spectrum, values: &[f64], range: Range) -> Self {
        let (mut sum, mut sum_sq, mut count) = (0.0, 0.0, 0usize);
        for &v in values.iter().filter(|&&v| range.contains(v)) {
            sum += v;
            sum_sq += v * v;
            count += 1;
        }
        let (mean, stddev) = if count == 0 {
            (0.0, 0.0)
        } else {
            let mean = sum / count as f64;
            (mean, (sum_sq / count as f64 - mean * mean).max(0.0).sqrt())
        };
        Self {
            spectrum,
            range,
            mean,
            stddev,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn stddev(&self) -> f64 {
        self.stddev
    }
}

impl Palette for GaussianPalette {
    fn range(&self) -> Range {
        self.range
    }

    fn color_at(&self, value: f64) -> Rgb {
        if self.stddev == 0.0 {
            return self.spectrum.color_at(0.5);
        }
        let z = (self.range.clamp(value) - self.mean) / self.stddev;
        let cdf = 0.5 * (1.0 + erf(z / (SIGMA_RANGE * std::f64::consts::SQRT_2)));
        self.spectrum.color_at(cdf.clamp(0.0, 1.0))
    }
}

/// Abramowitz-Stegun 7.1.26, absolute error below 1.5e-7.
pub fn erf(x: f64) -> f64 {
    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = ((((1.061405429 * t - 1.453152027) * t + 1.421413741) * t - 0.284496736) * t
        + 0.254829592)
        * t;
    sign * (1.0 - poly * (-x * x).exp())
}

// ─── Quantile ──────────────────────────────────────────────────────────

const NUM_QUANTILES: usize = 31;

#[derive(Debug, Clone, PartialEq)]
pub struct QuantilePalette {
    spectrum: Spectrum,
    range: Range,
    quantiles: Vec<f64>,
}

impl QuantilePalette {
    pub fn new(spectrum: Spectrum, sorted_values: &[f64], range: Range) -> Self {
        Self {
            spectrum,
            range,
            quantiles: quantiles(sorted_values, range),
        }
    }

    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }
}

/// Interpolated quantiles of the sorted values that fall inside `range`.
fn quantiles(sorted: &[f64], range: Range) -> Vec<f64> {
    let lo = sorted.partition_point(|&v| v < range.min);
    let hi = sorted.partition_point(|&v| v <= range.max);
    // need at least two in-range values
    if hi < lo + 2 {
        return Vec::new();
    }
    let last = hi - 1;

    let step = (hi - lo) as f64 / NUM_QUANTILES as f64;
    (0..NUM_QUANTILES)
        .map(|q| {
            let t = lo as f64 + q as f64 * step;
            let i = (t.floor() as usize).min(last - 1);
            let k = t - i as f64;
            sorted[i] + k * (sorted[i + 1] - sorted[i])
        })
        .collect()
}

impl Palette for QuantilePalette {
    fn range(&self) -> Range {
        self.range
    }

    fn color_at(&self, value: f64) -> Rgb {
        let n = self.quantiles.len();
        if n < 2 {
            return self.spectrum.color_at(0.5);
        }
        // last quantile <= value
        let i = self.quantiles.partition_point(|&q| q <= value).saturating_sub(1);
        self.spectrum.color_at(i as f64 / (n - 1) as f64)
    }
}
