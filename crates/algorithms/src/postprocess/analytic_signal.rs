//! Analytic-signal magnitude
//!
//! `|A| = √(∂f/∂x² + ∂f/∂y² + ∂f/∂z²)`. Horizontal derivatives come from
//! finite differences in metres; the vertical derivative is taken in the
//! wavenumber domain by scaling the 2-D spectrum with `|k|`. Gaps are filled
//! before differentiating and blanked again afterwards, so the magnitude is
//! defined exactly where the input has data.
//!
//! Reference:
//! Roest, W.R., Verhoef, J. & Pilkington, M. (1992). Magnetic interpretation
//! using the 3-D analytic signal. Geophysics, 57(1).

use ndarray::{Array2, Axis};
use num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use surveygrid_core::{Algorithm, Error, Grid, Range, Result};

use crate::interpolation::gap_fill;

/// Parameters for the analytic-signal transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticSignalParams {
    /// Fraction clipped from each tail of the magnitude distribution when
    /// choosing the display range
    pub percentile: f64,
}

impl Default for AnalyticSignalParams {
    fn default() -> Self {
        Self { percentile: 0.02 }
    }
}

/// Magnitude grid with its robust display range.
#[derive(Debug, Clone)]
pub struct AnalyticSignal {
    pub magnitude: Grid,
    pub range: Range,
}

/// Compute the analytic-signal magnitude of `grid`.
///
/// `cell_width`/`cell_height` are the true cell dimensions in metres.
pub fn analytic_signal(
    grid: &Grid,
    cell_width: f64,
    cell_height: f64,
    params: &AnalyticSignalParams,
) -> Result<AnalyticSignal> {
    if !(cell_width > 0.0 && cell_height > 0.0) {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: format!("{cell_width}x{cell_height}"),
            reason: "cell dimensions must be positive".into(),
        });
    }
    if !(0.0..0.5).contains(&params.percentile) {
        return Err(Error::InvalidParameter {
            name: "percentile",
            value: params.percentile.to_string(),
            reason: "must be in [0, 0.5)".into(),
        });
    }

    let original = grid.data();
    let mut filled = original.clone();
    gap_fill(&mut filled, cell_width, cell_height);

    let (dx, dy) = horizontal_derivatives(&filled, cell_width, cell_height);
    let dz = vertical_derivative(&filled, cell_width, cell_height);

    let magnitude = Array2::from_shape_fn(original.dim(), |idx| {
        if original[idx].is_nan() {
            return f64::NAN;
        }
        (dx[idx] * dx[idx] + dy[idx] * dy[idx] + dz[idx] * dz[idx]).sqrt()
    });
    let magnitude = grid.with_data(magnitude)?;

    let sorted = magnitude.sorted_values();
    let range = percentile_range(&sorted, params.percentile);
    debug!(
        width = grid.width(),
        height = grid.height(),
        valid = sorted.len(),
        range = %range,
        "analytic signal computed"
    );

    Ok(AnalyticSignal { magnitude, range })
}

/// `(∂f/∂x, ∂f/∂y)` per cell.
///
/// Uses the 5-point stencil where two valid neighbours exist on each side,
/// falling back to central, then one-sided differences at the grid edges.
/// Cells where no stencil applies get NaN.
pub fn horizontal_derivatives(
    values: &Array2<f64>,
    cell_width: f64,
    cell_height: f64,
) -> (Array2<f64>, Array2<f64>) {
    let dx = Array2::from_shape_fn(values.dim(), |(x, y)| {
        derivative(|i| lookup(values, i, y as isize), x as isize, values.nrows(), cell_width)
    });
    let dy = Array2::from_shape_fn(values.dim(), |(x, y)| {
        derivative(|j| lookup(values, x as isize, j), y as isize, values.ncols(), cell_height)
    });
    (dx, dy)
}

#[inline]
fn lookup(values: &Array2<f64>, x: isize, y: isize) -> Option<f64> {
    if x < 0 || y < 0 {
        return None;
    }
    values.get((x as usize, y as usize)).copied().filter(|v| !v.is_nan())
}

/// Derivative along one axis at position `i` of a lane of length `n`.
fn derivative(f: impl Fn(isize) -> Option<f64>, i: isize, n: usize, h: f64) -> f64 {
    let last = n as isize - 1;

    if let (Some(m2), Some(m1), Some(p1), Some(p2)) = (f(i - 2), f(i - 1), f(i + 1), f(i + 2)) {
        return (m2 - 8.0 * m1 + 8.0 * p1 - p2) / (12.0 * h);
    }
    if let (Some(m1), Some(p1)) = (f(i - 1), f(i + 1)) {
        return (p1 - m1) / (2.0 * h);
    }
    if i == 0 {
        if let (Some(c), Some(p1)) = (f(i), f(i + 1)) {
            return (p1 - c) / h;
        }
    }
    if i == last && i > 0 {
        if let (Some(m1), Some(c)) = (f(i - 1), f(i)) {
            return (c - m1) / h;
        }
    }
    f64::NAN
}

/// First vertical derivative: inverse FFT of `|k|·F(kx, ky)`.
///
/// NaN cells contribute zero to the spectrum.
pub fn vertical_derivative(values: &Array2<f64>, cell_width: f64, cell_height: f64) -> Array2<f64> {
    let (w, h) = values.dim();
    let mut spectrum = values.mapv(|v| Complex::new(if v.is_nan() { 0.0 } else { v }, 0.0));

    let mut planner = FftPlanner::<f64>::new();
    fft_2d(&mut spectrum, &mut planner, false);

    let dkx = 2.0 * PI / (w as f64 * cell_width);
    let dky = 2.0 * PI / (h as f64 * cell_height);
    for ((i, j), c) in spectrum.indexed_iter_mut() {
        let kx = wavenumber_index(i, w) as f64 * dkx;
        let ky = wavenumber_index(j, h) as f64 * dky;
        *c *= (kx * kx + ky * ky).sqrt();
    }

    fft_2d(&mut spectrum, &mut planner, true);
    let scale = 1.0 / (w * h) as f64;
    spectrum.mapv(|c| c.re * scale)
}

/// Signed frequency index in standard FFT ordering
#[inline]
fn wavenumber_index(i: usize, n: usize) -> isize {
    if i <= n / 2 {
        i as isize
    } else {
        i as isize - n as isize
    }
}

/// Unnormalised 2-D transform, one axis at a time.
fn fft_2d(data: &mut Array2<Complex<f64>>, planner: &mut FftPlanner<f64>, inverse: bool) {
    for axis in [Axis(1), Axis(0)] {
        let len = data.len_of(axis);
        let fft = if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        };
        let mut buffer = vec![Complex::new(0.0, 0.0); len];
        for mut lane in data.lanes_mut(axis) {
            for (b, v) in buffer.iter_mut().zip(lane.iter()) {
                *b = *v;
            }
            fft.process(&mut buffer);
            for (v, b) in lane.iter_mut().zip(buffer.iter()) {
                *v = *b;
            }
        }
    }
}

/// Display range clipping `percentile` of the values at each end.
///
/// `sorted` must be ascending without NaN. With `k = max(1, ⌊p·n⌋)` the
/// range is `[sorted[k-1], sorted[n-k]]`; an empty input gives `[0, 0]`.
pub fn percentile_range(sorted: &[f64], percentile: f64) -> Range {
    let n = sorted.len();
    if n == 0 {
        return Range::new(0.0, 0.0);
    }
    let k = ((percentile * n as f64) as usize).clamp(1, n);
    Range::new(sorted[k - 1], sorted[n - k])
}

/// Analytic-signal filter. Input is the grid plus its metric cell size.
#[derive(Debug, Clone, Default)]
pub struct AnalyticSignalFilter;

impl Algorithm for AnalyticSignalFilter {
    type Input = (Grid, f64, f64);
    type Output = AnalyticSignal;
    type Params = AnalyticSignalParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "AnalyticSignal"
    }

    fn description(&self) -> &'static str {
        "Edge-enhancing analytic-signal magnitude with percentile display range"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (grid, cell_width, cell_height) = input;
        analytic_signal(&grid, cell_width, cell_height, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use surveygrid_core::{GeoBounds, LatLon};

    fn bounds() -> GeoBounds {
        GeoBounds::new(LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0))
    }

    #[test]
    fn test_derivatives_of_plane() {
        // f = 3x + 2y with 2 m cells along x and 4 m along y
        let values = Array2::from_shape_fn((8, 6), |(x, y)| 3.0 * x as f64 * 2.0 + 2.0 * y as f64 * 4.0);
        let (dx, dy) = horizontal_derivatives(&values, 2.0, 4.0);
        for &v in dx.iter() {
            assert_relative_eq!(v, 3.0, epsilon = 1e-12);
        }
        for &v in dy.iter() {
            assert_relative_eq!(v, 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_derivative_single_column_is_nan() {
        let values = Array2::from_elem((1, 3), 1.0);
        let (dx, dy) = horizontal_derivatives(&values, 1.0, 1.0);
        assert!(dx.iter().all(|v| v.is_nan()));
        assert!(dy.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_vertical_derivative_of_constant_is_zero() {
        let values = Array2::from_elem((8, 8), 42.0);
        let dz = vertical_derivative(&values, 1.0, 1.0);
        for &v in dz.iter() {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn test_vertical_derivative_of_cosine() {
        // cos(kx) on a periodic lattice: dz = |k| cos(kx)
        let n = 16;
        let cell = 2.0;
        let k = 2.0 * PI / (n as f64 * cell) * 2.0;
        let values = Array2::from_shape_fn((n, 4), |(x, _)| (k * x as f64 * cell).cos());
        let dz = vertical_derivative(&values, cell, 3.0);
        for ((x, _), &v) in dz.indexed_iter() {
            assert_relative_eq!(v, k * (k * x as f64 * cell).cos(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_magnitude_respects_nan_mask() {
        let mut g = Grid::new(6, 6, bounds()).unwrap();
        for x in 0..6 {
            for y in 0..6 {
                if x + y < 8 {
                    g.set(x, y, (x * y) as f64).unwrap();
                }
            }
        }
        let out = analytic_signal(&g, 1.0, 1.0, &AnalyticSignalParams::default()).unwrap();
        for x in 0..6 {
            for y in 0..6 {
                let src = g.get(x, y).unwrap();
                let m = out.magnitude.get(x, y).unwrap();
                assert_eq!(src.is_nan(), m.is_nan(), "cell ({}, {})", x, y);
                if !m.is_nan() {
                    assert!(m >= 0.0);
                }
            }
        }
        assert!(out.range.min <= out.range.max);
    }

    #[test]
    fn test_all_nan_grid() {
        let g = Grid::new(4, 4, bounds()).unwrap();
        let out = analytic_signal(&g, 1.0, 1.0, &AnalyticSignalParams::default()).unwrap();
        assert_eq!(out.magnitude.valid_count(), 0);
        assert_eq!(out.range, Range::new(0.0, 0.0));
    }

    #[test]
    fn test_percentile_range() {
        let sorted: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(percentile_range(&sorted, 0.02), Range::new(1.0, 98.0));
        // k never drops below one
        assert_eq!(percentile_range(&[1.0, 2.0, 3.0], 0.02), Range::new(1.0, 3.0));
        assert_eq!(percentile_range(&[5.0], 0.02), Range::new(5.0, 5.0));
    }

    #[test]
    fn test_outlier_does_not_collapse_range() {
        let mut sorted: Vec<f64> = (0..200).map(|i| (i % 10) as f64).collect();
        sorted.push(1e6);
        sorted.sort_by(f64::total_cmp);
        let r = percentile_range(&sorted, 0.02);
        assert!(r.max < 100.0);
    }

    #[test]
    fn test_invalid_cell_size() {
        let g = Grid::filled(3, 3, 1.0, bounds()).unwrap();
        assert!(analytic_signal(&g, 0.0, 1.0, &AnalyticSignalParams::default()).is_err());
    }
}
