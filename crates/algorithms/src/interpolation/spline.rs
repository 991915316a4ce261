//! Tensioned lattice spline
//!
//! Solves `(1 - t)·∇⁴u - t·∇²u = 0` on the empty cells of a lattice by
//! Gauss-Seidel relaxation, with occupied cells held fixed (Smith & Wessel
//! style continuous-curvature gridding). `t = 0` gives minimum curvature,
//! `t → 1` approaches a harmonic membrane that cannot overshoot the data.
//!
//! Reference:
//! Smith, W.H.F. & Wessel, P. (1990). Gridding with continuous curvature
//! splines in tension. Geophysics, 55(3).

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{gap_fill, GridLayout};

/// Parameters for the tensioned spline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineSettings {
    /// Tension in [0, 1]
    pub tension: f64,
    pub max_iterations: usize,
    /// Tension of the second attempt when the first does not converge
    pub relaxed_tension: f64,
    pub relaxed_max_iterations: usize,
    /// Convergence threshold on the largest per-sweep change, relative to the data range
    pub tolerance: f64,
}

impl Default for SplineSettings {
    fn default() -> Self {
        Self {
            tension: 0.9999,
            max_iterations: 100,
            relaxed_tension: 0.999999,
            relaxed_max_iterations: 200,
            tolerance: 1e-4,
        }
    }
}

/// Relaxed lattice plus how the relaxation went.
#[derive(Debug, Clone)]
pub struct SplineOutcome {
    pub values: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
    pub tension: f64,
}

/// Fill the NaN cells of `known` with a tensioned spline through its
/// non-NaN cells.
///
/// If the first attempt does not converge within `max_iterations` it is
/// repeated from scratch with `relaxed_tension` and `relaxed_max_iterations`.
/// The second attempt's lattice is returned either way.
pub fn spline_grid(known: &Array2<f64>, layout: &GridLayout, settings: &SplineSettings) -> SplineOutcome {
    let first = relax(
        known,
        layout,
        settings.tension,
        settings.max_iterations,
        settings.tolerance,
    );
    if first.converged {
        debug!(iterations = first.iterations, tension = first.tension, "spline converged");
        return first;
    }

    warn!(
        iterations = first.iterations,
        tension = first.tension,
        retry_tension = settings.relaxed_tension,
        "spline did not converge, retrying with relaxed settings"
    );
    let second = relax(
        known,
        layout,
        settings.relaxed_tension,
        settings.relaxed_max_iterations,
        settings.tolerance,
    );
    if second.converged {
        debug!(iterations = second.iterations, tension = second.tension, "spline converged");
    } else {
        warn!(iterations = second.iterations, "spline stopped at iteration limit");
    }
    second
}

fn relax(
    known: &Array2<f64>,
    layout: &GridLayout,
    tension: f64,
    max_iterations: usize,
    tolerance: f64,
) -> SplineOutcome {
    let tension = tension.clamp(0.0, 1.0);
    let mut values = known.clone();
    let unknown: Vec<(usize, usize)> = known
        .indexed_iter()
        .filter(|(_, v)| v.is_nan())
        .map(|(idx, _)| idx)
        .collect();

    let data_range = known
        .iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });

    let Some((lo, hi)) = data_range else {
        return SplineOutcome {
            values,
            iterations: 0,
            converged: true,
            tension,
        };
    };
    if unknown.is_empty() {
        return SplineOutcome {
            values,
            iterations: 0,
            converged: true,
            tension,
        };
    }

    // Start from a smooth guess so few sweeps are needed
    gap_fill(&mut values, layout.cell_width, layout.cell_height);

    let threshold = tolerance * (hi - lo);
    let ax = 1.0 / (layout.cell_width * layout.cell_width);
    let ay = 1.0 / (layout.cell_height * layout.cell_height);

    for iteration in 1..=max_iterations {
        let mut max_delta: f64 = 0.0;
        for &(x, y) in &unknown {
            let old = values[(x, y)];
            let new = update(&values, x, y, tension, ax, ay);
            if new.is_finite() {
                max_delta = max_delta.max((new - old).abs());
                values[(x, y)] = new;
            }
        }
        if max_delta <= threshold {
            return SplineOutcome {
                values,
                iterations: iteration,
                converged: true,
                tension,
            };
        }
    }

    SplineOutcome {
        values,
        iterations: max_iterations,
        converged: false,
        tension,
    }
}

#[inline]
fn at(values: &Array2<f64>, x: isize, y: isize) -> Option<f64> {
    if x < 0 || y < 0 {
        return None;
    }
    values.get((x as usize, y as usize)).copied()
}

/// New value of cell (x, y): tension-weighted mix of the biharmonic and
/// Laplace updates. Near the lattice edge only the Laplace term is available.
fn update(values: &Array2<f64>, x: usize, y: usize, tension: f64, ax: f64, ay: f64) -> f64 {
    let (x, y) = (x as isize, y as isize);
    let get = |dx: isize, dy: isize| at(values, x + dx, y + dy);

    // Laplace, weighted for non-square cells
    let mut sum = 0.0;
    let mut weight = 0.0;
    for (dx, dy, w) in [(-1, 0, ax), (1, 0, ax), (0, -1, ay), (0, 1, ay)] {
        if let Some(v) = get(dx, dy) {
            sum += w * v;
            weight += w;
        }
    }
    if weight == 0.0 {
        return f64::NAN;
    }
    let laplace = sum / weight;

    if tension >= 1.0 {
        return laplace;
    }

    let ring = |offsets: &[(isize, isize)]| -> Option<f64> {
        offsets.iter().map(|&(dx, dy)| get(dx, dy)).sum()
    };
    let biharmonic = ring(&[(-1, 0), (1, 0), (0, -1), (0, 1)])
        .zip(ring(&[(-1, -1), (1, -1), (-1, 1), (1, 1)]))
        .zip(ring(&[(-2, 0), (2, 0), (0, -2), (0, 2)]))
        .map(|((n, d), f)| (8.0 * n - 2.0 * d - f) / 20.0);

    match biharmonic {
        Some(b) => (1.0 - tension) * b + tension * laplace,
        None => laplace,
    }
}
