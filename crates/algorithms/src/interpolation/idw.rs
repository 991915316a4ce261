//! Inverse Distance Weighting (IDW) with an adaptive search radius
//!
//! Each empty cell takes a weighted average of the samples within a search
//! radius, weights inversely proportional to distance raised to `power`.
//! The radius starts at a few cells and grows until enough samples are found,
//! so sparse survey areas still get a stable estimate.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{GridLayout, KdTree, PlanarPoint};

/// Parameters for IDW interpolation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdwSettings {
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby points.
    pub power: f64,
    /// Samples required before the search radius stops growing
    pub min_points: usize,
    /// Starting search radius in cells
    pub initial_radius_cells: f64,
    /// Radius multiplier per growth step
    pub growth_factor: f64,
    /// Nearest samples kept once the radius is large enough
    pub max_points: usize,
    /// Distance below which a sample's value is used directly (avoids singularity)
    pub snap_distance: f64,
}

impl Default for IdwSettings {
    fn default() -> Self {
        Self {
            power: 2.0,
            min_points: 4,
            initial_radius_cells: 2.0,
            growth_factor: 1.5,
            max_points: 32,
            snap_distance: 1e-9,
        }
    }
}

/// Fill every NaN cell of `known` by IDW over `points`.
///
/// Occupied cells keep their binned value. Returns `known` unchanged when
/// there are no points.
pub fn idw_grid(
    points: &[PlanarPoint],
    known: &Array2<f64>,
    layout: &GridLayout,
    settings: &IdwSettings,
) -> Array2<f64> {
    if points.is_empty() {
        return known.clone();
    }

    let tree = KdTree::build(points);
    let (width, height) = layout.shape();
    let required = settings.min_points.clamp(1, points.len());
    let start_radius =
        (settings.initial_radius_cells * layout.cell_width.max(layout.cell_height)).max(f64::EPSILON);
    let growth = settings.growth_factor.max(1.1);
    let extent = ((width as f64 * layout.cell_width).powi(2)
        + (height as f64 * layout.cell_height).powi(2))
    .sqrt();

    let data: Vec<f64> = (0..width)
        .into_par_iter()
        .flat_map(|ix| {
            let mut column = vec![f64::NAN; height];
            for (iy, out) in column.iter_mut().enumerate() {
                let k = known[(ix, iy)];
                if !k.is_nan() {
                    *out = k;
                    continue;
                }

                let (cx, cy) = layout.cell_center(ix, iy);
                let mut radius = start_radius;
                let mut found = tree.within_radius(cx, cy, radius);
                while found.len() < required && radius <= 2.0 * extent {
                    radius *= growth;
                    found = tree.within_radius(cx, cy, radius);
                }
                if found.len() > settings.max_points.max(required) {
                    found.sort_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq));
                    found.truncate(settings.max_points.max(required));
                }

                *out = weighted_average(found.iter().map(|r| (r.distance_sq, r.point.value)), settings);
            }
            column
        })
        .collect();

    // Collected column by column, i.e. in [x][y] order
    Array2::from_shape_vec((width, height), data).unwrap_or_else(|_| known.clone())
}

/// Σ(wᵢvᵢ)/Σwᵢ with wᵢ = 1/dᵢ^power; a sample within the snap distance wins outright.
fn weighted_average<I>(candidates: I, settings: &IdwSettings) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let snap_sq = settings.snap_distance * settings.snap_distance;
    let mut sum_w = 0.0;
    let mut sum_wz = 0.0;

    for (dsq, value) in candidates {
        if dsq <= snap_sq {
            return value;
        }
        let w = 1.0 / dsq.sqrt().powf(settings.power);
        sum_w += w;
        sum_wz += w * value;
    }

    if sum_w > 0.0 {
        sum_wz / sum_w
    } else {
        f64::NAN
    }
}
