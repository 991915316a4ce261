//! Scattered-sample gridding
//!
//! Turns geotagged readings into a dense [`Grid`]:
//! - duplicate positions collapse to their median
//! - samples are binned to cells, each occupied cell keeps the median
//! - empty cells are filled by a tensioned spline or by IDW
//! - cells farther than the blanking distance from every sample become NaN

mod binning;
mod blanking;
pub mod gap_fill;
mod idw;
pub mod kdtree;
mod spline;

pub use binning::{bin_medians, dedupe_positions, median};
pub use blanking::apply_blanking;
pub use gap_fill::gap_fill;
pub use idw::{idw_grid, IdwSettings};
pub use kdtree::{KdTree, NearestResult};
pub use spline::{spline_grid, SplineOutcome, SplineSettings};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use surveygrid_core::{
    Algorithm, CoordinateProjector, Error, GeoBounds, Grid, GriddingParams, InterpolationMethod,
    LatLon, Result, SamplePoint,
};

/// A sample projected to metres east/north of the grid origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other_x: f64, other_y: f64) -> f64 {
        let dx = self.x - other_x;
        let dy = self.y - other_y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn dist(&self, other_x: f64, other_y: f64) -> f64 {
        self.dist_sq(other_x, other_y).sqrt()
    }
}

/// Cell geometry of an output grid in local metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub width: usize,
    pub height: usize,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl GridLayout {
    pub fn new(width: usize, height: usize, cell_width: f64, cell_height: f64) -> Self {
        Self {
            width,
            height,
            cell_width,
            cell_height,
        }
    }

    /// Cell holding a planar position; points on the far edge fall into the last cell.
    pub fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        (
            axis_index(x, self.cell_width, self.width),
            axis_index(y, self.cell_height, self.height),
        )
    }

    /// Planar centre of cell (ix, iy)
    pub fn cell_center(&self, ix: usize, iy: usize) -> (f64, f64) {
        (
            (ix as f64 + 0.5) * self.cell_width,
            (iy as f64 + 0.5) * self.cell_height,
        )
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

fn axis_index(v: f64, cell: f64, n: usize) -> usize {
    let i = (v / cell).floor();
    if i.is_nan() || i < 0.0 {
        0
    } else {
        (i as usize).min(n - 1)
    }
}

/// Method-specific tuning for [`interpolate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationSettings {
    pub idw: IdwSettings,
    pub spline: SplineSettings,
}

/// Samples prepared for gridding: deduplicated, projected and binned.
#[derive(Debug, Clone)]
pub struct PreparedSamples {
    pub bounds: GeoBounds,
    pub layout: GridLayout,
    pub points: Vec<PlanarPoint>,
    /// Median per occupied cell, NaN elsewhere
    pub known: Array2<f64>,
}

impl PreparedSamples {
    /// Returns `None` when no sample has both a position and a value.
    pub fn new(samples: &[SamplePoint], cell_size: f64) -> Option<Self> {
        let valid: Vec<SamplePoint> = samples
            .iter()
            .filter(|s| s.has_value() && s.position().is_finite())
            .copied()
            .collect();
        if valid.is_empty() {
            return None;
        }

        let deduped = dedupe_positions(&valid);
        let positions: Vec<LatLon> = deduped.iter().map(SamplePoint::position).collect();
        let bounds = GeoBounds::from_positions(&positions)?;

        let projector = CoordinateProjector::new(bounds);
        let (width, height) = projector.grid_dimensions(cell_size);
        let (cw, ch) = projector.cell_dimensions(width, height, cell_size);
        let layout = GridLayout::new(width, height, cw, ch);

        let points: Vec<PlanarPoint> = deduped
            .iter()
            .map(|s| {
                let (x, y) = projector.project(&s.position());
                PlanarPoint::new(x, y, s.value)
            })
            .collect();
        let known = bin_medians(&points, &layout);

        Some(Self {
            bounds,
            layout,
            points,
            known,
        })
    }
}

/// Bounds used for a grid with no usable samples
fn empty_bounds(samples: &[SamplePoint]) -> GeoBounds {
    let positions: Vec<LatLon> = samples
        .iter()
        .map(SamplePoint::position)
        .filter(LatLon::is_finite)
        .collect();
    GeoBounds::from_positions(&positions)
        .unwrap_or_else(|| GeoBounds::new(LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.0)))
}

/// Grid scattered samples with the method and distances in `params`.
///
/// Samples without a value are ignored. With no usable samples the result is
/// a 1x1 all-NaN grid; "no data" is a valid outcome, not an error.
pub fn interpolate(
    samples: &[SamplePoint],
    params: &GriddingParams,
    settings: &InterpolationSettings,
) -> Result<Grid> {
    let start = Instant::now();

    let Some(prepared) = PreparedSamples::new(samples, params.cell_size()) else {
        debug!(samples = samples.len(), "no valid samples, producing empty grid");
        return Grid::new(1, 1, empty_bounds(samples));
    };

    let PreparedSamples {
        bounds,
        layout,
        points,
        known,
    } = prepared;

    let mut data = match params.method() {
        InterpolationMethod::Splines => spline_grid(&known, &layout, &settings.spline).values,
        InterpolationMethod::Idw => idw_grid(&points, &known, &layout, &settings.idw),
    };

    let tree = KdTree::build(&points);
    apply_blanking(&mut data, &known, &tree, &layout, params.blanking_distance());

    let grid = Grid::from_array(data, bounds)?;
    debug!(
        method = %params.method(),
        points = points.len(),
        width = layout.width,
        height = layout.height,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "interpolated grid"
    );
    Ok(grid)
}

/// Gridding as an [`Algorithm`]: input is the sample list plus validated params.
#[derive(Debug, Clone, Default)]
pub struct Interpolator;

impl Algorithm for Interpolator {
    type Input = (Vec<SamplePoint>, GriddingParams);
    type Output = Grid;
    type Params = InterpolationSettings;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Interpolator"
    }

    fn description(&self) -> &'static str {
        "Grid scattered survey samples with splines or inverse distance weighting"
    }

    fn execute(&self, input: Self::Input, settings: Self::Params) -> Result<Self::Output> {
        let (samples, params) = input;
        interpolate(&samples, &params, &settings)
    }
}
