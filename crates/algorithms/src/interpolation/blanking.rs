//! Blanking: no-data beyond the reach of the survey

use ndarray::Array2;
use rayon::prelude::*;

use super::{GridLayout, KdTree};

/// Set to NaN every cell whose centre is farther than `blanking_distance`
/// from the nearest sample. Cells holding a binned sample are always kept.
pub fn apply_blanking(
    data: &mut Array2<f64>,
    known: &Array2<f64>,
    tree: &KdTree,
    layout: &GridLayout,
    blanking_distance: f64,
) {
    let (width, height) = data.dim();
    let limit_sq = blanking_distance * blanking_distance;

    let uncovered: Vec<(usize, usize)> = (0..width)
        .into_par_iter()
        .flat_map(|ix| {
            (0..height)
                .filter(|&iy| known[(ix, iy)].is_nan())
                .filter(|&iy| {
                    let (cx, cy) = layout.cell_center(ix, iy);
                    !tree
                        .nearest(cx, cy)
                        .is_some_and(|n| n.distance_sq <= limit_sq)
                })
                .map(|iy| (ix, iy))
                .collect::<Vec<_>>()
        })
        .collect();

    for cell in uncovered {
        data[cell] = f64::NAN;
    }
}
