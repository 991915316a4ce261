//! Priority-ordered inverse-distance gap filling
//!
//! NaN cells are filled one at a time from their already-filled 8-neighbours,
//! weighted by inverse centre distance. The cell with the largest total
//! neighbour weight is always filled next, so values propagate inward from
//! the best-supported edges of each gap.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::Array2;

const OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Copy)]
struct Pending {
    weight: f64,
    x: usize,
    y: usize,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    /// Heaviest first; ties broken by position so the fill order is deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.x.cmp(&self.x))
            .then_with(|| other.y.cmp(&self.y))
    }
}

/// Fill every NaN cell reachable from a non-NaN cell. A grid with no
/// values is left untouched.
pub fn gap_fill(grid: &mut Array2<f64>, cell_width: f64, cell_height: f64) {
    let (w, h) = grid.dim();
    let inv_dist: [f64; 8] = OFFSETS.map(|(dx, dy)| {
        let ddx = dx as f64 * cell_width;
        let ddy = dy as f64 * cell_height;
        1.0 / (ddx * ddx + ddy * ddy).sqrt()
    });

    let neighbor = |x: usize, y: usize, k: usize| -> Option<(usize, usize)> {
        let (dx, dy) = OFFSETS[k];
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        (nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h)
            .then(|| (nx as usize, ny as usize))
    };

    let mut weights = Array2::<f64>::zeros((w, h));
    let mut queue = BinaryHeap::new();

    for ((x, y), v) in grid.indexed_iter() {
        if !v.is_nan() {
            continue;
        }
        let weight: f64 = (0..8)
            .filter_map(|k| neighbor(x, y, k).map(|n| (k, n)))
            .filter(|&(_, n)| !grid[n].is_nan())
            .map(|(k, _)| inv_dist[k])
            .sum();
        weights[(x, y)] = weight;
        if weight > 0.0 {
            queue.push(Pending { weight, x, y });
        }
    }

    while let Some(Pending { x, y, .. }) = queue.pop() {
        // A cell may be queued several times with growing weight
        if !grid[(x, y)].is_nan() {
            continue;
        }

        let mut sum = 0.0;
        let mut weight_sum = 0.0;
        for k in 0..8 {
            if let Some(n) = neighbor(x, y, k) {
                let v = grid[n];
                if !v.is_nan() {
                    sum += v * inv_dist[k];
                    weight_sum += inv_dist[k];
                }
            }
        }
        if weight_sum <= 0.0 {
            continue;
        }
        grid[(x, y)] = sum / weight_sum;

        for k in 0..8 {
            if let Some(n) = neighbor(x, y, k) {
                if grid[n].is_nan() {
                    weights[n] += inv_dist[k];
                    queue.push(Pending {
                        weight: weights[n],
                        x: n.0,
                        y: n.1,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fills_all_cells() {
        let mut g = Array2::from_elem((5, 4), f64::NAN);
        g[(2, 1)] = 3.0;
        gap_fill(&mut g, 1.0, 1.0);
        assert!(g.iter().all(|v| (v - 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_existing_values_untouched() {
        let mut g = Array2::from_elem((3, 3), f64::NAN);
        g[(0, 0)] = 1.0;
        g[(2, 2)] = 5.0;
        gap_fill(&mut g, 1.0, 1.0);
        assert_eq!(g[(0, 0)], 1.0);
        assert_eq!(g[(2, 2)], 5.0);
        for &v in g.iter() {
            assert!((1.0..=5.0).contains(&v));
        }
    }

    #[test]
    fn test_gap_between_equal_sides() {
        let mut g = Array2::from_elem((3, 1), f64::NAN);
        g[(0, 0)] = 2.0;
        g[(2, 0)] = 4.0;
        gap_fill(&mut g, 1.0, 1.0);
        assert_relative_eq!(g[(1, 0)], 3.0);
    }

    #[test]
    fn test_cell_aspect_weights() {
        // Cells are 1 wide and 4 tall, so the x-neighbour weighs four times the y-neighbour.
        let mut g = Array2::from_elem((2, 2), f64::NAN);
        g[(0, 1)] = 0.0;
        g[(1, 0)] = 10.0;
        gap_fill(&mut g, 1.0, 4.0);
        // (0, 0) ties with (1, 1) on weight and is filled first
        assert_relative_eq!(g[(0, 0)], 10.0 / 1.25, epsilon = 1e-12);
        let diag = 1.0 / 17f64.sqrt();
        let expected = (10.0 * 0.25 + g[(0, 0)] * diag) / (1.25 + diag);
        assert_relative_eq!(g[(1, 1)], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_all_nan_untouched() {
        let mut g = Array2::from_elem((2, 2), f64::NAN);
        gap_fill(&mut g, 1.0, 1.0);
        assert!(g.iter().all(|v| v.is_nan()));
    }
}
