//! Median reduction of duplicate samples and per-cell binning

use std::collections::BTreeMap;

use ndarray::Array2;
use surveygrid_core::SamplePoint;

use super::{GridLayout, PlanarPoint};

/// Median of a non-empty slice; sorts in place. NaN for an empty slice.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    }
}

/// Collapse samples sharing an identical position into one sample holding
/// their median. Output is ordered by position so repeated runs are identical.
pub fn dedupe_positions(samples: &[SamplePoint]) -> Vec<SamplePoint> {
    let mut by_position: BTreeMap<(u64, u64), Vec<f64>> = BTreeMap::new();
    for s in samples {
        by_position
            .entry((s.latitude.to_bits(), s.longitude.to_bits()))
            .or_default()
            .push(s.value);
    }

    by_position
        .into_iter()
        .map(|((lat, lon), mut values)| {
            SamplePoint::new(f64::from_bits(lat), f64::from_bits(lon), median(&mut values))
        })
        .collect()
}

/// Median of the points falling in each cell, NaN for empty cells.
pub fn bin_medians(points: &[PlanarPoint], layout: &GridLayout) -> Array2<f64> {
    let mut bins: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
    for p in points {
        bins.entry(layout.cell_of(p.x, p.y)).or_default().push(p.value);
    }

    let mut known = Array2::from_elem(layout.shape(), f64::NAN);
    for (cell, mut values) in bins {
        known[cell] = median(&mut values);
    }
    known
}
