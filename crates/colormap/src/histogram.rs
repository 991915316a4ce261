//! Value histograms and cumulative curves for palette legends

use serde::Serialize;
use surveygrid_core::{Grid, Range};

/// Bars used by legends unless configured otherwise
pub const DEFAULT_NUM_BARS: usize = 128;

/// Counts of values over equal-width bins of a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    bars: Vec<usize>,
    total: usize,
    max: usize,
}

impl Histogram {
    /// Bucket every non-NaN value of `grid` inside `range` into `num_bars`
    /// bins. A value equal to `range.max` lands in the last bin; a zero-width
    /// range puts everything in the first bin.
    pub fn compute(grid: &Grid, range: Range, num_bars: usize) -> Self {
        Self::from_values(grid.data().iter().copied(), range, num_bars)
    }

    /// Same as [`Histogram::compute`] over any value sequence.
    pub fn from_values<I>(values: I, range: Range, num_bars: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        if num_bars == 0 {
            return Self {
                bars: Vec::new(),
                total: 0,
                max: 0,
            };
        }

        let mut bars = vec![0usize; num_bars];
        let bar_width = range.width() / num_bars as f64;
        for v in values {
            if v.is_nan() || !range.contains(v) {
                continue;
            }
            let bar = if bar_width > 0.0 {
                ((v - range.min) / bar_width) as usize
            } else {
                0
            };
            bars[bar.min(num_bars - 1)] += 1;
        }

        let total = bars.iter().sum();
        let max = bars.iter().copied().max().unwrap_or(0);
        Self { bars, total, max }
    }

    pub fn num_bars(&self) -> usize {
        self.bars.len()
    }

    pub fn bars(&self) -> &[usize] {
        &self.bars
    }

    pub fn bar(&self, i: usize) -> usize {
        self.bars[i]
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Height of bar `i` when the tallest bar is `max_height`.
    pub fn scale_bar(&self, i: usize, max_height: f64) -> f64 {
        if self.max > 0 {
            max_height / self.max as f64 * self.bars[i] as f64
        } else {
            0.0
        }
    }

    /// Fraction of values below each of the `num_bars + 1` bin boundaries.
    /// Starts at 0 and ends at 1 unless the histogram is empty (all zeros).
    pub fn cdf(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.bars.len() + 1);
        let mut sum = 0usize;
        for i in 0..=self.bars.len() {
            out.push(if self.total > 0 {
                sum as f64 / self.total as f64
            } else {
                0.0
            });
            if i < self.bars.len() {
                sum += self.bars[i];
            }
        }
        out
    }
}
