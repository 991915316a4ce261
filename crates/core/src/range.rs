//! Closed numeric ranges for display scaling and histogram binning

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Create a range; bounds given in the wrong order are swapped.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Min/max of the non-NaN values, or `None` if there are none.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| !v.is_nan()) {
            min = min.min(v);
            max = max.max(v);
        }
        (min <= max).then_some(Self { min, max })
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Both bounds are finite numbers
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Clamp into the range. NaN bounds leave that side open.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Position of `value` in the range as a fraction in `[0, 1]`.
    /// A zero-width range maps everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let w = self.width();
        if w > 0.0 {
            ((self.clamp(value) - self.min) / w).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Same center, new width
    pub fn scale_to_width(&self, width: f64) -> Self {
        let c = self.center();
        let half = width.abs() / 2.0;
        Self {
            min: c - half,
            max: c + half,
        }
    }

    /// Smallest range containing both
    pub fn union(&self, other: &Range) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Widen a zero-width range to width 1 around its value so it can be
    /// normalised against.
    pub fn ensure_width(&self) -> Self {
        if self.width() > 0.0 {
            *self
        } else {
            self.scale_to_width(1.0)
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_range_basics() {
        let r = Range::new(10.0, 2.0);
        assert_eq!(r.min, 2.0);
        assert_eq!(r.max, 10.0);
        assert_eq!(r.width(), 8.0);
        assert_eq!(r.center(), 6.0);
        assert!(r.contains(2.0) && r.contains(10.0));
        assert!(!r.contains(10.5));
    }

    #[test]
    fn test_normalize_clamps() {
        let r = Range::new(0.0, 4.0);
        assert_eq!(r.normalize(-3.0), 0.0);
        assert_eq!(r.normalize(1.0), 0.25);
        assert_eq!(r.normalize(9.0), 1.0);
        assert_eq!(Range::new(3.0, 3.0).normalize(3.0), 0.0);
    }

    #[test]
    fn test_scale_to_width_and_union() {
        let r = Range::new(0.0, 10.0).scale_to_width(5.0);
        assert_relative_eq!(r.min, 2.5);
        assert_relative_eq!(r.max, 7.5);
        let u = Range::new(0.0, 1.0).union(&Range::new(-2.0, 0.5));
        assert_eq!(u, Range::new(-2.0, 1.0));
    }

    #[test]
    fn test_from_values_skips_nan() {
        let r = Range::from_values([3.0, f64::NAN, -1.0, 2.0]).unwrap();
        assert_eq!(r, Range::new(-1.0, 3.0));
        assert!(Range::from_values([f64::NAN]).is_none());
        assert!(Range::from_values(Vec::new()).is_none());
    }

    #[test]
    fn test_non_finite_bounds() {
        let r = Range::new(f64::NAN, 1.0);
        assert!(!r.is_finite());
        assert!(!Range::new(0.0, f64::INFINITY).is_finite());
        assert!(Range::new(-1.0, 1.0).is_finite());
        // never panics, even with a NaN bound
        assert_eq!(r.clamp(5.0), 1.0);
        assert_eq!(Range::new(0.0, 4.0).clamp(-2.0), 0.0);
    }

    #[test]
    fn test_ensure_width() {
        let r = Range::new(5.0, 5.0).ensure_width();
        assert_eq!(r, Range::new(4.5, 5.5));
        let r = Range::new(1.0, 2.0);
        assert_eq!(r.ensure_width(), r);
    }
}
