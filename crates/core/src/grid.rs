//! Dense lon/lat grid of survey values

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::geo::{GeoBounds, LatLon};

/// A dense grid of `f64` values spanning a lat/lon box.
///
/// Cells are addressed as `(x, y)`: `x` runs west to east along longitude,
/// `y` runs south to north along latitude. `NaN` marks "no data". A grid is
/// never empty; both dimensions are at least one.
///
/// # Example
///
/// ```ignore
/// use surveygrid_core::{Grid, GeoBounds, LatLon};
///
/// let bounds = GeoBounds::new(LatLon::new(0.0, 0.0), LatLon::new(0.001, 0.001));
/// let mut grid = Grid::new(10, 10, bounds)?;
/// grid.set(3, 4, 42.0)?;
/// assert_eq!(grid.get(3, 4)?, 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Values stored as `[x][y]`
    data: Array2<f64>,
    bounds: GeoBounds,
}

impl Grid {
    /// Create a grid filled with NaN
    pub fn new(width: usize, height: usize, bounds: GeoBounds) -> Result<Self> {
        Self::filled(width, height, f64::NAN, bounds)
    }

    /// Create a grid filled with a specific value
    pub fn filled(width: usize, height: usize, value: f64, bounds: GeoBounds) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            data: Array2::from_elem((width, height), value),
            bounds,
        })
    }

    /// Wrap an existing `[x][y]` array
    pub fn from_array(data: Array2<f64>, bounds: GeoBounds) -> Result<Self> {
        let (width, height) = data.dim();
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self { data, bounds })
    }

    /// Grid with the same bounds and shape holding different values
    pub fn with_data(&self, data: Array2<f64>) -> Result<Self> {
        if data.dim() != self.data.dim() {
            let (width, height) = data.dim();
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            bounds: self.bounds,
        })
    }

    // Dimensions

    pub fn width(&self) -> usize {
        self.data.nrows()
    }

    pub fn height(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (width, height)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for the `len`/`is_empty` convention.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    // Data access

    /// Get value at (x, y)
    pub fn get(&self, x: usize, y: usize) -> Result<f64> {
        self.data.get((x, y)).copied().ok_or(Error::IndexOutOfBounds {
            x,
            y,
            width: self.width(),
            height: self.height(),
        })
    }

    /// Set value at (x, y)
    pub fn set(&mut self, x: usize, y: usize, value: f64) -> Result<()> {
        let (width, height) = self.shape();
        match self.data.get_mut((x, y)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                x,
                y,
                width,
                height,
            }),
        }
    }

    /// Value at a signed position, `None` outside the grid.
    ///
    /// Used for neighbour lookups so edge handling never needs a fallible call.
    #[inline]
    pub fn value_at(&self, x: isize, y: isize) -> Option<f64> {
        if x < 0 || y < 0 {
            return None;
        }
        self.data.get((x as usize, y as usize)).copied()
    }

    /// Value at a signed position if it is inside the grid and not NaN.
    #[inline]
    pub fn valid_at(&self, x: isize, y: isize) -> Option<f64> {
        self.value_at(x, y).filter(|v| !v.is_nan())
    }

    /// Get a reference to the underlying `[x][y]` array
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    // Geometry

    /// Geographic centre of cell (x, y)
    pub fn cell_center(&self, x: usize, y: usize) -> LatLon {
        let fx = (x as f64 + 0.5) / self.width() as f64;
        let fy = (y as f64 + 0.5) / self.height() as f64;
        LatLon::new(
            self.bounds.min.latitude + fy * self.bounds.lat_span(),
            self.bounds.min.longitude + fx * self.bounds.lon_span(),
        )
    }

    // Statistics

    /// Number of non-NaN cells
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// All non-NaN values in ascending order
    pub fn sorted_values(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.data.iter().copied().filter(|v| !v.is_nan()).collect();
        values.sort_by(f64::total_cmp);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GeoBounds {
        GeoBounds::new(LatLon::new(0.0, 0.0), LatLon::new(1.0, 2.0))
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(4, 3, bounds()).unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.shape(), (4, 3));
        assert!(grid.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            Grid::new(0, 3, bounds()),
            Err(Error::InvalidDimensions { width: 0, height: 3 })
        ));
    }

    #[test]
    fn test_grid_access() {
        let mut grid = Grid::new(10, 10, bounds()).unwrap();
        grid.set(5, 7, 42.0).unwrap();
        assert_eq!(grid.get(5, 7).unwrap(), 42.0);
        assert!(grid.set(10, 0, 1.0).is_err());
        assert!(grid.get(0, 10).is_err());
    }

    #[test]
    fn test_guarded_lookup() {
        let grid = Grid::filled(2, 2, 1.0, bounds()).unwrap();
        assert_eq!(grid.value_at(-1, 0), None);
        assert_eq!(grid.value_at(0, 2), None);
        assert_eq!(grid.value_at(1, 1), Some(1.0));
    }

    #[test]
    fn test_cell_center() {
        let grid = Grid::new(2, 1, bounds()).unwrap();
        let c = grid.cell_center(1, 0);
        assert_eq!(c, LatLon::new(0.5, 1.5));
    }

    #[test]
    fn test_valid_count() {
        let mut grid = Grid::new(10, 10, bounds()).unwrap();
        for x in 0..10 {
            for y in 0..5 {
                grid.set(x, y, (x * 10 + y) as f64).unwrap();
            }
        }
        assert_eq!(grid.valid_count(), 50);
        assert_eq!(grid.len(), 100);
    }

    #[test]
    fn test_all_nan_grid() {
        let grid = Grid::new(2, 2, bounds()).unwrap();
        assert_eq!(grid.valid_count(), 0);
        assert!(grid.sorted_values().is_empty());
    }

    #[test]
    fn test_sorted_values_skip_nan() {
        let mut grid = Grid::new(2, 2, bounds()).unwrap();
        grid.set(0, 0, 3.0).unwrap();
        grid.set(1, 0, -1.0).unwrap();
        grid.set(1, 1, 2.0).unwrap();
        assert_eq!(grid.sorted_values(), vec![-1.0, 2.0, 3.0]);
    }
}
