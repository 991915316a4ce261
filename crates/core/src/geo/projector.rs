//! Linear projection of a lat/lon bounding box onto a local metric plane

use super::{GeoBounds, LatLon};

/// Relative slack below which `span / cell_size` counts as a whole number of cells.
const CELL_COUNT_TOLERANCE: f64 = 1e-6;

/// Maps positions inside a [`GeoBounds`] to metres east/north of its
/// south-west corner.
///
/// The box is treated as a rectangle: its metric width is the longer of the
/// southern and northern edges, its height the western edge. Over survey-scale
/// extents the distortion of this linear mapping is negligible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateProjector {
    bounds: GeoBounds,
    width_m: f64,
    height_m: f64,
}

impl CoordinateProjector {
    pub fn new(bounds: GeoBounds) -> Self {
        let GeoBounds { min, max } = bounds;
        let south = LatLon::new(min.latitude, min.longitude)
            .distance_to(&LatLon::new(min.latitude, max.longitude));
        let north = LatLon::new(max.latitude, min.longitude)
            .distance_to(&LatLon::new(max.latitude, max.longitude));
        let west = LatLon::new(min.latitude, min.longitude)
            .distance_to(&LatLon::new(max.latitude, min.longitude));

        Self {
            bounds,
            width_m: south.max(north),
            height_m: west,
        }
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// East-west extent in metres
    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    /// North-south extent in metres
    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    /// Metres east and north of the south-west corner.
    pub fn project(&self, p: &LatLon) -> (f64, f64) {
        let fx = fraction(p.longitude, self.bounds.min.longitude, self.bounds.lon_span());
        let fy = fraction(p.latitude, self.bounds.min.latitude, self.bounds.lat_span());
        (fx * self.width_m, fy * self.height_m)
    }

    /// Inverse of [`project`](Self::project).
    pub fn unproject(&self, x_m: f64, y_m: f64) -> LatLon {
        let fx = if self.width_m > 0.0 { x_m / self.width_m } else { 0.0 };
        let fy = if self.height_m > 0.0 { y_m / self.height_m } else { 0.0 };
        LatLon::new(
            self.bounds.min.latitude + fy * self.bounds.lat_span(),
            self.bounds.min.longitude + fx * self.bounds.lon_span(),
        )
    }

    /// Grid size `(width, height)` for a cell size in metres:
    /// `max(1, ceil(span / cell_size))` along each axis.
    pub fn grid_dimensions(&self, cell_size: f64) -> (usize, usize) {
        (
            cell_count(self.width_m, cell_size),
            cell_count(self.height_m, cell_size),
        )
    }

    /// Metric size of one cell when the box is split into `width x height`
    /// cells. A degenerate axis (zero extent) falls back to `cell_size`.
    pub fn cell_dimensions(&self, width: usize, height: usize, cell_size: f64) -> (f64, f64) {
        let cw = self.width_m / width.max(1) as f64;
        let ch = self.height_m / height.max(1) as f64;
        (
            if cw > 0.0 { cw } else { cell_size },
            if ch > 0.0 { ch } else { cell_size },
        )
    }
}

fn fraction(v: f64, min: f64, span: f64) -> f64 {
    if span > 0.0 {
        (v - min) / span
    } else {
        0.0
    }
}

/// Whole cells needed to cover `span` metres, at least one.
///
/// Projection round-off (e.g. 10.000000001 m / 10 m) must not add a column,
/// so counts within a relative tolerance of an integer are rounded.
pub fn cell_count(span: f64, cell_size: f64) -> usize {
    if !(span > 0.0) || !(cell_size > 0.0) {
        return 1;
    }
    let n = span / cell_size;
    let rounded = n.round();
    let count = if (n - rounded).abs() <= CELL_COUNT_TOLERANCE * rounded.max(1.0) {
        rounded
    } else {
        n.ceil()
    };
    (count as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_M;
    use approx::assert_relative_eq;

    /// Bounds of a square `side_m` metres wide with its SW corner at (lat, lon).
    fn square(lat: f64, lon: f64, side_m: f64) -> GeoBounds {
        let dlat = (side_m / EARTH_RADIUS_M).to_degrees();
        let dlon = (side_m / (EARTH_RADIUS_M * lat.to_radians().cos())).to_degrees();
        GeoBounds::new(LatLon::new(lat, lon), LatLon::new(lat + dlat, lon + dlon))
    }

    #[test]
    fn test_square_extent() {
        let proj = CoordinateProjector::new(square(45.0, 7.0, 100.0));
        assert_relative_eq!(proj.height_m(), 100.0, epsilon = 1e-6);
        assert_relative_eq!(proj.width_m(), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_project_corners() {
        let b = square(10.0, 20.0, 50.0);
        let proj = CoordinateProjector::new(b);
        assert_eq!(proj.project(&b.min), (0.0, 0.0));
        let (x, y) = proj.project(&b.max);
        assert_relative_eq!(x, proj.width_m(), epsilon = 1e-9);
        assert_relative_eq!(y, proj.height_m(), epsilon = 1e-9);
    }

    #[test]
    fn test_unproject_roundtrip() {
        let b = square(-33.0, 151.0, 500.0);
        let proj = CoordinateProjector::new(b);
        let p = LatLon::new(b.min.latitude + 0.001, b.min.longitude + 0.002);
        let (x, y) = proj.project(&p);
        let back = proj.unproject(x, y);
        assert_relative_eq!(back.latitude, p.latitude, epsilon = 1e-12);
        assert_relative_eq!(back.longitude, p.longitude, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_dimensions_ceil() {
        let proj = CoordinateProjector::new(square(0.0, 0.0, 95.0));
        assert_eq!(proj.grid_dimensions(10.0), (10, 10));
        assert_eq!(proj.grid_dimensions(100.0), (1, 1));
    }

    #[test]
    fn test_grid_dimensions_exact_multiple() {
        let proj = CoordinateProjector::new(square(0.0, 0.0, 10.0));
        assert_eq!(proj.grid_dimensions(10.0), (1, 1));
        assert_eq!(proj.grid_dimensions(5.0), (2, 2));
    }

    #[test]
    fn test_degenerate_bounds() {
        let p = LatLon::new(12.0, 34.0);
        let proj = CoordinateProjector::new(GeoBounds::new(p, p));
        assert_eq!(proj.grid_dimensions(5.0), (1, 1));
        assert_eq!(proj.cell_dimensions(1, 1, 5.0), (5.0, 5.0));
        assert_eq!(proj.project(&p), (0.0, 0.0));
    }

    #[test]
    fn test_cell_count() {
        assert_eq!(cell_count(0.0, 1.0), 1);
        assert_eq!(cell_count(1.0, 1.0), 1);
        assert_eq!(cell_count(1.5, 1.0), 2);
        assert_eq!(cell_count(30.000000001, 10.0), 3);
        assert_eq!(cell_count(f64::NAN, 1.0), 1);
    }
}
