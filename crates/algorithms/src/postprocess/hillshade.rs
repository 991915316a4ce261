//! Hill-shading illumination
//!
//! Simulates a light source over the value surface. Slopes are taken from
//! 4-neighbour central differences in cell units. Border cells and cells next
//! to no-data are treated as fully lit so blank areas leave no dark seams.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use surveygrid_core::{Algorithm, Error, Grid, Result};

/// Parameters for hill-shading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillshadeParams {
    /// Light direction in degrees (0 = north, 90 = east)
    pub azimuth: f64,
    /// Light elevation in degrees (0 = horizon, 90 = zenith)
    pub altitude: f64,
    /// How strongly shadows darken colours, in [0, 1]
    pub intensity: f64,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 180.0,
            altitude: 45.0,
            intensity: 0.5,
        }
    }
}

/// Illumination in [0, 1] of cell (x, y).
pub fn illumination_at(grid: &Grid, x: usize, y: usize, azimuth: f64, altitude: f64) -> f64 {
    let (x, y) = (x as isize, y as isize);
    let neighbors = (
        grid.valid_at(x - 1, y),
        grid.valid_at(x + 1, y),
        grid.valid_at(x, y - 1),
        grid.valid_at(x, y + 1),
    );
    let (Some(left), Some(right), Some(down), Some(up)) = neighbors else {
        return 1.0;
    };

    let dzdx = (right - left) / 2.0;
    let dzdy = (up - down) / 2.0;
    let slope = (dzdx * dzdx + dzdy * dzdy).sqrt().atan();
    let aspect = dzdy.atan2(dzdx);

    let azimuth = azimuth.to_radians();
    let altitude = altitude.to_radians();
    let illumination =
        slope.cos() * altitude.sin() + slope.sin() * altitude.cos() * (azimuth - aspect).cos();
    illumination.max(0.0)
}

/// Colour multiplier for an illumination: `1 - (1 - illumination) * intensity`.
#[inline]
pub fn shade_factor(illumination: f64, intensity: f64) -> f64 {
    1.0 - (1.0 - illumination) * intensity.clamp(0.0, 1.0)
}

/// Illumination for every cell of `grid`.
pub fn hillshade(grid: &Grid, params: &HillshadeParams) -> Result<Grid> {
    if !(0.0..=1.0).contains(&params.intensity) {
        return Err(Error::InvalidParameter {
            name: "intensity",
            value: params.intensity.to_string(),
            reason: "must be in [0, 1]".into(),
        });
    }

    let (width, height) = grid.shape();
    let data: Vec<f64> = (0..width)
        .into_par_iter()
        .flat_map(|x| {
            (0..height)
                .map(|y| illumination_at(grid, x, y, params.azimuth, params.altitude))
                .collect::<Vec<_>>()
        })
        .collect();

    let array = Array2::from_shape_vec((width, height), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    grid.with_data(array)
}

/// Hill-shading algorithm
#[derive(Debug, Clone, Default)]
pub struct HillShade;

impl Algorithm for HillShade {
    type Input = Grid;
    type Output = Grid;
    type Params = HillshadeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "HillShade"
    }

    fn description(&self) -> &'static str {
        "Per-cell illumination of the value surface"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        hillshade(&input, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use surveygrid_core::{GeoBounds, LatLon};

    fn bounds() -> GeoBounds {
        GeoBounds::new(LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0))
    }

    /// Surface rising along x
    fn ramp(size: usize) -> Grid {
        let mut g = Grid::new(size, size, bounds()).unwrap();
        for x in 0..size {
            for y in 0..size {
                g.set(x, y, x as f64 * 0.5).unwrap();
            }
        }
        g
    }

    #[test]
    fn test_flat_surface() {
        let g = Grid::filled(5, 5, 3.0, bounds()).unwrap();
        let out = hillshade(&g, &HillshadeParams::default()).unwrap();
        // interior: sin(45°)
        assert_relative_eq!(out.get(2, 2).unwrap(), 45f64.to_radians().sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_borders_fully_lit() {
        let g = ramp(6);
        for (az, alt) in [(0.0, 10.0), (90.0, 45.0), (180.0, 80.0), (270.0, 0.0)] {
            let out = hillshade(&g, &HillshadeParams { azimuth: az, altitude: alt, intensity: 0.5 }).unwrap();
            for i in 0..6 {
                assert_eq!(out.get(0, i).unwrap(), 1.0);
                assert_eq!(out.get(5, i).unwrap(), 1.0);
                assert_eq!(out.get(i, 0).unwrap(), 1.0);
                assert_eq!(out.get(i, 5).unwrap(), 1.0);
            }
        }
    }

    #[test]
    fn test_nan_neighbor_fully_lit() {
        let mut g = ramp(5);
        g.set(2, 3, f64::NAN).unwrap();
        for az in [0.0, 135.0, 300.0] {
            assert_eq!(illumination_at(&g, 2, 2, az, 30.0), 1.0);
        }
        // diagonal NaN does not count
        let mut g = ramp(5);
        g.set(3, 3, f64::NAN).unwrap();
        assert!(illumination_at(&g, 2, 2, 0.0, 30.0) < 1.0);
    }

    #[test]
    fn test_light_direction_matters() {
        let g = ramp(5);
        let toward = illumination_at(&g, 2, 2, 0.0, 45.0);
        let away = illumination_at(&g, 2, 2, 180.0, 45.0);
        assert!((toward - away).abs() > 0.1);
        assert!((0.0..=1.0).contains(&toward) && (0.0..=1.0).contains(&away));
    }

    #[test]
    fn test_shade_factor() {
        assert_eq!(shade_factor(1.0, 0.5), 1.0);
        assert_eq!(shade_factor(0.0, 0.5), 0.5);
        assert_eq!(shade_factor(0.0, 0.0), 1.0);
        assert_eq!(shade_factor(0.0, 3.0), 0.0);
    }

    #[test]
    fn test_intensity_validated() {
        let g = ramp(3);
        let p = HillshadeParams {
            intensity: 1.5,
            ..Default::default()
        };
        assert!(hillshade(&g, &p).is_err());
    }
}
