//! NaN-aware Gaussian low-pass filter
//!
//! Each valid cell becomes the kernel-weighted mean of the valid cells in its
//! window, with the weights renormalised over whatever is available. No-data
//! cells stay no-data, so smoothing never extends the survey footprint.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use surveygrid_core::{Algorithm, Error, Grid, Result};

/// Parameters for Gaussian smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Kernel radius in cells; the window is `2 * radius + 1` square
    pub radius: usize,
    /// Standard deviation in cells
    pub sigma: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            radius: 7,
            sigma: 5.0,
        }
    }
}

/// Normalised `(2r+1)²` Gaussian kernel indexed `[dx + r][dy + r]`.
pub fn gaussian_kernel(radius: usize, sigma: f64) -> Array2<f64> {
    let size = 2 * radius + 1;
    let r = radius as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel = Array2::from_shape_fn((size, size), |(i, j)| {
        let dx = i as f64 - r;
        let dy = j as f64 - r;
        (-(dx * dx + dy * dy) / two_sigma_sq).exp()
    });
    let sum = kernel.sum();
    kernel.mapv_inplace(|v| v / sum);
    kernel
}

/// Smooth a grid with a Gaussian kernel, skipping NaN cells.
pub fn gaussian_smoothing(grid: &Grid, params: &SmoothingParams) -> Result<Grid> {
    if params.radius == 0 {
        return Err(Error::InvalidParameter {
            name: "radius",
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }
    if !(params.sigma > 0.0) {
        return Err(Error::InvalidParameter {
            name: "sigma",
            value: params.sigma.to_string(),
            reason: "must be positive".into(),
        });
    }

    let (width, height) = grid.shape();
    let kernel = gaussian_kernel(params.radius, params.sigma);
    let r = params.radius as isize;

    let data: Vec<f64> = (0..width)
        .into_par_iter()
        .flat_map(|x| {
            let mut column = vec![f64::NAN; height];
            for (y, out) in column.iter_mut().enumerate() {
                if grid.valid_at(x as isize, y as isize).is_none() {
                    continue;
                }

                let mut sum = 0.0;
                let mut weight_sum = 0.0;
                for dx in -r..=r {
                    for dy in -r..=r {
                        if let Some(v) = grid.valid_at(x as isize + dx, y as isize + dy) {
                            let w = kernel[((dx + r) as usize, (dy + r) as usize)];
                            sum += v * w;
                            weight_sum += w;
                        }
                    }
                }
                if weight_sum > 0.0 {
                    *out = sum / weight_sum;
                }
            }
            column
        })
        .collect();

    let array = Array2::from_shape_vec((width, height), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    grid.with_data(array)
}

/// Gaussian smoothing algorithm
#[derive(Debug, Clone, Default)]
pub struct GaussianSmoothing;

impl Algorithm for GaussianSmoothing {
    type Input = Grid;
    type Output = Grid;
    type Params = SmoothingParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "GaussianSmoothing"
    }

    fn description(&self) -> &'static str {
        "NaN-aware Gaussian low-pass filter"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        gaussian_smoothing(&input, &params)
    }
}
