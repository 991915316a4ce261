//! Turns one series of one file into a [`GriddingResult`].

use std::time::Instant;

use tracing::{debug, info};

use surveygrid_algorithms::interpolation::{interpolate, InterpolationSettings};
use surveygrid_algorithms::postprocess::{gaussian_smoothing, SmoothingParams};
use surveygrid_core::{
    CoordinateProjector, Error, GriddingParams, PostProcessingFlags, Range, Result,
};

use crate::config::EngineConfig;
use crate::provider::SeriesProvider;
use crate::result::GriddingResult;

/// Stateless gridding pipeline: samples, interpolation with blanking,
/// optional smoothing, display range.
///
/// Holds only configuration, so one instance can be shared across worker
/// threads.
#[derive(Debug, Clone, Default)]
pub struct GriddingService {
    interpolation: InterpolationSettings,
    smoothing: SmoothingParams,
}

impl GriddingService {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            interpolation: config.interpolation.clone(),
            smoothing: config.smoothing.clone(),
        }
    }

    /// Grid `series` of `file`.
    ///
    /// The display range is `range_override` if given, else the min/max of
    /// the sample values, widened to width 1 when all values are equal.
    /// A series with no usable values gives an all-NaN result rather than
    /// an error; a series the file does not have is [`Error::MissingSeries`].
    pub fn run(
        &self,
        file: &dyn SeriesProvider,
        series: &str,
        params: &GriddingParams,
        flags: PostProcessingFlags,
        range_override: Option<Range>,
    ) -> Result<GriddingResult> {
        debug_assert!(params.cell_size() > 0.0 && params.blanking_distance() > 0.0);
        let key = file.file_key();
        let start = Instant::now();

        let samples = file.samples(series).ok_or_else(|| Error::MissingSeries {
            file: key.path().to_path_buf(),
            series: series.to_string(),
        })?;
        debug!(file = %key, series, samples = samples.len(), "gridding");

        let grid = interpolate(&samples, params, &self.interpolation)?;
        let smoothed = if flags.smoothing {
            Some(gaussian_smoothing(&grid, &self.smoothing)?)
        } else {
            None
        };

        let (width, height) = grid.shape();
        let cell_size = CoordinateProjector::new(*grid.bounds()).cell_dimensions(
            width,
            height,
            params.cell_size(),
        );

        let range = range_override.unwrap_or_else(|| {
            Range::from_values(samples.iter().map(|s| s.value))
                .unwrap_or(Range::new(0.0, 0.0))
                .ensure_width()
        });

        info!(
            file = %key,
            series,
            method = %params.method(),
            width,
            height,
            valid = grid.valid_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "gridding complete"
        );

        Ok(GriddingResult::new(
            key,
            series.to_string(),
            *params,
            grid,
            smoothed,
            cell_size,
            range,
            flags,
        ))
    }
}
