//! Gridding results and their rendered, post-processed views.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use surveygrid_algorithms::postprocess::{analytic_signal, gaussian_smoothing, hillshade};
use surveygrid_colormap::{
    build_palette, grid_to_rgba, Histogram, Palette, PaletteType, Shading, Spectrum,
};
use surveygrid_core::{FileKey, Grid, GriddingParams, PostProcessingFlags, Range, Result};

use crate::config::EngineConfig;

/// Output of one gridding run.
///
/// Never modified after construction; a recompute produces a new value that
/// replaces the old one in the cache.
#[derive(Debug, Clone)]
pub struct GriddingResult {
    file_key: FileKey,
    series_name: String,
    params: GriddingParams,
    grid: Arc<Grid>,
    smoothed: Option<Arc<Grid>>,
    cell_width: f64,
    cell_height: f64,
    range: Range,
    flags: PostProcessingFlags,
}

impl GriddingResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        file_key: FileKey,
        series_name: String,
        params: GriddingParams,
        grid: Grid,
        smoothed: Option<Grid>,
        cell_size: (f64, f64),
        range: Range,
        flags: PostProcessingFlags,
    ) -> Self {
        Self {
            file_key,
            series_name,
            params,
            grid: Arc::new(grid),
            smoothed: smoothed.map(Arc::new),
            cell_width: cell_size.0,
            cell_height: cell_size.1,
            range,
            flags,
        }
    }

    pub fn file_key(&self) -> &FileKey {
        &self.file_key
    }

    pub fn series_name(&self) -> &str {
        &self.series_name
    }

    pub fn params(&self) -> &GriddingParams {
        &self.params
    }

    /// Interpolated, blanked grid
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// Smoothed grid; present iff smoothing was on when the result was made
    pub fn smoothed(&self) -> Option<&Arc<Grid>> {
        self.smoothed.as_ref()
    }

    /// Cell width and height in metres
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    /// Display range; not necessarily the data extrema
    pub fn range(&self) -> Range {
        self.range
    }

    pub fn flags(&self) -> PostProcessingFlags {
        self.flags
    }

    /// Whether this result was made from the given inputs.
    pub fn matches(&self, series: &str, params: &GriddingParams) -> bool {
        self.series_name == series && self.params == *params
    }
}

/// Display settings for a (template, series) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GriddingFilter {
    pub flags: PostProcessingFlags,
    /// Display range; `None` uses the result's range
    pub range: Option<Range>,
    pub palette: PaletteType,
    pub spectrum: Spectrum,
}

impl GriddingFilter {
    pub fn new(flags: PostProcessingFlags, range: Option<Range>) -> Self {
        Self {
            flags,
            range,
            palette: PaletteType::default(),
            spectrum: Spectrum::default(),
        }
    }

    pub fn with_palette(self, palette: PaletteType, spectrum: Spectrum) -> Self {
        Self {
            palette,
            spectrum,
            ..self
        }
    }

    fn palette_differs(&self, other: &Self) -> bool {
        self.palette != other.palette || self.spectrum != other.spectrum || self.range != other.range
    }
}

/// A result after post-processing, ready to colour.
#[derive(Debug, Clone)]
pub struct RenderedGrid {
    file_key: FileKey,
    source: Arc<Grid>,
    values: Arc<Grid>,
    sorted_values: Arc<Vec<f64>>,
    illumination: Option<Arc<Grid>>,
    range: Range,
    palette: Arc<dyn Palette>,
    filter: GriddingFilter,
    shade_intensity: f64,
}

impl RenderedGrid {
    /// Post-process `result` under `filter`.
    ///
    /// With a `previous` grid for the same result, the post-processed values
    /// are reused unless smoothing or analytic signal changed, and the
    /// palette is reused unless palette settings or the range changed.
    pub fn build(
        result: &GriddingResult,
        filter: GriddingFilter,
        config: &EngineConfig,
        previous: Option<&RenderedGrid>,
    ) -> Result<Self> {
        let start = Instant::now();
        let previous = previous.filter(|p| Arc::ptr_eq(&p.source, result.grid()));

        let reusable = previous.filter(|p| !p.filter.flags.values_differ(&filter.flags));
        let (values, sorted_values, range) = match reusable {
            Some(p) => {
                let range = if filter.flags.analytic_signal {
                    p.range
                } else {
                    filter.range.unwrap_or(result.range())
                };
                (Arc::clone(&p.values), Arc::clone(&p.sorted_values), range)
            }
            None => {
                let (values, range) = post_process(result, &filter, config)?;
                let sorted = values.sorted_values();
                (Arc::new(values), Arc::new(sorted), range)
            }
        };

        let palette = match previous {
            Some(p) if reusable.is_some() && !p.filter.palette_differs(&filter) && p.range == range => {
                Arc::clone(&p.palette)
            }
            _ => Arc::from(build_palette(filter.palette, filter.spectrum, &sorted_values, range)),
        };

        let illumination = match (filter.flags.hill_shading, reusable) {
            (false, _) => None,
            (true, Some(p)) if p.illumination.is_some() => p.illumination.clone(),
            (true, _) => Some(Arc::new(hillshade(&values, &config.hillshade)?)),
        };

        debug!(
            file = %result.file_key(),
            smoothing = filter.flags.smoothing,
            analytic_signal = filter.flags.analytic_signal,
            hill_shading = filter.flags.hill_shading,
            reused = reusable.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "rendered grid"
        );

        Ok(Self {
            file_key: result.file_key().clone(),
            source: Arc::clone(result.grid()),
            values,
            sorted_values,
            illumination,
            range,
            palette,
            filter,
            shade_intensity: config.hillshade.intensity,
        })
    }

    pub fn file_key(&self) -> &FileKey {
        &self.file_key
    }

    /// Post-processed values
    pub fn values(&self) -> &Grid {
        &self.values
    }

    /// Non-NaN values in ascending order
    pub fn sorted_values(&self) -> &[f64] {
        &self.sorted_values
    }

    /// Hill-shade illumination, when shading is on
    pub fn illumination(&self) -> Option<&Grid> {
        self.illumination.as_deref()
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn palette(&self) -> &dyn Palette {
        self.palette.as_ref()
    }

    pub fn filter(&self) -> &GriddingFilter {
        &self.filter
    }

    /// Whether this was built from `result` under `filter`.
    pub fn is_current(&self, result: &GriddingResult, filter: &GriddingFilter) -> bool {
        Arc::ptr_eq(&self.source, result.grid()) && self.filter == *filter
    }

    pub fn histogram(&self, num_bars: usize) -> Histogram {
        Histogram::compute(&self.values, self.range, num_bars)
    }

    /// RGBA pixels, northmost row first.
    pub fn to_rgba(&self) -> Result<Vec<u8>> {
        let shading = self.illumination.as_deref().map(|illumination| Shading {
            illumination,
            intensity: self.shade_intensity,
        });
        grid_to_rgba(&self.values, self.palette.as_ref(), shading)
    }
}

/// Smoothing then analytic signal, each only when enabled.
fn post_process(
    result: &GriddingResult,
    filter: &GriddingFilter,
    config: &EngineConfig,
) -> Result<(Grid, Range)> {
    let base = if filter.flags.smoothing {
        match result.smoothed() {
            Some(smoothed) => Grid::clone(smoothed),
            None => gaussian_smoothing(result.grid(), &config.smoothing)?,
        }
    } else {
        Grid::clone(result.grid())
    };

    if filter.flags.analytic_signal {
        let (cw, ch) = result.cell_size();
        let signal = analytic_signal(&base, cw, ch, &config.analytic_signal)?;
        return Ok((signal.magnitude, signal.range));
    }

    Ok((base, filter.range.unwrap_or(result.range())))
}
