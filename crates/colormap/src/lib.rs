//! # SurveyGrid Colormap
//!
//! Colour mapping for gridded survey values: spectra, palettes that turn
//! values into spectrum positions, legend histograms, and grid-to-RGBA
//! rendering with optional hill-shading.
//!
//! ## Usage
//!
//! ```ignore
//! use surveygrid_colormap::{build_palette, grid_to_rgba, PaletteType, Spectrum};
//!
//! let palette = build_palette(PaletteType::Linear, Spectrum::Hue, &sorted, range);
//! let rgba = grid_to_rgba(&grid, palette.as_ref(), None)?;
//! ```

mod histogram;
mod palette;
mod render;
mod scheme;

pub use histogram::{Histogram, DEFAULT_NUM_BARS};
pub use palette::{
    build_palette, erf, GaussianPalette, LinearPalette, Palette, PaletteType, QuantilePalette,
};
pub use render::{apply_shade, grid_to_rgba, Shading, NODATA_RGBA};
pub use scheme::{ColorStop, Rgb, Spectrum, HUE_SPAN_DEGREES};
