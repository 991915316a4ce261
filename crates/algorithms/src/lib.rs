//! # SurveyGrid Algorithms
//!
//! Numerical core of the SurveyGrid engine.
//!
//! ## Available Algorithm Categories
//!
//! - **interpolation**: median binning, tensioned splines, adaptive IDW, blanking, gap filling
//! - **postprocess**: Gaussian smoothing, hill-shading, analytic-signal magnitude

pub mod interpolation;
pub mod postprocess;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        interpolate, GridLayout, IdwSettings, InterpolationSettings, Interpolator, PlanarPoint,
        SplineSettings,
    };
    pub use crate::postprocess::{
        analytic_signal, gaussian_smoothing, hillshade, shade_factor, AnalyticSignal,
        AnalyticSignalFilter, AnalyticSignalParams, GaussianSmoothing, HillShade, HillshadeParams,
        SmoothingParams,
    };
    pub use surveygrid_core::prelude::*;
}
