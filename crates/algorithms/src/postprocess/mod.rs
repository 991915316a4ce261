//! Post-processing of gridded survey data
//!
//! - Smoothing: NaN-aware Gaussian low-pass
//! - Hill-shading: per-cell illumination used to modulate colours
//! - Analytic signal: edge-enhancing gradient magnitude with robust display range

mod analytic_signal;
mod hillshade;
mod smoothing;

pub use analytic_signal::{
    analytic_signal, horizontal_derivatives, percentile_range, vertical_derivative, AnalyticSignal,
    AnalyticSignalFilter, AnalyticSignalParams,
};
pub use hillshade::{hillshade, illumination_at, shade_factor, HillShade, HillshadeParams};
pub use smoothing::{gaussian_kernel, gaussian_smoothing, GaussianSmoothing, SmoothingParams};
