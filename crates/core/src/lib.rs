//! # SurveyGrid Core
//!
//! Core types and traits for the SurveyGrid gridding engine.
//!
//! This crate provides:
//! - `Grid`: dense lon/lat raster with NaN as "no data"
//! - `CoordinateProjector`: lat/lon deltas to local metres
//! - `SamplePoint`, `SurveyFile`: geotagged readings grouped by survey line
//! - `GriddingParams`, `PostProcessingFlags`: validated user parameters
//! - `Range`: display/value ranges
//! - Algorithm traits for consistent API

pub mod error;
pub mod geo;
pub mod grid;
pub mod params;
pub mod range;
pub mod sample;

pub use error::{Error, Result};
pub use geo::{CoordinateProjector, GeoBounds, LatLon};
pub use grid::Grid;
pub use params::{GriddingParams, InterpolationMethod, PostProcessingFlags};
pub use range::Range;
pub use sample::{FileKey, GeoRecord, SamplePoint, SurveyFile, SurveyLine};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geo::{CoordinateProjector, GeoBounds, LatLon};
    pub use crate::grid::Grid;
    pub use crate::params::{GriddingParams, InterpolationMethod, PostProcessingFlags};
    pub use crate::range::Range;
    pub use crate::sample::{FileKey, SamplePoint};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in SurveyGrid.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
