//! # SurveyGrid Engine
//!
//! Turns open survey files into gridded, post-processed rasters and keeps
//! them current as the user edits parameters, filters series or renames and
//! closes files.
//!
//! - [`GriddingService`]: one file and series to a [`GriddingResult`]
//! - [`ResultCache`]: latest result per file
//! - [`RecomputeCoordinator`]: event handling, background jobs, stale-result
//!   suppression and memoised post-processing
//! - [`RenderedGrid`]: a result under a [`GriddingFilter`], ready to colour

mod cache;
mod config;
mod coordinator;
mod events;
mod provider;
mod result;
mod service;

pub use cache::{CacheOp, ResultCache};
pub use config::EngineConfig;
pub use coordinator::{FileState, JobHandle, RecomputeCoordinator};
pub use events::{
    classify, ChangeSource, DataChange, EngineEvent, ParameterChange, Reaction, RedrawScheduler,
    ViewEvent,
};
pub use provider::SeriesProvider;
pub use result::{GriddingFilter, GriddingResult, RenderedGrid};
pub use service::GriddingService;
