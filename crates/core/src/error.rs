//! Error types for SurveyGrid

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for SurveyGrid operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({x}, {y}) in grid of size ({width}, {height})")]
    IndexOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Series '{series}' not found in {}", file.display())]
    MissingSeries { file: PathBuf, series: String },

    #[error("File not open: {}", .0.display())]
    UnknownFile(PathBuf),

    #[error("File already open: {}", .0.display())]
    FileAlreadyOpen(PathBuf),

    #[error("Worker disconnected before the result was delivered")]
    WorkerDisconnected,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for SurveyGrid operations
pub type Result<T> = std::result::Result<T, Error>;
