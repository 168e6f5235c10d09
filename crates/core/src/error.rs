//! Error types for reliefill

use thiserror::Error;

/// Main error type for reliefill operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Grid that cannot be traversed: no rows, no columns, or ragged rows.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Unrecognized configuration value (direction, policy, ...).
    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Operation cancelled after visiting {visited} cells")]
    Cancelled { visited: usize },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for reliefill operations
pub type Result<T> = std::result::Result<T, Error>;
