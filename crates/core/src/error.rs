//! Error types for FireRisk core types

use thiserror::Error;

/// Main error type for raster and image-expression operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Band count mismatch: {left} vs {right}")]
    BandMismatch { left: usize, right: usize },

    #[error("Band not found: {0}")]
    BandNotFound(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Expression error: {0}")]
    Expression(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for FireRisk core operations
pub type Result<T> = std::result::Result<T, Error>;
