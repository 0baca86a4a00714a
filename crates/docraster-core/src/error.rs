//! Error types for docraster-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Every failure is reported to the caller as a typed error; no operation
//! silently clamps or truncates out-of-domain input.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// An empty rectangle was given where a non-empty one is required
    #[error("empty rectangle")]
    EmptyRect,

    /// A ratio was constructed with a zero denominator
    #[error("zero denominator in ratio")]
    ZeroDenominator,

    /// Gray-level count outside the supported 2..=256 range
    #[error("invalid gray-level count: {0}")]
    BadGrayLevels(i32),

    /// Run-length compression requested on a raster with more than 2 levels
    #[error("cannot run-length encode a raster with {0} gray levels")]
    CantCompress(i32),

    /// Negative rows, columns or border
    #[error("invalid raster dimensions: {rows}x{columns} border {border}")]
    BadDimensions { rows: i32, columns: i32, border: i32 },

    /// Raster dimensions exceed the supported maximum
    ///
    /// Guards the row-stride arithmetic against corrupted files that claim
    /// impossible sizes.
    #[error("raster size exceeds maximum (corrupted file?): {rows}x{columns}")]
    TooLarge { rows: i32, columns: i32 },

    /// Operation requires an initialized, non-empty raster
    #[error("raster not initialized")]
    NotInitialized,

    /// Operation requires the pixel grid but only the run stream is present
    #[error("pixel grid not materialized")]
    NoPixelGrid,

    /// A run overruns the row width during decoding
    #[error("lost sync in run-length data")]
    LostSync,

    /// The run stream ended in the middle of a row
    #[error("truncated run-length data")]
    TruncatedRuns,

    /// Subsampling factor must be at least 1
    #[error("invalid subsampling factor: {0}")]
    BadSubsample(i32),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
