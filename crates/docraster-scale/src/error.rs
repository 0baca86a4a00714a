//! Resampler error types

use thiserror::Error;

/// Error type for resampling operations.
#[derive(Error, Debug)]
pub enum ScaleError {
    /// Input and output sizes must be configured before ratios
    #[error("input and output sizes are not configured")]
    UndefinedSize,

    /// Scaling ratios must be positive
    #[error("invalid scaling ratio: {numer}/{denom}")]
    BadRatio { numer: i32, denom: i32 },

    /// The desired output rectangle lies outside the output raster
    #[error("desired output rectangle exceeds the output size")]
    RectTooBig,

    /// The desired output rectangle is empty
    #[error("empty output rectangle")]
    EmptyRect,

    /// The provided input rectangle does not match the input raster size
    #[error("provided rectangle {provided_w}x{provided_h} does not match input {input_w}x{input_h}")]
    SizeMismatch {
        provided_w: i32,
        provided_h: i32,
        input_w: i32,
        input_h: i32,
    },

    /// The provided input does not cover the required input rectangle
    #[error("provided input does not cover the required input rectangle")]
    InputTooSmall,

    /// The input raster holds no pixel grid
    #[error("input raster holds no pixel grid")]
    NoPixelGrid,

    /// The coordinate table did not land exactly on its endpoint
    ///
    /// Signals a logic defect rather than bad data; callers should treat
    /// this as fatal.
    #[error("coordinate table endpoint drift: expected {expected}, got {actual}")]
    CoordDrift { expected: i32, actual: i32 },

    /// An error from the core library
    #[error("core error: {0}")]
    Core(#[from] docraster_core::Error),
}

/// Convenience alias for resampling results.
pub type ScaleResult<T> = Result<T, ScaleError>;
