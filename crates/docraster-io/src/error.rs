//! I/O error types
//!
//! Provides a unified error type for all stream codecs.  Core-library
//! errors (dimension guards, run synchronization) wrap transparently so
//! that callers only handle one error type.

use thiserror::Error;

/// Error type for stream decoding and encoding.
#[derive(Error, Debug)]
pub enum IoError {
    /// Standard I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized 2-byte magic number
    #[error("bad magic number: {0:02x?}")]
    BadMagic([u8; 2]),

    /// A non-digit byte where a header integer was expected
    #[error("expected integer in header, found byte {0:#04x}")]
    NotInteger(u8),

    /// A header integer does not fit the accumulator
    #[error("header integer overflow")]
    IntegerOverflow,

    /// Unsupported maximum sample value
    #[error("unsupported maxval: {0}")]
    BadMaxval(u32),

    /// A sample outside the declared range, or a malformed ASCII pixel
    #[error("invalid pixel value")]
    BadPixel,

    /// The stream ended inside the pixel data
    #[error("unexpected end of stream")]
    EndOfStream,

    /// The raster cannot be written in the requested bi-level format
    #[error("cannot write a raster with {0} gray levels as bi-level")]
    TooManyLevels(i32),

    /// An error from the core library
    #[error("core error: {0}")]
    Core(#[from] docraster_core::Error),
}

/// Convenience alias for I/O results.
pub type IoResult<T> = Result<T, IoError>;
