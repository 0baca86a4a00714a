//! docraster-core - raster and geometry types for a document image codec
//!
//! This crate provides the data structures shared by the rest of the
//! workspace:
//!
//! - [`Rect`] - axis-aligned, half-open integer rectangle
//! - [`Ratio`] / [`RectMapper`] - exact rational affine mapping between two
//!   rectangles, composed with the eight rectangle symmetries
//! - [`Bitmap`] - single-plane raster (2..=256 gray levels) with dual
//!   raw/run-length storage, additive compositing, and quarter-turn rotation
//! - [`Pixmap`] / [`Pixel`] - companion RGB raster consumed by the color
//!   resampler
//!
//! Coordinates follow the point/pixel distinction used throughout the
//! workspace: pixel `(i, j)` spans points `(i, j)` to `(i+1, j+1)`, and row
//! 0 is the bottom row of an image.

pub mod bitmap;
pub mod error;
pub mod pixmap;
pub mod rect;
mod shared;

pub use bitmap::rle::{MAX_RUN, RUN_OVERFLOW};
pub use bitmap::{Bitmap, RowCursor, RunReader};
pub use error::{Error, Result};
pub use pixmap::{Pixel, Pixmap};
pub use rect::{Ratio, Rect, RectMapper};
