//! docraster-scale - fixed-point bilinear resampling
//!
//! Rescales a raster between arbitrary input and output pixel grids.  A
//! scaler is configured with matching input/output sizes (and optionally
//! exact ratios), reports which input rectangle a desired output rectangle
//! requires, and computes output segments with a box-filter pre-reduction
//! stage followed by separable bilinear interpolation in 1/16-pixel
//! fixed point.
//!
//! - [`BitmapScaler`] rescales gray rasters and always emits 256 levels
//! - [`PixmapScaler`] rescales RGB rasters channel by channel
//!
//! Scalers carry no internal locking: resampling one scaler from several
//! threads concurrently is undefined.  Use one scaler per thread or
//! serialize externally.

mod bitmap;
mod error;
mod interp;
mod pixmap;
mod scaler;

pub use bitmap::BitmapScaler;
pub use error::{ScaleError, ScaleResult};
pub use pixmap::PixmapScaler;
pub use scaler::Scaler;
