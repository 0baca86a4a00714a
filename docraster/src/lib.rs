//! docraster - raster image codec and geometric resampling engine
//!
//! Underlies a document image format with three layers:
//!
//! - raster and geometry types: [`Bitmap`] (dual raw/run-length storage,
//!   additive compositing, quarter-turn rotation), [`Pixmap`], [`Rect`],
//!   and the exact rational [`RectMapper`]
//! - stream codecs for PBM (`P1`/`P4`), PGM (`P2`/`P5`) and the raw
//!   bi-level run-length form (`R4`)
//! - fixed-point bilinear resamplers with box-filter pre-reduction
//!
//! # Example
//!
//! ```
//! use docraster::{Bitmap, Rect};
//! use docraster::scale::BitmapScaler;
//!
//! // Downscale a 4x4 raster to 2x2.
//! let mut input = Bitmap::with_size(4, 4, 0).unwrap();
//! input.set_grays(256).unwrap();
//! input.fill(128).unwrap();
//! let mut scaler = BitmapScaler::with_sizes(4, 4, 2, 2);
//! let mut output = Bitmap::new();
//! scaler
//!     .scale(
//!         &Rect::new(0, 0, 4, 4),
//!         &input,
//!         &Rect::new(0, 0, 2, 2),
//!         &mut output,
//!     )
//!     .unwrap();
//! assert_eq!(output.pixel(0, 0), 128);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use docraster_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use docraster_io as io;
pub use docraster_scale as scale;
