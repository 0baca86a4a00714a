//! Bitmap - single-plane raster with dual raw/run-length storage
//!
//! A [`Bitmap`] holds one intensity sample per pixel with 2 to 256 gray
//! levels.  Value 0 is white and `grays - 1` is black (ink).  Rows are
//! numbered bottom to top: row 0 is the bottom row of the image.
//!
//! # Storage
//!
//! Exactly one of two representations is authoritative at any time:
//!
//! - a raw pixel grid of `rows * (columns + border) + border` bytes, with
//!   `border` zero-filled guard cells on the left of every row and trailing
//!   the last row, enabling branch-free edge access in downstream codecs;
//! - a run-length encoded stream (bi-level rasters only), laid out in the
//!   wire format described in [`rle`](crate::bitmap::rle).
//!
//! [`compress`](Bitmap::compress) and [`uncompress`](Bitmap::uncompress)
//! switch between the two losslessly.  Buffers are shared on clone and
//! detached on first write.
//!
//! # Locking
//!
//! Mutating operations acquire a mutex drawn from a small process-wide pool,
//! keyed by the raster's creation identity.  Two distinct rasters may share
//! a pooled mutex; compound operations therefore acquire locks in slot order
//! and never nest acquisitions of different slots.

mod blit;
pub mod rle;

pub use rle::{RowCursor, RunReader};

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::rect::Rect;
use crate::shared;

/// Single-plane raster with raw and run-length representations.
#[derive(Debug)]
pub struct Bitmap {
    nrows: i32,
    ncolumns: i32,
    border: i32,
    bytes_per_row: i32,
    grays: i32,
    /// Raw pixel grid, when materialized
    bytes: Option<Arc<Vec<u8>>>,
    /// Run-length stream, when materialized (bi-level only)
    rle: Option<Arc<Vec<u8>>>,
    /// Pins the shared zero buffer this raster was sized against
    zero_guard: Option<Arc<Vec<u8>>>,
    /// Pool slot of the pooled mutex guarding this raster
    slot: usize,
}

impl Default for Bitmap {
    fn default() -> Self {
        Bitmap {
            nrows: 0,
            ncolumns: 0,
            border: 0,
            bytes_per_row: 0,
            grays: 2,
            bytes: None,
            rle: None,
            zero_guard: None,
            slot: shared::assign_slot(),
        }
    }
}

impl Clone for Bitmap {
    /// Clones share the underlying buffers until one side writes.
    ///
    /// The clone is a distinct raster and draws its own pooled mutex slot.
    fn clone(&self) -> Self {
        Bitmap {
            nrows: self.nrows,
            ncolumns: self.ncolumns,
            border: self.border,
            bytes_per_row: self.bytes_per_row,
            grays: self.grays,
            bytes: self.bytes.clone(),
            rle: self.rle.clone(),
            zero_guard: self.zero_guard.clone(),
            slot: shared::assign_slot(),
        }
    }
}

impl Bitmap {
    /// Create an empty bitmap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero-filled bi-level bitmap of the given size.
    ///
    /// # Errors
    ///
    /// See [`init`](Self::init).
    pub fn with_size(rows: i32, columns: i32, border: i32) -> Result<Self> {
        let mut bm = Self::default();
        bm.init(rows, columns, border)?;
        Ok(bm)
    }

    /// Reinitialize as a zero-filled bi-level bitmap of the given size.
    ///
    /// Any previous content is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadDimensions`] for negative arguments and
    /// [`Error::TooLarge`] when a dimension exceeds 65535 or the row-stride
    /// arithmetic would overflow.
    pub fn init(&mut self, rows: i32, columns: i32, border: i32) -> Result<()> {
        if rows < 0 || columns < 0 || border < 0 {
            return Err(Error::BadDimensions { rows, columns, border });
        }
        const MAXDIM: i32 = u16::MAX as i32;
        if rows > MAXDIM || columns > MAXDIM || columns + border > MAXDIM {
            return Err(Error::TooLarge { rows, columns });
        }
        let bpr = columns + border;
        let npixels = (rows as usize)
            .checked_mul(bpr as usize)
            .and_then(|n| n.checked_add(border as usize))
            .ok_or(Error::TooLarge { rows, columns })?;
        let _guard = shared::lock(self.slot);
        self.destroy();
        self.grays = 2;
        self.nrows = rows;
        self.ncolumns = columns;
        self.border = border;
        self.bytes_per_row = bpr;
        self.zero_guard = Some(shared::zeroes((bpr + border) as usize));
        if npixels > 0 {
            self.bytes = Some(Arc::new(vec![0u8; npixels]));
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.bytes = None;
        self.rle = None;
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> i32 {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> i32 {
        self.ncolumns
    }

    /// Width of the guard border, in pixels.
    #[inline]
    pub fn border(&self) -> i32 {
        self.border
    }

    /// Number of gray levels, between 2 and 256.
    #[inline]
    pub fn grays(&self) -> i32 {
        self.grays
    }

    /// Distance in bytes between the starts of consecutive raw rows.
    #[inline]
    pub fn row_stride(&self) -> i32 {
        self.bytes_per_row
    }

    /// True when the raw pixel grid is materialized.
    #[inline]
    pub fn has_pixels(&self) -> bool {
        self.bytes.is_some()
    }

    /// True when the run-length stream is materialized.
    #[inline]
    pub fn has_runs(&self) -> bool {
        self.rle.is_some()
    }

    /// The run-length stream, when materialized.
    #[inline]
    pub fn runs(&self) -> Option<&[u8]> {
        self.rle.as_deref().map(Vec::as_slice)
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    fn row_range(&self, y: i32) -> std::ops::Range<usize> {
        let start = (self.border + y * self.bytes_per_row) as usize;
        start..start + self.ncolumns as usize
    }

    /// Pixels of row `y`, bottom-up numbering.
    ///
    /// # Panics
    ///
    /// Panics when `y` is out of range or the pixel grid is not
    /// materialized.
    pub fn row(&self, y: i32) -> &[u8] {
        assert!(y >= 0 && y < self.nrows, "row index {y} out of range");
        let bytes = self.bytes.as_ref().expect("pixel grid not materialized");
        &bytes[self.row_range(y)]
    }

    /// Mutable pixels of row `y`, detaching any shared buffer first.
    ///
    /// # Panics
    ///
    /// Panics when `y` is out of range or the pixel grid is not
    /// materialized.
    pub fn row_mut(&mut self, y: i32) -> &mut [u8] {
        assert!(y >= 0 && y < self.nrows, "row index {y} out of range");
        let range = self.row_range(y);
        let bytes = self.bytes.as_mut().expect("pixel grid not materialized");
        &mut Arc::make_mut(bytes)[range]
    }

    /// Value of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when the coordinates are out of range or the pixel grid is
    /// not materialized.
    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        assert!(x >= 0 && x < self.ncolumns, "column index {x} out of range");
        self.row(y)[x as usize]
    }

    /// Whole raw buffer, mutable; used by the rotation index remapping.
    fn raw_mut(&mut self) -> Result<&mut [u8]> {
        match self.bytes.as_mut() {
            Some(b) => Ok(Arc::make_mut(b).as_mut_slice()),
            None => Err(Error::NoPixelGrid),
        }
    }

    /// Set every visible pixel to `value`.
    ///
    /// Guard cells are left untouched (zero).
    pub fn fill(&mut self, value: u8) -> Result<()> {
        let _guard = shared::lock(self.slot);
        self.uncompress_impl()?;
        for y in 0..self.nrows {
            let range = self.row_range(y);
            let bytes = match self.bytes.as_mut() {
                Some(b) => Arc::make_mut(b),
                None => return Ok(()), // empty raster
            };
            bytes[range].fill(value);
        }
        Ok(())
    }

    /// Set the gray-level count.
    ///
    /// Pixel values are not rescaled; a raster holding only the run stream
    /// is expanded first when more than two levels are requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadGrayLevels`] when `ngrays` is outside `2..=256`.
    pub fn set_grays(&mut self, ngrays: i32) -> Result<()> {
        let _guard = shared::lock(self.slot);
        self.set_grays_impl(ngrays)
    }

    fn set_grays_impl(&mut self, ngrays: i32) -> Result<()> {
        if !(2..=256).contains(&ngrays) {
            return Err(Error::BadGrayLevels(ngrays));
        }
        self.grays = ngrays;
        if ngrays > 2 && !self.has_pixels() {
            self.uncompress_impl()?;
        }
        Ok(())
    }

    /// Change the gray-level count, rescaling every pixel.
    ///
    /// Each value passes through a 256-entry lookup table built from the old
    /// and new level counts with round-to-nearest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadGrayLevels`] when `ngrays` is outside `2..=256`.
    pub fn change_grays(&mut self, ngrays: i32) -> Result<()> {
        let _guard = shared::lock(self.slot);
        let ng = ngrays - 1;
        let og = self.grays - 1;
        self.set_grays_impl(ngrays)?;
        let mut conv = [0u8; 256];
        for (i, c) in conv.iter_mut().enumerate() {
            let i = i as i32;
            *c = if i > og { ng as u8 } else { ((i * ng + og / 2) / og) as u8 };
        }
        for y in 0..self.nrows {
            for p in self.row_mut(y) {
                *p = conv[*p as usize];
            }
        }
        Ok(())
    }

    /// Force every pixel to 0 or 1 by threshold comparison and reset the
    /// gray-level count to 2.
    ///
    /// Pixels strictly above `threshold` become 1.
    pub fn binarize(&mut self, threshold: u8) {
        let _guard = shared::lock(self.slot);
        if self.has_pixels() {
            for y in 0..self.nrows {
                for p in self.row_mut(y) {
                    *p = if *p > threshold { 1 } else { 0 };
                }
            }
        }
        self.grays = 2;
    }

    /// Return a copy rotated by `count` quarter turns counter-clockwise.
    ///
    /// For odd counts the copy has swapped width and height.  When the
    /// raster is bi-level, both this raster and the returned one are left in
    /// run-length form.
    pub fn rotate(&mut self, count: i32) -> Result<Bitmap> {
        let count = count & 3;
        if count == 0 {
            return Ok(self.clone());
        }
        let mut dst = if count & 1 != 0 {
            Bitmap::with_size(self.ncolumns, self.nrows, 0)?
        } else {
            Bitmap::with_size(self.nrows, self.ncolumns, 0)?
        };
        dst.set_grays(self.grays)?;
        if self.nrows == 0 || self.ncolumns == 0 {
            return Ok(dst);
        }
        {
            let _guard = shared::lock(self.slot);
            self.uncompress_impl()?;
            let dcols = dst.ncolumns as usize;
            let dbuf = dst.raw_mut()?;
            match count {
                1 => {
                    // each source row becomes a column, rightmost first
                    let lastcolumn = (self.nrows - 1) as usize;
                    for y in 0..self.nrows {
                        let r = self.row(y);
                        let ynew = lastcolumn - y as usize;
                        for x in 0..self.ncolumns as usize {
                            dbuf[x * dcols + ynew] = r[x];
                        }
                    }
                }
                2 => {
                    let lastrow = (self.nrows - 1) as usize;
                    let lastcolumn = (self.ncolumns - 1) as usize;
                    for y in 0..self.nrows {
                        let r = self.row(y);
                        let ynew = lastrow - y as usize;
                        for x in 0..self.ncolumns as usize {
                            dbuf[ynew * dcols + (lastcolumn - x)] = r[x];
                        }
                    }
                }
                3 => {
                    // each source row becomes a column, leftmost first
                    let lastrow = (self.ncolumns - 1) as usize;
                    for y in 0..self.nrows {
                        let r = self.row(y);
                        for x in 0..self.ncolumns as usize {
                            dbuf[(lastrow - x) * dcols + y as usize] = r[x];
                        }
                    }
                }
                _ => unreachable!(),
            }
        }
        if self.grays == 2 {
            self.compress()?;
            dst.compress()?;
        }
        Ok(dst)
    }

    /// Copy the pixels covered by `rect` into a new bitmap of the same
    /// gray-level count.
    ///
    /// Regions of `rect` outside this raster read as zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPixelGrid`] when only the run stream is
    /// materialized, and propagates size validation errors for `rect`.
    pub fn crop(&self, rect: &Rect, border: i32) -> Result<Bitmap> {
        let mut dst = Bitmap::with_size(rect.height(), rect.width(), border)?;
        dst.grays = self.grays;
        if !self.has_pixels() {
            if self.has_runs() {
                return Err(Error::NoPixelGrid);
            }
            return Ok(dst); // empty source
        }
        let _guard = shared::lock(self.slot);
        let bounds = Rect::new(0, 0, self.ncolumns as u32, self.nrows as u32);
        let mut copy = Rect::default();
        copy.intersect(&bounds, rect);
        if copy.translate(-rect.xmin, -rect.ymin) {
            for y in copy.ymin..copy.ymax {
                let src = self.row(y + rect.ymin);
                let dst_row = dst.row_mut(y);
                for x in copy.xmin..copy.xmax {
                    dst_row[x as usize] = src[(x + rect.xmin) as usize];
                }
            }
        }
        Ok(dst)
    }

    /// Bytes held by whichever representations are currently materialized.
    ///
    /// Normally exactly one buffer is live; a transient state during
    /// conversion may briefly hold both.
    pub fn memory_usage(&self) -> usize {
        let mut usage = std::mem::size_of::<Bitmap>();
        if let Some(bytes) = &self.bytes {
            usage += bytes.len();
        }
        if let Some(rle) = &self.rle {
            usage += rle.len();
        }
        usage
    }

    /// Verify that every guard cell reads zero.
    pub fn border_is_clean(&self) -> bool {
        let Some(bytes) = self.bytes.as_ref() else {
            return true;
        };
        let b = self.border as usize;
        let bpr = self.bytes_per_row as usize;
        let cols = self.ncolumns as usize;
        if bytes[..b].iter().any(|&v| v != 0) {
            return false;
        }
        for y in 0..self.nrows as usize {
            let row_end = b + y * bpr + cols;
            let next_row = b + (y + 1) * bpr;
            if bytes[row_end..next_row].iter().any(|&v| v != 0) {
                return false;
            }
        }
        true
    }
}
