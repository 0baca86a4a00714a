//! Run-length wire codec
//!
//! A bi-level raster row is encoded as alternating run lengths, starting
//! with a run of white (possibly of length zero) and ending exactly at the
//! row width.  Rows are stored bottom-to-top file order: the first encoded
//! row is the raster's top internal row (`rows - 1`), matching the scan
//! order of the PBM/PGM stream formats.
//!
//! Run lengths below [`RUN_OVERFLOW`] occupy one byte.  Longer runs occupy
//! two: the first byte is `(run >> 8) + RUN_OVERFLOW`, the second is
//! `run & 0xff`.  A run longer than [`MAX_RUN`] is split by emitting a
//! full-length run (`0xff, 0xff`) followed by a zero-length run of the
//! opposite color (`0x00`), so color parity continues unaffected.  Both
//! encoder and decoder honor this continuation rule.

use std::borrow::Cow;
use std::sync::Arc;

use super::Bitmap;
use crate::error::{Error, Result};
use crate::rect::Rect;
use crate::shared;

/// First byte value of a two-byte run encoding
pub const RUN_OVERFLOW: u8 = 0xc0;

/// Longest run length a single encoding can carry
pub const MAX_RUN: i32 = 0x3fff;

/// Append one run length to a run stream.
pub fn append_run(out: &mut Vec<u8>, count: i32) {
    debug_assert!(count >= 0);
    if count < RUN_OVERFLOW as i32 {
        out.push(count as u8);
    } else if count <= MAX_RUN {
        out.push((count >> 8) as u8 + RUN_OVERFLOW);
        out.push((count & 0xff) as u8);
    } else {
        append_long_run(out, count);
    }
}

/// Split a run longer than [`MAX_RUN`] into full-length runs separated by
/// zero-length runs of the opposite color.
fn append_long_run(out: &mut Vec<u8>, mut count: i32) {
    while count > MAX_RUN {
        out.extend_from_slice(&[0xff, 0xff, 0x00]);
        count -= MAX_RUN;
    }
    if count < RUN_OVERFLOW as i32 {
        out.push(count as u8);
    } else {
        out.push((count >> 8) as u8 + RUN_OVERFLOW);
        out.push((count & 0xff) as u8);
    }
}

/// Encode one pixel row as alternating runs, starting with white.
pub fn append_line(out: &mut Vec<u8>, row: &[u8]) {
    let mut i = 0;
    let mut ink = false;
    while i < row.len() {
        let start = i;
        if ink {
            while i < row.len() && row[i] != 0 {
                i += 1;
            }
        } else {
            while i < row.len() && row[i] == 0 {
                i += 1;
            }
        }
        append_run(out, (i - start) as i32);
        ink = !ink;
    }
}

/// Sequential reader over a run stream.
#[derive(Debug, Clone)]
pub struct RunReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RunReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        RunReader { data, pos: 0 }
    }

    /// Read the next run length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedRuns`] when the stream ends mid-run.
    pub fn next_run(&mut self) -> Result<i32> {
        let z = *self.data.get(self.pos).ok_or(Error::TruncatedRuns)?;
        self.pos += 1;
        if z >= RUN_OVERFLOW {
            let lo = *self.data.get(self.pos).ok_or(Error::TruncatedRuns)?;
            self.pos += 1;
            Ok((((z - RUN_OVERFLOW) as i32) << 8) | lo as i32)
        } else {
            Ok(z as i32)
        }
    }
}

/// Expand one row of runs into `out`, which must be `ncolumns` long.
pub(crate) fn decode_one_row(rr: &mut RunReader<'_>, ncolumns: i32, out: &mut [u8]) -> Result<()> {
    let mut c: i32 = 0;
    let mut p: u8 = 0;
    while c < ncolumns {
        let x = rr.next_run()?;
        if c + x > ncolumns {
            return Err(Error::LostSync);
        }
        out[c as usize..(c + x) as usize].fill(p);
        c += x;
        p = 1 - p;
    }
    Ok(())
}

impl Bitmap {
    /// Replace the raw pixel grid with the run-length representation.
    ///
    /// No-op when the raster already holds only the run stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CantCompress`] when the raster has more than two
    /// gray levels.
    pub fn compress(&mut self) -> Result<()> {
        if self.grays > 2 {
            return Err(Error::CantCompress(self.grays));
        }
        let _guard = shared::lock(self.slot);
        self.compress_impl()
    }

    pub(crate) fn compress_impl(&mut self) -> Result<()> {
        if self.grays > 2 {
            return Err(Error::CantCompress(self.grays));
        }
        if self.bytes.is_some() {
            let runs = self.encode_runs()?;
            if !runs.is_empty() {
                self.rle = Some(Arc::new(runs));
                self.bytes = None;
            }
        }
        Ok(())
    }

    /// Rebuild the raw pixel grid from the run stream.
    ///
    /// No-op when the grid is already materialized.
    pub fn uncompress(&mut self) -> Result<()> {
        let _guard = shared::lock(self.slot);
        self.uncompress_impl()
    }

    pub(crate) fn uncompress_impl(&mut self) -> Result<()> {
        if self.bytes.is_none() && self.rle.is_some() {
            self.decode_runs()
        } else {
            Ok(())
        }
    }

    /// Encode the current content as a fresh run stream.
    fn encode_runs(&self) -> Result<Vec<u8>> {
        if self.nrows == 0 || self.ncolumns == 0 {
            return Ok(Vec::new());
        }
        if self.bytes.is_none() {
            return Ok(self.rle.as_deref().cloned().unwrap_or_default());
        }
        let mut runs = Vec::with_capacity(1024 + 2 * self.ncolumns as usize);
        for n in (0..self.nrows).rev() {
            append_line(&mut runs, self.row(n));
        }
        Ok(runs)
    }

    fn decode_runs(&mut self) -> Result<()> {
        if self.nrows == 0 || self.ncolumns == 0 {
            return Err(Error::NotInitialized);
        }
        self.bytes_per_row = self.ncolumns + self.border;
        let npixels = (self.nrows as usize) * (self.bytes_per_row as usize) + self.border as usize;
        self.zero_guard = Some(shared::zeroes((self.bytes_per_row + self.border) as usize));
        let mut buf = vec![0u8; npixels];
        {
            let runs = self.rle.as_ref().ok_or(Error::NotInitialized)?;
            let mut rr = RunReader::new(runs);
            let mut n = self.nrows - 1;
            let mut c: i32 = 0;
            let mut p: u8 = 0;
            while n >= 0 {
                let x = rr.next_run()?;
                if c + x > self.ncolumns {
                    return Err(Error::LostSync);
                }
                if p != 0 {
                    let start = (self.border + n * self.bytes_per_row + c) as usize;
                    buf[start..start + x as usize].fill(p);
                }
                c += x;
                p = 1 - p;
                if c >= self.ncolumns {
                    c = 0;
                    p = 0;
                    n -= 1;
                }
            }
        }
        self.bytes = Some(Arc::new(buf));
        self.rle = None;
        Ok(())
    }

    /// The run stream, borrowed when materialized and encoded on the fly
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CantCompress`] when the raster has more than two
    /// gray levels and no run stream.
    pub fn run_data(&self) -> Result<Cow<'_, [u8]>> {
        if let Some(rle) = self.rle.as_deref() {
            return Ok(Cow::Borrowed(rle.as_slice()));
        }
        if self.grays > 2 {
            return Err(Error::CantCompress(self.grays));
        }
        Ok(Cow::Owned(self.encode_runs()?))
    }

    /// Bounding rectangle (half-open) and population count of set pixels,
    /// computed from the run stream.
    ///
    /// Returns the canonical empty rectangle and a count of zero for a
    /// blank raster.
    pub fn ink_bounds(&self) -> Result<(Rect, i64)> {
        if self.grays > 2 {
            return Err(Error::CantCompress(self.grays));
        }
        if self.nrows == 0 || self.ncolumns == 0 {
            return Ok((Rect::default(), 0));
        }
        let runs = self.run_data()?;
        let mut rr = RunReader::new(&runs);
        let mut rect = Rect {
            xmin: self.ncolumns,
            ymin: self.nrows,
            xmax: 0,
            ymax: 0,
        };
        let mut area: i64 = 0;
        let mut r = self.nrows;
        while r > 0 {
            r -= 1;
            let mut p = false;
            let mut c: i32 = 0;
            let mut n: i64 = 0;
            while c < self.ncolumns {
                let x = rr.next_run()?;
                if c + x > self.ncolumns {
                    return Err(Error::LostSync);
                }
                if x != 0 {
                    if p {
                        if c < rect.xmin {
                            rect.xmin = c;
                        }
                        c += x;
                        if c > rect.xmax {
                            rect.xmax = c;
                        }
                        n += x as i64;
                    } else {
                        c += x;
                    }
                }
                p = !p;
            }
            area += n;
            if n != 0 {
                rect.ymin = r;
                if r + 1 > rect.ymax {
                    rect.ymax = r + 1;
                }
            }
        }
        if area == 0 {
            rect.clear();
        }
        Ok((rect, area))
    }
}

/// Streams the rows of a bitmap in file scan order (top internal row
/// first), from whichever representation is materialized.
///
/// Lets stream writers emit a compressed bitmap without forcing a
/// representation switch.
#[derive(Debug)]
pub struct RowCursor<'a> {
    bm: &'a Bitmap,
    next: i32,
    runs: Option<RunReader<'a>>,
    scratch: Vec<u8>,
}

impl<'a> RowCursor<'a> {
    /// Position the cursor on the raster's top row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] when a non-empty raster holds
    /// neither representation.
    pub fn new(bm: &'a Bitmap) -> Result<Self> {
        let runs = if bm.has_pixels() {
            None
        } else if let Some(data) = bm.runs() {
            Some(RunReader::new(data))
        } else if bm.rows() == 0 || bm.columns() == 0 {
            None
        } else {
            return Err(Error::NotInitialized);
        };
        let scratch = if runs.is_some() || !bm.has_pixels() {
            vec![0u8; bm.columns().max(0) as usize]
        } else {
            Vec::new()
        };
        Ok(RowCursor { bm, next: bm.rows() - 1, runs, scratch })
    }

    /// The next row, or `None` after the bottom row has been yielded.
    pub fn next_row(&mut self) -> Result<Option<&[u8]>> {
        if self.next < 0 {
            return Ok(None);
        }
        let y = self.next;
        self.next -= 1;
        match &mut self.runs {
            Some(rr) => {
                decode_one_row(rr, self.bm.columns(), &mut self.scratch)?;
                Ok(Some(&self.scratch))
            }
            None => {
                if self.bm.has_pixels() {
                    Ok(Some(self.bm.row(y)))
                } else {
                    Ok(Some(&self.scratch))
                }
            }
        }
    }
}
