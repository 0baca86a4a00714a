//! R4 stream codec
//!
//! The proprietary raw bi-level form: header `R4\n<cols> <rows>\n` followed
//! immediately by the run stream of
//! [`docraster_core::bitmap::rle`](docraster_core::bitmap::rle), rows top to
//! bottom.

use std::io::{Read, Write};

use docraster_core::{Bitmap, RUN_OVERFLOW};

use crate::error::{IoError, IoResult};
use crate::header::read_byte;

pub(crate) fn read_rle_raw<R: Read + ?Sized>(reader: &mut R, bm: &mut Bitmap) -> IoResult<()> {
    let ncolumns = bm.columns();
    let mut n = bm.rows() - 1;
    let mut c: i32 = 0;
    let mut p: u8 = 0;
    while n >= 0 {
        let h = read_byte(reader)?.ok_or(IoError::EndOfStream)?;
        let mut x = h as i32;
        if x >= RUN_OVERFLOW as i32 {
            let lo = read_byte(reader)?.ok_or(IoError::EndOfStream)?;
            x = lo as i32 + ((x - RUN_OVERFLOW as i32) << 8);
        }
        if c + x > ncolumns {
            return Err(docraster_core::Error::LostSync.into());
        }
        let row = bm.row_mut(n);
        row[c as usize..(c + x) as usize].fill(p);
        c += x;
        p = 1 - p;
        if c >= ncolumns {
            c = 0;
            p = 0;
            n -= 1;
        }
    }
    Ok(())
}

/// Write a bi-level raster as an R4 stream.
///
/// # Errors
///
/// Returns [`IoError::TooManyLevels`] when the raster has more than two
/// gray levels, and a core error when the raster is empty.
pub fn write_rle<W: Write>(bm: &Bitmap, writer: &mut W) -> IoResult<()> {
    if bm.columns() == 0 || bm.rows() == 0 {
        return Err(docraster_core::Error::NotInitialized.into());
    }
    if bm.grays() > 2 {
        return Err(IoError::TooManyLevels(bm.grays()));
    }
    write!(writer, "R4\n{} {}\n", bm.columns(), bm.rows())?;
    writer.write_all(&bm.run_data()?)?;
    Ok(())
}
