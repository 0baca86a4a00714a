//! PBM / PGM stream codecs
//!
//! Reads and writes bi-level PBM (`P1` ASCII, `P4` raw) and gray PGM
//! (`P2` ASCII, `P5` raw).  Stream rows run top to bottom, which is the
//! inverse of the raster's bottom-up row numbering; readers and writers
//! walk internal rows from `rows - 1` down to 0.
//!
//! PGM samples are inverted on the way through: sample value `v` maps to
//! gray level `grays - 1 - v`, so level 0 is white and `grays - 1` is ink.
//! A `maxval` above 255 selects two-byte big-endian samples.

use std::io::{Read, Write};

use docraster_core::{Bitmap, RowCursor};

use crate::Encoding;
use crate::error::{IoError, IoResult};
use crate::header::{read_byte, read_integer};

pub(crate) fn read_pbm_text<R: Read + ?Sized>(reader: &mut R, bm: &mut Bitmap) -> IoResult<()> {
    for n in (0..bm.rows()).rev() {
        let row = bm.row_mut(n);
        for c in 0..row.len() {
            let bit = loop {
                match read_byte(reader)? {
                    None => return Err(IoError::EndOfStream),
                    Some(b' ' | b'\t' | b'\r' | b'\n') => continue,
                    Some(b) => break b,
                }
            };
            row[c] = match bit {
                b'1' => 1,
                b'0' => 0,
                _ => return Err(IoError::BadPixel),
            };
        }
    }
    Ok(())
}

pub(crate) fn read_pbm_raw<R: Read + ?Sized>(reader: &mut R, bm: &mut Bitmap) -> IoResult<()> {
    for n in (0..bm.rows()).rev() {
        let row = bm.row_mut(n);
        let mut acc = 0u8;
        let mut mask = 0u8;
        for c in 0..row.len() {
            if mask == 0 {
                acc = read_byte(reader)?.ok_or(IoError::EndOfStream)?;
                mask = 0x80;
            }
            row[c] = if acc & mask != 0 { 1 } else { 0 };
            mask >>= 1;
        }
    }
    Ok(())
}

/// Inversion ramp from sample values to gray levels.
fn pgm_ramp(grays: i32, maxval: u32, bins: usize) -> Vec<u8> {
    let maxval = maxval as i64;
    let mut ramp = vec![0u8; bins];
    for (i, r) in ramp.iter_mut().enumerate() {
        let i = i as i64;
        if i < maxval {
            *r = (((grays as i64 - 1) * (maxval - i) + maxval / 2) / maxval) as u8;
        }
    }
    ramp
}

pub(crate) fn read_pgm_text<R: Read + ?Sized>(
    reader: &mut R,
    bm: &mut Bitmap,
    maxval: u32,
    lookahead: &mut u8,
) -> IoResult<()> {
    let ramp = pgm_ramp(bm.grays(), maxval, maxval as usize + 1);
    for n in (0..bm.rows()).rev() {
        for c in 0..bm.columns() {
            let v = read_integer(lookahead, reader)?;
            if v > maxval {
                return Err(IoError::BadPixel);
            }
            bm.row_mut(n)[c as usize] = ramp[v as usize];
        }
    }
    Ok(())
}

pub(crate) fn read_pgm_raw<R: Read + ?Sized>(
    reader: &mut R,
    bm: &mut Bitmap,
    maxval: u32,
) -> IoResult<()> {
    let bins = if maxval > 255 { 65536 } else { 256 };
    let ramp = pgm_ramp(bm.grays(), maxval, bins);
    let wide = bins > 256;
    for n in (0..bm.rows()).rev() {
        let row = bm.row_mut(n);
        for c in 0..row.len() {
            let v = if wide {
                let hi = read_byte(reader)?.ok_or(IoError::EndOfStream)?;
                let lo = read_byte(reader)?.ok_or(IoError::EndOfStream)?;
                (hi as usize) << 8 | lo as usize
            } else {
                read_byte(reader)?.ok_or(IoError::EndOfStream)? as usize
            };
            row[c] = ramp[v];
        }
    }
    Ok(())
}

/// Write a bi-level raster as PBM.
///
/// # Errors
///
/// Returns [`IoError::TooManyLevels`] when the raster has more than two
/// gray levels.
pub fn write_pbm<W: Write>(bm: &Bitmap, writer: &mut W, encoding: Encoding) -> IoResult<()> {
    if bm.grays() > 2 {
        return Err(IoError::TooManyLevels(bm.grays()));
    }
    let magic = match encoding {
        Encoding::Raw => '4',
        Encoding::Ascii => '1',
    };
    write!(writer, "P{}\n{} {}\n", magic, bm.columns(), bm.rows())?;
    let mut cursor = RowCursor::new(bm)?;
    match encoding {
        Encoding::Raw => {
            let count = ((bm.columns() + 7) >> 3) as usize;
            let mut packed = vec![0u8; count];
            while let Some(row) = cursor.next_row()? {
                packed.fill(0);
                for (c, &v) in row.iter().enumerate() {
                    if v != 0 {
                        packed[c >> 3] |= 0x80 >> (c & 7);
                    }
                }
                writer.write_all(&packed)?;
            }
        }
        Encoding::Ascii => {
            while let Some(row) = cursor.next_row()? {
                for (c, &v) in row.iter().enumerate() {
                    writer.write_all(if v != 0 { b"1" } else { b"0" })?;
                    let c = c + 1;
                    if c == row.len() || c & 0x3f == 0 {
                        writer.write_all(b"\n")?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Write a raster as PGM, inverting samples to the PGM white-is-maxval
/// convention.
pub fn write_pgm<W: Write>(bm: &Bitmap, writer: &mut W, encoding: Encoding) -> IoResult<()> {
    let magic = match encoding {
        Encoding::Raw => '5',
        Encoding::Ascii => '2',
    };
    let maxg = (bm.grays() - 1) as u8;
    write!(
        writer,
        "P{}\n{} {}\n{}\n",
        magic,
        bm.columns(),
        bm.rows(),
        maxg
    )?;
    let mut cursor = RowCursor::new(bm)?;
    match encoding {
        Encoding::Raw => {
            let mut out = vec![0u8; bm.columns().max(0) as usize];
            while let Some(row) = cursor.next_row()? {
                for (o, &v) in out.iter_mut().zip(row) {
                    *o = maxg.wrapping_sub(v);
                }
                writer.write_all(&out)?;
            }
        }
        Encoding::Ascii => {
            while let Some(row) = cursor.next_row()? {
                for (c, &v) in row.iter().enumerate() {
                    write!(writer, "{} ", maxg.wrapping_sub(v))?;
                    let c = c + 1;
                    if c == row.len() || c & 0x1f == 0 {
                        writer.write_all(b"\n")?;
                    }
                }
            }
        }
    }
    Ok(())
}
