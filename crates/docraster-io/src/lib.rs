//! docraster-io - stream codecs for the document image raster
//!
//! Decodes and encodes the bit-exact stream forms consumed and produced by
//! [`Bitmap`]:
//!
//! | magic | form |
//! |---|---|
//! | `P1` | bi-level PBM, ASCII |
//! | `P2` | gray PGM, ASCII, `maxval <= 65535` |
//! | `P4` | bi-level PBM, raw packed bits |
//! | `P5` | gray PGM, raw, two-byte big-endian above `maxval` 255 |
//! | `R4` | raw bi-level run-length stream |
//!
//! All five share the same header grammar: 2-byte magic, then
//! whitespace/`#`-comment-skipping decimal integers for width, height and
//! (PGM only) maxval.  [`read_bitmap`] sniffs the magic and dispatches.

mod error;
mod header;
pub mod pnm;
pub mod rle;

pub use error::{IoError, IoResult};
pub use pnm::{write_pbm, write_pgm};
pub use rle::write_rle;

use std::io::Read;

use docraster_core::Bitmap;
use log::debug;

/// ASCII or raw body encoding for the PBM/PGM writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Human-readable body (`P1`/`P2`)
    Ascii,
    /// Packed binary body (`P4`/`P5`)
    Raw,
}

/// Decode a bitmap from any of the supported stream forms.
///
/// The raster is created with `border` guard pixels.
///
/// # Errors
///
/// Returns [`IoError::BadMagic`] for an unrecognized magic number, header
/// grammar errors from the tokenizer, and format-specific body errors.
pub fn read_bitmap<R: Read + ?Sized>(reader: &mut R, border: i32) -> IoResult<Bitmap> {
    let mut magic = [0u8; 2];
    reader
        .read_exact(&mut magic)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => IoError::EndOfStream,
            _ => IoError::Io(e),
        })?;
    let mut lookahead = b'\n';
    let columns = read_dimension(&mut lookahead, reader)?;
    let rows = read_dimension(&mut lookahead, reader)?;
    let mut bm = Bitmap::new();
    bm.init(rows, columns, border)?;
    match &magic {
        b"P1" => {
            debug!("decoding {columns}x{rows} ascii pbm");
            pnm::read_pbm_text(reader, &mut bm)?;
        }
        b"P2" => {
            let maxval = read_maxval(&mut lookahead, reader)?;
            debug!("decoding {columns}x{rows} ascii pgm, maxval {maxval}");
            bm.set_grays(grays_for(maxval))?;
            pnm::read_pgm_text(reader, &mut bm, maxval, &mut lookahead)?;
        }
        b"P4" => {
            debug!("decoding {columns}x{rows} raw pbm");
            pnm::read_pbm_raw(reader, &mut bm)?;
        }
        b"P5" => {
            let maxval = read_maxval(&mut lookahead, reader)?;
            debug!("decoding {columns}x{rows} raw pgm, maxval {maxval}");
            bm.set_grays(grays_for(maxval))?;
            pnm::read_pgm_raw(reader, &mut bm, maxval)?;
        }
        b"R4" => {
            debug!("decoding {columns}x{rows} run-length stream");
            rle::read_rle_raw(reader, &mut bm)?;
        }
        _ => return Err(IoError::BadMagic(magic)),
    }
    Ok(bm)
}

fn read_dimension<R: Read + ?Sized>(lookahead: &mut u8, reader: &mut R) -> IoResult<i32> {
    let v = header::read_integer(lookahead, reader)?;
    i32::try_from(v).map_err(|_| IoError::IntegerOverflow)
}

fn read_maxval<R: Read + ?Sized>(lookahead: &mut u8, reader: &mut R) -> IoResult<u32> {
    let maxval = header::read_integer(lookahead, reader)?;
    if maxval == 0 || maxval > 65535 {
        return Err(IoError::BadMaxval(maxval));
    }
    Ok(maxval)
}

fn grays_for(maxval: u32) -> i32 {
    if maxval > 255 { 256 } else { maxval as i32 + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_pgm_text_inverts() {
        let mut data: &[u8] = b"P2\n3 1\n255\n10 20 30\n";
        let bm = read_bitmap(&mut data, 0).unwrap();
        assert_eq!((bm.columns(), bm.rows()), (3, 1));
        assert_eq!(bm.grays(), 256);
        assert_eq!(bm.row(0), &[245, 235, 225]);
    }

    #[test]
    fn test_read_pbm_text() {
        let mut data: &[u8] = b"P1\n# tiny glyph\n3 2\n1 0 1\n0 1 0\n";
        let bm = read_bitmap(&mut data, 0).unwrap();
        // file top row lands on internal row 1
        assert_eq!(bm.row(1), &[1, 0, 1]);
        assert_eq!(bm.row(0), &[0, 1, 0]);
    }

    #[test]
    fn test_bad_magic() {
        let mut data: &[u8] = b"P7\n1 1\n";
        assert!(matches!(read_bitmap(&mut data, 0), Err(IoError::BadMagic(_))));
    }

    #[test]
    fn test_bad_maxval() {
        let mut data: &[u8] = b"P5\n1 1\n70000\n\x00\x00";
        assert!(matches!(
            read_bitmap(&mut data, 0),
            Err(IoError::BadMaxval(70000))
        ));
    }

    #[test]
    fn test_non_digit_header() {
        let mut data: &[u8] = b"P4\nw 4\n";
        assert!(matches!(
            read_bitmap(&mut data, 0),
            Err(IoError::NotInteger(b'w'))
        ));
    }
}
