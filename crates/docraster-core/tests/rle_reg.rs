//! Run-length codec regression test
//!
//! Exercises the encode/decode round trip over structured and randomized
//! bi-level rasters, including the degenerate rows (all white, all ink,
//! zero-length leading runs) and runs crossing the maximum-run-length
//! continuation boundary.

use docraster_core::Bitmap;
use rand::Rng;
use rand::RngExt;

fn pixels(bm: &Bitmap) -> Vec<Vec<u8>> {
    (0..bm.rows()).map(|y| bm.row(y).to_vec()).collect()
}

fn roundtrip(bm: &mut Bitmap) {
    let before = pixels(bm);
    bm.compress().expect("compress");
    assert!(!bm.has_pixels());
    bm.uncompress().expect("uncompress");
    assert_eq!(pixels(bm), before, "round trip changed pixel data");
    assert!(bm.border_is_clean(), "round trip dirtied the border");
}

#[test]
fn rle_structured_reg() {
    // checkerboard
    let mut bm = Bitmap::with_size(9, 13, 2).unwrap();
    for y in 0..9 {
        for x in 0..13 {
            bm.row_mut(y)[x as usize] = ((x + y) & 1) as u8;
        }
    }
    roundtrip(&mut bm);

    // all white and all ink
    let mut blank = Bitmap::with_size(5, 31, 0).unwrap();
    roundtrip(&mut blank);
    let mut solid = Bitmap::with_size(5, 31, 0).unwrap();
    solid.fill(1).unwrap();
    roundtrip(&mut solid);

    // single-column raster alternates parity every row
    let mut thin = Bitmap::with_size(6, 1, 1).unwrap();
    for y in (0..6).step_by(2) {
        thin.row_mut(y)[0] = 1;
    }
    roundtrip(&mut thin);
}

#[test]
fn rle_continuation_reg() {
    // rows longer than the maximum run require the continuation encoding
    let mut bm = Bitmap::with_size(3, 40000, 0).unwrap();
    bm.row_mut(0).fill(1);
    bm.row_mut(2)[17000..].fill(1);
    let before = pixels(&bm);
    bm.compress().unwrap();
    // a 40000 ink run needs two full-length runs plus a remainder
    let runs = bm.runs().unwrap().to_vec();
    assert!(runs.windows(3).any(|w| w == &[0xff, 0xff, 0x00]));
    bm.uncompress().unwrap();
    assert_eq!(pixels(&bm), before);
}

#[test]
fn rle_random_reg() {
    let mut rng = rand::rng();
    for _ in 0..20 {
        let rows = rng.random_range(1..12);
        let cols = rng.random_range(1..300);
        let border = rng.random_range(0..3);
        let mut bm = Bitmap::with_size(rows, cols, border).unwrap();
        for y in 0..rows {
            for x in 0..cols {
                bm.row_mut(y)[x as usize] = rng.random_range(0..2) as u8;
            }
        }
        roundtrip(&mut bm);
    }
}

#[test]
fn rle_stream_matches_in_memory_reg() {
    // the wire body of an R4 stream is the in-memory run stream verbatim
    let mut bm = Bitmap::with_size(4, 9, 0).unwrap();
    for y in 0..4 {
        bm.row_mut(y)[(y * 2) as usize..(y * 2 + 3) as usize].fill(1);
    }
    bm.compress().unwrap();
    let runs = bm.runs().unwrap().to_vec();
    let mut stream = Vec::new();
    docraster_io::write_rle(&bm, &mut stream).unwrap();
    assert!(stream.ends_with(&runs));
    let back = docraster_io::read_bitmap(&mut stream.as_slice(), 2).unwrap();
    bm.uncompress().unwrap();
    assert_eq!(pixels(&back), pixels(&bm));
    assert!(back.border_is_clean());
}

#[test]
fn rle_ink_bounds_reg() {
    let mut rng = rand::rng();
    for _ in 0..10 {
        let mut bm = Bitmap::with_size(20, 20, 0).unwrap();
        let x = rng.random_range(0..18);
        let y = rng.random_range(0..18);
        bm.row_mut(y)[x as usize] = 1;
        bm.row_mut(y + 1)[x as usize + 1] = 1;
        let (rect, area) = bm.ink_bounds().unwrap();
        assert_eq!(area, 2);
        assert_eq!((rect.xmin, rect.ymin), (x, y));
        assert_eq!((rect.xmax, rect.ymax), (x + 2, y + 2));
    }
}
