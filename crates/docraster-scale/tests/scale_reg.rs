//! Resampler regression test
//!
//! Runs the gray and color resamplers over decoded streams and synthetic
//! gradients, checking the identity path, segment consistency, and the
//! interaction with the rectangle mapper geometry.

use docraster_core::{Bitmap, Rect, RectMapper};
use docraster_io::read_bitmap;
use docraster_scale::{BitmapScaler, ScaleError};

fn checker_pgm(size: i32) -> Bitmap {
    let mut stream = format!("P2\n{size} {size}\n255\n").into_bytes();
    for y in 0..size {
        for x in 0..size {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            stream.extend_from_slice(format!("{v} ").as_bytes());
        }
        stream.push(b'\n');
    }
    read_bitmap(&mut stream.as_slice(), 0).unwrap()
}

#[test]
fn scale_identity_reg() {
    let input = checker_pgm(12);
    let frame = Rect::new(0, 0, 12, 12);
    let mut s = BitmapScaler::with_sizes(12, 12, 12, 12);
    s.set_horz_ratio(1, 1).unwrap();
    s.set_vert_ratio(1, 1).unwrap();
    let mut out = Bitmap::new();
    s.scale(&frame, &input, &frame, &mut out).unwrap();
    for y in 0..12 {
        assert_eq!(out.row(y), input.row(y));
    }
}

#[test]
fn scale_downsample_range_reg() {
    // aggressive downsampling goes through the box-filter reduction and
    // must stay within the sample range of the source
    let input = checker_pgm(64);
    let provided = Rect::new(0, 0, 64, 64);
    let desired = Rect::new(0, 0, 9, 9);
    let mut s = BitmapScaler::with_sizes(64, 64, 9, 9);
    let mut out = Bitmap::new();
    s.scale(&provided, &input, &desired, &mut out).unwrap();
    assert_eq!((out.columns(), out.rows()), (9, 9));
    // a checkerboard averages toward mid-gray under heavy reduction
    for y in 1..8 {
        for x in 1..8 {
            let v = out.pixel(x, y) as i32;
            assert!((v - 128).abs() < 64, "pixel ({x},{y}) = {v}");
        }
    }
}

#[test]
fn scale_segments_tile_exactly_reg() {
    // output computed in tiles must match the output computed whole
    let mut input = Bitmap::with_size(20, 20, 0).unwrap();
    input.set_grays(256).unwrap();
    for y in 0..20 {
        for x in 0..20 {
            input.row_mut(y)[x as usize] = (x * 13 + y * 7) as u8;
        }
    }
    let full_in = Rect::new(0, 0, 20, 20);
    let full_out = Rect::new(0, 0, 13, 11);

    let mut s = BitmapScaler::with_sizes(20, 20, 13, 11);
    let mut whole = Bitmap::new();
    s.scale(&full_in, &input, &full_out, &mut whole).unwrap();

    for tile in [
        Rect::new(0, 0, 7, 6),
        Rect::new(7, 0, 6, 6),
        Rect::new(0, 6, 13, 5),
        Rect::new(4, 3, 5, 5),
    ] {
        let mut st = BitmapScaler::with_sizes(20, 20, 13, 11);
        let needed = st.get_input_rect(&tile).unwrap();
        let cropped = input.crop(&needed, 0).unwrap();
        let mut part = Bitmap::new();
        st.scale(&needed, &cropped, &tile, &mut part).unwrap();
        for y in 0..part.rows() {
            for x in 0..part.columns() {
                assert_eq!(
                    part.pixel(x, y),
                    whole.pixel(x + tile.xmin, y + tile.ymin),
                    "tile {tile:?} at ({x},{y})"
                );
            }
        }
    }
}

#[test]
fn scale_with_mapper_geometry_reg() {
    // the mapper picks the source region for a destination rectangle, and
    // the scaler consumes exactly that region
    let mut mapper = RectMapper::new();
    mapper.set_input(&Rect::new(0, 0, 40, 40)).unwrap();
    mapper.set_output(&Rect::new(0, 0, 20, 20)).unwrap();
    let view = Rect::new(5, 5, 10, 10);
    let source_rect = mapper.unmap_rect(&view).unwrap();
    assert_eq!(source_rect, Rect::new(10, 10, 20, 20));

    let input = checker_pgm(40);
    let mut s = BitmapScaler::with_sizes(40, 40, 20, 20);
    let needed = s.get_input_rect(&view).unwrap();
    assert!(Rect::new(0, 0, 40, 40).contains(&needed));
    let cropped = input.crop(&needed, 0).unwrap();
    let mut out = Bitmap::new();
    s.scale(&needed, &cropped, &view, &mut out).unwrap();
    assert_eq!((out.columns(), out.rows()), (10, 10));
}

#[test]
fn scale_rejects_oversized_desired_reg() {
    let input = checker_pgm(8);
    let mut s = BitmapScaler::with_sizes(8, 8, 4, 4);
    let mut out = Bitmap::new();
    let r = s.scale(
        &Rect::new(0, 0, 8, 8),
        &input,
        &Rect::new(0, 0, 5, 4),
        &mut out,
    );
    assert!(matches!(r, Err(ScaleError::RectTooBig)));
}
