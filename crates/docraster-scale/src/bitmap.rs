//! Gray raster resampler
//!
//! [`BitmapScaler`] computes an arbitrary segment of the rescaled output
//! given the corresponding pixels of the input raster.  Input samples pass
//! through a gray conversion ramp to 256 levels, are box-filter reduced
//! when the geometry calls for a pre-reduction shift, then bilinearly
//! interpolated (vertical pass into a line buffer, horizontal pass into
//! the output row).  Two reduced source lines are kept in a rolling cache
//! so adjacent output rows reuse their box-filter work.
//!
//! The output raster always carries 256 gray levels; callers wanting fewer
//! reduce it explicitly after scaling.

use docraster_core::{Bitmap, Rect};

use crate::error::{ScaleError, ScaleResult};
use crate::interp::{FRACBITS, blend, deltas};
use crate::scaler::Scaler;

#[derive(Debug, Default)]
struct GrayCache {
    lines: [Vec<u8>; 2],
    ids: [i32; 2],
}

impl GrayCache {
    fn reset(&mut self, bufw: usize) {
        self.lines = [vec![0u8; bufw], vec![0u8; bufw]];
        self.ids = [-1, -1];
    }

    /// Make the reduced source line `fy` resident.
    ///
    /// A miss shifts the newest line into the older slot and recomputes
    /// into the freed one; `fy` is clamped to the required reduced rows.
    #[allow(clippy::too_many_arguments)]
    fn fetch(
        &mut self,
        fy: i32,
        red: &Rect,
        provided: &Rect,
        input: &Bitmap,
        conv: &[u8],
        xshift: i32,
        yshift: i32,
    ) -> ScaleResult<()> {
        let fy = fy.clamp(red.ymin, red.ymax - 1);
        if fy == self.ids[1] || fy == self.ids[0] {
            return Ok(());
        }
        self.lines.swap(0, 1);
        self.ids[0] = self.ids[1];
        self.ids[1] = fy;
        let dst = &mut self.lines[1];
        if xshift == 0 && yshift == 0 {
            let dx = (red.xmin - provided.xmin) as usize;
            let dx1 = (red.xmax - provided.xmin) as usize;
            let src = &input.row(fy - provided.ymin)[dx..dx1];
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = conv[s as usize];
            }
        } else {
            // box-filter one reduced line out of a 2^xshift x 2^yshift block
            let mut line = Rect {
                xmin: red.xmin << xshift,
                xmax: red.xmax << xshift,
                ymin: fy << yshift,
                ymax: (fy + 1) << yshift,
            };
            let mut clipped = Rect::default();
            clipped.intersect(&line, provided);
            line = clipped;
            line.translate(-provided.xmin, -provided.ymin);
            let sw = 1 << xshift;
            let div = xshift + yshift;
            let rnd = 1i32 << (div - 1);
            let mut di = 0;
            let mut x = line.xmin;
            while x < line.xmax {
                let mut g: i32 = 0;
                let mut s: i32 = 0;
                let sy1 = line.height().min(1 << yshift);
                for sy in 0..sy1 {
                    let row = input.row(line.ymin + sy);
                    let x2 = (x + sw).min(line.xmax);
                    for &v in &row[x as usize..x2 as usize] {
                        g += conv[v as usize] as i32;
                        s += 1;
                    }
                }
                dst[di] = if s == rnd + rnd {
                    ((g + rnd) >> div) as u8
                } else {
                    ((g + s / 2) / s) as u8
                };
                di += 1;
                x += sw;
            }
        }
        Ok(())
    }

    /// Borrow the cached reduced line `fy` (clamped as in `fetch`).
    fn line(&self, fy: i32, red: &Rect) -> &[u8] {
        let fy = fy.clamp(red.ymin, red.ymax - 1);
        if fy == self.ids[1] {
            &self.lines[1]
        } else {
            &self.lines[0]
        }
    }
}

/// Resampler for gray rasters.
///
/// Holds no internal locking; use one scaler per thread or serialize
/// externally.
#[derive(Debug, Default)]
pub struct BitmapScaler {
    base: Scaler,
    cache: GrayCache,
    conv: Vec<u8>,
}

impl BitmapScaler {
    /// Create an unconfigured scaler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scaler configured for the given input and output sizes.
    pub fn with_sizes(inw: i32, inh: i32, outw: i32, outh: i32) -> Self {
        let mut s = Self::default();
        s.set_input_size(inw, inh);
        s.set_output_size(outw, outh);
        s
    }

    /// Set the input raster size.
    pub fn set_input_size(&mut self, w: i32, h: i32) {
        self.base.set_input_size(w, h);
    }

    /// Set the output raster size.
    pub fn set_output_size(&mut self, w: i32, h: i32) {
        self.base.set_output_size(w, h);
    }

    /// Force the horizontal scaling ratio; `(0, 0)` derives it from the
    /// sizes.
    pub fn set_horz_ratio(&mut self, numer: i32, denom: i32) -> ScaleResult<()> {
        self.base.set_horz_ratio(numer, denom)
    }

    /// Force the vertical scaling ratio; `(0, 0)` derives it from the
    /// sizes.
    pub fn set_vert_ratio(&mut self, numer: i32, denom: i32) -> ScaleResult<()> {
        self.base.set_vert_ratio(numer, denom)
    }

    /// Which input pixels are required to compute `desired_output`.
    pub fn get_input_rect(&mut self, desired_output: &Rect) -> ScaleResult<Rect> {
        self.base.get_input_rect(desired_output)
    }

    /// Compute the `desired` segment of the output raster.
    ///
    /// `provided` locates `input` within the full input raster; it must
    /// match the input's actual size and cover the required input
    /// rectangle.  `output` is resized to `desired` and always holds 256
    /// gray levels afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::SizeMismatch`], [`ScaleError::InputTooSmall`]
    /// or [`ScaleError::NoPixelGrid`] on precondition violations and
    /// [`ScaleError::CoordDrift`] on internal-consistency failure.
    pub fn scale(
        &mut self,
        provided: &Rect,
        input: &Bitmap,
        desired: &Rect,
        output: &mut Bitmap,
    ) -> ScaleResult<()> {
        let (red, required) = self.base.make_rectangles(desired)?;
        if provided.width() != input.columns() || provided.height() != input.rows() {
            return Err(ScaleError::SizeMismatch {
                provided_w: provided.width(),
                provided_h: provided.height(),
                input_w: input.columns(),
                input_h: input.rows(),
            });
        }
        if provided.xmin > required.xmin
            || provided.ymin > required.ymin
            || provided.xmax < required.xmax
            || provided.ymax < required.ymax
        {
            return Err(ScaleError::InputTooSmall);
        }
        if !input.has_pixels() {
            return Err(ScaleError::NoPixelGrid);
        }
        if desired.width() != output.columns() || desired.height() != output.rows() {
            output.init(desired.height(), desired.width(), 0)?;
        }
        output.set_grays(256)?;

        let bufw = red.width() as usize;
        let mut lbuffer = vec![0u8; bufw + 2];
        self.cache.reset(bufw);
        // gray conversion ramp to 256 levels
        let maxgray = input.grays() - 1;
        self.conv = (0..256i32)
            .map(|i| {
                if i <= maxgray {
                    ((i * 255 + (maxgray >> 1)) / maxgray) as u8
                } else {
                    255
                }
            })
            .collect();

        let xshift = self.base.xshift;
        let yshift = self.base.yshift;
        let Some(vcoord) = self.base.vcoord.as_deref() else {
            return Err(ScaleError::UndefinedSize);
        };
        let Some(hcoord) = self.base.hcoord.as_deref() else {
            return Err(ScaleError::UndefinedSize);
        };

        for y in desired.ymin..desired.ymax {
            // vertical interpolation between two reduced lines
            let fy = vcoord[y as usize];
            let fy1 = fy >> FRACBITS;
            let fy2 = fy1 + 1;
            self.cache
                .fetch(fy1, &red, provided, input, &self.conv, xshift, yshift)?;
            self.cache
                .fetch(fy2, &red, provided, input, &self.conv, xshift, yshift)?;
            let lower = self.cache.line(fy1, &red);
            let upper = self.cache.line(fy2, &red);
            let vdeltas = deltas(fy);
            for (d, (&l, &u)) in lbuffer[1..=bufw].iter_mut().zip(lower.iter().zip(upper)) {
                *d = blend(vdeltas, l as i32, u as i32);
            }
            // duplicate the ends so the horizontal pass can read one past
            lbuffer[0] = lbuffer[1];
            lbuffer[bufw + 1] = lbuffer[bufw];
            // horizontal interpolation into the output row
            let dest = output.row_mut(y - desired.ymin);
            for x in desired.xmin..desired.xmax {
                let n = hcoord[x as usize];
                let idx = ((n >> FRACBITS) - red.xmin + 1) as usize;
                let hdeltas = deltas(n);
                dest[(x - desired.xmin) as usize] =
                    blend(hdeltas, lbuffer[idx] as i32, lbuffer[idx + 1] as i32);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_bitmap(rows: i32, cols: i32, f: impl Fn(i32, i32) -> u8) -> Bitmap {
        let mut bm = Bitmap::with_size(rows, cols, 0).unwrap();
        bm.set_grays(256).unwrap();
        for y in 0..rows {
            for x in 0..cols {
                bm.row_mut(y)[x as usize] = f(x, y);
            }
        }
        bm
    }

    #[test]
    fn test_identity_reproduces_input() {
        let input = gray_bitmap(7, 9, |x, y| (x * 25 + y * 3) as u8);
        let mut s = BitmapScaler::with_sizes(9, 7, 9, 7);
        s.set_horz_ratio(1, 1).unwrap();
        s.set_vert_ratio(1, 1).unwrap();
        let frame = Rect::new(0, 0, 9, 7);
        let mut out = Bitmap::new();
        s.scale(&frame, &input, &frame, &mut out).unwrap();
        assert_eq!(out.grays(), 256);
        for y in 0..7 {
            assert_eq!(out.row(y), input.row(y));
        }
    }

    #[test]
    fn test_box_filter_rounding() {
        // 2x2 block [10, 20, 10, 20] reduced with shift 1 on both axes:
        // (10+20+10+20+2)/4 = 15
        let input = gray_bitmap(2, 2, |x, _| if x == 0 { 10 } else { 20 });
        let mut s = BitmapScaler::with_sizes(2, 2, 1, 1);
        s.set_horz_ratio(1, 3).unwrap();
        s.set_vert_ratio(1, 3).unwrap();
        let provided = Rect::new(0, 0, 2, 2);
        let desired = Rect::new(0, 0, 1, 1);
        let mut out = Bitmap::new();
        s.scale(&provided, &input, &desired, &mut out).unwrap();
        assert_eq!(out.pixel(0, 0), 15);
    }

    #[test]
    fn test_bilevel_input_expands_to_256() {
        let input = gray_bitmap(4, 4, |x, y| ((x + y) % 2) as u8);
        let mut bilevel = input.clone();
        // conv ramp maps level 1 of a 2-level raster to 255
        let mut s = BitmapScaler::with_sizes(4, 4, 4, 4);
        s.set_horz_ratio(1, 1).unwrap();
        s.set_vert_ratio(1, 1).unwrap();
        bilevel.set_grays(2).unwrap();
        let frame = Rect::new(0, 0, 4, 4);
        let mut out = Bitmap::new();
        s.scale(&frame, &bilevel, &frame, &mut out).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let expected = if input.pixel(x, y) != 0 { 255 } else { 0 };
                assert_eq!(out.pixel(x, y), expected);
            }
        }
    }

    #[test]
    fn test_scale_validates_provided_rect() {
        let input = gray_bitmap(4, 4, |_, _| 0);
        let mut s = BitmapScaler::with_sizes(8, 8, 4, 4);
        let mut out = Bitmap::new();
        // declared size does not match the raster
        assert!(matches!(
            s.scale(
                &Rect::new(0, 0, 8, 8),
                &input,
                &Rect::new(0, 0, 4, 4),
                &mut out
            ),
            Err(ScaleError::SizeMismatch { .. })
        ));
        // declared size matches but does not cover the required input
        assert!(matches!(
            s.scale(
                &Rect::new(0, 0, 4, 4),
                &input,
                &Rect::new(0, 0, 4, 4),
                &mut out
            ),
            Err(ScaleError::InputTooSmall)
        ));
    }

    #[test]
    fn test_partial_output_segment_matches_full() {
        let input = gray_bitmap(16, 16, |x, y| (x * 16 + y) as u8);
        let full_frame = Rect::new(0, 0, 16, 16);
        let out_frame = Rect::new(0, 0, 8, 8);

        let mut s = BitmapScaler::with_sizes(16, 16, 8, 8);
        let mut whole = Bitmap::new();
        s.scale(&full_frame, &input, &out_frame, &mut whole).unwrap();

        // recompute rows 2..6, columns 1..7 from only the required input
        let mut s2 = BitmapScaler::with_sizes(16, 16, 8, 8);
        let segment = Rect::new(1, 2, 6, 4);
        let needed = s2.get_input_rect(&segment).unwrap();
        let cropped = input.crop(&needed, 0).unwrap();
        let mut part = Bitmap::new();
        s2.scale(&needed, &cropped, &segment, &mut part).unwrap();

        for y in 0..part.rows() {
            for x in 0..part.columns() {
                assert_eq!(
                    part.pixel(x, y),
                    whole.pixel(x + segment.xmin, y + segment.ymin),
                    "mismatch at ({x},{y})"
                );
            }
        }
    }
}
