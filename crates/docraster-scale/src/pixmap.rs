//! Color raster resampler
//!
//! Same geometry and interpolation contract as the gray resampler, applied
//! independently to the three color channels.  When no pre-reduction shift
//! is in effect the vertical pass reads straight from the input rows and
//! the rolling cache stays unused.

use docraster_core::{Pixel, Pixmap, Rect};

use crate::error::{ScaleError, ScaleResult};
use crate::interp::{FRACBITS, blend, deltas};
use crate::scaler::Scaler;

#[derive(Debug, Default)]
struct RgbCache {
    lines: [Vec<Pixel>; 2],
    ids: [i32; 2],
}

impl RgbCache {
    fn reset(&mut self, bufw: usize) {
        self.lines = [vec![Pixel::default(); bufw], vec![Pixel::default(); bufw]];
        self.ids = [-1, -1];
    }

    fn fetch(
        &mut self,
        fy: i32,
        red: &Rect,
        provided: &Rect,
        input: &Pixmap,
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
            let (mut r, mut g, mut b) = (0i32, 0i32, 0i32);
            let mut s: i32 = 0;
            let sy1 = line.height().min(1 << yshift);
            for sy in 0..sy1 {
                let row = input.row(line.ymin + sy);
                let x2 = (x + sw).min(line.xmax);
                for p in &row[x as usize..x2 as usize] {
                    r += p.r as i32;
                    g += p.g as i32;
                    b += p.b as i32;
                    s += 1;
                }
            }
            dst[di] = if s == rnd + rnd {
                Pixel::new(
                    ((r + rnd) >> div) as u8,
                    ((g + rnd) >> div) as u8,
                    ((b + rnd) >> div) as u8,
                )
            } else {
                Pixel::new(
                    ((r + s / 2) / s) as u8,
                    ((g + s / 2) / s) as u8,
                    ((b + s / 2) / s) as u8,
                )
            };
            di += 1;
            x += sw;
        }
        Ok(())
    }

    fn line(&self, fy: i32, red: &Rect) -> &[Pixel] {
        let fy = fy.clamp(red.ymin, red.ymax - 1);
        if fy == self.ids[1] {
            &self.lines[1]
        } else {
            &self.lines[0]
        }
    }
}

/// Resampler for RGB rasters.
///
/// Holds no internal locking; use one scaler per thread or serialize
/// externally.
#[derive(Debug, Default)]
pub struct PixmapScaler {
    base: Scaler,
    cache: RgbCache,
}

impl PixmapScaler {
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
    /// Same contract as the gray resampler, applied per channel.
    ///
    /// # Errors
    ///
    /// See the gray resampler.
    pub fn scale(
        &mut self,
        provided: &Rect,
        input: &Pixmap,
        desired: &Rect,
        output: &mut Pixmap,
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
        if desired.width() != output.columns() || desired.height() != output.rows() {
            output.init(desired.height(), desired.width())?;
        }

        let bufw = red.width() as usize;
        let mut lbuffer = vec![Pixel::default(); bufw + 2];
        let xshift = self.base.xshift;
        let yshift = self.base.yshift;
        let reducing = xshift > 0 || yshift > 0;
        if reducing {
            self.cache.reset(bufw);
        }
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
            let (lower, upper): (&[Pixel], &[Pixel]) = if reducing {
                self.cache.fetch(fy1, &red, provided, input, xshift, yshift)?;
                self.cache.fetch(fy2, &red, provided, input, xshift, yshift)?;
                (self.cache.line(fy1, &red), self.cache.line(fy2, &red))
            } else {
                let dx = (red.xmin - provided.xmin) as usize;
                let fy1 = fy1.max(red.ymin);
                let fy2 = fy2.min(red.ymax - 1);
                (
                    &input.row(fy1 - provided.ymin)[dx..dx + bufw],
                    &input.row(fy2 - provided.ymin)[dx..dx + bufw],
                )
            };
            let vdeltas = deltas(fy);
            for (d, (l, u)) in lbuffer[1..=bufw].iter_mut().zip(lower.iter().zip(upper)) {
                d.r = blend(vdeltas, l.r as i32, u.r as i32);
                d.g = blend(vdeltas, l.g as i32, u.g as i32);
                d.b = blend(vdeltas, l.b as i32, u.b as i32);
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
                let (lo, hi) = (lbuffer[idx], lbuffer[idx + 1]);
                dest[(x - desired.xmin) as usize] = Pixel::new(
                    blend(hdeltas, lo.r as i32, hi.r as i32),
                    blend(hdeltas, lo.g as i32, hi.g as i32),
                    blend(hdeltas, lo.b as i32, hi.b as i32),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_pixmap(rows: i32, cols: i32, f: impl Fn(i32, i32) -> Pixel) -> Pixmap {
        let mut pm = Pixmap::with_size(rows, cols).unwrap();
        for y in 0..rows {
            for x in 0..cols {
                pm.row_mut(y)[x as usize] = f(x, y);
            }
        }
        pm
    }

    #[test]
    fn test_identity_reproduces_input() {
        let input = color_pixmap(5, 6, |x, y| {
            Pixel::new((x * 40) as u8, (y * 50) as u8, (x + y) as u8)
        });
        let mut s = PixmapScaler::with_sizes(6, 5, 6, 5);
        s.set_horz_ratio(1, 1).unwrap();
        s.set_vert_ratio(1, 1).unwrap();
        let frame = Rect::new(0, 0, 6, 5);
        let mut out = Pixmap::new();
        s.scale(&frame, &input, &frame, &mut out).unwrap();
        for y in 0..5 {
            assert_eq!(out.row(y), input.row(y));
        }
    }

    #[test]
    fn test_box_filter_per_channel() {
        let input = color_pixmap(2, 2, |x, _| {
            if x == 0 {
                Pixel::new(10, 40, 0)
            } else {
                Pixel::new(20, 80, 255)
            }
        });
        let mut s = PixmapScaler::with_sizes(2, 2, 1, 1);
        s.set_horz_ratio(1, 3).unwrap();
        s.set_vert_ratio(1, 3).unwrap();
        let mut out = Pixmap::new();
        s.scale(
            &Rect::new(0, 0, 2, 2),
            &input,
            &Rect::new(0, 0, 1, 1),
            &mut out,
        )
        .unwrap();
        // each channel averages its own 2x2 block with half-adjust
        assert_eq!(out.pixel(0, 0), Pixel::new(15, 60, 128));
    }

    #[test]
    fn test_downscale_smooths_gradient() {
        let input = color_pixmap(8, 8, |x, _| Pixel::new((x * 30) as u8, 0, 0));
        let mut s = PixmapScaler::with_sizes(8, 8, 4, 4);
        let frame_in = Rect::new(0, 0, 8, 8);
        let frame_out = Rect::new(0, 0, 4, 4);
        let mut out = Pixmap::new();
        s.scale(&frame_in, &input, &frame_out, &mut out).unwrap();
        assert_eq!((out.columns(), out.rows()), (4, 4));
        // red stays monotone along x and green/blue stay zero
        let row = out.row(0);
        assert!(row.windows(2).all(|w| w[0].r <= w[1].r));
        assert!(row.iter().all(|p| p.g == 0 && p.b == 0));
    }
}
