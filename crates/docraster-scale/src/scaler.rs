//! Scaler geometry
//!
//! Output-driven resampling works in three coordinate spaces: the full
//! input raster, a "reduced" raster obtained by halving the input `shift`
//! times per axis (box-filter pre-reduction), and the output raster.  The
//! reduction shift is chosen per axis as the largest power of two that
//! keeps the reduced resolution within roughly 2x of the output
//! resolution, bounding interpolation cost regardless of how aggressive
//! the requested downsampling is.
//!
//! For every output pixel the coordinate tables hold a fixed-point position
//! (units of 1/16 pixel) in the reduced raster, computed incrementally with
//! a Bresenham-style accumulator.  The final accumulator value must land
//! exactly on the table endpoint; drift is a logic defect and is reported
//! as a fatal internal-consistency error.

use docraster_core::Rect;

use crate::error::{ScaleError, ScaleResult};
use crate::interp::{FRACBITS, FRACSIZE, FRACSIZE2};

/// Common geometry for the bitmap and pixmap resamplers.
#[derive(Debug, Default)]
pub struct Scaler {
    pub(crate) inw: i32,
    pub(crate) inh: i32,
    pub(crate) xshift: i32,
    pub(crate) yshift: i32,
    pub(crate) redw: i32,
    pub(crate) redh: i32,
    pub(crate) outw: i32,
    pub(crate) outh: i32,
    pub(crate) hcoord: Option<Vec<i32>>,
    pub(crate) vcoord: Option<Vec<i32>>,
}

fn prepare_coord(inmax: i32, outmax: i32, r_in: i32, r_out: i32) -> ScaleResult<Vec<i32>> {
    let len = r_in * FRACSIZE;
    let beg = (len + r_out) / (2 * r_out) - FRACSIZE2;
    let mut coord = Vec::with_capacity(outmax as usize);
    let mut y = beg;
    let mut z = r_out / 2;
    let inmaxlim = (inmax - 1) * FRACSIZE;
    for _ in 0..outmax {
        coord.push(y.min(inmaxlim));
        z += len;
        y += z / r_out;
        z %= r_out;
    }
    // the accumulator must land exactly on the endpoint
    if r_out == outmax && y != beg + len {
        return Err(ScaleError::CoordDrift { expected: beg + len, actual: y });
    }
    Ok(coord)
}

impl Scaler {
    /// Create an unconfigured scaler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input raster size, invalidating the coordinate tables.
    pub fn set_input_size(&mut self, w: i32, h: i32) {
        self.inw = w;
        self.inh = h;
        self.hcoord = None;
        self.vcoord = None;
    }

    /// Set the output raster size, invalidating the coordinate tables.
    pub fn set_output_size(&mut self, w: i32, h: i32) {
        self.outw = w;
        self.outh = h;
        self.hcoord = None;
        self.vcoord = None;
    }

    /// Force the horizontal scaling ratio to `numer/denom`.
    ///
    /// `(0, 0)` derives the ratio from the input and output sizes.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::UndefinedSize`] before both sizes are set and
    /// [`ScaleError::BadRatio`] unless both terms are positive.
    pub fn set_horz_ratio(&mut self, numer: i32, denom: i32) -> ScaleResult<()> {
        if !(self.inw > 0 && self.inh > 0 && self.outw > 0 && self.outh > 0) {
            return Err(ScaleError::UndefinedSize);
        }
        let (mut numer, denom) = if numer == 0 && denom == 0 {
            (self.outw, self.inw)
        } else if numer <= 0 || denom <= 0 {
            return Err(ScaleError::BadRatio { numer, denom });
        } else {
            (numer, denom)
        };
        // largest power-of-two reduction keeping 2*numer >= denom
        self.xshift = 0;
        self.redw = self.inw;
        while numer + numer < denom {
            self.xshift += 1;
            self.redw = (self.redw + 1) >> 1;
            numer <<= 1;
        }
        self.hcoord = Some(prepare_coord(self.redw, self.outw, denom, numer)?);
        Ok(())
    }

    /// Force the vertical scaling ratio to `numer/denom`.
    ///
    /// `(0, 0)` derives the ratio from the input and output sizes.
    ///
    /// # Errors
    ///
    /// See [`set_horz_ratio`](Self::set_horz_ratio).
    pub fn set_vert_ratio(&mut self, numer: i32, denom: i32) -> ScaleResult<()> {
        if !(self.inw > 0 && self.inh > 0 && self.outw > 0 && self.outh > 0) {
            return Err(ScaleError::UndefinedSize);
        }
        let (mut numer, denom) = if numer == 0 && denom == 0 {
            (self.outh, self.inh)
        } else if numer <= 0 || denom <= 0 {
            return Err(ScaleError::BadRatio { numer, denom });
        } else {
            (numer, denom)
        };
        self.yshift = 0;
        self.redh = self.inh;
        while numer + numer < denom {
            self.yshift += 1;
            self.redh = (self.redh + 1) >> 1;
            numer <<= 1;
        }
        self.vcoord = Some(prepare_coord(self.redh, self.outh, denom, numer)?);
        Ok(())
    }

    /// Compute the reduced-space and full-input rectangles needed to
    /// produce `desired` output pixels.
    pub(crate) fn make_rectangles(&mut self, desired: &Rect) -> ScaleResult<(Rect, Rect)> {
        if desired.is_empty() {
            return Err(ScaleError::EmptyRect);
        }
        if desired.xmin < 0 || desired.ymin < 0 || desired.xmax > self.outw || desired.ymax > self.outh
        {
            return Err(ScaleError::RectTooBig);
        }
        if self.vcoord.is_none() {
            self.set_vert_ratio(0, 0)?;
        }
        if self.hcoord.is_none() {
            self.set_horz_ratio(0, 0)?;
        }
        let hcoord = self.hcoord.as_ref().ok_or(ScaleError::UndefinedSize)?;
        let vcoord = self.vcoord.as_ref().ok_or(ScaleError::UndefinedSize)?;
        let mut red = Rect {
            xmin: hcoord[desired.xmin as usize] >> FRACBITS,
            ymin: vcoord[desired.ymin as usize] >> FRACBITS,
            xmax: (hcoord[(desired.xmax - 1) as usize] + FRACSIZE - 1) >> FRACBITS,
            ymax: (vcoord[(desired.ymax - 1) as usize] + FRACSIZE - 1) >> FRACBITS,
        };
        // expand by the +/-1 bilinear neighborhood and clamp
        red.xmin = red.xmin.max(0);
        red.xmax = (red.xmax + 1).min(self.redw);
        red.ymin = red.ymin.max(0);
        red.ymax = (red.ymax + 1).min(self.redh);
        let inp = Rect {
            xmin: (red.xmin << self.xshift).max(0),
            xmax: (red.xmax << self.xshift).min(self.inw),
            ymin: (red.ymin << self.yshift).max(0),
            ymax: (red.ymax << self.yshift).min(self.inh),
        };
        Ok((red, inp))
    }

    /// Which input pixels are required to compute the `desired_output`
    /// rectangle of the output raster.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::RectTooBig`] when `desired_output` exceeds the
    /// configured output size.
    pub fn get_input_rect(&mut self, desired_output: &Rect) -> ScaleResult<Rect> {
        let (_red, inp) = self.make_rectangles(desired_output)?;
        Ok(inp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_coord_table() {
        // 1:1 ratio positions every output pixel on its input pixel center
        let mut s = Scaler::new();
        s.set_input_size(8, 8);
        s.set_output_size(8, 8);
        s.set_horz_ratio(1, 1).unwrap();
        assert_eq!(s.xshift, 0);
        assert_eq!(s.redw, 8);
        let coords = s.hcoord.as_ref().unwrap();
        let expected: Vec<i32> = (0..8).map(|x| x * FRACSIZE).collect();
        assert_eq!(coords, &expected);
    }

    #[test]
    fn test_shift_selection() {
        let mut s = Scaler::new();
        s.set_input_size(100, 90);
        s.set_output_size(10, 30);
        // 10/100: doubles the numerator until 2*numer >= denom:
        // 10 -> 20 -> 40 -> 80, three halvings
        s.set_horz_ratio(0, 0).unwrap();
        assert_eq!(s.xshift, 3);
        assert_eq!(s.redw, 13);
        // 30/90: 30+30 < 90 -> shift 1, then 60+60 >= 90
        s.set_vert_ratio(0, 0).unwrap();
        assert_eq!(s.yshift, 1);
        assert_eq!(s.redh, 45);
    }

    #[test]
    fn test_ratio_validation() {
        let mut s = Scaler::new();
        assert!(matches!(s.set_horz_ratio(1, 1), Err(ScaleError::UndefinedSize)));
        s.set_input_size(4, 4);
        s.set_output_size(4, 4);
        assert!(matches!(
            s.set_horz_ratio(-1, 2),
            Err(ScaleError::BadRatio { .. })
        ));
        assert!(matches!(
            s.set_vert_ratio(1, 0),
            Err(ScaleError::BadRatio { .. })
        ));
    }

    #[test]
    fn test_get_input_rect_covers_neighborhood() {
        let mut s = Scaler::new();
        s.set_input_size(100, 100);
        s.set_output_size(50, 50);
        let inp = s.get_input_rect(&Rect::new(10, 10, 10, 10)).unwrap();
        // every requested output pixel maps inside the returned rectangle
        assert!(inp.xmin <= 20 && inp.xmax >= 40);
        assert!(inp.ymin <= 20 && inp.ymax >= 40);
        assert!(inp.xmax <= 100 && inp.ymax <= 100);

        assert!(matches!(
            s.get_input_rect(&Rect::new(45, 0, 10, 10)),
            Err(ScaleError::RectTooBig)
        ));
    }

    #[test]
    fn test_input_rect_full_frame() {
        let mut s = Scaler::new();
        s.set_input_size(17, 9);
        s.set_output_size(5, 3);
        let inp = s.get_input_rect(&Rect::new(0, 0, 5, 3)).unwrap();
        assert_eq!(inp, Rect::new(0, 0, 17, 9));
    }
}
