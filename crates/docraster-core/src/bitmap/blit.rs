//! Additive compositing
//!
//! `blit` accumulates a source raster into a destination raster with
//! saturation-free byte addition (`dest += src`), so multiple
//! non-overlapping glyphs can be stacked onto a page-sized canvas.  The
//! source is consumed from whichever representation it currently holds; a
//! run-length source streams its runs and touches only destination pixels
//! under ink runs.
//!
//! The subsampling variant divides source offsets with Euclidean (floor)
//! division so that partial coverage at negative offsets lands in the
//! correct destination bucket.

use super::Bitmap;
use super::rle::RunReader;
use crate::error::{Error, Result};
use crate::shared;

/// Floor division with non-negative remainder.
fn euclidian_ratio(a: i32, b: i32) -> (i32, i32) {
    let mut q = a / b;
    let mut r = a - b * q;
    if r < 0 {
        q -= 1;
        r += b;
    }
    (q, r)
}

impl Bitmap {
    /// Add the pixels of `src` into this raster at offset `(x, y)`.
    ///
    /// Out-of-bounds parts of the source are ignored.  The destination grid
    /// is materialized first; the source is read as it is.
    pub fn blit(&mut self, src: &Bitmap, x: i32, y: i32) -> Result<()> {
        // Fully outside the destination
        if x >= self.ncolumns
            || y >= self.nrows
            || x + src.ncolumns < 0
            || y + src.nrows < 0
        {
            return Ok(());
        }
        let (_lock1, _lock2) = shared::lock_pair(self.slot, src.slot);
        if src.has_pixels() {
            self.uncompress_impl()?;
            for sr in 0..src.nrows {
                if sr + y >= 0 && sr + y < self.nrows {
                    let mut sc = (-x).max(0);
                    let sc1 = src.ncolumns.min(self.ncolumns - x);
                    let srow = src.row(sr);
                    let drow = self.row_mut(y + sr);
                    while sc < sc1 {
                        let d = (x + sc) as usize;
                        drow[d] = drow[d].wrapping_add(srow[sc as usize]);
                        sc += 1;
                    }
                }
            }
        } else if let Some(runs) = src.runs() {
            self.uncompress_impl()?;
            let mut rr = RunReader::new(runs);
            let mut sr = src.nrows - 1;
            let mut sc: i32 = 0;
            let mut p = false;
            while sr >= 0 {
                let z = rr.next_run()?;
                if sc + z > src.ncolumns {
                    return Err(Error::LostSync);
                }
                let nc = sc + z;
                if p && sr + y >= 0 && sr + y < self.nrows {
                    if sc + x < 0 {
                        sc = (-x).min(nc);
                    }
                    let ncols = self.ncolumns;
                    let drow = self.row_mut(y + sr);
                    while sc < nc && sc + x < ncols {
                        let d = (sc + x) as usize;
                        drow[d] = drow[d].wrapping_add(1);
                        sc += 1;
                    }
                }
                sc = nc;
                p = !p;
                if sc >= src.ncolumns {
                    p = false;
                    sc = 0;
                    sr -= 1;
                }
            }
        }
        Ok(())
    }

    /// Add `src` into this raster at offset `(xh, yh)` given in source
    /// resolution, reducing it by the integer factor `subsample`.
    ///
    /// Each destination pixel accumulates the sum of the source pixels of
    /// its `subsample x subsample` bucket, so sub-pixel contributions from
    /// partially covered cells all land in the correct bucket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadSubsample`] when `subsample < 1`.
    pub fn blit_subsampled(&mut self, src: &Bitmap, xh: i32, yh: i32, subsample: i32) -> Result<()> {
        if subsample < 1 {
            return Err(Error::BadSubsample(subsample));
        }
        if subsample == 1 {
            return self.blit(src, xh, yh);
        }
        if xh >= self.ncolumns * subsample
            || yh >= self.nrows * subsample
            || xh + src.ncolumns < 0
            || yh + src.nrows < 0
        {
            return Ok(());
        }
        let (_lock1, _lock2) = shared::lock_pair(self.slot, src.slot);
        if src.has_pixels() {
            self.uncompress_impl()?;
            let (mut dr, mut dr1) = euclidian_ratio(yh, subsample);
            let (zdc, zdc1) = euclidian_ratio(xh, subsample);
            for sr in 0..src.nrows {
                if dr >= 0 && dr < self.nrows {
                    let mut dc = zdc;
                    let mut dc1 = zdc1;
                    let srow = src.row(sr);
                    let drow = self.row_mut(dr);
                    for sc in 0..src.ncolumns {
                        if dc >= 0 && dc < drow.len() as i32 {
                            let d = dc as usize;
                            drow[d] = drow[d].wrapping_add(srow[sc as usize]);
                        }
                        dc1 += 1;
                        if dc1 >= subsample {
                            dc1 = 0;
                            dc += 1;
                        }
                    }
                }
                dr1 += 1;
                if dr1 >= subsample {
                    dr1 = 0;
                    dr += 1;
                }
            }
        } else if let Some(runs) = src.runs() {
            self.uncompress_impl()?;
            let (mut dr, mut dr1) = euclidian_ratio(yh + src.nrows - 1, subsample);
            let (zdc, zdc1) = euclidian_ratio(xh, subsample);
            let mut rr = RunReader::new(runs);
            let mut sr = src.nrows - 1;
            let mut sc: i32 = 0;
            let mut p = false;
            let mut dc = zdc;
            let mut dc1 = zdc1;
            while sr >= 0 {
                let mut z = rr.next_run()?;
                if sc + z > src.ncolumns {
                    return Err(Error::LostSync);
                }
                let nc = sc + z;
                if dr >= 0 && dr < self.nrows {
                    while z > 0 && dc < self.ncolumns {
                        let mut zd = subsample - dc1;
                        if zd > z {
                            zd = z;
                        }
                        if p && dc >= 0 {
                            let drow = self.row_mut(dr);
                            let d = dc as usize;
                            drow[d] = drow[d].wrapping_add(zd as u8);
                        }
                        z -= zd;
                        dc1 += zd;
                        if dc1 >= subsample {
                            dc1 = 0;
                            dc += 1;
                        }
                    }
                }
                sc = nc;
                p = !p;
                if sc >= src.ncolumns {
                    sc = 0;
                    dc = zdc;
                    dc1 = zdc1;
                    p = false;
                    sr -= 1;
                    dr1 -= 1;
                    if dr1 < 0 {
                        dr1 = subsample - 1;
                        dr -= 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph() -> Bitmap {
        let mut g = Bitmap::with_size(2, 3, 0).unwrap();
        g.row_mut(0).copy_from_slice(&[1, 0, 1]);
        g.row_mut(1).copy_from_slice(&[0, 1, 0]);
        g
    }

    #[test]
    fn test_euclidian_ratio() {
        assert_eq!(euclidian_ratio(7, 3), (2, 1));
        assert_eq!(euclidian_ratio(-7, 3), (-3, 2));
        assert_eq!(euclidian_ratio(-6, 3), (-2, 0));
        assert_eq!(euclidian_ratio(0, 4), (0, 0));
    }

    #[test]
    fn test_blit_is_additive() {
        let mut page = Bitmap::with_size(4, 6, 0).unwrap();
        page.set_grays(256).unwrap();
        let g = glyph();
        page.blit(&g, 1, 1).unwrap();
        page.blit(&g, 1, 1).unwrap();
        assert_eq!(page.pixel(1, 1), 2);
        assert_eq!(page.pixel(2, 2), 2);
        assert_eq!(page.pixel(0, 0), 0);
    }

    #[test]
    fn test_blit_from_rle_matches_raw() {
        let mut raw_dst = Bitmap::with_size(5, 7, 0).unwrap();
        raw_dst.set_grays(256).unwrap();
        let mut rle_dst = raw_dst.clone();

        let mut g = glyph();
        raw_dst.blit(&g, 2, 1).unwrap();
        g.compress().unwrap();
        rle_dst.blit(&g, 2, 1).unwrap();
        for y in 0..5 {
            assert_eq!(raw_dst.row(y), rle_dst.row(y));
        }
    }

    #[test]
    fn test_blit_partially_out_of_bounds() {
        let mut page = Bitmap::with_size(3, 3, 0).unwrap();
        page.set_grays(256).unwrap();
        let g = glyph();
        // glyph hangs over the left and bottom edges
        page.blit(&g, -1, -1).unwrap();
        // g(1,1)=1 lands at (0,0); g(2,1)=0 at (1,0)
        assert_eq!(page.pixel(0, 0), 1);
        assert_eq!(page.pixel(1, 0), 0);
        // fully outside is a no-op
        page.blit(&g, 10, 10).unwrap();
        page.blit(&g, -10, -10).unwrap();
        assert!(page.border_is_clean());
    }

    #[test]
    fn test_blit_from_rle_out_of_bounds_matches_raw() {
        for &(x, y) in &[(-1, -1), (-2, 0), (6, 4), (-3, 2), (5, -1)] {
            let mut raw_dst = Bitmap::with_size(5, 7, 0).unwrap();
            raw_dst.set_grays(256).unwrap();
            let mut rle_dst = raw_dst.clone();
            let mut g = glyph();
            raw_dst.blit(&g, x, y).unwrap();
            g.compress().unwrap();
            rle_dst.blit(&g, x, y).unwrap();
            for row in 0..5 {
                assert_eq!(raw_dst.row(row), rle_dst.row(row), "offset ({x},{y})");
            }
        }
    }

    #[test]
    fn test_subsampled_blit_boxes() {
        // 4x4 all-ink source reduced by 2 onto a 2x2 page: each destination
        // bucket collects its 2x2 block sum.
        let mut src = Bitmap::with_size(4, 4, 0).unwrap();
        src.fill(1).unwrap();
        let mut page = Bitmap::with_size(2, 2, 0).unwrap();
        page.set_grays(256).unwrap();
        page.blit_subsampled(&src, 0, 0, 2).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(page.pixel(x, y), 4);
            }
        }
    }

    #[test]
    fn test_subsampled_blit_rle_matches_raw() {
        let mut src = Bitmap::with_size(6, 9, 0).unwrap();
        for y in 0..6 {
            for x in 0..9 {
                if (x + y) % 3 == 0 {
                    src.row_mut(y)[x as usize] = 1;
                }
            }
        }
        for &(x, y, sub) in &[(0, 0, 3), (-2, 1, 3), (1, -2, 2), (4, 3, 2)] {
            let mut raw_dst = Bitmap::with_size(4, 5, 0).unwrap();
            raw_dst.set_grays(256).unwrap();
            let mut rle_dst = raw_dst.clone();
            raw_dst.blit_subsampled(&src, x, y, sub).unwrap();
            let mut packed = src.clone();
            packed.compress().unwrap();
            rle_dst.blit_subsampled(&packed, x, y, sub).unwrap();
            for row in 0..4 {
                assert_eq!(raw_dst.row(row), rle_dst.row(row), "offset ({x},{y}) sub {sub}");
            }
        }
    }

    #[test]
    fn test_subsample_validation() {
        let mut page = Bitmap::with_size(2, 2, 0).unwrap();
        let g = glyph();
        assert!(matches!(
            page.blit_subsampled(&g, 0, 0, 0),
            Err(Error::BadSubsample(0))
        ));
    }
}
