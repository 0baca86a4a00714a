//! Rect, Ratio, RectMapper - rectangle geometry and exact affine mapping
//!
//! A [`Rect`] is an axis-aligned, half-open integer rectangle: it contains
//! the pixels whose horizontal coordinate lies in `xmin` (inclusive) to
//! `xmax` (exclusive) and whose vertical coordinate lies in `ymin`
//! (inclusive) to `ymax` (exclusive).  Point coordinates with integer values
//! sit on pixel corners: pixel `(i,j)` extends from point `(i,j)` to point
//! `(i+1,j+1)`.
//!
//! A [`RectMapper`] relates the points of one rectangle to the points of
//! another through one of the eight symmetries of a rectangle followed by an
//! axis-aligned stretch.  The stretch is carried out with exact rational
//! arithmetic ([`Ratio`]) so that repeated forward/backward mapping cannot
//! drift.

use std::ops::{Div, Mul};

use crate::error::{Error, Result};

/// An axis-aligned, half-open integer rectangle.
///
/// The canonical empty rectangle is `(0,0,0,0)`; all empty rectangles
/// compare equal regardless of their stored coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rect {
    /// Minimal horizontal point coordinate
    pub xmin: i32,
    /// Minimal vertical point coordinate
    pub ymin: i32,
    /// Maximal horizontal point coordinate (exclusive)
    pub xmax: i32,
    /// Maximal vertical point coordinate (exclusive)
    pub ymax: i32,
}

impl Rect {
    /// Create a rectangle from its minimal corner and its measurements.
    pub fn new(xmin: i32, ymin: i32, width: u32, height: u32) -> Self {
        Rect {
            xmin,
            ymin,
            xmax: xmin + width as i32,
            ymax: ymin + height as i32,
        }
    }

    /// Rectangle width.
    #[inline]
    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    /// Rectangle height.
    #[inline]
    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    /// Rectangle area, 0 when empty.
    #[inline]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width() as i64 * self.height() as i64
        }
    }

    /// True when the rectangle contains no pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xmin >= self.xmax || self.ymin >= self.ymax
    }

    /// Reset to the canonical empty rectangle.
    pub fn clear(&mut self) {
        self.xmin = 0;
        self.ymin = 0;
        self.xmax = 0;
        self.ymax = 0;
    }

    /// True when pixel `(x, y)` lies inside the rectangle.
    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.xmin && x < self.xmax && y >= self.ymin && y < self.ymax
    }

    /// True when `rect` lies entirely inside this rectangle.
    ///
    /// Checks that the intersection of the two rectangles is `rect`.
    pub fn contains(&self, rect: &Rect) -> bool {
        let mut tmp = Rect::default();
        tmp.intersect(self, rect);
        tmp == *rect
    }

    /// Push the vertical sides apart by `dx` units and the horizontal sides
    /// apart by `dy` units.  Negative values shrink the rectangle.
    ///
    /// Returns true when the result is non-empty; an empty result is reset
    /// to the canonical empty rectangle.
    pub fn inflate(&mut self, dx: i32, dy: i32) -> bool {
        self.xmin -= dx;
        self.xmax += dx;
        self.ymin -= dy;
        self.ymax += dy;
        self.canonicalize()
    }

    /// Shift the rectangle by `dx` units horizontally and `dy` vertically.
    ///
    /// Returns true when the result is non-empty.
    pub fn translate(&mut self, dx: i32, dy: i32) -> bool {
        self.xmin += dx;
        self.xmax += dx;
        self.ymin += dy;
        self.ymax += dy;
        self.canonicalize()
    }

    /// Set this rectangle to the intersection of `rect1` and `rect2`.
    ///
    /// Returns true when the intersection is non-empty.
    pub fn intersect(&mut self, rect1: &Rect, rect2: &Rect) -> bool {
        self.xmin = rect1.xmin.max(rect2.xmin);
        self.xmax = rect1.xmax.min(rect2.xmax);
        self.ymin = rect1.ymin.max(rect2.ymin);
        self.ymax = rect1.ymax.min(rect2.ymax);
        self.canonicalize()
    }

    /// Set this rectangle to the smallest rectangle containing both `rect1`
    /// and `rect2`.  The hull with an empty rectangle is the other
    /// rectangle, unchanged.
    ///
    /// Returns true when the result is non-empty.
    pub fn recthull(&mut self, rect1: &Rect, rect2: &Rect) -> bool {
        if rect1.is_empty() {
            *self = *rect2;
            return !self.is_empty();
        }
        if rect2.is_empty() {
            *self = *rect1;
            return !self.is_empty();
        }
        self.xmin = rect1.xmin.min(rect2.xmin);
        self.xmax = rect1.xmax.max(rect2.xmax);
        self.ymin = rect1.ymin.min(rect2.ymin);
        self.ymax = rect1.ymax.max(rect2.ymax);
        true
    }

    /// Multiply all four bounds by `factor`, truncating toward zero.
    ///
    /// This is lossy and approximate; exact scaling is the business of
    /// [`RectMapper`].
    pub fn scale(&mut self, factor: f32) {
        self.scale_xy(factor, factor);
    }

    /// Multiply the horizontal bounds by `xfactor` and the vertical bounds
    /// by `yfactor`, truncating toward zero.
    pub fn scale_xy(&mut self, xfactor: f32, yfactor: f32) {
        self.xmin = (self.xmin as f32 * xfactor) as i32;
        self.ymin = (self.ymin as f32 * yfactor) as i32;
        self.xmax = (self.xmax as f32 * xfactor) as i32;
        self.ymax = (self.ymax as f32 * yfactor) as i32;
    }

    fn canonicalize(&mut self) -> bool {
        if self.is_empty() {
            self.clear();
            false
        } else {
            true
        }
    }
}

impl PartialEq for Rect {
    fn eq(&self, other: &Rect) -> bool {
        if self.is_empty() && other.is_empty() {
            return true;
        }
        self.xmin == other.xmin
            && self.xmax == other.xmax
            && self.ymin == other.ymin
            && self.ymax == other.ymax
    }
}

impl Eq for Rect {}

/// A reduced fraction `p/q` with `q > 0`.
///
/// Used to represent scale factors exactly; never stored as floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    p: i32,
    q: i32,
}

impl Ratio {
    /// Build a reduced ratio.
    ///
    /// A negative denominator is normalized by negating both terms, and the
    /// denominator is forced to 1 when the numerator is 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroDenominator`] when `q` is 0.
    pub fn new(mut p: i32, mut q: i32) -> Result<Self> {
        if q == 0 {
            return Err(Error::ZeroDenominator);
        }
        if p == 0 {
            q = 1;
        }
        if q < 0 {
            p = -p;
            q = -q;
        }
        let gcd = Self::gcd(p.unsigned_abs(), q.unsigned_abs()).max(1) as i32;
        Ok(Ratio { p: p / gcd, q: q / gcd })
    }

    /// Numerator of the reduced fraction.
    #[inline]
    pub fn numer(&self) -> i32 {
        self.p
    }

    /// Denominator of the reduced fraction, always positive.
    #[inline]
    pub fn denom(&self) -> i32 {
        self.q
    }

    fn gcd(mut a: u32, mut b: u32) -> u32 {
        while a > 0 {
            let t = b % a;
            b = a;
            a = t;
        }
        b
    }
}

/// Multiply an integer by a ratio, rounding to the nearest integer.
///
/// The computation widens to 64 bits and must stay exact: ties are resolved
/// by half-adjustment, with explicit negation for negative products so that
/// rounding stays symmetric around zero.
impl Mul<Ratio> for i32 {
    type Output = i32;

    fn mul(self, r: Ratio) -> i32 {
        let x = self as i64 * r.p as i64;
        let q = r.q as i64;
        if x >= 0 {
            ((q / 2 + x) / q) as i32
        } else {
            -((q / 2 - x) / q) as i32
        }
    }
}

/// Divide an integer by a ratio, rounding to the nearest integer.
///
/// # Panics
///
/// Panics when the ratio is zero.
impl Div<Ratio> for i32 {
    type Output = i32;

    fn div(self, r: Ratio) -> i32 {
        let x = self as i64 * r.q as i64;
        let p = r.p as i64;
        if x >= 0 {
            ((p / 2 + x) / p) as i32
        } else {
            -((p / 2 - x) / p) as i32
        }
    }
}

const MIRRORX: u8 = 1;
const MIRRORY: u8 = 2;
const SWAPXY: u8 = 4;

/// Maps points of an input rectangle onto points of an output rectangle.
///
/// The transform composes one of the eight symmetries of a rectangle
/// (mirror-x, mirror-y, swap-xy) with the axis-aligned stretch that carries
/// the input rectangle onto the output rectangle.  Scale factors are cached
/// as exact [`Ratio`] values and recomputed lazily after any change to the
/// rectangles or to the swap bit.
#[derive(Debug, Clone)]
pub struct RectMapper {
    rect_from: Rect,
    rect_to: Rect,
    code: u8,
    ratios: Option<(Ratio, Ratio)>,
}

impl Default for RectMapper {
    fn default() -> Self {
        RectMapper {
            rect_from: Rect::new(0, 0, 1, 1),
            rect_to: Rect::new(0, 0, 1, 1),
            code: 0,
            ratios: None,
        }
    }
}

impl RectMapper {
    /// Create a mapper relating two unit rectangles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the mapper state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Set the input rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRect`] when `rect` is empty.
    pub fn set_input(&mut self, rect: &Rect) -> Result<()> {
        if rect.is_empty() {
            return Err(Error::EmptyRect);
        }
        self.rect_from = *rect;
        if self.code & SWAPXY != 0 {
            std::mem::swap(&mut self.rect_from.xmin, &mut self.rect_from.ymin);
            std::mem::swap(&mut self.rect_from.xmax, &mut self.rect_from.ymax);
        }
        self.ratios = None;
        Ok(())
    }

    /// The stored input rectangle.
    pub fn input(&self) -> Rect {
        self.rect_from
    }

    /// Set the output rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRect`] when `rect` is empty.
    pub fn set_output(&mut self, rect: &Rect) -> Result<()> {
        if rect.is_empty() {
            return Err(Error::EmptyRect);
        }
        self.rect_to = *rect;
        self.ratios = None;
        Ok(())
    }

    /// The stored output rectangle.
    pub fn output(&self) -> Rect {
        self.rect_to
    }

    /// Compose a rotation of `count` quarter turns into the transform.
    pub fn rotate(&mut self, count: i32) {
        let oldcode = self.code;
        match count & 3 {
            1 => {
                self.code ^= if self.code & SWAPXY != 0 { MIRRORY } else { MIRRORX };
                self.code ^= SWAPXY;
            }
            2 => {
                self.code ^= MIRRORX | MIRRORY;
            }
            3 => {
                self.code ^= if self.code & SWAPXY != 0 { MIRRORX } else { MIRRORY };
                self.code ^= SWAPXY;
            }
            _ => {}
        }
        if (oldcode ^ self.code) & SWAPXY != 0 {
            std::mem::swap(&mut self.rect_from.xmin, &mut self.rect_from.ymin);
            std::mem::swap(&mut self.rect_from.xmax, &mut self.rect_from.ymax);
            self.ratios = None;
        }
    }

    /// Compose a symmetry about the vertical axis into the transform.
    pub fn mirrorx(&mut self) {
        self.code ^= MIRRORX;
    }

    /// Compose a symmetry about the horizontal axis into the transform.
    pub fn mirrory(&mut self) {
        self.code ^= MIRRORY;
    }

    /// Compute the cached scale ratios.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRect`] when either rectangle is empty.
    fn precalc(&mut self) -> Result<(Ratio, Ratio)> {
        if self.rect_to.is_empty() || self.rect_from.is_empty() {
            return Err(Error::EmptyRect);
        }
        let rw = Ratio::new(self.rect_to.width(), self.rect_from.width())?;
        let rh = Ratio::new(self.rect_to.height(), self.rect_from.height())?;
        self.ratios = Some((rw, rh));
        Ok((rw, rh))
    }

    fn ratios(&mut self) -> Result<(Ratio, Ratio)> {
        match self.ratios {
            Some(r) => Ok(r),
            None => self.precalc(),
        }
    }

    /// Map a point from the input rectangle to the output rectangle.
    ///
    /// Coordinates are rounded to the nearest integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRect`] when the transform is not fully
    /// configured.
    pub fn map(&mut self, x: i32, y: i32) -> Result<(i32, i32)> {
        let (rw, rh) = self.ratios()?;
        let (mut mx, mut my) = (x, y);
        // swap and mirror in input space
        if self.code & SWAPXY != 0 {
            std::mem::swap(&mut mx, &mut my);
        }
        if self.code & MIRRORX != 0 {
            mx = self.rect_from.xmin + self.rect_from.xmax - mx;
        }
        if self.code & MIRRORY != 0 {
            my = self.rect_from.ymin + self.rect_from.ymax - my;
        }
        // scale and translate
        let ox = self.rect_to.xmin + (mx - self.rect_from.xmin) * rw;
        let oy = self.rect_to.ymin + (my - self.rect_from.ymin) * rh;
        Ok((ox, oy))
    }

    /// Map a point from the output rectangle back to the input rectangle.
    ///
    /// Exact inverse of [`map`](Self::map) whenever the scale ratios divide
    /// evenly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRect`] when the transform is not fully
    /// configured.
    pub fn unmap(&mut self, x: i32, y: i32) -> Result<(i32, i32)> {
        let (rw, rh) = self.ratios()?;
        // scale and translate
        let mut mx = self.rect_from.xmin + (x - self.rect_to.xmin) / rw;
        let mut my = self.rect_from.ymin + (y - self.rect_to.ymin) / rh;
        // mirror and swap, in the opposite order from map
        if self.code & MIRRORX != 0 {
            mx = self.rect_from.xmin + self.rect_from.xmax - mx;
        }
        if self.code & MIRRORY != 0 {
            my = self.rect_from.ymin + self.rect_from.ymax - my;
        }
        if self.code & SWAPXY != 0 {
            std::mem::swap(&mut mx, &mut my);
        }
        Ok((mx, my))
    }

    /// Map a rectangle through the transform.
    ///
    /// The two opposite corners are mapped independently, then each axis
    /// pair is re-sorted, since mirroring can invert their order.
    pub fn map_rect(&mut self, rect: &Rect) -> Result<Rect> {
        let mut r = Rect::default();
        (r.xmin, r.ymin) = self.map(rect.xmin, rect.ymin)?;
        (r.xmax, r.ymax) = self.map(rect.xmax, rect.ymax)?;
        if r.xmin > r.xmax {
            std::mem::swap(&mut r.xmin, &mut r.xmax);
        }
        if r.ymin > r.ymax {
            std::mem::swap(&mut r.ymin, &mut r.ymax);
        }
        Ok(r)
    }

    /// Map a rectangle through the inverse transform.
    pub fn unmap_rect(&mut self, rect: &Rect) -> Result<Rect> {
        let mut r = Rect::default();
        (r.xmin, r.ymin) = self.unmap(rect.xmin, rect.ymin)?;
        (r.xmax, r.ymax) = self.unmap(rect.xmax, rect.ymax)?;
        if r.xmin >= r.xmax {
            std::mem::swap(&mut r.xmin, &mut r.xmax);
        }
        if r.ymin >= r.ymax {
            std::mem::swap(&mut r.ymin, &mut r.ymax);
        }
        Ok(r)
    }
}
