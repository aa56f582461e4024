//! Rectangles and 2D affine matrices in page space.
//!
//! Matrices are row-vector affine transforms `[a b c d e f]`:
//! `x' = a*x + c*y + e`, `y' = b*x + d*y + f`. `a.concat(b)` applies `a`
//! first, then `b`.

/// Slack used when snapping float rectangles to whole pixels.
const ROUND_EPSILON: f32 = 0.001;

/// Rectangle in points or fractional pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// A `width`×`height` rectangle anchored at the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Snap outward to the pixel grid, tolerating float noise at the edges.
    ///
    /// The result is never empty: a degenerate axis is widened to one pixel.
    pub fn round(&self) -> IRect {
        let (x0, x1) = snap_axis(self.x0, self.x1);
        let (y0, y1) = snap_axis(self.y0, self.y1);
        IRect { x0, y0, x1, y1 }
    }
}

/// Float-to-int casts saturate, so far-off edges pin to the `i32` range.
fn snap_axis(lo: f32, hi: f32) -> (i32, i32) {
    let lo = (lo + ROUND_EPSILON).floor() as i32;
    let hi = (hi - ROUND_EPSILON).ceil() as i32;
    if hi > lo {
        (lo, hi)
    } else if lo == i32::MAX {
        (lo - 1, lo)
    } else {
        (lo, lo + 1)
    }
}

/// Integer pixel bounding box. Always at least 1×1 when produced by [`Rect::round`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl IRect {
    pub fn width(&self) -> u32 {
        span(self.x0, self.x1)
    }

    pub fn height(&self) -> u32 {
        span(self.y0, self.y1)
    }
}

fn span(lo: i32, hi: i32) -> u32 {
    u32::try_from((i64::from(hi) - i64::from(lo)).max(0)).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation in a y-down space. Quarter turns are exact.
    pub fn rotate(degrees: f32) -> Self {
        let mut deg = degrees % 360.0;
        if deg < 0.0 {
            deg += 360.0;
        }
        let (sin, cos) = if deg.abs() < f32::EPSILON {
            (0.0, 1.0)
        } else if (deg - 90.0).abs() < f32::EPSILON {
            (1.0, 0.0)
        } else if (deg - 180.0).abs() < f32::EPSILON {
            (0.0, -1.0)
        } else if (deg - 270.0).abs() < f32::EPSILON {
            (-1.0, 0.0)
        } else {
            deg.to_radians().sin_cos()
        };
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self` followed by `then`.
    pub fn concat(&self, then: &Matrix) -> Matrix {
        Matrix {
            a: self.a * then.a + self.b * then.c,
            b: self.a * then.b + self.b * then.d,
            c: self.c * then.a + self.d * then.c,
            d: self.c * then.b + self.d * then.d,
            e: self.e * then.a + self.f * then.c + then.e,
            f: self.e * then.b + self.f * then.d + then.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Bounding box of the transformed rectangle.
    pub fn transform_rect(&self, r: &Rect) -> Rect {
        let corners = [
            self.apply(r.x0, r.y0),
            self.apply(r.x1, r.y0),
            self.apply(r.x0, r.y1),
            self.apply(r.x1, r.y1),
        ];
        let mut out = Rect::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in corners {
            out.x0 = out.x0.min(x);
            out.y0 = out.y0.min(y);
            out.x1 = out.x1.max(x);
            out.y1 = out.y1.max(y);
        }
        out
    }

    /// Largest length a unit vector can reach under this matrix's linear part.
    pub fn max_expansion(&self) -> f32 {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        sx.max(sy)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
