//! Points, affine transformations and boxes
use std::{
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

pub type Scalar = f64;
pub const EPSILON: f64 = f64::EPSILON;
/// Square root of [`EPSILON`]
pub const EPSILON_SQRT: f64 = 1.490_116_119_384_765_6e-8;
pub const PI: f64 = std::f64::consts::PI;

/// Short human readable scalar: integers without a fraction, tiny and huge values in
/// exponent form, everything else rounded to six fractional digits.
fn scalar_fmt(f: &mut fmt::Formatter<'_>, value: Scalar) -> fmt::Result {
    let magnitude = value.abs();
    if value.fract() == 0.0 && magnitude < 1e15 {
        write!(f, "{}", value as i64)
    } else if magnitude >= 1e5 || magnitude < 1e-4 {
        write!(f, "{:.3e}", value)
    } else {
        write!(f, "{}", (value * 1e6).round() / 1e6)
    }
}

/// 2D point, also used as a vector
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Point(pub [Scalar; 2]);

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        scalar_fmt(f, self.x())?;
        f.write_str(",")?;
        scalar_fmt(f, self.y())
    }
}

impl Point {
    #[inline]
    pub const fn new(x: Scalar, y: Scalar) -> Self {
        Self([x, y])
    }

    #[inline]
    pub fn x(self) -> Scalar {
        self.0[0]
    }

    #[inline]
    pub fn y(self) -> Scalar {
        self.0[1]
    }

    /// Euclidean norm
    pub fn length(self) -> Scalar {
        self.x().hypot(self.y())
    }

    pub fn dist(self, other: Self) -> Scalar {
        (other - self).length()
    }

    pub fn dot(self, other: Self) -> Scalar {
        self.x() * other.x() + self.y() * other.y()
    }

    /// Z component of the 3D cross product, positive when `other` is
    /// counter-clockwise from `self` in a y-up frame
    pub fn cross(self, other: Self) -> Scalar {
        self.x() * other.y() - self.y() * other.x()
    }

    /// Vector rotated by a right angle `(y, -x)`, keeps the length
    pub fn normal(self) -> Point {
        Self([self.y(), -self.x()])
    }

    /// Unit vector with the same direction, `None` for a zero vector
    pub fn normalize(self) -> Option<Point> {
        let length = self.length();
        (length >= EPSILON).then(|| self / length)
    }

    /// Direction angle in `(-PI, PI]`
    pub fn angle(self) -> Scalar {
        self.y().atan2(self.x())
    }

    /// Signed angle of the rotation that takes `self` to `other`
    pub fn angle_between(self, other: Self) -> Option<Scalar> {
        let lengths = self.length() * other.length();
        if lengths < EPSILON {
            return None;
        }
        let angle = (self.dot(other) / lengths).clamp(-1.0, 1.0).acos();
        Some(if self.cross(other) < 0.0 { -angle } else { angle })
    }

    /// Both coordinates are within [`EPSILON`] of the other point
    pub fn is_close_to(self, other: Point) -> bool {
        (self.x() - other.x()).abs() < EPSILON && (self.y() - other.y()).abs() < EPSILON
    }
}

impl From<(Scalar, Scalar)> for Point {
    #[inline]
    fn from((x, y): (Scalar, Scalar)) -> Self {
        Self([x, y])
    }
}

impl From<[Scalar; 2]> for Point {
    #[inline]
    fn from(xy: [Scalar; 2]) -> Self {
        Self(xy)
    }
}

macro_rules! point_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Point {
            type Output = Point;

            #[inline]
            fn $method(self, other: Point) -> Point {
                Point([self.0[0] $op other.0[0], self.0[1] $op other.0[1]])
            }
        }
    };
}

point_binop!(Add, add, +);
point_binop!(Sub, sub, -);

impl Mul<Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, point: Point) -> Point {
        Point([self * point.0[0], self * point.0[1]])
    }
}

impl Mul<&Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, point: &Point) -> Point {
        self * *point
    }
}

impl Div<Scalar> for Point {
    type Output = Point;

    #[inline]
    fn div(self, scale: Scalar) -> Point {
        Point([self.0[0] / scale, self.0[1] / scale])
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point([-self.0[0], -self.0[1]])
    }
}

/// Placement of a box inside a larger one along both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Align {
    Min,
    Mid,
    Max,
}

/// Affine transformation `screen = M * world`
///
/// Coefficients are kept row by row `[m00, m01, m02, m10, m11, m12]`, the implied
/// last row is `[0, 0, 1]`. Builder methods (`translate`, `scale`, `rotate`, `skew`)
/// multiply on the right, so the most recently added operation is the first one
/// applied to world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform([Scalar; 6]);

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(
        m00: Scalar,
        m01: Scalar,
        m02: Scalar,
        m10: Scalar,
        m11: Scalar,
        m12: Scalar,
    ) -> Self {
        Self([m00, m01, m02, m10, m11, m12])
    }

    pub fn identity() -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }

    pub fn new_translate(tx: Scalar, ty: Scalar) -> Self {
        Self([1.0, 0.0, tx, 0.0, 1.0, ty])
    }

    /// Coefficients `[m00, m01, m02, m10, m11, m12]`
    pub fn to_array(self) -> [Scalar; 6] {
        self.0
    }

    pub fn apply(&self, point: Point) -> Point {
        let [m00, m01, m02, m10, m11, m12] = self.0;
        let Point([x, y]) = point;
        Point([m00 * x + m01 * y + m02, m10 * x + m11 * y + m12])
    }

    /// Determinant of the 2x2 linear part
    pub fn determinant(&self) -> Scalar {
        let [m00, m01, _, m10, m11, _] = self.0;
        m00 * m11 - m01 * m10
    }

    pub fn is_degenerate(&self) -> bool {
        self.determinant().abs() <= EPSILON
    }

    /// Inverse transformation, `None` if the transformation is degenerate
    pub fn invert(&self) -> Option<Self> {
        if self.is_degenerate() {
            return None;
        }
        let [m00, m01, m02, m10, m11, m12] = self.0;
        let det = self.determinant();
        // inverse linear part via adjugate, translation is mapped back through it
        let (i00, i01, i10, i11) = (m11 / det, -m01 / det, -m10 / det, m00 / det);
        Some(Self([
            i00,
            i01,
            -(i00 * m02 + i01 * m12),
            i10,
            i11,
            -(i10 * m02 + i11 * m12),
        ]))
    }

    pub fn translate(&self, tx: Scalar, ty: Scalar) -> Self {
        self.matmul(Self::new_translate(tx, ty))
    }

    pub fn scale(&self, sx: Scalar, sy: Scalar) -> Self {
        self.matmul(Self([sx, 0.0, 0.0, 0.0, sy, 0.0]))
    }

    /// Rotation by `angle` radians, from the x axis towards the y axis
    pub fn rotate(&self, angle: Scalar) -> Self {
        let (sin, cos) = angle.sin_cos();
        self.matmul(Self([cos, -sin, 0.0, sin, cos, 0.0]))
    }

    /// Skew by angles `ax` (along x) and `ay` (along y)
    pub fn skew(&self, ax: Scalar, ay: Scalar) -> Self {
        self.matmul(Self([1.0, ax.tan(), 0.0, ay.tan(), 1.0, 0.0]))
    }

    /// Matrix product `self * other`
    pub fn matmul(&self, other: Transform) -> Self {
        let [a00, a01, a02, a10, a11, a12] = self.0;
        let [b00, b01, b02, b10, b11, b12] = other.0;
        Self([
            a00 * b00 + a01 * b10,
            a00 * b01 + a01 * b11,
            a00 * b02 + a01 * b12 + a02,
            a10 * b00 + a11 * b10,
            a10 * b01 + a11 * b11,
            a10 * b02 + a11 * b12 + a12,
        ])
    }

    /// Screen length of a unit world length
    ///
    /// Measured along the diagonal: `|M(1, 1) - M(0, 0)| / sqrt(2)`.
    pub fn scale_factor(&self) -> Scalar {
        let [m00, m01, _, m10, m11, _] = self.0;
        Point::new(m00 + m01, m10 + m11).length() * std::f64::consts::FRAC_1_SQRT_2
    }

    /// Maps `rect` onto a parallelogram
    ///
    /// `parl` holds the images of the `(x0, y0)`, `(x1, y0)` and `(x1, y1)` corners.
    /// Returns `None` for an empty rectangle.
    pub fn rect_to_parl(rect: BBox, parl: [Point; 3]) -> Option<Self> {
        if rect.width() < EPSILON || rect.height() < EPSILON {
            return None;
        }
        let [p0, p1, p2] = parl;
        let u = p1 - p0;
        let v = p2 - p1;
        let unit_to_parl = Self([u.x(), v.x(), p0.x(), u.y(), v.y(), p0.y()]);
        let rect_to_unit = Self::identity()
            .scale(rect.width().recip(), rect.height().recip())
            .translate(-rect.x(), -rect.y());
        Some(unit_to_parl * rect_to_unit)
    }

    /// Uniform scale that fits `src` inside `dst`, placed according to `align`
    pub fn fit(src: BBox, dst: BBox, align: Align) -> Transform {
        let scale = (dst.width() / src.width()).min(dst.height() / src.height());
        let slack = |free: Scalar| match align {
            Align::Min => 0.0,
            Align::Mid => free / 2.0,
            Align::Max => free,
        };
        let dx = slack(dst.width() - src.width() * scale);
        let dy = slack(dst.height() - src.height() * scale);
        Self::new_translate(dst.x() + dx, dst.y() + dy)
            .scale(scale, scale)
            .translate(-src.x(), -src.y())
    }

    /// Non-uniform scale that maps `src` exactly onto `dst`
    pub fn stretch(src: BBox, dst: BBox) -> Transform {
        Self::new_translate(dst.x(), dst.y())
            .scale(dst.width() / src.width(), dst.height() / src.height())
            .translate(-src.x(), -src.y())
    }
}

impl Mul<Transform> for Transform {
    type Output = Transform;

    fn mul(self, other: Transform) -> Self::Output {
        self.matmul(other)
    }
}

/// Axis aligned bounding box
#[derive(Clone, Copy, PartialEq)]
pub struct BBox {
    min: Point,
    max: Point,
}

impl BBox {
    /// Smallest box containing both points
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let (p0, p1) = (p0.into(), p1.into());
        Self {
            min: Point::new(p0.x().min(p1.x()), p0.y().min(p1.y())),
            max: Point::new(p0.x().max(p1.x()), p0.y().max(p1.y())),
        }
    }

    #[inline]
    pub fn min(&self) -> Point {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point {
        self.max
    }

    #[inline]
    pub fn x(&self) -> Scalar {
        self.min.x()
    }

    #[inline]
    pub fn y(&self) -> Scalar {
        self.min.y()
    }

    #[inline]
    pub fn width(&self) -> Scalar {
        self.max.x() - self.min.x()
    }

    #[inline]
    pub fn height(&self) -> Scalar {
        self.max.y() - self.min.y()
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Point) -> bool {
        (self.min.x()..=self.max.x()).contains(&point.x())
            && (self.min.y()..=self.max.y()).contains(&point.y())
    }

    /// Grow the box to include `point`
    pub fn extend(&self, point: Point) -> Self {
        self.union(Self {
            min: point,
            max: point,
        })
    }

    pub fn union(&self, other: BBox) -> Self {
        Self {
            min: Point::new(self.min.x().min(other.min.x()), self.min.y().min(other.min.y())),
            max: Point::new(self.max.x().max(other.max.x()), self.max.y().max(other.max.y())),
        }
    }

    /// Union with an optional box
    pub fn union_opt(&self, other: Option<BBox>) -> Self {
        other.map_or(*self, |other| self.union(other))
    }
}

impl fmt::Debug for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BBox x=")?;
        scalar_fmt(f, self.x())?;
        f.write_str(" y=")?;
        scalar_fmt(f, self.y())?;
        f.write_str(" w=")?;
        scalar_fmt(f, self.width())?;
        f.write_str(" h=")?;
        scalar_fmt(f, self.height())
    }
}

/// Integer clipping rectangle in screen pixels
///
/// Corners are inclusive, `ClipBox::new(0, 0, 7, 7)` covers an 8x8 block of pixels.
/// A box with `x2 < x1` or `y2 < y1` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl ClipBox {
    /// Clip box with normalized corners, `x1 <= x2` and `y1 <= y2`
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Whole `width x height` surface
    pub fn from_size(width: usize, height: usize) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: width as i32 - 1,
            y2: height as i32 - 1,
        }
    }

    pub fn empty() -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: -1,
            y2: -1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x2 < self.x1 || self.y2 < self.y1
    }

    /// Number of pixel columns
    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.x2 - self.x1 + 1) as usize
        }
    }

    /// Number of pixel rows
    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.y2 - self.y1 + 1) as usize
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.x1..=self.x2).contains(&x) && (self.y1..=self.y2).contains(&y)
    }

    /// Common part of two boxes, [`ClipBox::empty`] if they do not overlap
    pub fn intersect(&self, other: ClipBox) -> ClipBox {
        let result = ClipBox {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if result.is_empty() {
            ClipBox::empty()
        } else {
            result
        }
    }
}
