//! Line and bezier segments
//!
//! Curves are approximated by lines sampled at uniform parameter steps. The
//! number of steps is derived from an upper bound on the second derivative,
//! since a chord of parameter length `h` deviates from the curve by at most
//! `M * h^2 / 8` where `M` bounds the second derivative.
use crate::{BBox, EPSILON, Point, Scalar, Transform, quadratic_solve};

/// Upper limit on the number of lines produced for a single segment
pub(crate) const FLATTEN_MAX_STEPS: usize = 1024;

/// Operations shared by all segment kinds
pub trait Curve: Sized + Copy + Into<Segment> {
    /// Approximate the curve with lines, no point of the curve is further
    /// than `flatness` away from the produced polyline.
    fn flatten(&self, flatness: Scalar) -> CurveFlattenIter {
        CurveFlattenIter::new(*self, flatness)
    }

    /// Upper bound on the length of the second derivative over `t` in `[0, 1]`
    fn curvature_bound(&self) -> Scalar;

    /// Apply transformation to every control point
    fn transform(&self, tr: Transform) -> Self;

    fn start(&self) -> Point;

    fn end(&self) -> Point;

    /// Evaluate curve at parameter `t` in `[0, 1]`
    fn at(&self, t: Scalar) -> Point;

    /// Tight bounding box of the curve, merged with `init` when provided
    fn bbox(&self, init: Option<BBox>) -> BBox;
}

/// Iterator over lines approximating a segment
#[derive(Debug, Clone)]
pub struct CurveFlattenIter {
    segment: Segment,
    steps: usize,
    step: usize,
    last: Point,
}

impl CurveFlattenIter {
    pub fn new(segment: impl Into<Segment>, flatness: Scalar) -> Self {
        let segment = segment.into();
        let steps = (segment.curvature_bound() / (8.0 * flatness)).sqrt().ceil();
        // NaN saturates to zero and infinity to `usize::MAX`
        let steps = (steps as usize).clamp(1, FLATTEN_MAX_STEPS);
        Self {
            segment,
            steps,
            step: 0,
            last: segment.start(),
        }
    }
}

impl Iterator for CurveFlattenIter {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.steps {
            return None;
        }
        self.step += 1;
        let point = if self.step == self.steps {
            self.segment.end()
        } else {
            self.segment.at(self.step as Scalar / self.steps as Scalar)
        };
        let line = Line([self.last, point]);
        self.last = point;
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remain = self.steps - self.step;
        (remain, Some(remain))
    }
}

impl ExactSizeIterator for CurveFlattenIter {}

/// Extend `bbox` with the curve evaluated at every parameter in `ts` that lies inside `[0, 1]`
fn bbox_with<C: Curve>(curve: &C, init: Option<BBox>, ts: impl Iterator<Item = Scalar>) -> BBox {
    let bbox = BBox::new(curve.start(), curve.end()).union_opt(init);
    ts.filter(|t| (0.0..=1.0).contains(t))
        .fold(bbox, |bbox, t| bbox.extend(curve.at(t)))
}

/// Straight line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line(pub [Point; 2]);

impl Line {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into()])
    }

    pub fn points(&self) -> [Point; 2] {
        self.0
    }
}

impl Curve for Line {
    fn curvature_bound(&self) -> Scalar {
        0.0
    }

    fn transform(&self, tr: Transform) -> Self {
        let Self([p0, p1]) = self;
        Self([tr.apply(*p0), tr.apply(*p1)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[1]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1]) = self;
        (1.0 - t) * p0 + t * p1
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        BBox::new(self.0[0], self.0[1]).union_opt(init)
    }
}

/// Quadratic bezier curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad(pub [Point; 3]);

impl Quad {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into(), p2.into()])
    }

    pub fn points(&self) -> [Point; 3] {
        self.0
    }

    /// Control point of the next smooth quad, reflection of `p1` around `p2`
    pub fn smooth(&self) -> Point {
        let Self([_, p1, p2]) = self;
        2.0 * p2 - *p1
    }
}

impl Curve for Quad {
    fn curvature_bound(&self) -> Scalar {
        let Self([p0, p1, p2]) = *self;
        2.0 * (p0 - 2.0 * p1 + p2).length()
    }

    fn transform(&self, tr: Transform) -> Self {
        let Self([p0, p1, p2]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[2]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2]) = self;
        let s = 1.0 - t;
        (s * s) * p0 + (2.0 * s * t) * p1 + (t * t) * p2
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        // derivative is linear: 2 * ((p1 - p0) + t * (p0 - 2 * p1 + p2))
        let Self([p0, p1, p2]) = *self;
        let a = p0 - 2.0 * p1 + p2;
        let b = p0 - p1;
        let ts = (0..2).filter_map(move |axis| {
            (a.0[axis].abs() > EPSILON).then(|| b.0[axis] / a.0[axis])
        });
        bbox_with(self, init, ts)
    }
}

/// Cubic bezier curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    /// First control point of the next smooth cubic, reflection of `p2` around `p3`
    pub fn smooth(&self) -> Point {
        let Self([_, _, p2, p3]) = self;
        2.0 * p3 - *p2
    }
}

impl Curve for Cubic {
    fn curvature_bound(&self) -> Scalar {
        // second derivative interpolates linearly between its values at the ends
        let Self([p0, p1, p2, p3]) = *self;
        let d0 = (p0 - 2.0 * p1 + p2).length();
        let d1 = (p1 - 2.0 * p2 + p3).length();
        6.0 * d0.max(d1)
    }

    fn transform(&self, tr: Transform) -> Self {
        let Self([p0, p1, p2, p3]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2), tr.apply(*p3)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[3]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = self;
        let s = 1.0 - t;
        (s * s * s) * p0 + (3.0 * s * s * t) * p1 + (3.0 * s * t * t) * p2 + (t * t * t) * p3
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        // derivative divided by 3 is `a * t^2 + b * t + c`
        let Self([p0, p1, p2, p3]) = *self;
        let a = p3 - p0 + 3.0 * (p1 - p2);
        let b = 2.0 * (p0 - 2.0 * p1 + p2);
        let c = p1 - p0;
        let ts = (0..2).flat_map(move |axis| quadratic_solve(a.0[axis], b.0[axis], c.0[axis]));
        bbox_with(self, init, ts)
    }
}

/// Any of the supported segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Line),
    Quad(Quad),
    Cubic(Cubic),
}

macro_rules! segment_dispatch {
    ($segment:expr, $curve:ident => $body:expr) => {
        match $segment {
            Segment::Line($curve) => $body,
            Segment::Quad($curve) => $body,
            Segment::Cubic($curve) => $body,
        }
    };
}

impl Curve for Segment {
    fn curvature_bound(&self) -> Scalar {
        segment_dispatch!(self, curve => curve.curvature_bound())
    }

    fn transform(&self, tr: Transform) -> Self {
        segment_dispatch!(self, curve => curve.transform(tr).into())
    }

    fn start(&self) -> Point {
        segment_dispatch!(self, curve => curve.start())
    }

    fn end(&self) -> Point {
        segment_dispatch!(self, curve => curve.end())
    }

    fn at(&self, t: Scalar) -> Point {
        segment_dispatch!(self, curve => curve.at(t))
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        segment_dispatch!(self, curve => curve.bbox(init))
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<Quad> for Segment {
    fn from(quad: Quad) -> Self {
        Self::Quad(quad)
    }
}

impl From<Cubic> for Segment {
    fn from(cubic: Cubic) -> Self {
        Self::Cubic(cubic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    /// Largest distance from densely sampled curve points to the polyline
    fn max_deviation(curve: impl Curve, lines: &[Line]) -> Scalar {
        let dist = |point: Point, Line([p0, p1]): Line| {
            let dir = p1 - p0;
            let len2 = dir.dot(dir);
            let t = if len2 < EPSILON {
                0.0
            } else {
                ((point - p0).dot(dir) / len2).clamp(0.0, 1.0)
            };
            point.dist(p0 + t * dir)
        };
        (0..=1000)
            .map(|index| curve.at(index as Scalar / 1000.0))
            .map(|point| {
                lines
                    .iter()
                    .map(|line| dist(point, *line))
                    .fold(Scalar::INFINITY, Scalar::min)
            })
            .fold(0.0, Scalar::max)
    }

    #[test]
    fn test_flatten_tolerance() {
        let cubic = Cubic::new((3.0, 7.0), (2.0, 8.0), (0.0, 3.0), (6.0, 5.0));
        let quad = Quad::new((30.0, 90.0), (220.0, 200.0), (120.0, 50.0));
        for flatness in [1.0, 0.1, 0.01] {
            let lines: Vec<_> = cubic.flatten(flatness).collect();
            assert!(max_deviation(cubic, &lines) <= flatness);
            let lines: Vec<_> = quad.flatten(flatness).collect();
            assert!(max_deviation(quad, &lines) <= flatness);
        }

        let coarse = cubic.flatten(0.1).count();
        let fine = cubic.flatten(0.001).count();
        assert!(fine > coarse);
    }

    #[test]
    fn test_flatten_chain() {
        let cubic = Cubic::new((0.0, 0.0), (10.0, 40.0), (60.0, -20.0), (70.0, 30.0));
        let iter = cubic.flatten(0.01);
        let count = iter.len();
        let lines: Vec<_> = iter.collect();
        assert_eq!(lines.len(), count);
        assert_eq!(lines[0].start(), cubic.start());
        assert_eq!(lines[count - 1].end(), cubic.end());
        for pair in lines.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }

        let line = Line::new((0.0, 0.0), (100.0, 50.0));
        let lines: Vec<_> = line.flatten(0.01).collect();
        assert_eq!(lines, vec![line]);

        // non-positive flatness must not hang or explode
        assert_eq!(cubic.flatten(0.0).count(), FLATTEN_MAX_STEPS);
        assert_eq!(cubic.flatten(-1.0).count(), 1);
    }

    #[test]
    fn test_smooth() {
        let quad = Quad::new((0.0, 0.0), (1.0, 1.0), (2.0, 0.0));
        assert_eq!(quad.smooth(), Point::new(3.0, -1.0));
        let cubic = Cubic::new((0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0));
        assert_eq!(cubic.smooth(), Point::new(4.0, -1.0));
    }

    #[test]
    fn test_transform() {
        let tr = Transform::new_translate(10.0, 0.0).scale(2.0, 2.0);
        let segment: Segment = Quad::new((0.0, 0.0), (1.0, 2.0), (2.0, 0.0)).into();
        let moved = segment.transform(tr);
        assert!(moved.start().is_close_to(Point::new(10.0, 0.0)));
        assert!(moved.end().is_close_to(Point::new(14.0, 0.0)));
        assert!(moved.at(0.5).is_close_to(tr.apply(segment.at(0.5))));
    }

    #[test]
    fn test_bbox() {
        let cubic = Cubic::new((106.0, 0.0), (0.0, 100.0), (382.0, 216.0), (324.0, 14.0));
        let bbox = cubic.bbox(None);
        assert_approx_eq!(bbox.x(), 87.308, 0.001);
        assert_approx_eq!(bbox.y(), 0.0, 0.001);
        assert_approx_eq!(bbox.width(), 242.724, 0.001);
        assert_approx_eq!(bbox.height(), 125.140, 0.001);

        let quad = Quad::new((30.0, 90.0), (220.0, 200.0), (120.0, 50.0));
        let bbox = quad.bbox(None);
        assert_approx_eq!(bbox.x(), 30.0, 0.001);
        assert_approx_eq!(bbox.y(), 50.0, 0.001);
        assert_approx_eq!(bbox.width(), 124.483, 0.001);
        assert_approx_eq!(bbox.height(), 86.538, 0.001);

        let line = Line::new((5.0, 1.0), (-1.0, 3.0));
        let bbox = line.bbox(Some(BBox::new((0.0, 0.0), (1.0, 1.0))));
        assert_eq!(bbox.min(), Point::new(-1.0, 0.0));
        assert_eq!(bbox.max(), Point::new(5.0, 3.0));
    }
}
