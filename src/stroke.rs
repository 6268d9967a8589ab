//! Conversion of flattened paths into fillable stroke outlines
use crate::{
    Curve, EPSILON, EllipArc, FlatPath, LineCap, LineJoin, PI, Point, Polyline, Scalar,
    StrokeStyle,
};

/// Build outline of the stroke
///
/// Every polyline of the result is closed and the result must be filled with
/// `FillRule::NonZero`. `flatness` is used to approximate round joins and caps.
/// Empty outline is produced for non-positive width.
pub fn outline(path: &FlatPath, style: StrokeStyle, flatness: Scalar) -> FlatPath {
    let mut result = FlatPath::new();
    if style.width <= 0.0 {
        return result;
    }
    let stroker = Stroker {
        dist: style.width / 2.0,
        style,
        flatness,
    };
    for polyline in path.polylines() {
        let points = polyline.points();
        if points.len() == 1 {
            result.extend(stroker.dot(points[0]));
        } else if polyline.closed() && points.len() > 2 {
            result.extend(stroker.closed(points).into_iter().flatten());
        } else {
            result.extend(stroker.open(points));
        }
    }
    tracing::trace!(
        "[stroke] polylines={} segments={}",
        result.polylines().len(),
        result.segments_count()
    );
    result
}

struct Stroker {
    style: StrokeStyle,
    /// half of the stroke width
    dist: Scalar,
    flatness: Scalar,
}

impl Stroker {
    /// Outline of a polyline that collapsed into a single point
    fn dot(&self, center: Point) -> Option<Polyline> {
        let d = self.dist;
        match self.style.line_cap {
            LineCap::Butt => None,
            LineCap::Square => Polyline::from_points(
                vec![
                    center + Point::new(-d, -d),
                    center + Point::new(d, -d),
                    center + Point::new(d, d),
                    center + Point::new(-d, d),
                ],
                true,
            ),
            LineCap::Round => {
                let mut points = vec![center + Point::new(d, 0.0)];
                let arc = EllipArc::new_center(center, d, d, 0.0, 2.0 * PI);
                points.extend(arc.flatten(self.flatness).map(|line| line.end()));
                Polyline::from_points(points, true)
            }
        }
    }

    /// Open polyline: forward side, end cap, backward side, start cap
    fn open(&self, points: &[Point]) -> Option<Polyline> {
        let forward = directions(points.iter().copied());
        let backward = directions(points.iter().rev().copied());
        let (&(first, first_dir), &(last, last_dir)) = (forward.first()?, forward.last()?);
        let mut out = Vec::new();
        self.side(&forward, &mut out);
        self.cap(last + last_dir, last_dir, &mut out);
        self.side(&backward, &mut out);
        self.cap(first, -first_dir, &mut out);
        Polyline::from_points(out, true)
    }

    /// Closed polyline: two loops with opposite orientation
    fn closed(&self, points: &[Point]) -> [Option<Polyline>; 2] {
        let forward = directions(points.iter().copied().chain(points.first().copied()));
        let backward = directions(points.iter().rev().copied().chain(points.last().copied()));
        [self.ring(&forward), self.ring(&backward)]
    }

    fn ring(&self, segments: &[(Point, Point)]) -> Option<Polyline> {
        let count = segments.len();
        if count < 2 {
            return None;
        }
        let mut out = Vec::new();
        for index in 0..count {
            let (_, dir_a) = segments[(index + count - 1) % count];
            let (pivot, dir_b) = segments[index];
            self.join(pivot, dir_a, dir_b, &mut out);
        }
        Polyline::from_points(out, true)
    }

    /// Offset side of the polyline given as a list of `(start, direction)` segments
    ///
    /// Segment direction is not normalized, segment ends at `start + direction`.
    fn side(&self, segments: &[(Point, Point)], out: &mut Vec<Point>) {
        let Some(&(start, dir)) = segments.first() else {
            return;
        };
        out.push(start + self.offset(dir));
        for pair in segments.windows(2) {
            let (_, dir_a) = pair[0];
            let (pivot, dir_b) = pair[1];
            self.join(pivot, dir_a, dir_b, out);
        }
        if let Some(&(start, dir)) = segments.last() {
            out.push(start + dir + self.offset(dir));
        }
    }

    /// Offset vector on the right side of the direction
    fn offset(&self, dir: Point) -> Point {
        match dir.normal().normalize() {
            Some(normal) => self.dist * normal,
            None => Point::default(),
        }
    }

    /// Join of two segments at `pivot`
    fn join(&self, pivot: Point, dir_a: Point, dir_b: Point, out: &mut Vec<Point>) {
        let (Some(ua), Some(ub)) = (dir_a.normalize(), dir_b.normalize()) else {
            return;
        };
        let d = self.dist;
        let (na, nb) = (ua.normal(), ub.normal());
        let a_end = pivot + d * na;
        let b_start = pivot + d * nb;
        let cross = ua.cross(ub);
        let dot = ua.dot(ub);
        if cross.abs() < EPSILON && dot > 0.0 {
            // collinear
            out.push(a_end);
            return;
        }
        if cross < 0.0 {
            // inner side goes through the pivot
            out.extend([a_end, pivot, b_start]);
            return;
        }
        match self.style.line_join {
            LineJoin::Miter(limit) => {
                // ratio of the miter length to the stroke width is `1 / sin(theta / 2)`
                // where `theta` is the angle between segments, which is `1 / cos(phi / 2)`
                // for the turn angle `phi`
                let cos_half = ((1.0 + dot) / 2.0).max(0.0).sqrt();
                if cos_half > EPSILON && 1.0 / cos_half <= limit {
                    let miter = pivot + (d / (1.0 + na.dot(nb))) * (na + nb);
                    out.extend([a_end, miter, b_start]);
                } else {
                    out.extend([a_end, b_start]);
                }
            }
            LineJoin::Bevel => out.extend([a_end, b_start]),
            LineJoin::Round => {
                let sweep = na.angle_between(nb).unwrap_or(0.0);
                let sweep = if sweep < 0.0 { sweep + 2.0 * PI } else { sweep };
                out.push(a_end);
                let arc = EllipArc::new_center(pivot, d, d, na.angle(), sweep);
                out.extend(arc.flatten(self.flatness).map(|line| line.end()));
            }
        }
    }

    /// Cap at the `end` point of the segment with direction `dir`
    ///
    /// Goes from the right side of the segment to the left side.
    fn cap(&self, end: Point, dir: Point, out: &mut Vec<Point>) {
        let Some(unit) = dir.normalize() else {
            return;
        };
        let d = self.dist;
        let normal = unit.normal();
        match self.style.line_cap {
            LineCap::Butt => {}
            LineCap::Square => {
                out.push(end + d * normal + d * unit);
                out.push(end - d * normal + d * unit);
            }
            LineCap::Round => {
                let arc = EllipArc::new_center(end, d, d, normal.angle(), PI);
                out.extend(arc.flatten(self.flatness).map(|line| line.end()));
            }
        }
    }
}

/// Convert points to the list of `(start, direction)` segments skipping degenerate ones
fn directions(points: impl Iterator<Item = Point>) -> Vec<(Point, Point)> {
    let mut result = Vec::new();
    let mut prev: Option<Point> = None;
    for point in points {
        match prev {
            None => prev = Some(point),
            Some(start) => {
                let dir = point - start;
                if dir.length() > EPSILON {
                    result.push((start, dir));
                    prev = Some(point);
                }
            }
        }
    }
    result
}
