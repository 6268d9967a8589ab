use crate::{
    BBox, Cubic, Curve, EPSILON, EllipArc, Line, PI, Point, Quad, Scalar, Segment, Transform,
};
use std::fmt;

/// Default miter limit, ratio of the miter length to the stroke width
pub const DEFAULT_MITER_LIMIT: Scalar = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    Miter(Scalar),
    Bevel,
    Round,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Round
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    Butt,
    Square,
    Round,
}

impl Default for LineCap {
    fn default() -> Self {
        Self::Round
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeStyle {
    pub width: Scalar,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            line_join: LineJoin::default(),
            line_cap: LineCap::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Single path command, all coordinates are absolute and in user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    /// Quadratic bezier curve with control point and end point
    Curve3(Point, Point),
    /// Cubic bezier curve with two control points and end point
    Curve4(Point, Point, Point),
    /// Elliptic arc from the current position to `end`, `x_axis_rot` is in radians
    ArcTo {
        radii: Point,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        end: Point,
    },
    Close,
}

/// Ordered list of path commands
///
/// Every drawing command is preceded by a `MoveTo` in its subpath, if there is no
/// open subpath when drawing command is issued `MoveTo` to the current position
/// is inserted automatically. Path does not own any transformation.
#[derive(Clone, PartialEq, Default)]
pub struct Path {
    cmds: Vec<PathCmd>,
    /// Current position
    position: Point,
    /// Start of the current subpath
    start: Point,
    /// Whether there is an open subpath
    open: bool,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cmds.is_empty() {
            return write!(f, "Empty");
        }
        for cmd in self.cmds.iter() {
            match cmd {
                PathCmd::MoveTo(p) => write!(f, "M{:?} ", p)?,
                PathCmd::LineTo(p) => write!(f, "L{:?} ", p)?,
                PathCmd::Curve3(p1, p2) => write!(f, "Q{:?} {:?} ", p1, p2)?,
                PathCmd::Curve4(p1, p2, p3) => write!(f, "C{:?} {:?} {:?} ", p1, p2, p3)?,
                PathCmd::ArcTo {
                    radii,
                    x_axis_rot,
                    large,
                    sweep,
                    end,
                } => write!(
                    f,
                    "A{:?} {:.3} {} {} {:?} ",
                    radii, x_axis_rot, *large as u8, *sweep as u8, end
                )?,
                PathCmd::Close => write!(f, "Z ")?,
            }
        }
        Ok(())
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the path
    pub fn commands(&self) -> &[PathCmd] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Remove all commands and reset current position
    pub fn remove_all(&mut self) -> &mut Self {
        self.cmds.clear();
        self.position = Point::default();
        self.start = Point::default();
        self.open = false;
        self
    }

    /// Last vertex of the path, `None` if path is empty
    pub fn last_vertex(&self) -> Option<Point> {
        if self.cmds.is_empty() {
            None
        } else {
            Some(self.position)
        }
    }

    /// Current position, used to resolve relative commands
    pub fn position(&self) -> Point {
        self.position
    }

    fn ensure_open(&mut self) {
        if !self.open {
            self.cmds.push(PathCmd::MoveTo(self.position));
            self.start = self.position;
            self.open = true;
        }
    }

    /// Start new subpath at the point
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        // consecutive moves collapse into the last one
        if let Some(PathCmd::MoveTo(last)) = self.cmds.last_mut() {
            *last = p;
        } else {
            self.cmds.push(PathCmd::MoveTo(p));
        }
        self.position = p;
        self.start = p;
        self.open = true;
        self
    }

    pub fn move_rel(&mut self, d: impl Into<Point>) -> &mut Self {
        let p = self.position + d.into();
        self.move_to(p)
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.ensure_open();
        let p = p.into();
        self.cmds.push(PathCmd::LineTo(p));
        self.position = p;
        self
    }

    pub fn line_rel(&mut self, d: impl Into<Point>) -> &mut Self {
        let p = self.position + d.into();
        self.line_to(p)
    }

    /// Horizontal line to the `x` coordinate
    pub fn hor_line_to(&mut self, x: Scalar) -> &mut Self {
        let y = self.position.y();
        self.line_to((x, y))
    }

    pub fn hor_line_rel(&mut self, dx: Scalar) -> &mut Self {
        let x = self.position.x() + dx;
        self.hor_line_to(x)
    }

    /// Vertical line to the `y` coordinate
    pub fn ver_line_to(&mut self, y: Scalar) -> &mut Self {
        let x = self.position.x();
        self.line_to((x, y))
    }

    pub fn ver_line_rel(&mut self, dy: Scalar) -> &mut Self {
        let y = self.position.y() + dy;
        self.ver_line_to(y)
    }

    /// Add quadratic bezier curve
    pub fn curve3(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        self.ensure_open();
        let p2 = p2.into();
        self.cmds.push(PathCmd::Curve3(p1.into(), p2));
        self.position = p2;
        self
    }

    pub fn curve3_rel(&mut self, d1: impl Into<Point>, d2: impl Into<Point>) -> &mut Self {
        let p1 = self.position + d1.into();
        let p2 = self.position + d2.into();
        self.curve3(p1, p2)
    }

    /// Add smooth quadratic bezier curve
    ///
    /// Control point is a reflection of the previous curve's control point, or
    /// the current position if the previous command is not a quadratic curve.
    pub fn curve3_smooth(&mut self, p2: impl Into<Point>) -> &mut Self {
        let p1 = match self.cmds.last() {
            Some(PathCmd::Curve3(p1, p2)) => Quad::new(self.position, *p1, *p2).smooth(),
            _ => self.position,
        };
        self.curve3(p1, p2)
    }

    pub fn curve3_smooth_rel(&mut self, d2: impl Into<Point>) -> &mut Self {
        let p2 = self.position + d2.into();
        self.curve3_smooth(p2)
    }

    /// Add cubic beizer curve
    pub fn curve4(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        self.ensure_open();
        let p3 = p3.into();
        self.cmds.push(PathCmd::Curve4(p1.into(), p2.into(), p3));
        self.position = p3;
        self
    }

    pub fn curve4_rel(
        &mut self,
        d1: impl Into<Point>,
        d2: impl Into<Point>,
        d3: impl Into<Point>,
    ) -> &mut Self {
        let p1 = self.position + d1.into();
        let p2 = self.position + d2.into();
        let p3 = self.position + d3.into();
        self.curve4(p1, p2, p3)
    }

    /// Add smooth cubic bezier curve
    pub fn curve4_smooth(&mut self, p2: impl Into<Point>, p3: impl Into<Point>) -> &mut Self {
        let p1 = match self.cmds.last() {
            Some(PathCmd::Curve4(p1, p2, p3)) => {
                Cubic::new(self.position, *p1, *p2, *p3).smooth()
            }
            _ => self.position,
        };
        self.curve4(p1, p2, p3)
    }

    pub fn curve4_smooth_rel(&mut self, d2: impl Into<Point>, d3: impl Into<Point>) -> &mut Self {
        let p2 = self.position + d2.into();
        let p3 = self.position + d3.into();
        self.curve4_smooth(p2, p3)
    }

    /// Add elliptic arc segment, `x_axis_rot` is in radians
    pub fn arc_to(
        &mut self,
        radii: impl Into<Point>,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        p: impl Into<Point>,
    ) -> &mut Self {
        self.ensure_open();
        let end = p.into();
        self.cmds.push(PathCmd::ArcTo {
            radii: radii.into(),
            x_axis_rot,
            large,
            sweep,
            end,
        });
        self.position = end;
        self
    }

    pub fn arc_rel(
        &mut self,
        radii: impl Into<Point>,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        d: impl Into<Point>,
    ) -> &mut Self {
        let p = self.position + d.into();
        self.arc_to(radii, x_axis_rot, large, sweep, p)
    }

    /// Close current subpath, current position moves to the start of the subpath
    pub fn close(&mut self) -> &mut Self {
        if self.open {
            self.cmds.push(PathCmd::Close);
            self.position = self.start;
            self.open = false;
        }
        self
    }

    /// Append commands of the other path verbatim
    pub fn concat_path(&mut self, other: &Path) -> &mut Self {
        if other.is_empty() {
            return self;
        }
        self.cmds.extend_from_slice(&other.cmds);
        self.position = other.position;
        self.start = other.start;
        self.open = other.open;
        self
    }

    // -------------------------------------------------------------------------
    // Shapes, each one is appended as a separate subpath
    // -------------------------------------------------------------------------

    /// Line segment
    pub fn line(&mut self, p0: impl Into<Point>, p1: impl Into<Point>) -> &mut Self {
        self.move_to(p0).line_to(p1)
    }

    pub fn triangle(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
    ) -> &mut Self {
        self.move_to(p0).line_to(p1).line_to(p2).close()
    }

    /// Axis aligned rectangle with corners `p0` and `p1`
    pub fn rectangle(&mut self, p0: impl Into<Point>, p1: impl Into<Point>) -> &mut Self {
        let Point([x0, y0]) = p0.into();
        let Point([x1, y1]) = p1.into();
        self.move_to((x0, y0))
            .line_to((x1, y0))
            .line_to((x1, y1))
            .line_to((x0, y1))
            .close()
    }

    /// Rectangle with rounded corners of the same radius
    pub fn rounded_rect(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        r: Scalar,
    ) -> &mut Self {
        let radii = Point::new(r, r);
        self.rounded_rect_corners(p0, p1, [radii; 4])
    }

    /// Rectangle with elliptic corners of the same radii
    pub fn rounded_rect_xy(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        radii: impl Into<Point>,
    ) -> &mut Self {
        let radii = radii.into();
        self.rounded_rect_corners(p0, p1, [radii; 4])
    }

    /// Rectangle with per corner radii
    ///
    /// Radii are in order: bottom-left, bottom-right, top-right, top-left, where bottom
    /// is the side with smaller `y`. Radii are scaled down uniformly if adjacent corners
    /// do not fit into the side.
    pub fn rounded_rect_corners(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        radii: [Point; 4],
    ) -> &mut Self {
        let bbox = BBox::new(p0, p1);
        let (lx, ly) = (bbox.x(), bbox.y());
        let (hx, hy) = (lx + bbox.width(), ly + bbox.height());
        let radii = radii.map(|Point([rx, ry])| Point::new(rx.abs(), ry.abs()));
        let [r0, r1, r2, r3] = radii;

        let mut k: Scalar = 1.0;
        for (sum, side) in [
            (r0.x() + r1.x(), bbox.width()),
            (r1.y() + r2.y(), bbox.height()),
            (r2.x() + r3.x(), bbox.width()),
            (r3.y() + r0.y(), bbox.height()),
        ] {
            if sum > side && sum > EPSILON {
                k = k.min(side / sum);
            }
        }
        let [r0, r1, r2, r3] = radii.map(|r| k * r);
        let rounded = |r: Point| r.x() > EPSILON && r.y() > EPSILON;

        self.move_to((lx + r0.x(), ly)).line_to((hx - r1.x(), ly));
        if rounded(r1) {
            self.arc_to(r1, 0.0, false, true, (hx, ly + r1.y()));
        }
        self.line_to((hx, hy - r2.y()));
        if rounded(r2) {
            self.arc_to(r2, 0.0, false, true, (hx - r2.x(), hy));
        }
        self.line_to((lx + r3.x(), hy));
        if rounded(r3) {
            self.arc_to(r3, 0.0, false, true, (lx, hy - r3.y()));
        }
        self.line_to((lx, ly + r0.y()));
        if rounded(r0) {
            self.arc_to(r0, 0.0, false, true, (lx + r0.x(), ly));
        }
        self.close()
    }

    /// Full ellipse with the center and radii
    pub fn ellipse(&mut self, center: impl Into<Point>, rx: Scalar, ry: Scalar) -> &mut Self {
        let center = center.into();
        let rx = rx.abs();
        let ry = ry.abs();
        let p0 = center + Point::new(rx, 0.0);
        let p1 = center - Point::new(rx, 0.0);
        let radii = Point::new(rx, ry);
        self.move_to(p0)
            .arc_to(radii, 0.0, false, true, p1)
            .arc_to(radii, 0.0, false, true, p0)
            .close()
    }

    /// Open elliptic arc with the center and radii
    ///
    /// Arc starts at angle `start` and spans `sweep` radians.
    pub fn arc(
        &mut self,
        center: impl Into<Point>,
        rx: Scalar,
        ry: Scalar,
        start: Scalar,
        sweep: Scalar,
    ) -> &mut Self {
        let arc = EllipArc::new_center(center, rx, ry, start, sweep);
        self.move_to(arc.start());
        for cubic in arc.to_cubics() {
            let Cubic([_, p1, p2, p3]) = cubic;
            self.curve4(p1, p2, p3);
        }
        self
    }

    /// Star with `rays` rays, `r1` is the inner radius and `r2` is the outer radius
    pub fn star(
        &mut self,
        center: impl Into<Point>,
        r1: Scalar,
        r2: Scalar,
        start_angle: Scalar,
        rays: usize,
    ) -> &mut Self {
        if rays == 0 {
            return self;
        }
        let center = center.into();
        let da = PI / rays as Scalar;
        let mut angle = start_angle;
        let at = |angle: Scalar, r: Scalar| {
            let (sin, cos) = angle.sin_cos();
            center + Point::new(cos * r, sin * r)
        };
        self.move_to(at(angle, r2));
        for index in 0..rays {
            if index != 0 {
                self.line_to(at(angle, r2));
            }
            angle += da;
            self.line_to(at(angle, r1));
            angle += da;
        }
        self.close()
    }

    /// Closed polygon through the points
    pub fn polygon(&mut self, points: &[Point]) -> &mut Self {
        self.polyline(points).close()
    }

    /// Open polyline through the points
    pub fn polyline(&mut self, points: &[Point]) -> &mut Self {
        if let Some((first, rest)) = points.split_first() {
            self.move_to(*first);
            for point in rest {
                self.line_to(*point);
            }
        }
        self
    }

    /// Quadratic curve as a separate subpath
    pub fn curve(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
    ) -> &mut Self {
        self.move_to(p0).curve3(p1, p2)
    }

    /// Cubic curve as a separate subpath
    pub fn cubic_curve(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        self.move_to(p0).curve4(p1, p2, p3)
    }

    // -------------------------------------------------------------------------
    // Conversion
    // -------------------------------------------------------------------------

    /// Walk all commands converting them to segments
    fn visit(&self, mut visitor: impl FnMut(PathEvent)) {
        let mut position = Point::default();
        let mut start = Point::default();
        for cmd in self.cmds.iter() {
            match *cmd {
                PathCmd::MoveTo(p) => {
                    visitor(PathEvent::Move(p));
                    position = p;
                    start = p;
                }
                PathCmd::LineTo(p) => {
                    visitor(PathEvent::Segment(Line::new(position, p).into()));
                    position = p;
                }
                PathCmd::Curve3(p1, p2) => {
                    visitor(PathEvent::Segment(Quad::new(position, p1, p2).into()));
                    position = p2;
                }
                PathCmd::Curve4(p1, p2, p3) => {
                    visitor(PathEvent::Segment(Cubic::new(position, p1, p2, p3).into()));
                    position = p3;
                }
                PathCmd::ArcTo {
                    radii,
                    x_axis_rot,
                    large,
                    sweep,
                    end,
                } => {
                    let arc = EllipArc::new_param(
                        position,
                        end,
                        radii.x(),
                        radii.y(),
                        x_axis_rot,
                        large,
                        sweep,
                    );
                    match arc {
                        None => visitor(PathEvent::Segment(Line::new(position, end).into())),
                        Some(arc) => {
                            for cubic in arc.to_cubics() {
                                visitor(PathEvent::Segment(cubic.into()));
                            }
                        }
                    }
                    position = end;
                }
                PathCmd::Close => {
                    visitor(PathEvent::Close);
                    position = start;
                }
            }
        }
    }

    /// Convert path to polylines, `flatness` is the maximum distance between
    /// curves and their approximation in user space units.
    pub fn flatten(&self, flatness: Scalar) -> FlatPath {
        let mut flat = FlatPath::new();
        let mut current: Option<Polyline> = None;
        self.visit(|event| match event {
            PathEvent::Move(p) => {
                flat.extend(current.take());
                current = Some(Polyline::new(p));
            }
            PathEvent::Segment(segment) => {
                let polyline = current.get_or_insert_with(|| Polyline::new(segment.start()));
                polyline.touched = true;
                match segment {
                    Segment::Line(line) => polyline.push(line.end()),
                    _ => {
                        for line in segment.flatten(flatness) {
                            polyline.push(line.end());
                        }
                    }
                }
            }
            PathEvent::Close => {
                if let Some(mut polyline) = current.take() {
                    polyline.close();
                    let start = polyline.points[0];
                    flat.push(polyline);
                    current = Some(Polyline::new(start));
                }
            }
        });
        flat.extend(current);
        flat
    }

    /// Bounding box of the path after applying transformation
    pub fn bbox(&self, tr: Transform) -> Option<BBox> {
        let mut bbox: Option<BBox> = None;
        self.visit(|event| {
            if let PathEvent::Segment(segment) = event {
                bbox = Some(segment.transform(tr).bbox(bbox));
            }
        });
        bbox
    }
}

enum PathEvent {
    Move(Point),
    Segment(Segment),
    Close,
}

/// Connected sequence of points produced by flattening of a subpath
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Point>,
    closed: bool,
    /// Whether any drawing command contributed to the polyline
    touched: bool,
}

impl Polyline {
    fn new(start: Point) -> Self {
        Self {
            points: vec![start],
            closed: false,
            touched: false,
        }
    }

    /// Create polyline from the list of points, returns `None` if the list is empty
    pub fn from_points(points: Vec<Point>, closed: bool) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut polyline = Self::new(iter.next()?);
        polyline.touched = true;
        for point in iter {
            polyline.push(point);
        }
        if closed {
            polyline.close();
        }
        Some(polyline)
    }

    /// Add point, repeated points are skipped
    fn push(&mut self, point: Point) {
        match self.points.last() {
            Some(last) if last.is_close_to(point) => {}
            _ => self.points.push(point),
        }
    }

    fn close(&mut self) {
        self.closed = true;
        if self.points.len() > 1 && self.points[0].is_close_to(self.points[self.points.len() - 1]) {
            self.points.pop();
        }
    }

    /// Points of the polyline, never empty
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Whether the last point connects back to the first one
    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Iterator over segments of the polyline, including closing segment for closed polylines
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        let closing = if self.closed && self.points.len() > 2 {
            Some(Line::new(self.points[self.points.len() - 1], self.points[0]))
        } else {
            None
        };
        self.points
            .windows(2)
            .map(|ps| Line::new(ps[0], ps[1]))
            .chain(closing)
    }
}

/// Path converted to polylines
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatPath {
    polylines: Vec<Polyline>,
}

impl FlatPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Add polyline, polylines without any drawing commands are ignored
    pub fn push(&mut self, polyline: Polyline) {
        if polyline.touched {
            self.polylines.push(polyline);
        }
    }

    /// Total number of line segments
    pub fn segments_count(&self) -> usize {
        self.polylines
            .iter()
            .map(|polyline| polyline.lines().count())
            .sum()
    }
}

impl Extend<Polyline> for FlatPath {
    fn extend<T: IntoIterator<Item = Polyline>>(&mut self, iter: T) {
        for polyline in iter {
            self.push(polyline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_implicit_move() {
        let mut path = Path::new();
        path.line_to((10.0, 0.0)).line_to((10.0, 10.0)).close();
        assert_eq!(
            path.commands(),
            &[
                PathCmd::MoveTo(Point::new(0.0, 0.0)),
                PathCmd::LineTo(Point::new(10.0, 0.0)),
                PathCmd::LineTo(Point::new(10.0, 10.0)),
                PathCmd::Close,
            ]
        );

        // drawing after close starts a new subpath at the start of the closed one
        path.move_to((5.0, 5.0)).line_to((6.0, 5.0)).close();
        path.line_to((7.0, 7.0));
        assert_eq!(
            &path.commands()[path.commands().len() - 2..],
            &[
                PathCmd::MoveTo(Point::new(5.0, 5.0)),
                PathCmd::LineTo(Point::new(7.0, 7.0)),
            ]
        );

        // close without open subpath is ignored
        let mut path = Path::new();
        path.close();
        assert!(path.is_empty());
        assert!(path.last_vertex().is_none());
    }

    #[test]
    fn test_relative() {
        let mut path = Path::new();
        path.move_to((1.0, 1.0))
            .line_rel((2.0, 0.0))
            .ver_line_rel(3.0)
            .hor_line_to(0.0)
            .curve3_rel((1.0, 1.0), (2.0, 0.0))
            .curve4_rel((1.0, 0.0), (1.0, 1.0), (0.0, 1.0))
            .move_rel((10.0, 0.0));
        assert_eq!(
            path.commands(),
            &[
                PathCmd::MoveTo(Point::new(1.0, 1.0)),
                PathCmd::LineTo(Point::new(3.0, 1.0)),
                PathCmd::LineTo(Point::new(3.0, 4.0)),
                PathCmd::LineTo(Point::new(0.0, 4.0)),
                PathCmd::Curve3(Point::new(1.0, 5.0), Point::new(2.0, 4.0)),
                PathCmd::Curve4(
                    Point::new(3.0, 4.0),
                    Point::new(3.0, 5.0),
                    Point::new(2.0, 5.0)
                ),
                PathCmd::MoveTo(Point::new(12.0, 5.0)),
            ]
        );
        assert_eq!(path.last_vertex(), Some(Point::new(12.0, 5.0)));
    }

    #[test]
    fn test_smooth() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0))
            .curve3((1.0, 1.0), (2.0, 0.0))
            .curve3_smooth((4.0, 0.0));
        assert_eq!(
            path.commands()[2],
            PathCmd::Curve3(Point::new(3.0, -1.0), Point::new(4.0, 0.0))
        );

        path.curve4((5.0, 1.0), (6.0, 1.0), (7.0, 0.0))
            .curve4_smooth((9.0, -1.0), (10.0, 0.0));
        assert_eq!(
            path.commands()[4],
            PathCmd::Curve4(
                Point::new(8.0, -1.0),
                Point::new(9.0, -1.0),
                Point::new(10.0, 0.0)
            )
        );
    }

    #[test]
    fn test_flatten() {
        let mut path = Path::new();
        path.rectangle((0.0, 0.0), (4.0, 3.0))
            .move_to((10.0, 10.0))
            .curve4((10.0, 20.0), (20.0, 20.0), (20.0, 10.0))
            .move_to((30.0, 30.0));
        let flat = path.flatten(0.1);
        assert_eq!(flat.polylines().len(), 2);

        let rect = &flat.polylines()[0];
        assert!(rect.closed());
        assert_eq!(rect.points().len(), 4);
        assert_eq!(rect.lines().count(), 4);

        let curve = &flat.polylines()[1];
        assert!(!curve.closed());
        assert!(curve.points().len() > 4);
        assert!(curve.points()[0].is_close_to(Point::new(10.0, 10.0)));
        assert!(curve.points()[curve.points().len() - 1].is_close_to(Point::new(20.0, 10.0)));

        // finer tolerance produces more vertices
        let fine = path.flatten(0.001);
        assert!(fine.segments_count() > flat.segments_count());
    }

    #[test]
    fn test_flatten_dot() {
        let mut path = Path::new();
        path.move_to((1.0, 1.0)).line_to((1.0, 1.0));
        let flat = path.flatten(0.1);
        assert_eq!(flat.polylines().len(), 1);
        assert_eq!(flat.polylines()[0].points().len(), 1);
    }

    #[test]
    fn test_bbox() {
        let mut path = Path::new();
        path.ellipse((10.0, 20.0), 5.0, 3.0);
        let bbox = path.bbox(Transform::default()).unwrap();
        assert_approx_eq!(bbox.x(), 5.0, 1e-6);
        assert_approx_eq!(bbox.y(), 17.0, 1e-6);
        assert_approx_eq!(bbox.width(), 10.0, 1e-6);
        assert_approx_eq!(bbox.height(), 6.0, 1e-2);

        let bbox = path
            .bbox(Transform::default().translate(100.0, 0.0).scale(2.0, 2.0))
            .unwrap();
        assert_approx_eq!(bbox.x(), 110.0, 1e-6);
        assert_approx_eq!(bbox.width(), 20.0, 1e-6);

        assert!(Path::new().bbox(Transform::default()).is_none());
    }

    #[test]
    fn test_shapes() {
        let mut path = Path::new();
        path.star((0.0, 0.0), 5.0, 10.0, 0.0, 5);
        let flat = path.flatten(0.1);
        assert_eq!(flat.polylines()[0].points().len(), 10);
        for (index, point) in flat.polylines()[0].points().iter().enumerate() {
            let radius = if index % 2 == 0 { 10.0 } else { 5.0 };
            assert_approx_eq!(point.length(), radius, 1e-9);
        }

        let mut path = Path::new();
        path.rounded_rect((0.0, 0.0), (10.0, 10.0), 2.0);
        let bbox = path.bbox(Transform::default()).unwrap();
        assert_approx_eq!(bbox.width(), 10.0, 1e-9);
        assert_approx_eq!(bbox.height(), 10.0, 1e-9);
        let flat = path.flatten(0.01);
        // corner is cut
        for point in flat.polylines()[0].points() {
            assert!(point.dist(Point::new(0.0, 0.0)) > 0.5);
        }

        let mut path = Path::new();
        path.arc((0.0, 0.0), 10.0, 10.0, 0.0, PI / 2.0);
        let flat = path.flatten(0.01);
        let points = flat.polylines()[0].points();
        assert!(points[0].is_close_to(Point::new(10.0, 0.0)));
        assert!(points[points.len() - 1].dist(Point::new(0.0, 10.0)) < 1e-9);
        assert!(!flat.polylines()[0].closed());

        let mut other = Path::new();
        other.triangle((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        let count = path.commands().len();
        path.concat_path(&other);
        assert_eq!(path.commands().len(), count + 4);
    }
}
