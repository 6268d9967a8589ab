//! Elliptic arcs
use crate::{BBox, Cubic, EPSILON, Line, PI, Point, Scalar, Transform, curve::FLATTEN_MAX_STEPS};

/// Arc of an ellipse rotated by `phi` around its center
///
/// Points of the arc are `center + R(phi) * (rx * cos(a), ry * sin(a))` for
/// angles `a` going from `eta` to `eta + eta_delta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipArc {
    center: Point,
    rx: Scalar,
    ry: Scalar,
    phi: Scalar,
    eta: Scalar,
    eta_delta: Scalar,
}

impl EllipArc {
    /// Axis aligned arc starting at angle `eta` and spanning `eta_delta` radians
    ///
    /// Positive `eta_delta` turns from the x axis towards the y axis.
    pub fn new_center(
        center: impl Into<Point>,
        rx: Scalar,
        ry: Scalar,
        eta: Scalar,
        eta_delta: Scalar,
    ) -> Self {
        Self {
            center: center.into(),
            rx: rx.abs(),
            ry: ry.abs(),
            phi: 0.0,
            eta,
            eta_delta,
        }
    }

    /// Arc from `src` to `dst` given with SVG style endpoint parameters
    ///
    /// `x_axis_rot` is in radians. Radii too small to connect the end points are
    /// scaled up uniformly. Returns `None` when the arc is a straight line, that is
    /// either radius is zero or the end points coincide.
    pub fn new_param(
        src: Point,
        dst: Point,
        rx: Scalar,
        ry: Scalar,
        x_axis_rot: Scalar,
        large_flag: bool,
        sweep_flag: bool,
    ) -> Option<Self> {
        let (mut rx, mut ry) = (rx.abs(), ry.abs());
        if rx < EPSILON || ry < EPSILON || src.is_close_to(dst) {
            return None;
        }

        // half chord in the frame where the ellipse axes are aligned
        let half = Transform::identity().rotate(-x_axis_rot).apply(0.5 * (src - dst));
        let (hx, hy) = (half.x() / rx, half.y() / ry);
        let lambda = hx * hx + hy * hy;
        if lambda > 1.0 {
            let scale = lambda.sqrt();
            rx *= scale;
            ry *= scale;
        }

        // center offset from the chord midpoint in the aligned frame
        let (x1, y1) = (half.x(), half.y());
        let num = (rx * ry).powi(2) - (rx * y1).powi(2) - (ry * x1).powi(2);
        let den = (rx * y1).powi(2) + (ry * x1).powi(2);
        let mut coef = (num / den).max(0.0).sqrt();
        if large_flag == sweep_flag {
            coef = -coef;
        }
        let offset = Point::new(coef * rx * y1 / ry, -coef * ry * x1 / rx);

        // start and end directions on the unit circle
        let u = Point::new((x1 - offset.x()) / rx, (y1 - offset.y()) / ry);
        let v = Point::new((-x1 - offset.x()) / rx, (-y1 - offset.y()) / ry);
        let eta = u.y().atan2(u.x());
        let mut eta_delta = u.angle_between(v)?;
        if sweep_flag && eta_delta < 0.0 {
            eta_delta += 2.0 * PI;
        } else if !sweep_flag && eta_delta > 0.0 {
            eta_delta -= 2.0 * PI;
        }

        Some(Self {
            center: Transform::identity().rotate(x_axis_rot).apply(offset) + 0.5 * (src + dst),
            rx,
            ry,
            phi: x_axis_rot,
            eta,
            eta_delta,
        })
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// Point of the ellipse at angle parameter `angle`
    fn point(&self, angle: Scalar) -> Point {
        let (sin, cos) = angle.sin_cos();
        let local = Point::new(self.rx * cos, self.ry * sin);
        Transform::identity().rotate(self.phi).apply(local) + self.center
    }

    /// Derivative of [`Self::point`] with respect to the angle
    fn tangent(&self, angle: Scalar) -> Point {
        let (sin, cos) = angle.sin_cos();
        Transform::identity().rotate(self.phi).apply(Point::new(-self.rx * sin, self.ry * cos))
    }

    /// Point at parameter `t` in `[0, 1]`
    pub fn at(&self, t: Scalar) -> Point {
        self.point(self.eta + t * self.eta_delta)
    }

    pub fn start(&self) -> Point {
        self.at(0.0)
    }

    pub fn end(&self) -> Point {
        self.at(1.0)
    }

    /// Whether `angle` lies on the swept part of the ellipse
    fn sweeps(&self, angle: Scalar) -> bool {
        let offset = if self.eta_delta >= 0.0 {
            (angle - self.eta).rem_euclid(2.0 * PI)
        } else {
            (self.eta - angle).rem_euclid(2.0 * PI)
        };
        offset <= self.eta_delta.abs()
    }

    /// Exact bounding box, merged with `init` when provided
    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        let (sin, cos) = self.phi.sin_cos();
        // angles where d/da of x and y vanish
        let ax = (-self.ry * sin).atan2(self.rx * cos);
        let ay = (self.ry * cos).atan2(self.rx * sin);
        [ax, ax + PI, ay, ay + PI]
            .into_iter()
            .filter(|angle| self.sweeps(*angle))
            .fold(
                BBox::new(self.start(), self.end()).union_opt(init),
                |bbox, angle| bbox.extend(self.point(angle)),
            )
    }

    /// Cubic bezier approximation, each cubic covers at most a quarter turn
    pub fn to_cubics(&self) -> impl Iterator<Item = Cubic> + '_ {
        let count = (self.eta_delta.abs() / (PI / 2.0)).ceil() as usize;
        let step = self.eta_delta / count.max(1) as Scalar;
        let kappa = 4.0 / 3.0 * (step / 4.0).tan();
        (0..count).map(move |index| {
            let a0 = self.eta + index as Scalar * step;
            let a1 = a0 + step;
            let (p0, p3) = (self.point(a0), self.point(a1));
            Cubic([
                p0,
                p0 + kappa * self.tangent(a0),
                p3 - kappa * self.tangent(a1),
                p3,
            ])
        })
    }

    /// Lines approximating the arc within `flatness`
    ///
    /// Angle step `h` keeps the chord within `max(rx, ry) * h^2 / 8` of the arc.
    pub fn flatten(&self, flatness: Scalar) -> impl Iterator<Item = Line> + '_ {
        let steps = if self.eta_delta.abs() < EPSILON {
            0
        } else {
            let radius = self.rx.max(self.ry);
            let steps = (self.eta_delta.abs() * (radius / (8.0 * flatness)).sqrt()).ceil();
            (steps as usize).clamp(1, FLATTEN_MAX_STEPS)
        };
        let mut last = self.start();
        (1..=steps).map(move |index| {
            let point = if index == steps {
                self.end()
            } else {
                self.at(index as Scalar / steps as Scalar)
            };
            let line = Line([last, point]);
            last = point;
            line
        })
    }
}
