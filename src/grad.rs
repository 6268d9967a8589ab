use crate::{EPSILON, Point, PremulRGBA, Premultiply, Scalar, Transform};
use std::fmt;

/// Number of entries in a gradient lookup table
pub const GRADIENT_LUT_SIZE: usize = 256;

/// Precomputed gradient color ramp
///
/// Every entry is a defined premultiplied color, index `0` corresponds to the
/// gradient start and index `255` to its end.
#[derive(Clone, PartialEq, Eq)]
pub struct GradientLut {
    colors: [PremulRGBA; GRADIENT_LUT_SIZE],
}

impl GradientLut {
    /// Three stop ramp with stops at offsets `0.0`, `0.5` and `1.0`
    ///
    /// `[0, 128)` interpolates `c1 -> c2` and `[128, 256)` interpolates `c2 -> c3`.
    pub fn new(c1: impl Premultiply, c2: impl Premultiply, c3: impl Premultiply) -> Self {
        let (c1, c2, c3) = (c1.premultiply(), c2.premultiply(), c3.premultiply());
        let mut colors = [PremulRGBA::TRANSPARENT; GRADIENT_LUT_SIZE];
        for (index, color) in colors.iter_mut().enumerate() {
            *color = if index < 128 {
                c1.lerp(c2, index as f32 / 128.0)
            } else {
                c2.lerp(c3, (index - 128) as f32 / 127.0)
            };
        }
        Self { colors }
    }

    /// Two stop ramp with a `profile` in `[0, 1]`
    ///
    /// Colors are flat `c1` below `128 - profile * 127`, flat `c2` above
    /// `128 + profile * 127` and linearly interpolated in between. Profile `1.0`
    /// gives the smoothest ramp over the whole table.
    pub fn with_profile(c1: impl Premultiply, c2: impl Premultiply, profile: Scalar) -> Self {
        let (c1, c2) = (c1.premultiply(), c2.premultiply());
        let spread = (profile.clamp(0.0, 1.0) * 127.0) as usize;
        let start = 128 - spread;
        let end = (128 + spread).max(start + 1);
        let k = 1.0 / (end - start) as f32;
        let mut colors = [c2; GRADIENT_LUT_SIZE];
        for (index, color) in colors.iter_mut().enumerate().take(end) {
            *color = if index < start {
                c1
            } else {
                c1.lerp(c2, (index - start) as f32 * k)
            };
        }
        Self { colors }
    }

    pub fn colors(&self) -> &[PremulRGBA; GRADIENT_LUT_SIZE] {
        &self.colors
    }

    /// Color at parameter `t`, clamped to `[0, 1]`
    #[inline]
    pub fn at(&self, t: Scalar) -> PremulRGBA {
        let index = (t.clamp(0.0, 1.0) * (GRADIENT_LUT_SIZE - 1) as Scalar) as usize;
        self.colors[index.min(GRADIENT_LUT_SIZE - 1)]
    }
}

impl std::ops::Index<usize> for GradientLut {
    type Output = PremulRGBA;

    fn index(&self, index: usize) -> &Self::Output {
        &self.colors[index]
    }
}

impl fmt::Debug for GradientLut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientLut")
            .field("first", &self.colors[0])
            .field("middle", &self.colors[128])
            .field("last", &self.colors[GRADIENT_LUT_SIZE - 1])
            .finish()
    }
}

/// Gradient geometry with its own lookup table
///
/// `matrix` maps screen space into gradient space, it is captured when the
/// gradient is created and is not affected by later transformations.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    lut: Box<GradientLut>,
    matrix: Transform,
    d1: Scalar,
    d2: Scalar,
}

impl Gradient {
    /// Linear gradient from `p1` to `p2` given in world coordinates of `transform`
    ///
    /// Returns `None` if `transform` is degenerate.
    pub fn linear(lut: GradientLut, p1: Point, p2: Point, transform: Transform) -> Option<Self> {
        let dir = p2 - p1;
        let angle = dir.y().atan2(dir.x());
        let matrix = transform
            .translate(p1.x(), p1.y())
            .rotate(angle)
            .invert()?;
        Some(Self {
            lut: Box::new(lut),
            matrix,
            d1: 0.0,
            d2: dir.length(),
        })
    }

    /// Radial gradient around `center` with radius `radius` in world coordinates
    ///
    /// Center and radius are converted into screen space immediately.
    pub fn radial(lut: GradientLut, center: Point, radius: Scalar, transform: Transform) -> Self {
        let center = transform.apply(center);
        Self {
            lut: Box::new(lut),
            matrix: Transform::new_translate(-center.x(), -center.y()),
            d1: 0.0,
            d2: radius.abs() * transform.scale_factor(),
        }
    }

    pub fn lut(&self) -> &GradientLut {
        &self.lut
    }

    /// Screen space to gradient space transformation
    pub fn matrix(&self) -> Transform {
        self.matrix
    }

    pub fn d1(&self) -> Scalar {
        self.d1
    }

    pub fn d2(&self) -> Scalar {
        self.d2
    }

    /// Normalize gradient space distance into `[0, 1]`
    #[inline]
    fn param(&self, dist: Scalar) -> Scalar {
        let range = self.d2 - self.d1;
        if range <= EPSILON {
            return if dist < self.d1 { 0.0 } else { 1.0 };
        }
        ((dist - self.d1) / range).clamp(0.0, 1.0)
    }

    /// Linear gradient color at screen point
    #[inline]
    pub fn linear_at(&self, point: Point) -> PremulRGBA {
        let local = self.matrix.apply(point);
        self.lut.at(self.param(local.x()))
    }

    /// Radial gradient color at screen point
    #[inline]
    pub fn radial_at(&self, point: Point) -> PremulRGBA {
        let local = self.matrix.apply(point);
        self.lut.at(self.param(local.length()))
    }
}
