//! Immediate mode rendering context
//!
//! [`Canvas`] keeps persistent drawing state (transformation, styles, clip box and
//! the current path) and renders into an attached premultiplied RGBA buffer.
use crate::{
    Align, BBox, BlendMode, ClipBox, Compositor, DEFAULT_MITER_LIMIT, FillRule, FlatPath,
    Gradient, GradientLut, Image, ImageBlend, ImageFilter, ImagePattern, ImageRef,
    ImageResample, LineCap, LineJoin, Paint, Path, Point, PremulRGBA, Premultiply, Rasterizer,
    Scalar, Shape, StrokeStyle, Style, Transform, compose, stroke,
};
use std::fmt;

/// Ratio between transformation scale and curve approximation scale
pub const APPROXIMATION_SCALE: Scalar = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Buffer is smaller than `(height - 1) * stride + width * 4` bytes
    BufferTooSmall,
    /// Stride is not a multiple of 4 or is smaller than a row of pixels
    InvalidStride,
    /// Operation requires an attached buffer
    NotAttached,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferTooSmall => write!(f, "Buffer is too small for the requested size"),
            Error::InvalidStride => write!(f, "Stride must be a multiple of 4 covering a row"),
            Error::NotAttached => write!(f, "Render buffer is not attached"),
        }
    }
}

impl std::error::Error for Error {}

/// Borrowed premultiplied RGBA pixel memory, `stride` is in bytes
pub struct RenderBuffer<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl fmt::Debug for RenderBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish()
    }
}

impl<'a> RenderBuffer<'a> {
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, Error> {
        if stride % 4 != 0 || stride / 4 < width {
            return Err(Error::InvalidStride);
        }
        let required = if width == 0 || height == 0 {
            0
        } else {
            (height - 1) * stride + width * 4
        };
        if data.len() < required {
            return Err(Error::BufferTooSmall);
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Clip box covering the whole buffer
    pub fn clip_box(&self) -> ClipBox {
        ClipBox::from_size(self.width, self.height)
    }

    /// Pixels of the row `y`, panics if `y >= height`
    pub fn row(&self, y: usize) -> &[PremulRGBA] {
        let start = y * self.stride;
        bytemuck::cast_slice(&self.data[start..start + self.width * 4])
    }

    /// Mutable pixels of the row `y`, panics if `y >= height`
    pub fn row_mut(&mut self, y: usize) -> &mut [PremulRGBA] {
        let start = y * self.stride;
        bytemuck::cast_slice_mut(&mut self.data[start..start + self.width * 4])
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<PremulRGBA> {
        if !self.clip_box().contains(x, y) {
            return None;
        }
        self.row(y as usize).get(x as usize).copied()
    }

    /// View buffer as an image
    pub fn as_image(&self) -> ImageRef<'_, PremulRGBA> {
        let shape = Shape {
            width: self.width,
            height: self.height,
            row_stride: self.stride / 4,
        };
        let size = self.data.len() / 4 * 4;
        ImageRef::new(shape, bytemuck::cast_slice(&self.data[..size]))
    }

    /// Fill pixels inside of the clip box with color
    fn fill(&mut self, clip: ClipBox, color: PremulRGBA) {
        let clip = clip.intersect(self.clip_box());
        if clip.is_empty() {
            return;
        }
        for y in clip.y1..=clip.y2 {
            self.row_mut(y as usize)[clip.x1 as usize..=clip.x2 as usize].fill(color);
        }
    }
}

/// What `draw_path` renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrawPathFlag {
    /// Fill with the fill style
    FillOnly,
    /// Stroke with the line style
    StrokeOnly,
    /// Fill with the fill style then stroke with the line style
    #[default]
    FillAndStroke,
    /// Fill with the line style
    FillWithLineColor,
}

/// How world box is mapped onto screen box by `viewport`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewportOption {
    /// Stretch along both axes independently
    Anisotropic,
    XMinYMin,
    #[default]
    XMidYMid,
    XMaxYMax,
}

/// Rendering context
pub struct Canvas<'a> {
    buffer: Option<RenderBuffer<'a>>,
    clip: ClipBox,
    transform: Transform,
    approximation_scale: Scalar,
    path: Path,
    fill_style: Style,
    line_style: Style,
    stroke: StrokeStyle,
    miter_limit: Scalar,
    fill_rule: FillRule,
    compositor: Compositor,
    image_filter: ImageFilter,
    image_resample: ImageResample,
    image_blend: ImageBlend,
    rasterizer: Rasterizer,
}

impl Default for Canvas<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Canvas<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("buffer", &self.buffer)
            .field("clip", &self.clip)
            .field("transform", &self.transform)
            .field("fill_style", &self.fill_style)
            .field("line_style", &self.line_style)
            .field("stroke", &self.stroke_style())
            .field("fill_rule", &self.fill_rule)
            .field("compositor", &self.compositor)
            .finish()
    }
}

impl<'a> Canvas<'a> {
    /// Detached canvas with default state
    pub fn new() -> Self {
        Self {
            buffer: None,
            clip: ClipBox::empty(),
            transform: Transform::identity(),
            approximation_scale: APPROXIMATION_SCALE,
            path: Path::new(),
            fill_style: Style::Solid(PremulRGBA::new(255, 255, 255, 255)),
            line_style: Style::Solid(PremulRGBA::new(0, 0, 0, 255)),
            stroke: StrokeStyle::default(),
            miter_limit: DEFAULT_MITER_LIMIT,
            fill_rule: FillRule::NonZero,
            compositor: Compositor::default(),
            image_filter: ImageFilter::default(),
            image_resample: ImageResample::default(),
            image_blend: ImageBlend::default(),
            rasterizer: Rasterizer::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Render buffer
    // -------------------------------------------------------------------------

    /// Attach render buffer, `stride` is in bytes
    ///
    /// Drawing state is reset to defaults and the clip box covers the whole buffer.
    /// The current path is preserved.
    pub fn attach(
        &mut self,
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<(), Error> {
        let buffer = RenderBuffer::new(data, width, height, stride)?;
        tracing::debug!("[canvas:attach] {}x{} stride={}", width, height, stride);
        let path = std::mem::take(&mut self.path);
        let rasterizer = std::mem::take(&mut self.rasterizer);
        *self = Self {
            clip: buffer.clip_box(),
            buffer: Some(buffer),
            path,
            rasterizer,
            ..Self::new()
        };
        Ok(())
    }

    /// Detach render buffer and return it
    pub fn detach(&mut self) -> Option<RenderBuffer<'a>> {
        self.clip = ClipBox::empty();
        self.buffer.take()
    }

    pub fn is_attached(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn buffer(&self) -> Option<&RenderBuffer<'a>> {
        self.buffer.as_ref()
    }

    fn buffer_mut(&mut self) -> Option<&mut RenderBuffer<'a>> {
        let buffer = self.buffer.as_mut();
        if buffer.is_none() {
            tracing::debug!("[canvas] render buffer is not attached");
        }
        buffer
    }

    /// Set clip box with inclusive corners, clamped to the buffer bounds
    pub fn clip_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> &mut Self {
        let bounds = self
            .buffer
            .as_ref()
            .map_or_else(ClipBox::empty, RenderBuffer::clip_box);
        self.clip = ClipBox::new(x1, y1, x2, y2).intersect(bounds);
        self
    }

    pub fn clip_box_get(&self) -> ClipBox {
        self.clip
    }

    /// Whether screen point is inside of the clip box
    pub fn in_box(&self, point: Point) -> bool {
        let Point([x, y]) = point;
        x >= self.clip.x1 as Scalar
            && y >= self.clip.y1 as Scalar
            && x <= self.clip.x2 as Scalar
            && y <= self.clip.y2 as Scalar
    }

    /// Replace all pixels of the buffer with color
    pub fn clear_all(&mut self, color: impl Premultiply) -> &mut Self {
        let color = color.premultiply();
        if let Some(buffer) = self.buffer_mut() {
            let clip = buffer.clip_box();
            buffer.fill(clip, color);
        }
        self
    }

    /// Replace all pixels inside of the clip box with color
    pub fn clear_clip_box(&mut self, color: impl Premultiply) -> &mut Self {
        let color = color.premultiply();
        let clip = self.clip;
        if let Some(buffer) = self.buffer_mut() {
            buffer.fill(clip, color);
        }
        self
    }

    /// Pixel of the attached buffer
    pub fn pixel(&self, x: i32, y: i32) -> Option<PremulRGBA> {
        self.buffer.as_ref()?.pixel(x, y)
    }

    // -------------------------------------------------------------------------
    // Transformations
    // -------------------------------------------------------------------------

    fn set_transform(&mut self, transform: Transform) -> &mut Self {
        self.transform = transform;
        self.approximation_scale = self.world_to_screen_scalar(1.0) * APPROXIMATION_SCALE;
        self
    }

    pub fn reset_transformations(&mut self) -> &mut Self {
        self.set_transform(Transform::identity())
    }

    /// Current world to screen transformation
    pub fn transformations(&self) -> Transform {
        self.transform
    }

    /// Replace current transformation
    pub fn set_transformations(&mut self, transform: Transform) -> &mut Self {
        self.set_transform(transform)
    }

    pub fn translate(&mut self, tx: Scalar, ty: Scalar) -> &mut Self {
        self.set_transform(self.transform.translate(tx, ty))
    }

    pub fn rotate(&mut self, angle: Scalar) -> &mut Self {
        self.set_transform(self.transform.rotate(angle))
    }

    pub fn scale(&mut self, sx: Scalar, sy: Scalar) -> &mut Self {
        self.set_transform(self.transform.scale(sx, sy))
    }

    /// Skew by angles in radians
    pub fn skew(&mut self, ax: Scalar, ay: Scalar) -> &mut Self {
        self.set_transform(self.transform.skew(ax, ay))
    }

    /// Multiply current transformation by an arbitrary matrix
    pub fn affine(&mut self, tr: Transform) -> &mut Self {
        self.set_transform(self.transform * tr)
    }

    /// Map rectangle onto parallelogram
    ///
    /// Parallelogram corners correspond to `(x0, y0)`, `(x1, y0)` and `(x1, y1)`
    /// corners of the rectangle. Degenerate input leaves transformation unchanged.
    pub fn parallelogram(&mut self, rect: BBox, parl: [Point; 3]) -> &mut Self {
        match Transform::rect_to_parl(rect, parl) {
            Some(tr) => self.affine(tr),
            None => {
                tracing::warn!("[canvas] degenerate parallelogram is ignored");
                self
            }
        }
    }

    /// Map world box onto screen box
    pub fn viewport(&mut self, world: BBox, screen: BBox, option: ViewportOption) -> &mut Self {
        if world.width() <= 0.0 || world.height() <= 0.0 {
            tracing::warn!("[canvas] empty viewport world box is ignored");
            return self;
        }
        let tr = match option {
            ViewportOption::Anisotropic => Transform::stretch(world, screen),
            ViewportOption::XMinYMin => Transform::fit(world, screen, Align::Min),
            ViewportOption::XMidYMid => Transform::fit(world, screen, Align::Mid),
            ViewportOption::XMaxYMax => Transform::fit(world, screen, Align::Max),
        };
        self.affine(tr)
    }

    pub fn world_to_screen(&self, point: Point) -> Point {
        self.transform.apply(point)
    }

    /// Inverse of `world_to_screen`, point is returned unchanged if the
    /// transformation is degenerate.
    pub fn screen_to_world(&self, point: Point) -> Point {
        self.transform
            .invert()
            .map_or(point, |inverse| inverse.apply(point))
    }

    /// Length of the world space distance on the screen
    pub fn world_to_screen_scalar(&self, scalar: Scalar) -> Scalar {
        scalar * self.transform.scale_factor()
    }

    pub fn screen_to_world_scalar(&self, scalar: Scalar) -> Scalar {
        self.transform
            .invert()
            .map_or(scalar, |inverse| scalar * inverse.scale_factor())
    }

    /// Scale used for the curves approximation
    pub fn approximation_scale(&self) -> Scalar {
        self.approximation_scale
    }

    /// World space distance between curves and their approximation
    fn flatness(&self) -> Scalar {
        0.5 / self.approximation_scale.max(crate::EPSILON_SQRT)
    }

    // -------------------------------------------------------------------------
    // Styles
    // -------------------------------------------------------------------------

    pub fn fill_style(&self) -> &Style {
        &self.fill_style
    }

    pub fn line_style(&self) -> &Style {
        &self.line_style
    }

    pub fn fill_color(&mut self, color: impl Premultiply) -> &mut Self {
        self.fill_style = Style::Solid(color.premultiply());
        self
    }

    pub fn line_color(&mut self, color: impl Premultiply) -> &mut Self {
        self.line_style = Style::Solid(color.premultiply());
        self
    }

    pub fn no_fill(&mut self) -> &mut Self {
        self.fill_style = Style::None;
        self
    }

    pub fn no_line(&mut self) -> &mut Self {
        self.line_style = Style::None;
        self
    }

    fn linear_gradient(&self, lut: GradientLut, p1: Point, p2: Point) -> Option<Style> {
        let grad = Gradient::linear(lut, p1, p2, self.transform);
        if grad.is_none() {
            tracing::warn!("[canvas] linear gradient under degenerate transformation is ignored");
        }
        grad.map(Style::Linear)
    }

    fn radial_gradient(&self, lut: GradientLut, center: Point, radius: Scalar) -> Option<Style> {
        if self.transform.is_degenerate() {
            tracing::warn!("[canvas] radial gradient under degenerate transformation is ignored");
            return None;
        }
        Some(Style::Radial(Gradient::radial(
            lut,
            center,
            radius,
            self.transform,
        )))
    }

    /// Linear gradient from `p1` to `p2` with stops at `0.0`, `0.5` and `1.0`
    ///
    /// Gradient geometry is fixed by the current transformation.
    pub fn fill_linear_gradient(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        c1: impl Premultiply,
        c2: impl Premultiply,
        c3: impl Premultiply,
    ) -> &mut Self {
        let lut = GradientLut::new(c1, c2, c3);
        if let Some(style) = self.linear_gradient(lut, p1.into(), p2.into()) {
            self.fill_style = style;
        }
        self
    }

    /// Linear gradient from `p1` to `p2` between two colors with `profile`
    pub fn fill_linear_gradient_stops(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        c1: impl Premultiply,
        c2: impl Premultiply,
        profile: Scalar,
    ) -> &mut Self {
        let lut = GradientLut::with_profile(c1, c2, profile);
        if let Some(style) = self.linear_gradient(lut, p1.into(), p2.into()) {
            self.fill_style = style;
        }
        self
    }

    /// Radial gradient with stops at `0.0`, `0.5` and `1.0`
    pub fn fill_radial_gradient(
        &mut self,
        center: impl Into<Point>,
        radius: Scalar,
        c1: impl Premultiply,
        c2: impl Premultiply,
        c3: impl Premultiply,
    ) -> &mut Self {
        let lut = GradientLut::new(c1, c2, c3);
        if let Some(style) = self.radial_gradient(lut, center.into(), radius) {
            self.fill_style = style;
        }
        self
    }

    pub fn fill_radial_gradient_stops(
        &mut self,
        center: impl Into<Point>,
        radius: Scalar,
        c1: impl Premultiply,
        c2: impl Premultiply,
        profile: Scalar,
    ) -> &mut Self {
        let lut = GradientLut::with_profile(c1, c2, profile);
        if let Some(style) = self.radial_gradient(lut, center.into(), radius) {
            self.fill_style = style;
        }
        self
    }

    pub fn line_linear_gradient(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        c1: impl Premultiply,
        c2: impl Premultiply,
        c3: impl Premultiply,
    ) -> &mut Self {
        let lut = GradientLut::new(c1, c2, c3);
        if let Some(style) = self.linear_gradient(lut, p1.into(), p2.into()) {
            self.line_style = style;
        }
        self
    }

    pub fn line_linear_gradient_stops(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        c1: impl Premultiply,
        c2: impl Premultiply,
        profile: Scalar,
    ) -> &mut Self {
        let lut = GradientLut::with_profile(c1, c2, profile);
        if let Some(style) = self.linear_gradient(lut, p1.into(), p2.into()) {
            self.line_style = style;
        }
        self
    }

    pub fn line_radial_gradient(
        &mut self,
        center: impl Into<Point>,
        radius: Scalar,
        c1: impl Premultiply,
        c2: impl Premultiply,
        c3: impl Premultiply,
    ) -> &mut Self {
        let lut = GradientLut::new(c1, c2, c3);
        if let Some(style) = self.radial_gradient(lut, center.into(), radius) {
            self.line_style = style;
        }
        self
    }

    pub fn line_radial_gradient_stops(
        &mut self,
        center: impl Into<Point>,
        radius: Scalar,
        c1: impl Premultiply,
        c2: impl Premultiply,
        profile: Scalar,
    ) -> &mut Self {
        let lut = GradientLut::with_profile(c1, c2, profile);
        if let Some(style) = self.radial_gradient(lut, center.into(), radius) {
            self.line_style = style;
        }
        self
    }

    /// Stroke parameters used by `draw_path`
    pub fn stroke_style(&self) -> StrokeStyle {
        let line_join = match self.stroke.line_join {
            LineJoin::Miter(_) => LineJoin::Miter(self.miter_limit),
            join => join,
        };
        StrokeStyle {
            line_join,
            ..self.stroke
        }
    }

    /// Stroke width in world units, non-positive width disables stroking
    pub fn line_width(&mut self, width: Scalar) -> &mut Self {
        self.stroke.width = width;
        self
    }

    pub fn line_cap(&mut self, cap: LineCap) -> &mut Self {
        self.stroke.line_cap = cap;
        self
    }

    /// Set line join, miter join also updates miter limit
    pub fn line_join(&mut self, join: LineJoin) -> &mut Self {
        if let LineJoin::Miter(limit) = join {
            self.miter_limit = limit;
        }
        self.stroke.line_join = join;
        self
    }

    pub fn miter_limit(&mut self, limit: Scalar) -> &mut Self {
        self.miter_limit = limit;
        self
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn fill_even_odd(&mut self, even_odd: bool) -> &mut Self {
        self.fill_rule = if even_odd {
            FillRule::EvenOdd
        } else {
            FillRule::NonZero
        };
        self
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Global opacity in `[0, 1]` applied to everything drawn
    pub fn master_alpha(&mut self, alpha: Scalar) -> &mut Self {
        let compositor = &self.compositor;
        self.compositor = Compositor::new(compositor.mode(), alpha, compositor.gamma());
        self
    }

    /// Exponent applied to anti-aliasing coverage
    pub fn anti_alias_gamma(&mut self, gamma: Scalar) -> &mut Self {
        let compositor = &self.compositor;
        self.compositor = Compositor::new(compositor.mode(), compositor.master_alpha(), gamma);
        self
    }

    pub fn blend_mode(&mut self, mode: BlendMode) -> &mut Self {
        let compositor = &self.compositor;
        self.compositor = Compositor::new(mode, compositor.master_alpha(), compositor.gamma());
        self
    }

    pub fn image_filter(&mut self, filter: ImageFilter) -> &mut Self {
        self.image_filter = filter;
        self
    }

    pub fn image_resample(&mut self, resample: ImageResample) -> &mut Self {
        self.image_resample = resample;
        self
    }

    /// Mode used to blend image blend color onto image pixels, `Dst` disables it
    pub fn image_blend_mode(&mut self, mode: BlendMode) -> &mut Self {
        self.image_blend.mode = mode;
        self
    }

    pub fn image_blend_color(&mut self, color: impl Premultiply) -> &mut Self {
        self.image_blend.color = color.premultiply();
        self
    }

    // -------------------------------------------------------------------------
    // Path
    // -------------------------------------------------------------------------

    /// Current path in world coordinates
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut Path {
        &mut self.path
    }

    pub fn reset_path(&mut self) -> &mut Self {
        self.path.remove_all();
        self
    }

    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.path.move_to(p);
        self
    }

    pub fn move_rel(&mut self, d: impl Into<Point>) -> &mut Self {
        self.path.move_rel(d);
        self
    }

    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.path.line_to(p);
        self
    }

    pub fn line_rel(&mut self, d: impl Into<Point>) -> &mut Self {
        self.path.line_rel(d);
        self
    }

    pub fn hor_line_to(&mut self, x: Scalar) -> &mut Self {
        self.path.hor_line_to(x);
        self
    }

    pub fn hor_line_rel(&mut self, dx: Scalar) -> &mut Self {
        self.path.hor_line_rel(dx);
        self
    }

    pub fn ver_line_to(&mut self, y: Scalar) -> &mut Self {
        self.path.ver_line_to(y);
        self
    }

    pub fn ver_line_rel(&mut self, dy: Scalar) -> &mut Self {
        self.path.ver_line_rel(dy);
        self
    }

    pub fn curve3(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        self.path.curve3(p1, p2);
        self
    }

    pub fn curve3_rel(&mut self, d1: impl Into<Point>, d2: impl Into<Point>) -> &mut Self {
        self.path.curve3_rel(d1, d2);
        self
    }

    pub fn curve3_smooth(&mut self, p2: impl Into<Point>) -> &mut Self {
        self.path.curve3_smooth(p2);
        self
    }

    pub fn curve4(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        self.path.curve4(p1, p2, p3);
        self
    }

    pub fn curve4_rel(
        &mut self,
        d1: impl Into<Point>,
        d2: impl Into<Point>,
        d3: impl Into<Point>,
    ) -> &mut Self {
        self.path.curve4_rel(d1, d2, d3);
        self
    }

    pub fn curve4_smooth(&mut self, p2: impl Into<Point>, p3: impl Into<Point>) -> &mut Self {
        self.path.curve4_smooth(p2, p3);
        self
    }

    /// Elliptic arc to `p`, `angle` is the x axis rotation in radians
    pub fn arc_to(
        &mut self,
        rx: Scalar,
        ry: Scalar,
        angle: Scalar,
        large: bool,
        sweep: bool,
        p: impl Into<Point>,
    ) -> &mut Self {
        self.path.arc_to((rx, ry), angle, large, sweep, p);
        self
    }

    pub fn arc_rel(
        &mut self,
        rx: Scalar,
        ry: Scalar,
        angle: Scalar,
        large: bool,
        sweep: bool,
        d: impl Into<Point>,
    ) -> &mut Self {
        self.path.arc_rel((rx, ry), angle, large, sweep, d);
        self
    }

    pub fn close_polygon(&mut self) -> &mut Self {
        self.path.close();
        self
    }

    /// Append commands of the path
    pub fn add_path(&mut self, path: &Path) -> &mut Self {
        self.path.concat_path(path);
        self
    }

    pub fn line(&mut self, p0: impl Into<Point>, p1: impl Into<Point>) -> &mut Self {
        self.path.line(p0, p1);
        self
    }

    pub fn triangle(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
    ) -> &mut Self {
        self.path.triangle(p0, p1, p2);
        self
    }

    pub fn rectangle(&mut self, p0: impl Into<Point>, p1: impl Into<Point>) -> &mut Self {
        self.path.rectangle(p0, p1);
        self
    }

    pub fn rounded_rect(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        r: Scalar,
    ) -> &mut Self {
        self.path.rounded_rect(p0, p1, r);
        self
    }

    pub fn rounded_rect_xy(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        rx: Scalar,
        ry: Scalar,
    ) -> &mut Self {
        self.path.rounded_rect_xy(p0, p1, (rx, ry));
        self
    }

    /// Rounded rectangle with radii in order bottom-left, bottom-right, top-right, top-left
    pub fn rounded_rect_corners(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        radii: [Point; 4],
    ) -> &mut Self {
        self.path.rounded_rect_corners(p0, p1, radii);
        self
    }

    pub fn ellipse(&mut self, center: impl Into<Point>, rx: Scalar, ry: Scalar) -> &mut Self {
        self.path.ellipse(center, rx, ry);
        self
    }

    pub fn arc(
        &mut self,
        center: impl Into<Point>,
        rx: Scalar,
        ry: Scalar,
        start: Scalar,
        sweep: Scalar,
    ) -> &mut Self {
        self.path.arc(center, rx, ry, start, sweep);
        self
    }

    pub fn star(
        &mut self,
        center: impl Into<Point>,
        r1: Scalar,
        r2: Scalar,
        start_angle: Scalar,
        rays: usize,
    ) -> &mut Self {
        self.path.star(center, r1, r2, start_angle, rays);
        self
    }

    pub fn curve(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
    ) -> &mut Self {
        self.path.curve(p0, p1, p2);
        self
    }

    pub fn cubic_curve(
        &mut self,
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        self.path.cubic_curve(p0, p1, p2, p3);
        self
    }

    pub fn polygon(&mut self, points: &[Point]) -> &mut Self {
        self.path.polygon(points);
        self
    }

    pub fn polyline(&mut self, points: &[Point]) -> &mut Self {
        self.path.polyline(points);
        self
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Render current path, the path itself is not modified
    pub fn draw_path(&mut self, flag: DrawPathFlag) -> &mut Self {
        let _span = tracing::debug_span!("[canvas:draw_path]", ?flag).entered();
        if self.buffer_mut().is_none() || self.clip.is_empty() || self.path.is_empty() {
            return self;
        }
        let flatness = self.flatness();
        let flat = self.path.flatten(flatness);
        match flag {
            DrawPathFlag::FillOnly => self.fill(&flat, false),
            DrawPathFlag::StrokeOnly => self.stroke(&flat, flatness),
            DrawPathFlag::FillAndStroke => {
                self.fill(&flat, false);
                self.stroke(&flat, flatness);
            }
            DrawPathFlag::FillWithLineColor => self.fill(&flat, true),
        }
        self
    }

    fn fill(&mut self, flat: &FlatPath, line_style: bool) {
        let style = if line_style {
            &self.line_style
        } else {
            &self.fill_style
        };
        if style.is_none() {
            return;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        rasterize(
            &mut self.rasterizer,
            buffer,
            self.clip,
            &self.compositor,
            style,
            self.fill_rule,
            flat,
            self.transform,
        );
    }

    fn stroke(&mut self, flat: &FlatPath, flatness: Scalar) {
        let style = self.stroke_style();
        if style.width <= 0.0 || self.line_style.is_none() {
            return;
        }
        let outline = {
            let _span = tracing::debug_span!("[canvas:stroke]", width = style.width).entered();
            stroke::outline(flat, style, flatness)
        };
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        rasterize(
            &mut self.rasterizer,
            buffer,
            self.clip,
            &self.compositor,
            &self.line_style,
            FillRule::NonZero,
            &outline,
            self.transform,
        );
    }

    // -------------------------------------------------------------------------
    // Images
    // -------------------------------------------------------------------------

    /// Draw `src` rectangle of the image transformed onto `dst` world rectangle
    ///
    /// Current path is replaced by the `dst` rectangle.
    pub fn transform_image(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: BBox,
        dst: BBox,
    ) -> &mut Self {
        let parl = [
            dst.min(),
            Point::new(dst.max().x(), dst.min().y()),
            dst.max(),
        ];
        self.transform_image_parl(image, src, parl)
    }

    /// Draw `src` rectangle of the image transformed onto world parallelogram
    ///
    /// Parallelogram corners correspond to `(x0, y0)`, `(x1, y0)` and `(x1, y1)`
    /// corners of the `src` rectangle. Current path is replaced by the parallelogram.
    pub fn transform_image_parl(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: BBox,
        parl: [Point; 3],
    ) -> &mut Self {
        let [p0, p1, p2] = parl;
        self.path.remove_all();
        self.path.polygon(&[p0, p1, p2, p0 + p2 - p1]);
        self.render_image(image, src, parl)
    }

    /// Draw `src` rectangle of the image transformed onto `dst` world rectangle,
    /// clipped by the current path
    pub fn transform_image_path(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: BBox,
        dst: BBox,
    ) -> &mut Self {
        let parl = [
            dst.min(),
            Point::new(dst.max().x(), dst.min().y()),
            dst.max(),
        ];
        self.transform_image_path_parl(image, src, parl)
    }

    /// Draw `src` rectangle of the image transformed onto world parallelogram,
    /// clipped by the current path
    pub fn transform_image_path_parl(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: BBox,
        parl: [Point; 3],
    ) -> &mut Self {
        self.render_image(image, src, parl)
    }

    fn render_image(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: BBox,
        parl: [Point; 3],
    ) -> &mut Self {
        let _span = tracing::debug_span!(
            "[canvas:image]",
            width = image.width(),
            height = image.height()
        )
        .entered();
        if self.buffer_mut().is_none() || self.clip.is_empty() || self.path.is_empty() {
            return self;
        }
        let matrix = Transform::rect_to_parl(src, parl)
            .map(|tr| self.transform * tr)
            .and_then(|tr| tr.invert());
        let Some(matrix) = matrix else {
            tracing::warn!("[canvas] degenerate image mapping is ignored");
            return self;
        };
        let pattern = ImagePattern::new(
            image,
            matrix,
            self.image_filter,
            self.image_resample,
            self.image_blend,
        );
        let flat = self.path.flatten(self.flatness());
        if let Some(buffer) = self.buffer.as_mut() {
            rasterize(
                &mut self.rasterizer,
                buffer,
                self.clip,
                &self.compositor,
                &pattern,
                self.fill_rule,
                &flat,
                self.transform,
            );
        }
        self
    }

    /// Blend `src` pixels of the image (inclusive corners) at world point `dst`
    /// without transformation, `alpha` is multiplied by master alpha
    pub fn blend_image(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: ClipBox,
        dst: Point,
        alpha: u8,
    ) -> &mut Self {
        let cover = (alpha as Scalar * self.compositor.master_alpha() + 0.5) as u8;
        self.put_image(image, src, dst, |compositor, dst, src| {
            compositor.blend_span(dst, src, cover)
        })
    }

    /// Copy `src` pixels of the image (inclusive corners) to world point `dst`
    /// without transformation or blending
    pub fn copy_image(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: ClipBox,
        dst: Point,
    ) -> &mut Self {
        self.put_image(image, src, dst, |_, dst, src| dst.copy_from_slice(src))
    }

    fn put_image(
        &mut self,
        image: ImageRef<'_, PremulRGBA>,
        src: ClipBox,
        dst: Point,
        mut put: impl FnMut(&Compositor, &mut [PremulRGBA], &[PremulRGBA]),
    ) -> &mut Self {
        let _span = tracing::debug_span!(
            "[canvas:image]",
            width = image.width(),
            height = image.height()
        )
        .entered();
        let origin = self.world_to_screen(dst);
        let src = src.intersect(ClipBox::from_size(image.width(), image.height()));
        if src.is_empty() {
            return self;
        }
        // image pixel (x, y) lands at (x + dx, y + dy), far away origins saturate
        let dx = (origin.x() as i64).saturating_sub(src.x1 as i64);
        let dy = (origin.y() as i64).saturating_sub(src.y1 as i64);
        let clip = self.clip;
        let x1 = (src.x1 as i64).saturating_add(dx).max(clip.x1 as i64);
        let y1 = (src.y1 as i64).saturating_add(dy).max(clip.y1 as i64);
        let x2 = (src.x2 as i64).saturating_add(dx).min(clip.x2 as i64);
        let y2 = (src.y2 as i64).saturating_add(dy).min(clip.y2 as i64);
        if x1 > x2 || y1 > y2 {
            return self;
        }
        // both corners lie inside the clip box now
        let target = ClipBox::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        let compositor = &self.compositor;
        let Some(buffer) = self.buffer.as_mut() else {
            return self;
        };
        for y in target.y1..=target.y2 {
            let row = (y as i64 - dy) as usize;
            let start = image.shape().offset(row, (target.x1 as i64 - dx) as usize);
            let Some(src_row) = image.data().get(start..start + target.width()) else {
                continue;
            };
            let dst_row = &mut buffer.row_mut(y as usize)[target.x1 as usize..=target.x2 as usize];
            put(compositor, dst_row, src_row);
        }
        self
    }
}

/// Rasterize path and composite it with the paint
#[allow(clippy::too_many_arguments)]
fn rasterize(
    rasterizer: &mut Rasterizer,
    buffer: &mut RenderBuffer<'_>,
    clip: ClipBox,
    compositor: &Compositor,
    paint: &dyn Paint,
    fill_rule: FillRule,
    path: &FlatPath,
    tr: Transform,
) {
    rasterizer.reset(clip);
    rasterizer.add_polylines(path, tr);
    compose::render(rasterizer, fill_rule, paint, compositor, buffer, clip);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImageOwned, RGBA, assert_approx_eq};

    const SIZE: usize = 8;
    const RED: PremulRGBA = PremulRGBA::new(255, 0, 0, 255);
    const BLACK: PremulRGBA = PremulRGBA::new(0, 0, 0, 255);
    const WHITE: PremulRGBA = PremulRGBA::new(255, 255, 255, 255);
    const SENTINEL: PremulRGBA = PremulRGBA::new(1, 2, 3, 4);

    fn buffer() -> Vec<u8> {
        vec![0u8; SIZE * SIZE * 4]
    }

    fn pixels(data: &[u8]) -> &[PremulRGBA] {
        bytemuck::cast_slice(data)
    }

    fn pixel(data: &[u8], x: usize, y: usize) -> PremulRGBA {
        pixels(data)[y * SIZE + x]
    }

    #[test]
    fn test_world_screen_round_trip() {
        let mut canvas = Canvas::new();
        canvas.translate(3.0, -2.0).rotate(0.7).scale(2.0, 0.5).skew(0.1, 0.2);
        for point in [Point::new(0.0, 0.0), Point::new(1.5, -7.0), Point::new(100.0, 3.0)] {
            let back = canvas.screen_to_world(canvas.world_to_screen(point));
            assert_approx_eq!(back.x(), point.x(), 1e-9);
            assert_approx_eq!(back.y(), point.y(), 1e-9);
        }

        // scalars are measured along the diagonal, they round trip only for similarities
        canvas.reset_transformations().translate(3.0, -2.0).rotate(0.7).scale(2.5, 2.5);
        assert_approx_eq!(canvas.world_to_screen_scalar(3.0), 7.5, 1e-9);
        let length = canvas.screen_to_world_scalar(canvas.world_to_screen_scalar(3.0));
        assert_approx_eq!(length, 3.0, 1e-9);

        canvas.reset_transformations().scale(4.0, 4.0);
        assert_approx_eq!(canvas.world_to_screen_scalar(1.0), 4.0, 1e-9);
        assert_approx_eq!(canvas.approximation_scale(), 4.0 * APPROXIMATION_SCALE, 1e-9);

        // degenerate transformation keeps points unchanged
        canvas.scale(0.0, 1.0);
        let point = Point::new(5.0, 6.0);
        assert_eq!(canvas.screen_to_world(point), point);
    }

    #[test]
    fn test_attach_errors() {
        let mut data = buffer();
        let result = Canvas::new().attach(&mut data, SIZE, SIZE, 30);
        assert_eq!(result, Err(Error::InvalidStride));
        let result = Canvas::new().attach(&mut data, SIZE, SIZE, 28);
        assert_eq!(result, Err(Error::InvalidStride));

        let mut small = vec![0u8; SIZE * SIZE * 4 - 1];
        let mut canvas = Canvas::new();
        let result = canvas.attach(&mut small, SIZE, SIZE, SIZE * 4);
        assert_eq!(result, Err(Error::BufferTooSmall));
        assert!(!canvas.is_attached());

        // last row does not need padding
        let mut padded = vec![0u8; 40 * (SIZE - 1) + SIZE * 4];
        let mut canvas = Canvas::new();
        assert!(canvas.attach(&mut padded, SIZE, SIZE, 40).is_ok());
        assert!(canvas.is_attached());
        assert_eq!(canvas.clip_box_get(), ClipBox::new(0, 0, 7, 7));
        assert_eq!(Error::NotAttached.to_string(), "Render buffer is not attached");
    }

    #[test]
    fn test_not_attached() {
        let mut canvas = Canvas::new();
        canvas
            .fill_color(RED)
            .rectangle((0.0, 0.0), (8.0, 8.0))
            .draw_path(DrawPathFlag::FillAndStroke)
            .clear_all(RED);
        assert_eq!(canvas.pixel(0, 0), None);
        assert!(canvas.clip_box_get().is_empty());
        assert!(!canvas.path().is_empty());
    }

    #[test]
    fn test_solid_fill() {
        let mut data = buffer();
        {
            let mut canvas = Canvas::new();
            canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
            canvas
                .clear_all(RGBA::new(0, 0, 0, 0))
                .fill_color(RGBA::new(255, 0, 0, 255))
                .no_line()
                .rectangle((0.0, 0.0), (8.0, 8.0))
                .draw_path(DrawPathFlag::FillOnly);
            assert_eq!(canvas.pixel(3, 3), Some(RED));
            assert_eq!(canvas.pixel(8, 0), None);
        }
        assert!(pixels(&data).iter().all(|pixel| *pixel == RED));
    }

    #[test]
    fn test_full_coverage() {
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas
            .clear_all(SENTINEL)
            .fill_color(RED)
            .rectangle((2.0, 3.0), (6.0, 7.0))
            .draw_path(DrawPathFlag::FillOnly);
        for y in 0..SIZE as i32 {
            for x in 0..SIZE as i32 {
                let inside = (2..6).contains(&x) && (3..7).contains(&y);
                let expected = if inside { RED } else { SENTINEL };
                assert_eq!(canvas.pixel(x, y), Some(expected), "{} {}", x, y);
            }
        }
    }

    #[test]
    fn test_src_over_transparent() {
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        let color = RGBA::new(200, 100, 50, 128);
        canvas
            .fill_color(color)
            .rectangle((0.0, 0.0), (8.0, 8.0))
            .draw_path(DrawPathFlag::FillOnly);
        assert_eq!(canvas.pixel(5, 5), Some(color.premultiply()));
    }

    #[test]
    fn test_clip_box() {
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas.clear_all(SENTINEL).clip_box(2, 2, 5, 5);
        assert!(canvas.in_box(Point::new(5.0, 2.0)));
        assert!(!canvas.in_box(Point::new(5.5, 2.0)));
        canvas
            .fill_color(RED)
            .rectangle((-10.0, -10.0), (20.0, 20.0))
            .draw_path(DrawPathFlag::FillAndStroke);
        for y in 0..SIZE as i32 {
            for x in 0..SIZE as i32 {
                let expected = if canvas.clip_box_get().contains(x, y) {
                    RED
                } else {
                    SENTINEL
                };
                assert_eq!(canvas.pixel(x, y), Some(expected), "{} {}", x, y);
            }
        }

        canvas.clear_clip_box(WHITE);
        assert_eq!(canvas.pixel(2, 2), Some(WHITE));
        assert_eq!(canvas.pixel(1, 1), Some(SENTINEL));

        // clip box is clamped to the buffer
        canvas.clip_box(-5, 4, 100, 100);
        assert_eq!(canvas.clip_box_get(), ClipBox::new(0, 4, 7, 7));
    }

    #[test]
    fn test_zero_width_stroke() {
        let draw = |flag| {
            let mut data = buffer();
            let mut canvas = Canvas::new();
            canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
            canvas
                .fill_color(RED)
                .line_color(BLACK)
                .line_width(0.0)
                .ellipse((4.0, 4.0), 3.0, 2.0)
                .draw_path(flag);
            data
        };
        let fill = draw(DrawPathFlag::FillOnly);
        assert_eq!(draw(DrawPathFlag::FillAndStroke), fill);
        assert_eq!(pixel(&fill, 4, 4), RED);
        assert!(draw(DrawPathFlag::StrokeOnly).iter().all(|byte| *byte == 0));
    }

    #[test]
    fn test_butt_stroke() {
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas
            .no_fill()
            .line_color(BLACK)
            .line_width(2.0)
            .line_cap(LineCap::Butt)
            .move_to((1.0, 4.0))
            .line_to((7.0, 4.0))
            .draw_path(DrawPathFlag::FillAndStroke);
        for y in 0..SIZE as i32 {
            for x in 0..SIZE as i32 {
                let inside = (1..7).contains(&x) && (3..5).contains(&y);
                let expected = if inside { BLACK } else { PremulRGBA::TRANSPARENT };
                assert_eq!(canvas.pixel(x, y), Some(expected), "{} {}", x, y);
            }
        }
    }

    #[test]
    fn test_even_odd() {
        let draw = |even_odd| {
            let mut data = buffer();
            let mut canvas = Canvas::new();
            canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
            canvas
                .fill_color(RED)
                .no_line()
                .fill_even_odd(even_odd)
                .rectangle((0.0, 0.0), (8.0, 8.0))
                .rectangle((2.0, 2.0), (6.0, 6.0))
                .draw_path(DrawPathFlag::FillOnly);
            data
        };
        let data = draw(true);
        assert_eq!(pixel(&data, 1, 1), RED);
        assert_eq!(pixel(&data, 4, 4), PremulRGBA::TRANSPARENT);
        let data = draw(false);
        assert_eq!(pixel(&data, 4, 4), RED);
    }

    #[test]
    fn test_linear_gradient() {
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas
            .fill_linear_gradient((0.0, 0.0), (8.0, 0.0), WHITE, BLACK, WHITE)
            .no_line()
            .rectangle((0.0, 0.0), (8.0, 8.0))
            .draw_path(DrawPathFlag::FillAndStroke);
        let row: Vec<PremulRGBA> = (0..SIZE as i32)
            .filter_map(|x| canvas.pixel(x, 2))
            .collect();
        assert!(row.iter().all(|pixel| pixel.a == 255));
        let (first, last) = (row[0].r as i32, row[SIZE - 1].r as i32);
        assert!(first > 200 && last > 200, "{:?}", row);
        assert!((first - last).abs() <= 3, "{:?}", row);
        let darkest = (0..SIZE).min_by_key(|x| row[*x].r).unwrap_or_default();
        assert!(darkest == 3 || darkest == 4, "{:?}", row);
        // does not depend on y
        assert_eq!(canvas.pixel(0, 0), canvas.pixel(0, 7));
    }

    #[test]
    fn test_gradient_capture() {
        let draw = |scale_before: bool, scale_after: bool| {
            let mut data = buffer();
            let mut canvas = Canvas::new();
            canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
            if scale_before {
                canvas.scale(2.0, 2.0);
            }
            canvas.fill_linear_gradient_stops((0.0, 0.0), (8.0, 0.0), BLACK, WHITE, 1.0);
            if scale_after {
                canvas.scale(2.0, 2.0);
            }
            let end = if scale_before || scale_after { 4.0 } else { 8.0 };
            canvas
                .no_line()
                .rectangle((0.0, 0.0), (end, end))
                .draw_path(DrawPathFlag::FillOnly);
            data
        };
        let plain = draw(false, false);
        assert_eq!(draw(false, true), plain);
        assert_ne!(draw(true, false), plain);
    }

    #[test]
    fn test_radial_gradient() {
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas
            .fill_radial_gradient((4.0, 4.0), 4.0, BLACK, WHITE, WHITE)
            .no_line()
            .rectangle((0.0, 0.0), (8.0, 8.0))
            .draw_path(DrawPathFlag::FillOnly);
        let center = canvas.pixel(4, 4).unwrap_or_default();
        assert_eq!(canvas.pixel(0, 0), Some(WHITE));
        assert!(center.r < 128, "{:?}", center);
        assert_eq!(canvas.pixel(3, 3), canvas.pixel(4, 4));
    }

    #[test]
    fn test_degenerate_gradient() {
        let mut canvas = Canvas::new();
        canvas.fill_color(RED).scale(0.0, 0.0);
        canvas.fill_linear_gradient((0.0, 0.0), (1.0, 0.0), BLACK, WHITE, BLACK);
        canvas.fill_radial_gradient((0.0, 0.0), 1.0, BLACK, WHITE, BLACK);
        assert_eq!(canvas.fill_style(), &Style::Solid(RED));
    }

    #[test]
    fn test_blend_modes() {
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas
            .clear_all(PremulRGBA::new(128, 128, 128, 255))
            .blend_mode(BlendMode::Multiply)
            .fill_color(RED)
            .no_line()
            .rectangle((0.0, 0.0), (4.0, 8.0))
            .draw_path(DrawPathFlag::FillOnly);
        assert_eq!(canvas.compositor().mode(), BlendMode::Multiply);
        assert_eq!(canvas.pixel(1, 1), Some(PremulRGBA::new(128, 0, 0, 255)));
        assert_eq!(canvas.pixel(5, 1), Some(PremulRGBA::new(128, 128, 128, 255)));

        // master alpha scales coverage
        canvas
            .clear_all(PremulRGBA::TRANSPARENT)
            .blend_mode(BlendMode::SrcOver)
            .master_alpha(0.5)
            .draw_path(DrawPathFlag::FillOnly);
        assert_eq!(canvas.pixel(1, 1), Some(PremulRGBA::new(128, 0, 0, 128)));

        // attach resets state
        let mut other = buffer();
        assert!(canvas.detach().is_some());
        canvas.attach(&mut other, SIZE, SIZE, SIZE * 4).unwrap();
        assert_eq!(canvas.compositor().master_alpha(), 1.0);
        assert_eq!(canvas.compositor().mode(), BlendMode::SrcOver);
        assert!(!canvas.path().is_empty());
    }

    #[test]
    fn test_viewport() {
        let mut canvas = Canvas::new();
        let world = BBox::new((0.0, 0.0), (10.0, 10.0));
        let screen = BBox::new((0.0, 0.0), (20.0, 40.0));
        canvas.viewport(world, screen, ViewportOption::XMidYMid);
        let p0 = canvas.world_to_screen(Point::new(0.0, 0.0));
        let p1 = canvas.world_to_screen(Point::new(10.0, 10.0));
        assert_approx_eq!(p0.y(), 10.0, 1e-9);
        assert_approx_eq!(p1.x(), 20.0, 1e-9);
        assert_approx_eq!(p1.y(), 30.0, 1e-9);

        canvas
            .reset_transformations()
            .viewport(world, screen, ViewportOption::Anisotropic);
        let p1 = canvas.world_to_screen(Point::new(10.0, 10.0));
        assert_approx_eq!(p1.x(), 20.0, 1e-9);
        assert_approx_eq!(p1.y(), 40.0, 1e-9);

        canvas
            .reset_transformations()
            .viewport(world, screen, ViewportOption::XMaxYMax);
        let p0 = canvas.world_to_screen(Point::new(0.0, 0.0));
        assert_approx_eq!(p0.y(), 20.0, 1e-9);
    }

    #[test]
    fn test_parallelogram() {
        let mut canvas = Canvas::new();
        let rect = BBox::new((0.0, 0.0), (1.0, 1.0));
        let parl = [Point::new(2.0, 2.0), Point::new(6.0, 2.0), Point::new(6.0, 4.0)];
        canvas.parallelogram(rect, parl);
        let p = canvas.world_to_screen(Point::new(1.0, 1.0));
        assert_approx_eq!(p.x(), 6.0, 1e-9);
        assert_approx_eq!(p.y(), 4.0, 1e-9);
    }

    fn checker() -> ImageOwned<PremulRGBA> {
        ImageOwned::new_with(4, 4, |row, col| if (row + col) % 2 == 0 { WHITE } else { RED })
    }

    #[test]
    fn test_transform_image() {
        let image = checker();
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas.image_filter(ImageFilter::NoFilter).transform_image(
            image.as_ref(),
            BBox::new((0.0, 0.0), (4.0, 4.0)),
            BBox::new((0.0, 0.0), (8.0, 8.0)),
        );
        for y in 0..SIZE {
            for x in 0..SIZE {
                let expected = image.get(y / 2, x / 2).copied();
                assert_eq!(canvas.pixel(x as i32, y as i32), expected, "{} {}", x, y);
            }
        }

        // image clipped by the current path
        canvas
            .clear_all(PremulRGBA::TRANSPARENT)
            .reset_path()
            .rectangle((0.0, 0.0), (4.0, 8.0))
            .transform_image_path(
                image.as_ref(),
                BBox::new((0.0, 0.0), (4.0, 4.0)),
                BBox::new((0.0, 0.0), (8.0, 8.0)),
            );
        assert_eq!(canvas.pixel(0, 0), Some(WHITE));
        assert_eq!(canvas.pixel(2, 0), Some(RED));
        assert_eq!(canvas.pixel(4, 0), Some(PremulRGBA::TRANSPARENT));

        // image blend color
        canvas
            .clear_all(PremulRGBA::TRANSPARENT)
            .image_blend_mode(BlendMode::Src)
            .image_blend_color(BLACK)
            .transform_image(
                image.as_ref(),
                BBox::new((0.0, 0.0), (4.0, 4.0)),
                BBox::new((0.0, 0.0), (8.0, 8.0)),
            );
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(2, 0), Some(BLACK));
    }

    #[test]
    fn test_copy_and_blend_image() {
        let image = checker();
        let mut data = buffer();
        let mut canvas = Canvas::new();
        canvas.attach(&mut data, SIZE, SIZE, SIZE * 4).unwrap();
        canvas.clear_all(SENTINEL);
        canvas.copy_image(image.as_ref(), ClipBox::new(0, 0, 1, 1), Point::new(3.0, 4.0));
        assert_eq!(canvas.pixel(3, 4), Some(WHITE));
        assert_eq!(canvas.pixel(4, 4), Some(RED));
        assert_eq!(canvas.pixel(4, 5), Some(WHITE));
        assert_eq!(canvas.pixel(5, 4), Some(SENTINEL));
        assert_eq!(canvas.pixel(2, 4), Some(SENTINEL));

        // destination is clipped
        canvas.copy_image(image.as_ref(), ClipBox::new(0, 0, 3, 3), Point::new(6.0, 6.0));
        assert_eq!(canvas.pixel(7, 7), Some(WHITE));
        assert_eq!(canvas.pixel(6, 7), Some(RED));

        // translation is applied to the destination point
        canvas
            .clear_all(PremulRGBA::TRANSPARENT)
            .translate(1.0, 1.0)
            .blend_image(image.as_ref(), ClipBox::new(1, 0, 1, 0), Point::new(0.0, 0.0), 128);
        assert_eq!(canvas.pixel(1, 1), Some(PremulRGBA::new(128, 0, 0, 128)));
        assert_eq!(canvas.pixel(0, 0), Some(PremulRGBA::TRANSPARENT));
        assert_eq!(canvas.pixel(2, 1), Some(PremulRGBA::TRANSPARENT));

        // far away destinations are clipped out without overflow
        canvas.reset_transformations().clear_all(SENTINEL);
        for dst in [
            Point::new(1e10, 0.0),
            Point::new(-1e10, 0.0),
            Point::new(0.0, 1e10),
            Point::new(-1e30, -1e30),
        ] {
            canvas
                .copy_image(image.as_ref(), ClipBox::new(1, 0, 3, 3), dst)
                .blend_image(image.as_ref(), ClipBox::new(0, 1, 3, 3), dst, 255);
        }
        for y in 0..SIZE as i32 {
            for x in 0..SIZE as i32 {
                assert_eq!(canvas.pixel(x, y), Some(SENTINEL));
            }
        }
    }

    #[test]
    fn test_render_buffer() {
        let mut data = vec![0u8; 12 * 2];
        let mut buffer = RenderBuffer::new(&mut data, 2, 2, 12).unwrap();
        buffer.row_mut(1)[1] = RED;
        assert_eq!(buffer.pixel(1, 1), Some(RED));
        assert_eq!(buffer.pixel(2, 1), None);
        assert_eq!(buffer.row(0), &[PremulRGBA::TRANSPARENT; 2]);
        let image = buffer.as_image();
        assert_eq!(image.get(1, 1), Some(&RED));
        assert_eq!(image.width(), 2);
        assert_eq!(&data[16..20], &[255, 0, 0, 255]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_preset() -> Result<(), Box<dyn std::error::Error>> {
        #[derive(Debug, serde::Deserialize)]
        struct Preset {
            stroke: StrokeStyle,
            blend: BlendMode,
            flag: DrawPathFlag,
            fill_rule: FillRule,
            filter: ImageFilter,
            resample: ImageResample,
            viewport: ViewportOption,
            color: RGBA,
        }
        let preset: Preset = serde_json::from_str(
            r##"{
                "stroke": {"width": 2.0, "line_join": {"Miter": 3.0}, "line_cap": "Butt"},
                "blend": "Screen",
                "flag": "StrokeOnly",
                "fill_rule": "EvenOdd",
                "filter": "Bicubic",
                "resample": "ResampleOnZoomOut",
                "viewport": "XMinYMin",
                "color": "#ff000080"
            }"##,
        )?;
        let mut canvas = Canvas::new();
        canvas
            .line_width(preset.stroke.width)
            .line_join(preset.stroke.line_join)
            .line_cap(preset.stroke.line_cap)
            .blend_mode(preset.blend)
            .fill_even_odd(preset.fill_rule == FillRule::EvenOdd)
            .image_filter(preset.filter)
            .image_resample(preset.resample)
            .line_color(preset.color);
        assert_eq!(canvas.stroke_style(), preset.stroke);
        assert_eq!(canvas.fill_rule(), FillRule::EvenOdd);
        assert_eq!(canvas.line_style(), &Style::Solid(PremulRGBA::new(128, 0, 0, 128)));
        assert_eq!(preset.flag, DrawPathFlag::StrokeOnly);
        assert_eq!(preset.viewport, ViewportOption::XMinYMin);

        canvas.miter_limit(5.0);
        assert_eq!(canvas.stroke_style().line_join, LineJoin::Miter(5.0));
        Ok(())
    }
}
