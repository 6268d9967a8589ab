//! Immediate mode 2D vector rendering core.
//!
//! Main features:
//!  - Paths made of lines, quadratic/cubic bezier curves and elliptic arcs
//!  - Stroking with configurable joins and caps
//!  - Anti-aliased scanline rasterization with non-zero and even-odd fill rules
//!  - Solid colors, linear and radial gradients, transformed images
//!  - Porter-Duff and separable blend modes with master alpha
//!
//! [`Canvas`] is the entry point, it renders into a borrowed premultiplied RGBA buffer.
mod blend;
mod canvas;
mod color;
mod compose;
mod curve;
mod ellipse;
mod geometry;
mod grad;
mod image;
mod paint;
mod path;
mod rasterize;
mod stroke;
mod utils;

pub use blend::{BlendFn, BlendMode};
pub use canvas::{APPROXIMATION_SCALE, Canvas, DrawPathFlag, Error, RenderBuffer, ViewportOption};
pub use color::{ColorError, PremulRGBA, Premultiply, RGBA, mul_div255};
pub use compose::{Compositor, render};
pub use curve::{Cubic, Curve, CurveFlattenIter, Line, Quad, Segment};
pub use ellipse::EllipArc;
pub use geometry::{
    Align, BBox, ClipBox, EPSILON, EPSILON_SQRT, PI, Point, Scalar, Transform,
};
pub use grad::{GRADIENT_LUT_SIZE, Gradient, GradientLut};
pub use image::{
    Image, ImageBlend, ImageFilter, ImageOwned, ImagePattern, ImageRef, ImageResample,
    RESAMPLE_THRESHOLD, Shape, sample_bicubic, sample_bilinear, sample_nearest,
};
pub use paint::{Paint, Style};
pub use path::{
    DEFAULT_MITER_LIMIT, FillRule, FlatPath, LineCap, LineJoin, Path, PathCmd, Polyline,
    StrokeStyle,
};
pub use rasterize::{Rasterizer, Span};
pub use stroke::outline;
use utils::quadratic_solve;
