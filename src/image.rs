//! Source images and their sampling
use crate::{BlendMode, Error, Paint, Point, PremulRGBA, Scalar, Transform};

/// Dimensions of an image and distance between rows, all in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
    pub row_stride: usize,
}

impl Shape {
    /// Shape without padding between rows
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            row_stride: width,
        }
    }

    /// Index of the pixel in the flat data
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        row * self.row_stride + col
    }

    /// Length of the flat data needed to hold every pixel, the last row needs no padding
    pub fn data_size(&self) -> usize {
        match self.height.checked_sub(1) {
            Some(last) if self.width > 0 => last * self.row_stride + self.width,
            _ => 0,
        }
    }
}

/// Read access to a row-major grid of pixels
pub trait Image {
    type Pixel;

    fn data(&self) -> &[Self::Pixel];

    fn shape(&self) -> Shape;

    fn width(&self) -> usize {
        self.shape().width
    }

    fn height(&self) -> usize {
        self.shape().height
    }

    /// Pixel at `row` and `col`, `None` outside of the image
    fn get(&self, row: usize, col: usize) -> Option<&Self::Pixel> {
        let shape = self.shape();
        (row < shape.height && col < shape.width)
            .then(|| self.data().get(shape.offset(row, col)))
            .flatten()
    }

    /// Borrowed view of the image
    fn as_ref(&self) -> ImageRef<'_, Self::Pixel> {
        ImageRef::new(self.shape(), self.data())
    }
}

/// Image that owns its pixels
#[derive(Debug, Clone)]
pub struct ImageOwned<P> {
    shape: Shape,
    data: Vec<P>,
}

impl<P> ImageOwned<P> {
    /// Image filled with the default pixel
    pub fn new_default(height: usize, width: usize) -> Self
    where
        P: Default,
    {
        Self::new_with(height, width, |_, _| P::default())
    }

    /// Image with every pixel produced by `f(row, col)`
    pub fn new_with(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> P) -> Self {
        let data = (0..height)
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .map(|(row, col)| f(row, col))
            .collect();
        Self {
            shape: Shape::new(width, height),
            data,
        }
    }
}

impl<P> Image for ImageOwned<P> {
    type Pixel = P;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn data(&self) -> &[P] {
        &self.data
    }
}

/// Image borrowing its pixels
#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a, P> {
    shape: Shape,
    data: &'a [P],
}

impl<'a, P> ImageRef<'a, P> {
    pub fn new(shape: Shape, data: &'a [P]) -> Self {
        Self { shape, data }
    }
}

impl<'a> ImageRef<'a, PremulRGBA> {
    /// View premultiplied RGBA bytes as an image, `stride` is in bytes
    pub fn from_bytes(
        bytes: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, Error> {
        if stride % 4 != 0 || stride / 4 < width {
            return Err(Error::InvalidStride);
        }
        let shape = Shape {
            width,
            height,
            row_stride: stride / 4,
        };
        if bytes.len() < shape.data_size() * 4 {
            return Err(Error::BufferTooSmall);
        }
        let whole = bytes.len() - bytes.len() % 4;
        Ok(Self::new(shape, bytemuck::cast_slice(&bytes[..whole])))
    }
}

impl<P> Image for ImageRef<'_, P> {
    type Pixel = P;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn data(&self) -> &[P] {
        self.data
    }
}

impl<I: Image + ?Sized> Image for &I {
    type Pixel = I::Pixel;

    fn shape(&self) -> Shape {
        I::shape(self)
    }

    fn data(&self) -> &[I::Pixel] {
        I::data(self)
    }
}

/// Interpolation used when sampling source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFilter {
    /// Nearest neighbour
    NoFilter,
    #[default]
    Bilinear,
    /// Catmull-Rom cubic interpolation
    Bicubic,
}

/// Policy of supersampling the source image when it is scaled down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageResample {
    #[default]
    NoResample,
    ResampleAlways,
    /// Resample only if the image is scaled down more than [`RESAMPLE_THRESHOLD`]
    ResampleOnZoomOut,
}

/// Scale down factor above which `ResampleOnZoomOut` is applied
pub const RESAMPLE_THRESHOLD: Scalar = 1.125;

/// Maximum number of samples along one axis of a resampled pixel
const RESAMPLE_MAX: usize = 16;

/// Color which is blended onto every sampled image pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBlend {
    /// `Dst` disables blending
    pub mode: BlendMode,
    pub color: PremulRGBA,
}

impl Default for ImageBlend {
    fn default() -> Self {
        Self {
            mode: BlendMode::Dst,
            color: PremulRGBA::TRANSPARENT,
        }
    }
}

impl ImageBlend {
    #[inline]
    pub fn apply(&self, pixel: PremulRGBA) -> PremulRGBA {
        if self.mode == BlendMode::Dst {
            pixel
        } else {
            self.mode.blend(self.color, pixel, 255)
        }
    }
}

/// Image used as a paint
///
/// `matrix` maps screen coordinates into image pixel coordinates, where pixel
/// `(col, row)` covers `[col, col + 1] x [row, row + 1]`. Pixels outside of the
/// image are clamped to the nearest edge pixel.
#[derive(Debug, Clone)]
pub struct ImagePattern<'a> {
    image: ImageRef<'a, PremulRGBA>,
    matrix: Transform,
    filter: ImageFilter,
    /// supersampling grid, `None` if resampling is not used
    grid: Option<(usize, usize)>,
    blend: ImageBlend,
}

impl<'a> ImagePattern<'a> {
    pub fn new(
        image: ImageRef<'a, PremulRGBA>,
        matrix: Transform,
        filter: ImageFilter,
        resample: ImageResample,
        blend: ImageBlend,
    ) -> Self {
        let [m00, m01, _, m10, m11, _] = matrix.to_array();
        // image space footprint of a single screen pixel
        let sx = m00.hypot(m10);
        let sy = m01.hypot(m11);
        let resample = match resample {
            ImageResample::NoResample => false,
            ImageResample::ResampleAlways => true,
            ImageResample::ResampleOnZoomOut => {
                sx > RESAMPLE_THRESHOLD || sy > RESAMPLE_THRESHOLD
            }
        };
        let samples = |scale: Scalar| (scale.ceil() as usize).clamp(1, RESAMPLE_MAX);
        let grid = resample
            .then(|| (samples(sx), samples(sy)))
            .filter(|grid| *grid != (1, 1));
        Self {
            image,
            matrix,
            filter,
            grid,
            blend,
        }
    }

    /// Whether sampling uses supersampling of the source
    pub fn is_resampled(&self) -> bool {
        self.grid.is_some()
    }

    /// Sample color at screen point
    pub fn sample(&self, point: Point) -> PremulRGBA {
        let center = self.matrix.apply(point);
        let color = match self.grid {
            None => self.filtered(center),
            Some((nx, ny)) => {
                let [m00, m01, _, m10, m11, _] = self.matrix.to_array();
                let ux = Point::new(m00, m10);
                let uy = Point::new(m01, m11);
                let mut acc = [0.0f32; 4];
                for j in 0..ny {
                    let fy = (j as Scalar + 0.5) / ny as Scalar - 0.5;
                    for i in 0..nx {
                        let fx = (i as Scalar + 0.5) / nx as Scalar - 0.5;
                        let color = self.filtered(center + fx * ux + fy * uy).to_f32();
                        for (acc, c) in acc.iter_mut().zip(color) {
                            *acc += c;
                        }
                    }
                }
                let norm = 1.0 / (nx * ny) as f32;
                PremulRGBA::from_f32(acc.map(|c| c * norm))
            }
        };
        self.blend.apply(color)
    }

    fn filtered(&self, point: Point) -> PremulRGBA {
        match self.filter {
            ImageFilter::NoFilter => sample_nearest(&self.image, point),
            ImageFilter::Bilinear => sample_bilinear(&self.image, point),
            ImageFilter::Bicubic => sample_bicubic(&self.image, point),
        }
    }
}

impl Paint for ImagePattern<'_> {
    fn fill_span(&self, x: i32, y: i32, span: &mut [PremulRGBA]) {
        let y = y as Scalar + 0.5;
        for (index, color) in span.iter_mut().enumerate() {
            *color = self.sample(Point::new((x + index as i32) as Scalar + 0.5, y));
        }
    }
}

/// Pixel with coordinates clamped to the image bounds
#[inline]
fn pixel_clamped(image: &impl Image<Pixel = PremulRGBA>, col: i64, row: i64) -> PremulRGBA {
    let col = col.clamp(0, image.width() as i64 - 1) as usize;
    let row = row.clamp(0, image.height() as i64 - 1) as usize;
    image.get(row, col).copied().unwrap_or_default()
}

pub fn sample_nearest(image: &impl Image<Pixel = PremulRGBA>, point: Point) -> PremulRGBA {
    if image.width() == 0 || image.height() == 0 {
        return PremulRGBA::TRANSPARENT;
    }
    pixel_clamped(image, point.x().floor() as i64, point.y().floor() as i64)
}

pub fn sample_bilinear(image: &impl Image<Pixel = PremulRGBA>, point: Point) -> PremulRGBA {
    if image.width() == 0 || image.height() == 0 {
        return PremulRGBA::TRANSPARENT;
    }
    let fx = point.x() - 0.5;
    let fy = point.y() - 0.5;
    let (x0, y0) = (fx.floor(), fy.floor());
    let (tx, ty) = ((fx - x0) as f32, (fy - y0) as f32);
    let (x0, y0) = (x0 as i64, y0 as i64);
    let weights = [
        (x0, y0, (1.0 - tx) * (1.0 - ty)),
        (x0 + 1, y0, tx * (1.0 - ty)),
        (x0, y0 + 1, (1.0 - tx) * ty),
        (x0 + 1, y0 + 1, tx * ty),
    ];
    let mut acc = [0.0f32; 4];
    for (col, row, weight) in weights {
        if weight == 0.0 {
            continue;
        }
        let color = pixel_clamped(image, col, row).to_f32();
        for (acc, c) in acc.iter_mut().zip(color) {
            *acc += c * weight;
        }
    }
    PremulRGBA::from_f32(acc)
}

/// Catmull-Rom weights of the four neighbouring samples
fn cubic_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

pub fn sample_bicubic(image: &impl Image<Pixel = PremulRGBA>, point: Point) -> PremulRGBA {
    if image.width() == 0 || image.height() == 0 {
        return PremulRGBA::TRANSPARENT;
    }
    let fx = point.x() - 0.5;
    let fy = point.y() - 0.5;
    let (x0, y0) = (fx.floor(), fy.floor());
    let wx = cubic_weights((fx - x0) as f32);
    let wy = cubic_weights((fy - y0) as f32);
    let (x0, y0) = (x0 as i64 - 1, y0 as i64 - 1);
    let mut acc = [0.0f32; 4];
    for (j, wy) in wy.into_iter().enumerate() {
        for (i, wx) in wx.into_iter().enumerate() {
            let weight = wx * wy;
            if weight == 0.0 {
                continue;
            }
            let color = pixel_clamped(image, x0 + i as i64, y0 + j as i64).to_f32();
            for (acc, c) in acc.iter_mut().zip(color) {
                *acc += c * weight;
            }
        }
    }
    PremulRGBA::from_f32(acc)
}
