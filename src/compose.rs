//! Span compositing into the render buffer
use crate::{
    BlendMode, ClipBox, FillRule, Paint, PremulRGBA, Rasterizer, RenderBuffer, Scalar,
    blend::{BlendFn, blend_src, blend_src_over},
};

/// Converts rasterizer coverage into blended pixels
///
/// Coverage is mapped through a lookup table which combines anti-aliasing gamma
/// and master alpha, then the paint color is blended into the destination.
#[derive(Clone)]
pub struct Compositor {
    mode: BlendMode,
    blend: BlendFn,
    master_alpha: Scalar,
    gamma: Scalar,
    cover_lut: [u8; 256],
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(BlendMode::SrcOver, 1.0, 1.0)
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("mode", &self.mode)
            .field("master_alpha", &self.master_alpha)
            .field("gamma", &self.gamma)
            .finish()
    }
}

impl Compositor {
    /// `master_alpha` is clamped to `[0, 1]`, `gamma` is the exponent applied to coverage
    pub fn new(mode: BlendMode, master_alpha: Scalar, gamma: Scalar) -> Self {
        let master_alpha = if master_alpha.is_nan() {
            1.0
        } else {
            master_alpha.clamp(0.0, 1.0)
        };
        let gamma = if gamma > 0.0 && gamma.is_finite() {
            gamma
        } else {
            1.0
        };
        let mut cover_lut = [0u8; 256];
        for (index, cover) in cover_lut.iter_mut().enumerate() {
            let value = (index as Scalar / 255.0).powf(gamma) * master_alpha;
            *cover = (value * 255.0 + 0.5) as u8;
        }
        Self {
            mode,
            blend: mode.blend_fn(),
            master_alpha,
            gamma,
            cover_lut,
        }
    }

    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    pub fn master_alpha(&self) -> Scalar {
        self.master_alpha
    }

    pub fn gamma(&self) -> Scalar {
        self.gamma
    }

    /// Effective coverage after gamma and master alpha
    #[inline]
    pub fn cover(&self, cover: u8) -> u8 {
        self.cover_lut[cover as usize]
    }

    /// Blend single color over the span of destination pixels
    ///
    /// `cover` is effective coverage (already mapped through [`Compositor::cover`]).
    pub fn blend_solid(&self, dst: &mut [PremulRGBA], color: PremulRGBA, cover: u8) {
        match self.mode {
            BlendMode::Src | BlendMode::SrcOver
                if cover == 255 && (color.a == 255 || self.mode == BlendMode::Src) =>
            {
                dst.fill(color)
            }
            BlendMode::SrcOver => {
                for pixel in dst.iter_mut() {
                    *pixel = blend_src_over(color, *pixel, cover);
                }
            }
            BlendMode::Src => {
                for pixel in dst.iter_mut() {
                    *pixel = blend_src(color, *pixel, cover);
                }
            }
            _ => {
                for pixel in dst.iter_mut() {
                    *pixel = (self.blend)(color, *pixel, cover);
                }
            }
        }
    }

    /// Blend span of source colors over the span of destination pixels
    ///
    /// `cover` is effective coverage (already mapped through [`Compositor::cover`]).
    pub fn blend_span(&self, dst: &mut [PremulRGBA], src: &[PremulRGBA], cover: u8) {
        for (pixel, color) in dst.iter_mut().zip(src) {
            *pixel = (self.blend)(*color, *pixel, cover);
        }
    }
}

/// Sweep rasterizer and composite covered pixels with the paint into the buffer
///
/// Nothing outside of `clip` is modified.
pub fn render(
    rasterizer: &mut Rasterizer,
    fill_rule: FillRule,
    paint: &dyn Paint,
    compositor: &Compositor,
    buffer: &mut RenderBuffer<'_>,
    clip: ClipBox,
) {
    let clip = clip.intersect(buffer.clip_box());
    if clip.is_empty() {
        return;
    }
    let solid = paint.solid();
    let mut colors = Vec::new();
    rasterizer.sweep(fill_rule, |y, spans| {
        if y < clip.y1 || y > clip.y2 {
            return;
        }
        let row = buffer.row_mut(y as usize);
        for span in spans {
            let x0 = span.x.max(clip.x1);
            let x1 = (span.x + span.len).min(clip.x2 + 1);
            let cover = compositor.cover(span.cover);
            if x0 >= x1 || cover == 0 {
                continue;
            }
            let dst = &mut row[x0 as usize..x1 as usize];
            match solid {
                Some(color) => compositor.blend_solid(dst, color, cover),
                None => {
                    colors.resize(dst.len(), PremulRGBA::TRANSPARENT);
                    paint.fill_span(x0, y, &mut colors);
                    compositor.blend_span(dst, &colors, cover);
                }
            }
        }
    });
}
