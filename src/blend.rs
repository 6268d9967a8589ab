//! Blend modes over premultiplied pixels
//!
//! Porter-Duff operators and separable blend modes follow the usual definitions
//! on premultiplied colors. `Src` and `SrcOver` are computed with exact integer
//! arithmetic, every other mode is computed in normalized `f32`, interpolated from
//! destination to the blended result by coverage and rounded to nearest.
use crate::{PremulRGBA, color::mul_div255};
use std::fmt;

/// Blend function `(src, dst, cover) -> result`
pub type BlendFn = fn(PremulRGBA, PremulRGBA, u8) -> PremulRGBA;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    Clear,
    Src,
    Dst,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcAtop,
    DstAtop,
    Xor,
    Plus,
    Minus,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    pub const ALL: [BlendMode; 25] = [
        BlendMode::Clear,
        BlendMode::Src,
        BlendMode::Dst,
        BlendMode::SrcOver,
        BlendMode::DstOver,
        BlendMode::SrcIn,
        BlendMode::DstIn,
        BlendMode::SrcOut,
        BlendMode::DstOut,
        BlendMode::SrcAtop,
        BlendMode::DstAtop,
        BlendMode::Xor,
        BlendMode::Plus,
        BlendMode::Minus,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
    ];

    /// Function implementing this blend mode
    pub fn blend_fn(self) -> BlendFn {
        use BlendMode::*;
        match self {
            Clear => |s, d, c| composite(s, d, c, |_, _| [0.0; 4]),
            Src => blend_src,
            Dst => |_, d, _| d,
            SrcOver => blend_src_over,
            DstOver => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, 1.0 - d[3], 1.0)),
            SrcIn => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, d[3], 0.0)),
            DstIn => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, 0.0, s[3])),
            SrcOut => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, 1.0 - d[3], 0.0)),
            DstOut => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, 0.0, 1.0 - s[3])),
            SrcAtop => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, d[3], 1.0 - s[3])),
            DstAtop => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, 1.0 - d[3], s[3])),
            Xor => |s, d, c| composite(s, d, c, |s, d| porter_duff(s, d, 1.0 - d[3], 1.0 - s[3])),
            Plus => |s, d, c| composite(s, d, c, |s, d| std::array::from_fn(|i| s[i] + d[i])),
            Minus => |s, d, c| composite(s, d, c, minus),
            Multiply => |s, d, c| composite(s, d, c, |s, d| separable(s, d, |cb, cs| cb * cs)),
            Screen => |s, d, c| composite(s, d, c, |s, d| separable(s, d, screen)),
            Overlay => |s, d, c| {
                composite(s, d, c, |s, d| separable(s, d, |cb, cs| hard_light(cs, cb)))
            },
            Darken => |s, d, c| composite(s, d, c, |s, d| separable(s, d, f32::min)),
            Lighten => |s, d, c| composite(s, d, c, |s, d| separable(s, d, f32::max)),
            ColorDodge => |s, d, c| composite(s, d, c, |s, d| separable(s, d, color_dodge)),
            ColorBurn => |s, d, c| composite(s, d, c, |s, d| separable(s, d, color_burn)),
            HardLight => |s, d, c| composite(s, d, c, |s, d| separable(s, d, hard_light)),
            SoftLight => |s, d, c| composite(s, d, c, |s, d| separable(s, d, soft_light)),
            Difference => {
                |s, d, c| composite(s, d, c, |s, d| separable(s, d, |cb, cs| (cb - cs).abs()))
            }
            Exclusion => |s, d, c| {
                composite(s, d, c, |s, d| separable(s, d, |cb, cs| cb + cs - 2.0 * cb * cs))
            },
        }
    }

    /// Blend a single pixel
    pub fn blend(self, src: PremulRGBA, dst: PremulRGBA, cover: u8) -> PremulRGBA {
        (self.blend_fn())(src, dst, cover)
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// `src * cover + dst * (1 - cover)`
pub fn blend_src(src: PremulRGBA, dst: PremulRGBA, cover: u8) -> PremulRGBA {
    match cover {
        255 => src,
        0 => dst,
        _ => {
            let rest = 255 - cover;
            let mix = |s: u8, d: u8| mul_div255(s, cover).saturating_add(mul_div255(d, rest));
            PremulRGBA::new(
                mix(src.r, dst.r),
                mix(src.g, dst.g),
                mix(src.b, dst.b),
                mix(src.a, dst.a),
            )
        }
    }
}

/// `src * cover + dst * (1 - src.a * cover)`
pub fn blend_src_over(src: PremulRGBA, dst: PremulRGBA, cover: u8) -> PremulRGBA {
    let src = if cover == 255 { src } else { src.scale(cover) };
    match src.a {
        255 => src,
        0 => dst,
        alpha => {
            let rest = 255 - alpha;
            let mix = |s: u8, d: u8| s.saturating_add(mul_div255(d, rest));
            PremulRGBA::new(
                mix(src.r, dst.r),
                mix(src.g, dst.g),
                mix(src.b, dst.b),
                mix(src.a, dst.a),
            )
        }
    }
}

type Channels = [f32; 4];

/// Evaluate `op` in normalized space and interpolate the result from `dst` by coverage
#[inline]
fn composite(
    src: PremulRGBA,
    dst: PremulRGBA,
    cover: u8,
    op: impl Fn(Channels, Channels) -> Channels,
) -> PremulRGBA {
    if cover == 0 {
        return dst;
    }
    let s = src.to_f32();
    let d = dst.to_f32();
    let r = op(s, d);
    if cover == 255 {
        return PremulRGBA::from_f32(r);
    }
    let t = cover as f32 / 255.0;
    PremulRGBA::from_f32(std::array::from_fn(|i| d[i] + (r[i] - d[i]) * t))
}

/// `src * fa + dst * fb` for every channel
#[inline]
fn porter_duff(s: Channels, d: Channels, fa: f32, fb: f32) -> Channels {
    std::array::from_fn(|i| s[i] * fa + d[i] * fb)
}

/// Separable blend mode `B(cb, cs)` on straight colors, composited as
/// `Sa·Da·B + Sc·(1 - Da) + Dc·(1 - Sa)` with source-over alpha
#[inline]
fn separable(s: Channels, d: Channels, mode: impl Fn(f32, f32) -> f32) -> Channels {
    let (sa, da) = (s[3], d[3]);
    let unmul = |c: f32, a: f32| if a > 0.0 { (c / a).min(1.0) } else { 0.0 };
    let mut out = [0.0; 4];
    for i in 0..3 {
        let cs = unmul(s[i], sa);
        let cb = unmul(d[i], da);
        out[i] = sa * da * mode(cb, cs) + s[i] * (1.0 - da) + d[i] * (1.0 - sa);
    }
    out[3] = sa + da - sa * da;
    out
}

fn minus(s: Channels, d: Channels) -> Channels {
    let (sa, da) = (s[3], d[3]);
    [
        d[0] - s[0],
        d[1] - s[1],
        d[2] - s[2],
        sa + da - sa * da,
    ]
}

fn screen(cb: f32, cs: f32) -> f32 {
    cb + cs - cb * cs
}

fn hard_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        screen(cb, 2.0 * cs - 1.0)
    }
}

fn color_dodge(cb: f32, cs: f32) -> f32 {
    if cb <= 0.0 {
        0.0
    } else if cs >= 1.0 {
        1.0
    } else {
        (cb / (1.0 - cs)).min(1.0)
    }
}

fn color_burn(cb: f32, cs: f32) -> f32 {
    if cb >= 1.0 {
        1.0
    } else if cs <= 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - cb) / cs).min(1.0)
    }
}

fn soft_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let dcb = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (dcb - cb)
    }
}
