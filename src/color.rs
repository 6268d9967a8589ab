//! Straight and premultiplied 8-bit colors
use std::{fmt, str::FromStr};

/// Straight alpha sRGB color with 8-bit channels in `R, G, B, A` order
///
/// Text form is `#RRGGBB` or `#RRGGBBAA`, serde uses the same form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct RGBA([u8; 4]);

impl Default for RGBA {
    /// Transparent black
    fn default() -> Self {
        Self([0; 4])
    }
}

impl RGBA {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub const fn red(self) -> u8 {
        self.0[0]
    }

    pub const fn green(self) -> u8 {
        self.0[1]
    }

    pub const fn blue(self) -> u8 {
        self.0[2]
    }

    pub const fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Channels in `[r, g, b, a]` order
    pub fn to_rgba(self) -> [u8; 4] {
        self.0
    }

    /// Same color with alpha replaced
    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }
}

impl fmt::Debug for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGBA({})", self)
    }
}

impl fmt::Display for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)?;
        if a != 255 {
            write!(f, "{:02x}", a)?;
        }
        Ok(())
    }
}

impl FromStr for RGBA {
    type Err = ColorError;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let hex = match color.strip_prefix('#') {
            Some(hex) if hex.len() == 6 || hex.len() == 8 => hex.as_bytes(),
            _ => return Err(ColorError::HexExpected),
        };
        let digit = |byte| match byte {
            b'A'..=b'F' => Ok(byte - b'A' + 10),
            b'a'..=b'f' => Ok(byte - b'a' + 10),
            b'0'..=b'9' => Ok(byte - b'0'),
            _ => Err(ColorError::HexExpected),
        };
        let mut channels = hex
            .chunks(2)
            .map(|pair| Ok((digit(pair[0])? << 4) | digit(pair[1])?));
        Ok(RGBA::new(
            channels.next().unwrap_or(Ok(0))?,
            channels.next().unwrap_or(Ok(0))?,
            channels.next().unwrap_or(Ok(0))?,
            channels.next().unwrap_or(Ok(255))?,
        ))
    }
}

impl TryFrom<String> for RGBA {
    type Error = ColorError;

    fn try_from(color: String) -> Result<Self, Self::Error> {
        color.parse()
    }
}

impl From<RGBA> for String {
    fn from(color: RGBA) -> Self {
        color.to_string()
    }
}

/// 8-bit premultiplied RGBA pixel, memory layout `R, G, B, A`
///
/// Color channels never exceed alpha.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PremulRGBA {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PremulRGBA {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Construct from already premultiplied channels
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Recover straight alpha color
    pub fn unmultiply(self) -> RGBA {
        if self.a == 0 {
            return RGBA::default();
        }
        let a = self.a as u32;
        let div = |c: u8| ((c as u32 * 255 + a / 2) / a).min(255) as u8;
        RGBA::new(div(self.r), div(self.g), div(self.b), self.a)
    }

    /// Scale all channels by `scale / 255`
    #[inline]
    pub fn scale(self, scale: u8) -> Self {
        Self {
            r: mul_div255(self.r, scale),
            g: mul_div255(self.g, scale),
            b: mul_div255(self.b, scale),
            a: mul_div255(self.a, scale),
        }
    }

    /// Linear interpolation between self and other, `t` in `[0, 1]`
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |c0: u8, c1: u8| (c0 as f32 + (c1 as f32 - c0 as f32) * t + 0.5) as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Normalized `[0, 1]` channels
    #[inline]
    pub fn to_f32(self) -> [f32; 4] {
        const NORM: f32 = 1.0 / 255.0;
        [
            self.r as f32 * NORM,
            self.g as f32 * NORM,
            self.b as f32 * NORM,
            self.a as f32 * NORM,
        ]
    }

    /// Construct from normalized channels, rounding to nearest and clamping
    /// color channels to alpha
    #[inline]
    pub fn from_f32(rgba: [f32; 4]) -> Self {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        let a = quantize(rgba[3]);
        Self {
            r: quantize(rgba[0]).min(a),
            g: quantize(rgba[1]).min(a),
            b: quantize(rgba[2]).min(a),
            a,
        }
    }
}

impl fmt::Debug for PremulRGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PremulRGBA({}, {}, {}, {})",
            self.r, self.g, self.b, self.a
        )
    }
}

/// Conversion into premultiplied pixel
///
/// Idempotent: premultiplying an already premultiplied color returns it unchanged.
pub trait Premultiply: Copy {
    fn premultiply(self) -> PremulRGBA;
}

impl Premultiply for RGBA {
    fn premultiply(self) -> PremulRGBA {
        let a = self.alpha();
        PremulRGBA {
            r: mul_div255(self.red(), a),
            g: mul_div255(self.green(), a),
            b: mul_div255(self.blue(), a),
            a,
        }
    }
}

impl Premultiply for PremulRGBA {
    fn premultiply(self) -> PremulRGBA {
        self
    }
}

impl From<RGBA> for PremulRGBA {
    fn from(color: RGBA) -> Self {
        color.premultiply()
    }
}

/// Exactly rounded `a * b / 255`
#[inline(always)]
pub fn mul_div255(a: u8, b: u8) -> u8 {
    let t = a as u32 * b as u32 + 128;
    ((t + (t >> 8)) >> 8) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    HexExpected,
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::HexExpected => {
                write!(f, "Color expected to be #RRGGBB(AA) in hexadecimal format")
            }
        }
    }
}

impl std::error::Error for ColorError {}
