//! RGBA colors and the distance metric used to match them against a palette

use std::fmt;
use std::num::ParseIntError;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use image::Rgba;
use itertools::Itertools;
use thiserror::Error;

/// Color with four 8-bit channels
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Black, fully opaque
    pub const BLACK: Color = Color::opaque(0, 0, 0);
    /// White, fully opaque
    pub const WHITE: Color = Color::opaque(255, 255, 255);

    /// Create a color from all four channels
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully opaque color
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Pack all four channels into one integer, `0xRRGGBBAA`.
    ///
    /// Two colors pack to the same value iff they are equal, which makes this a collision-free
    /// set key.
    pub fn pack(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Inverse of [`Color::pack`]
    pub fn unpack(value: u32) -> Self {
        let [r, g, b, a] = value.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Squared euclidean distance to `other` over red, green and blue.
    ///
    /// Alpha does not take part.
    pub fn distance(&self, other: &Color) -> u32 {
        let d = *self - *other;
        let (r, g, b) = (d.r as u32, d.g as u32, d.b as u32);
        r * r + g * g + b * b
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Channel-wise absolute difference. The result is opaque.
impl Sub for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Color {
        Color::opaque(
            self.r.abs_diff(other.r),
            self.g.abs_diff(other.g),
            self.b.abs_diff(other.b),
        )
    }
}

/// Channel-wise saturating sum. The result is opaque.
impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::opaque(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
        )
    }
}

/// Channel-wise scaling, saturating at both ends. The result is opaque.
impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, scalar: f32) -> Color {
        let scale = |c: u8| (c as f32 * scalar) as u8;
        Color::opaque(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self { r, g, b, a }
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba([color.r, color.g, color.b, color.a])
    }
}

/// Index of the color in `colors` closest to `color`.
///
/// The whole slice is scanned and ties go to the lowest index. Returns `None` if `colors` is
/// empty.
pub fn nearest(color: &Color, colors: &[Color]) -> Option<usize> {
    colors.iter().position_min_by_key(|c| color.distance(c))
}

/// Errors when parsing a hex color
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    /// Not 3 or 6 hex digits after the optional `#`
    #[error("invalid hex color length (expected 3 or 6 digits)")]
    InvalidLength,
    /// Not a hex digit
    #[error("invalid hex digit: {0}")]
    InvalidHex(#[from] ParseIntError),
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parse `#rgb` or `#rrggbb`, the `#` being optional
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(ParseColorError::InvalidLength);
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16);
        match hex.len() {
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Color::opaque(short(0)?, short(1)?, short(2)?))
            }
            6 => Ok(Color::opaque(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(ParseColorError::InvalidLength),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_ignores_alpha() {
        let a = Color::new(10, 20, 30, 0);
        let b = Color::new(13, 16, 30, 255);
        assert_eq!(a.distance(&b), 9 + 16);
        assert_eq!(b.distance(&a), 9 + 16);
    }

    #[test]
    fn test_distance_extremes() {
        assert_eq!(Color::BLACK.distance(&Color::WHITE), 3 * 255 * 255);
        assert_eq!(Color::WHITE.distance(&Color::WHITE), 0);
    }

    #[test]
    fn test_nearest_mid_gray_prefers_white() {
        let palette = [Color::WHITE, Color::BLACK];
        let gray = Color::opaque(128, 128, 128);
        assert_eq!(nearest(&gray, &palette), Some(0));
    }

    #[test]
    fn test_nearest_tie_picks_first() {
        let palette = [Color::opaque(0, 0, 10), Color::opaque(0, 0, 30)];
        let between = Color::opaque(0, 0, 20);
        assert_eq!(nearest(&between, &palette), Some(0));

        let reversed = [palette[1], palette[0]];
        assert_eq!(nearest(&between, &reversed), Some(0));
    }

    #[test]
    fn test_nearest_empty() {
        assert_eq!(nearest(&Color::BLACK, &[]), None);
    }

    #[test]
    fn test_pack_roundtrip_and_order() {
        let color = Color::new(0x12, 0x34, 0x56, 0x78);
        assert_eq!(color.pack(), 0x1234_5678);
        assert_eq!(Color::unpack(0x1234_5678), color);
        // r*1000 + g*100 + b*10 + a would collide here
        let a = Color::new(1, 0, 0, 0);
        let b = Color::new(0, 10, 0, 0);
        assert_ne!(a.pack(), b.pack());
    }

    #[test]
    fn test_sub_is_absolute_and_opaque() {
        let a = Color::new(10, 200, 50, 3);
        let b = Color::new(20, 100, 50, 9);
        assert_eq!(a - b, Color::new(10, 100, 0, 255));
        assert_eq!(b - a, Color::new(10, 100, 0, 255));
    }

    #[test]
    fn test_add_and_scale_saturate() {
        let a = Color::new(200, 10, 0, 0);
        assert_eq!(a + a, Color::opaque(255, 20, 0));
        assert_eq!(a * 2.0, Color::opaque(255, 20, 0));
        assert_eq!(a * 0.5, Color::opaque(100, 5, 0));
        assert_eq!(a * -1.0, Color::opaque(0, 0, 0));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!("#FF8000".parse(), Ok(Color::opaque(255, 128, 0)));
        assert_eq!("ff8000".parse(), Ok(Color::opaque(255, 128, 0)));
        assert_eq!("#fff".parse(), Ok(Color::WHITE));
        assert_eq!(" #000 ".parse(), Ok(Color::BLACK));
        assert_eq!("#ff80".parse::<Color>(), Err(ParseColorError::InvalidLength));
        assert!(matches!(
            "#gg0000".parse::<Color>(),
            Err(ParseColorError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::new(1, 171, 255, 0).to_string(), "#01ABFF");
    }

    #[test]
    fn test_rgba_conversion() {
        let pixel = Rgba([1, 2, 3, 4]);
        let color = Color::from(pixel);
        assert_eq!(color, Color::new(1, 2, 3, 4));
        assert_eq!(Rgba::from(color), pixel);
    }
}
