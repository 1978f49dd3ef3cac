//! RGBA8 color values, named constants and blending.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// A straight (non-premultiplied) RGBA8 color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Multiply two channel values and divide by 255, rounded
#[inline]
fn mul_255(x: u8, y: u8) -> u8 {
    let product = x as u16 * y as u16 + 128;
    ((product + (product >> 8)) >> 8) as u8
}

/// Alpha blend a single color channel
/// Uses fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255
#[inline]
fn over_channel(src: u8, dst: u8, alpha: u8) -> u8 {
    let result = src as u16 * alpha as u16 + dst as u16 * (255 - alpha as u16);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

#[inline]
fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 * (1.0 - t) + b as f64 * t)
        .round()
        .clamp(0.0, 255.0) as u8
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0, 255);
    pub const GREEN: Color = Color::new(0, 255, 0, 255);
    pub const BLUE: Color = Color::new(0, 0, 255, 255);
    pub const CYAN: Color = Color::new(0, 255, 255, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0, 255);
    pub const ORANGE: Color = Color::new(255, 165, 0, 255);
    pub const PINK: Color = Color::new(255, 192, 203, 255);
    pub const GRAY: Color = Color::new(128, 128, 128, 255);
    pub const DARK_GRAY: Color = Color::new(64, 64, 64, 255);
    pub const LIGHT_GRAY: Color = Color::new(192, 192, 192, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn from_rgba(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    #[inline]
    pub const fn to_rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#RRGGBBAA`, uppercase
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// `#RRGGBB`, uppercase, alpha dropped
    pub fn to_rgb_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Linear interpolation from `a` to `b`.
    ///
    /// `t` is clamped to `[0, 1]` (NaN counts as 0) and every channel is
    /// rounded to the nearest integer, so `t = 0` yields `a` and `t = 1`
    /// yields `b` exactly.
    pub fn blend(a: Color, b: Color, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        Color::new(
            lerp_channel(a.r, b.r, t),
            lerp_channel(a.g, b.g, t),
            lerp_channel(a.b, b.b, t),
            lerp_channel(a.a, b.a, t),
        )
    }

    /// Alias of [`Color::blend`]
    #[inline]
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        Color::blend(a, b, t)
    }

    /// Source-over compositing of `self` on top of `background`.
    pub fn over(self, background: Color) -> Color {
        match self.a {
            255 => self,
            0 => background,
            alpha => Color::new(
                over_channel(self.r, background.r, alpha),
                over_channel(self.g, background.g, alpha),
                over_channel(self.b, background.b, alpha),
                alpha.saturating_add(mul_255(background.a, 255 - alpha)),
            ),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 4]> for Color {
    fn from(bytes: [u8; 4]) -> Self {
        Color::from_rgba(bytes)
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        color.to_rgba()
    }
}

impl FromStr for Color {
    type Err = OverlayError;

    /// Parses `#RRGGBB` or `#RRGGBBAA` (leading `#` optional)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        let invalid = || OverlayError::InvalidArgument(format!("invalid hex color '{}'", s));
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

// Binding-surface helpers

pub fn create_color(r: u8, g: u8, b: u8, a: u8) -> Color {
    Color::new(r, g, b, a)
}

pub fn color_to_rgba(color: Color) -> [u8; 4] {
    color.to_rgba()
}

pub fn color_to_hex(color: Color) -> String {
    color.to_hex()
}

pub fn color_to_rgb_hex(color: Color) -> String {
    color.to_rgb_hex()
}

pub fn blend_colors(a: Color, b: Color, t: f64) -> Color {
    Color::blend(a, b, t)
}

pub fn lerp_colors(a: Color, b: Color, t: f64) -> Color {
    Color::lerp(a, b, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [Color; 5] = [
        Color::BLACK,
        Color::WHITE,
        Color::ORANGE,
        Color::TRANSPARENT,
        Color::new(17, 200, 3, 99),
    ];

    #[test]
    fn test_blend_endpoints_are_exact() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(Color::blend(a, b, 0.0), a);
                assert_eq!(Color::blend(a, b, 1.0), b);
            }
        }
    }

    #[test]
    fn test_blend_clamps_t() {
        let a = Color::RED;
        let b = Color::BLUE;
        assert_eq!(Color::blend(a, b, -3.0), a);
        assert_eq!(Color::blend(a, b, 42.0), b);
        assert_eq!(Color::blend(a, b, f64::NAN), a);
    }

    #[test]
    fn test_blend_is_monotonic_per_channel() {
        let a = Color::new(10, 250, 0, 255);
        let b = Color::new(240, 5, 255, 0);
        let mut previous = a;
        for step in 1..=100 {
            let current = Color::blend(a, b, step as f64 / 100.0);
            assert!(current.r >= previous.r);
            assert!(current.g <= previous.g);
            assert!(current.b >= previous.b);
            assert!(current.a <= previous.a);
            previous = current;
        }
    }

    #[test]
    fn test_blend_rounds_midpoint() {
        let mid = Color::blend(Color::BLACK, Color::WHITE, 0.5);
        // 127.5 rounds away from zero
        assert_eq!(mid, Color::new(128, 128, 128, 255));
        assert_eq!(lerp_colors(Color::BLACK, Color::WHITE, 0.5), mid);
    }

    #[test]
    fn test_hex_formatting() {
        let color = create_color(255, 128, 64, 10);
        assert_eq!(color_to_hex(color), "#FF80400A");
        assert_eq!(color_to_rgb_hex(color), "#FF8040");
        assert_eq!(color_to_rgba(color), [255, 128, 64, 10]);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!("#FFA500".parse::<Color>().unwrap(), Color::ORANGE);
        assert_eq!("00000000".parse::<Color>().unwrap(), Color::TRANSPARENT);
        assert_eq!(
            "#ff80400a".parse::<Color>().unwrap(),
            Color::new(255, 128, 64, 10)
        );
        assert!(matches!(
            "#12345".parse::<Color>(),
            Err(OverlayError::InvalidArgument(_))
        ));
        assert!("#GGGGGG".parse::<Color>().is_err());
    }

    #[test]
    fn test_predefined_colors() {
        assert_eq!(Color::PINK.to_rgba(), [255, 192, 203, 255]);
        assert_eq!(Color::DARK_GRAY.to_rgba(), [64, 64, 64, 255]);
        assert_eq!(Color::LIGHT_GRAY.to_rgba(), [192, 192, 192, 255]);
        assert_eq!(Color::TRANSPARENT.a, 0);
    }

    #[test]
    fn test_over_compositing() {
        assert_eq!(Color::RED.over(Color::BLUE), Color::RED);
        assert_eq!(Color::TRANSPARENT.over(Color::BLUE), Color::BLUE);
        let half_red = Color::new(255, 0, 0, 128);
        let mixed = half_red.over(Color::BLUE);
        assert!(mixed.r > 120 && mixed.r < 136);
        assert!(mixed.b > 120 && mixed.b < 136);
        assert_eq!(mixed.a, 255);
    }
}
