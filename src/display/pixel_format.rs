//! Byte-level conversions between common 8-bit pixel layouts and the
//! engine's RGBA8 frames.

use std::fmt;

use crate::color::Color;
use crate::error::{OverlayError, Result};
use crate::types::{Size, BYTES_PER_PIXEL};

/// Channel order of a packed 8-bit pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Bgr,
    Bgra,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba | PixelFormat::Bgra)
    }

    /// Unpack one pixel; formats without alpha read as opaque
    fn decode(self, px: &[u8]) -> [u8; 4] {
        match self {
            PixelFormat::Rgb => [px[0], px[1], px[2], 255],
            PixelFormat::Rgba => [px[0], px[1], px[2], px[3]],
            PixelFormat::Bgr => [px[2], px[1], px[0], 255],
            PixelFormat::Bgra => [px[2], px[1], px[0], px[3]],
        }
    }

    fn encode(self, [r, g, b, a]: [u8; 4], out: &mut Vec<u8>) {
        match self {
            PixelFormat::Rgb => out.extend_from_slice(&[r, g, b]),
            PixelFormat::Rgba => out.extend_from_slice(&[r, g, b, a]),
            PixelFormat::Bgr => out.extend_from_slice(&[b, g, r]),
            PixelFormat::Bgra => out.extend_from_slice(&[b, g, r, a]),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Rgb => "RGB",
            PixelFormat::Rgba => "RGBA",
            PixelFormat::Bgr => "BGR",
            PixelFormat::Bgra => "BGRA",
        };
        f.write_str(name)
    }
}

/// Repack `data`, a `size` image in `from` layout, into `to` layout.
///
/// Dropping alpha discards it without compositing; use
/// [`blend_with_background`] first to flatten onto a color.
pub fn convert_pixel_format(data: &[u8], from: PixelFormat, to: PixelFormat, size: Size) -> Result<Vec<u8>> {
    let size = size.validate()?;
    let pixels = size.width as usize * size.height as usize;
    let expected = pixels * from.bytes_per_pixel();
    if data.len() != expected {
        return Err(OverlayError::SizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    if from == to {
        return Ok(data.to_vec());
    }

    let mut out = Vec::with_capacity(pixels * to.bytes_per_pixel());
    for px in data.chunks_exact(from.bytes_per_pixel()) {
        to.encode(from.decode(px), &mut out);
    }
    Ok(out)
}

/// Flatten RGBA8 pixels onto an opaque `background`; every pixel ends up
/// with alpha 255
pub fn blend_with_background(rgba: &mut [u8], background: Color) -> Result<()> {
    if rgba.len() % BYTES_PER_PIXEL != 0 {
        return Err(OverlayError::InvalidArgument(format!(
            "{} bytes is not a whole number of RGBA pixels",
            rgba.len()
        )));
    }
    let background = Color { a: 255, ..background };
    for px in rgba.chunks_exact_mut(BYTES_PER_PIXEL) {
        let flat = Color::new(px[0], px[1], px[2], px[3]).over(background);
        px.copy_from_slice(&flat.to_rgba());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_and_bgra_to_rgba() {
        let size = Size::new(2, 1);
        let rgb = [1, 2, 3, 4, 5, 6];
        assert_eq!(
            convert_pixel_format(&rgb, PixelFormat::Rgb, PixelFormat::Rgba, size).unwrap(),
            vec![1, 2, 3, 255, 4, 5, 6, 255]
        );

        let bgra = [30, 20, 10, 128, 0, 0, 255, 0];
        assert_eq!(
            convert_pixel_format(&bgra, PixelFormat::Bgra, PixelFormat::Rgba, size).unwrap(),
            vec![10, 20, 30, 128, 255, 0, 0, 0]
        );
    }

    #[test]
    fn test_rgba_to_bgr_drops_alpha() {
        let rgba = [10, 20, 30, 0];
        assert_eq!(
            convert_pixel_format(&rgba, PixelFormat::Rgba, PixelFormat::Bgr, Size::new(1, 1)).unwrap(),
            vec![30, 20, 10]
        );
    }

    #[test]
    fn test_conversion_checks_length() {
        assert_eq!(
            convert_pixel_format(&[0; 5], PixelFormat::Rgb, PixelFormat::Rgba, Size::new(2, 1)),
            Err(OverlayError::SizeMismatch {
                expected: 6,
                actual: 5
            })
        );
        assert!(matches!(
            convert_pixel_format(&[], PixelFormat::Rgb, PixelFormat::Rgba, Size::new(0, 1)),
            Err(OverlayError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_blend_with_background_flattens() {
        let mut pixels = vec![200, 100, 50, 255, 9, 9, 9, 0, 255, 255, 255, 128];
        blend_with_background(&mut pixels, Color::new(0, 0, 0, 0)).unwrap();
        assert_eq!(&pixels[0..4], &[200, 100, 50, 255]);
        assert_eq!(&pixels[4..8], &[0, 0, 0, 255]);
        assert_eq!(pixels[11], 255);
        assert!((127..=129).contains(&pixels[8]));

        assert!(blend_with_background(&mut [0; 6], Color::WHITE).is_err());
    }
}
