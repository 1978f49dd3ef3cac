use crate::color::Color;
use crate::error::{OverlayError, Result};
use crate::types::{Position, Size, BYTES_PER_PIXEL};

// ============================================================================
// FrameBuffer
// ============================================================================

/// RGBA8 frame in row-major order; this is what gets presented.
///
/// The byte length is always `width * height * 4`. A frame never changes
/// size: a resized window gets a freshly allocated buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// Zero-initialized (fully transparent) frame
    pub fn allocate(width: u32, height: u32) -> Result<Self> {
        let size = Size::new(width, height).validate()?;
        Ok(Self {
            pixels: vec![0; size.buffer_len()],
            width,
            height,
        })
    }

    /// Wrap existing RGBA8 bytes
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let size = Size::new(width, height).validate()?;
        if pixels.len() != size.buffer_len() {
            return Err(OverlayError::SizeMismatch {
                expected: size.buffer_len(),
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Byte length, always `width * height * 4`
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as i64) < self.width as i64 && y >= 0 && (y as i64) < self.height as i64
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    #[inline]
    fn pitch(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Overwrite every pixel with `color`
    pub fn fill_color(&mut self, color: Color) {
        let rgba = color.to_rgba();
        for chunk in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&rgba);
        }
    }

    /// Tile a single RGBA pixel (exactly 4 bytes) over the whole frame
    pub fn fill_rgba(&mut self, rgba: &[u8]) -> Result<()> {
        let pixel: [u8; BYTES_PER_PIXEL] = rgba.try_into().map_err(|_| OverlayError::SizeMismatch {
            expected: BYTES_PER_PIXEL,
            actual: rgba.len(),
        })?;
        self.fill_color(Color::from_rgba(pixel));
        Ok(())
    }

    /// Set a single pixel. Writes outside the frame are silently dropped so
    /// the drawing primitives never need their own bounds checks.
    #[inline]
    pub fn set_pixel(&mut self, pos: Position, color: Color) {
        if self.in_bounds(pos.x, pos.y) {
            let idx = self.pixel_index(pos.x as u32, pos.y as u32);
            self.pixels[idx..idx + BYTES_PER_PIXEL].copy_from_slice(&color.to_rgba());
        }
    }

    /// Read a pixel. Unlike writes, reads outside the frame are an error.
    pub fn get_pixel(&self, pos: Position) -> Result<Color> {
        if !self.in_bounds(pos.x, pos.y) {
            return Err(OverlayError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            });
        }
        let idx = self.pixel_index(pos.x as u32, pos.y as u32);
        Ok(Color::new(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ))
    }

    /// Replace the whole frame with `bytes`
    pub fn copy_from(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.pixels.len() {
            return Err(OverlayError::SizeMismatch {
                expected: self.pixels.len(),
                actual: bytes.len(),
            });
        }
        self.pixels.copy_from_slice(bytes);
        Ok(())
    }

    /// Draw a horizontal span from x1 to x2 inclusive, clipped to the frame
    pub(crate) fn hline(&mut self, x1: i64, x2: i64, y: i64, color: Color) {
        if y < 0 || y >= self.height as i64 {
            return;
        }
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let start = x1.max(0);
        let end = x2.min(self.width as i64 - 1);
        if start > end {
            return;
        }

        // Compute starting index once, then step by whole pixels
        let rgba = color.to_rgba();
        let from = self.pixel_index(start as u32, y as u32);
        let to = self.pixel_index(end as u32, y as u32) + BYTES_PER_PIXEL;
        for chunk in self.pixels[from..to].chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&rgba);
        }
    }

    // ========================================================================
    // Buffer Operations
    // ========================================================================

    /// Visible overlap of `src` placed at (x, y): returns
    /// (src_x, src_y, dst_x, dst_y, width, height) or None when fully clipped
    fn clip_blit(&self, src: &FrameBuffer, x: i32, y: i32) -> Option<(u32, u32, u32, u32, u32, u32)> {
        let left = (x as i64).max(0);
        let top = (y as i64).max(0);
        let right = (x as i64 + src.width as i64).min(self.width as i64);
        let bottom = (y as i64 + src.height as i64).min(self.height as i64);
        if left >= right || top >= bottom {
            return None;
        }
        Some((
            (left - x as i64) as u32,
            (top - y as i64) as u32,
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }

    /// Copy another frame onto this one at (x, y), overwriting pixels
    /// verbatim and clipping whatever falls outside
    pub fn blit(&mut self, src: &FrameBuffer, x: i32, y: i32) {
        let Some((sx, sy, dx, dy, w, h)) = self.clip_blit(src, x, y) else {
            return;
        };
        let row_bytes = w as usize * BYTES_PER_PIXEL;
        for row in 0..h {
            let s = src.pixel_index(sx, sy + row);
            let d = self.pixel_index(dx, dy + row);
            self.pixels[d..d + row_bytes].copy_from_slice(&src.pixels[s..s + row_bytes]);
        }
    }

    /// Composite another frame onto this one using per-pixel source alpha.
    /// Skips fully transparent pixels; fast-copies fully opaque ones.
    pub fn blit_blend(&mut self, src: &FrameBuffer, x: i32, y: i32) {
        let Some((sx, sy, dx, dy, w, h)) = self.clip_blit(src, x, y) else {
            return;
        };
        let row_bytes = w as usize * BYTES_PER_PIXEL;
        for row in 0..h {
            let s = src.pixel_index(sx, sy + row);
            let d = self.pixel_index(dx, dy + row);
            let src_row = &src.pixels[s..s + row_bytes];
            let dst_row = &mut self.pixels[d..d + row_bytes];
            for (sp, dp) in src_row
                .chunks_exact(BYTES_PER_PIXEL)
                .zip(dst_row.chunks_exact_mut(BYTES_PER_PIXEL))
            {
                match sp[3] {
                    0 => {},
                    255 => dp.copy_from_slice(sp),
                    _ => {
                        let top = Color::new(sp[0], sp[1], sp[2], sp[3]);
                        let bottom = Color::new(dp[0], dp[1], dp[2], dp[3]);
                        dp.copy_from_slice(&top.over(bottom).to_rgba());
                    },
                }
            }
        }
    }

    /// Get row `y` as a byte slice
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.pitch();
        Some(&self.pixels[start..start + self.pitch()])
    }

    /// Get raw pixel data for presentation
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Get mutable raw pixel data. The slice length cannot change, so the
    /// size invariant holds.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }
}
