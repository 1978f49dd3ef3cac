//! Drawing primitives over a [`FrameBuffer`].
//!
//! Every primitive clips silently: pixels that fall outside the frame are
//! dropped and never reported as errors.

use crate::color::Color;
use crate::display::frame_buffer::FrameBuffer;
use crate::error::{OverlayError, Result};
use crate::types::{Position, Size};

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

/// Cohen-Sutherland region code of a point relative to the frame
fn outcode(x: i64, y: i64, width: i64, height: i64) -> u8 {
    let mut code = INSIDE;
    if x < 0 {
        code |= LEFT;
    } else if x >= width {
        code |= RIGHT;
    }
    if y < 0 {
        code |= TOP;
    } else if y >= height {
        code |= BOTTOM;
    }
    code
}

/// Zero-initialized RGBA8 buffer
pub fn create_rgba_buffer(width: u32, height: u32) -> Result<FrameBuffer> {
    FrameBuffer::allocate(width, height)
}

#[inline]
pub fn draw_pixel(buffer: &mut FrameBuffer, pos: Position, color: Color) {
    buffer.set_pixel(pos, color);
}

/// Draw a 1px line using Bresenham's algorithm.
///
/// Both endpoints are included and each pixel on the path is written once.
/// Lines lying wholly beyond one edge of the frame are rejected up front;
/// otherwise only the steps whose major coordinate falls inside the frame
/// are visited, so the cost is bounded by the frame, not the line.
pub fn draw_line(buffer: &mut FrameBuffer, from: Position, to: Position, color: Color) {
    let (w, h) = (buffer.width() as i64, buffer.height() as i64);
    let (x0, y0) = (from.x as i64, from.y as i64);
    let (x1, y1) = (to.x as i64, to.y as i64);

    if outcode(x0, y0, w, h) & outcode(x1, y1, w, h) != 0 {
        return;
    }

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    // The loop's error term is fixed by how many x and y steps it has
    // taken, so the minor offset after k major steps has a closed form:
    // floor((2 * minor * k + major) / (2 * major)).
    let x_major = dx >= dy;
    let (major, minor) = if x_major { (dx, dy) } else { (dy, dx) };
    let minor_at = |k: i64| -> i64 {
        if major == 0 {
            return 0;
        }
        ((2 * minor as i128 * k as i128 + major as i128) / (2 * major as i128)) as i64
    };

    let (start, step, extent) = if x_major { (x0, sx, w) } else { (y0, sy, h) };
    let (first, last) = if step > 0 {
        ((-start).max(0), (extent - 1 - start).min(major))
    } else {
        ((start - (extent - 1)).max(0), start.min(major))
    };

    for k in first..=last {
        let n = minor_at(k);
        let (x, y) = if x_major {
            (x0 + sx * k, y0 + sy * n)
        } else {
            (x0 + sx * n, y0 + sy * k)
        };
        if x >= 0 && x < w && y >= 0 && y < h {
            buffer.set_pixel(Position::new(x as i32, y as i32), color);
        }
    }
}

/// Decision value of the midpoint loop for column `x` on row `y`; positive
/// means the loop steps inward
fn midpoint_decision(r: i64, x: i64, y: i64) -> i128 {
    let (r, x, y) = (r as i128, x as i128, y as i128);
    2 * x * x - 6 * x + 2 * y * y + 4 * y - 2 * r * r + 4 * r + 1
}

/// Error term the midpoint loop carries at `(x, y)`
fn midpoint_error(r: i64, x: i64, y: i64) -> i64 {
    let (r, x, y) = (r as i128, x as i128, y as i128);
    (x * x + y * y - r * r + 2 * y + 2 * r - 2 * x) as i64
}

/// Largest column whose decision on row `y` is not positive. This is where
/// the loop sits on row `y` as long as it stayed three or more columns off
/// the diagonal up to that row.
fn midpoint_column(r: i64, y: i64) -> i64 {
    let q = 4 * (r as i128 - 1).pow(2) + 7 - 4 * (y as i128 + 1).pow(2);
    if q < 1 {
        return 0;
    }
    let mut x = (((q as f64).sqrt() as i128 + 3) / 2) as i64;
    while midpoint_decision(r, x + 1, y) <= 0 {
        x += 1;
    }
    while x > 1 && midpoint_decision(r, x, y) > 0 {
        x -= 1;
    }
    x
}

/// Furthest row in `(from, to]` the loop can jump to in closed form
fn octant_skip_target(r: i64, from: i64, to: i64) -> Option<i64> {
    let reachable = |t: i64| midpoint_column(r, t - 1) >= t + 3;
    let (mut lo, mut hi) = (from + 1, to);
    if lo > hi || !reachable(lo) {
        return None;
    }
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if reachable(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Some(lo)
}

/// Draw a circle outline (1px thick) with the midpoint algorithm.
///
/// Only octant rows that can land inside the frame are walked; the loop
/// jumps over the rest, so huge radii cost no more than small ones.
pub fn draw_circle(buffer: &mut FrameBuffer, center: Position, radius: i32, color: Color) -> Result<()> {
    if radius < 0 {
        return Err(OverlayError::InvalidArgument(format!(
            "circle radius must be non-negative, got {}",
            radius
        )));
    }

    let (w, h) = (buffer.width() as i64, buffer.height() as i64);
    let (cx, cy) = (center.x as i64, center.y as i64);
    let r = radius as i64;
    if cx + r < 0 || cx - r >= w || cy + r < 0 || cy - r >= h {
        return Ok(());
    }

    let mut plot = |x: i64, y: i64| {
        if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
            buffer.set_pixel(Position::new(x, y), color);
        }
    };

    if r == 0 {
        plot(cx, cy);
        return Ok(());
    }

    // Row y paints at cy +- y and at cx +- y; rows outside these spans
    // only paint off-frame pixels
    let mut spans: Vec<(i64, i64)> = [
        (-cy, h - 1 - cy),
        (cy - (h - 1), cy),
        (-cx, w - 1 - cx),
        (cx - (w - 1), cx),
    ]
    .into_iter()
    .map(|(first, last)| (first.max(0), last.min(r)))
    .filter(|(first, last)| first <= last)
    .collect();
    spans.sort_unstable();

    let mut x = r;
    let mut y = 0i64;
    let mut err = 0i64;

    for (first, last) in spans {
        if let Some(target) = octant_skip_target(r, y, first) {
            x = midpoint_column(r, target);
            y = target;
            err = midpoint_error(r, x, y);
        }

        while x >= y && y <= last {
            if y >= first {
                plot(cx + x, cy + y);
                plot(cx + y, cy + x);
                plot(cx - y, cy + x);
                plot(cx - x, cy + y);
                plot(cx - x, cy - y);
                plot(cx - y, cy - x);
                plot(cx + y, cy - x);
                plot(cx + x, cy - y);
            }

            y += 1;
            err += 1 + 2 * y;
            if 2 * (err - x) + 1 > 0 {
                x -= 1;
                err += 1 - 2 * x;
            }
        }
        if x < y {
            break;
        }
    }
    Ok(())
}

/// Fill an axis-aligned rectangle; clipped, and a no-op for zero width or height
pub fn draw_rectangle(buffer: &mut FrameBuffer, pos: Position, size: Size, color: Color) {
    if size.is_empty() {
        return;
    }
    let x1 = pos.x as i64;
    let x2 = x1 + size.width as i64 - 1;
    let top = (pos.y as i64).max(0);
    let bottom = (pos.y as i64 + size.height as i64).min(buffer.height() as i64);
    for y in top..bottom {
        buffer.hline(x1, x2, y, color);
    }
}

/// Copy `image` into `buffer` at `pos`, overwriting destination pixels
/// (alpha included)
pub fn draw_image(buffer: &mut FrameBuffer, pos: Position, image: &FrameBuffer) {
    buffer.blit(image, pos.x, pos.y);
}

/// Composite `image` over `buffer` at `pos` using the image's alpha
pub fn draw_image_blended(buffer: &mut FrameBuffer, pos: Position, image: &FrameBuffer) {
    buffer.blit_blend(image, pos.x, pos.y);
}

pub fn fill_buffer_color(buffer: &mut FrameBuffer, color: Color) {
    buffer.fill_color(color);
}

pub fn fill_buffer_rgba(buffer: &mut FrameBuffer, rgba: &[u8]) -> Result<()> {
    buffer.fill_rgba(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(buffer: &FrameBuffer) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..buffer.height() as i32 {
            for x in 0..buffer.width() as i32 {
                if buffer.get_pixel(Position::new(x, y)).unwrap() != Color::TRANSPARENT {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_horizontal_line_covers_endpoints() {
        let mut buffer = create_rgba_buffer(10, 10).unwrap();
        draw_line(&mut buffer, Position::new(0, 0), Position::new(4, 0), Color::WHITE);
        assert_eq!(painted(&buffer), vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn test_line_is_symmetric_in_pixel_count() {
        let mut forward = create_rgba_buffer(20, 20).unwrap();
        let mut backward = create_rgba_buffer(20, 20).unwrap();
        draw_line(&mut forward, Position::new(1, 2), Position::new(17, 9), Color::RED);
        draw_line(&mut backward, Position::new(17, 9), Position::new(1, 2), Color::RED);
        // x-major: one pixel per column
        assert_eq!(painted(&forward).len(), 17);
        assert_eq!(painted(&backward).len(), 17);
    }

    #[test]
    fn test_degenerate_line_is_one_pixel() {
        let mut buffer = create_rgba_buffer(5, 5).unwrap();
        draw_line(&mut buffer, Position::new(2, 3), Position::new(2, 3), Color::BLUE);
        assert_eq!(painted(&buffer), vec![(2, 3)]);
    }

    #[test]
    fn test_line_clips_partially_visible() {
        let mut buffer = create_rgba_buffer(5, 5).unwrap();
        draw_line(&mut buffer, Position::new(-3, 2), Position::new(7, 2), Color::GREEN);
        assert_eq!(painted(&buffer).len(), 5);
    }

    #[test]
    fn test_line_outside_one_edge_is_rejected() {
        let mut buffer = create_rgba_buffer(5, 5).unwrap();
        draw_line(
            &mut buffer,
            Position::new(-100, i32::MIN),
            Position::new(i32::MAX, -1),
            Color::GREEN,
        );
        assert!(painted(&buffer).is_empty());
    }

    fn reference_line(buffer: &mut FrameBuffer, from: Position, to: Position, color: Color) {
        let (x1, y1) = (to.x as i64, to.y as i64);
        let (mut x, mut y) = (from.x as i64, from.y as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            if let (Ok(px), Ok(py)) = (i32::try_from(x), i32::try_from(y)) {
                buffer.set_pixel(Position::new(px, py), color);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn reference_circle(buffer: &mut FrameBuffer, center: Position, radius: i64, color: Color) {
        let (cx, cy) = (center.x as i64, center.y as i64);
        let mut plot = |x: i64, y: i64| {
            if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
                buffer.set_pixel(Position::new(x, y), color);
            }
        };
        let (mut x, mut y, mut err) = (radius, 0i64, 0i64);
        while x >= y {
            let octants = [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)];
            for (px, py) in octants {
                plot(cx + px, cy + py);
            }
            y += 1;
            err += 1 + 2 * y;
            if 2 * (err - x) + 1 > 0 {
                x -= 1;
                err += 1 - 2 * x;
            }
        }
    }

    #[test]
    fn test_clipped_line_matches_full_walk() {
        let coords = [-37, -9, -1, 0, 3, 6, 9, 10, 14, 41];
        for &x0 in &coords {
            for &y0 in &coords {
                for &x1 in &coords {
                    for &y1 in &coords {
                        let (from, to) = (Position::new(x0, y0), Position::new(x1, y1));
                        let mut fast = create_rgba_buffer(10, 8).unwrap();
                        let mut full = create_rgba_buffer(10, 8).unwrap();
                        draw_line(&mut fast, from, to, Color::WHITE);
                        reference_line(&mut full, from, to, Color::WHITE);
                        assert_eq!(painted(&fast), painted(&full), "{:?} -> {:?}", from, to);
                    }
                }
            }
        }
    }

    #[test]
    fn test_huge_line_costs_only_visible_steps() {
        let mut buffer = create_rgba_buffer(5, 5).unwrap();
        draw_line(
            &mut buffer,
            Position::new(-1_000_000_000, 2),
            Position::new(1_000_000_000, 2),
            Color::RED,
        );
        assert_eq!(painted(&buffer), vec![(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);

        let mut buffer = create_rgba_buffer(5, 5).unwrap();
        draw_line(
            &mut buffer,
            Position::new(i32::MIN, i32::MIN),
            Position::new(i32::MAX, i32::MAX),
            Color::RED,
        );
        assert_eq!(painted(&buffer).len(), 5);
    }

    #[test]
    fn test_skipped_circle_matches_full_walk() {
        let cases = [
            (Position::new(20, 20 + 300), 300),
            (Position::new(20 - 1000, 15), 1000),
            (Position::new(-700, -700), 1000),
            (Position::new(45, 45), 37),
            (Position::new(-5, 60), 64),
            (Position::new(20, 20), 3),
            (Position::new(-3, 11), 2),
        ];
        for (center, radius) in cases {
            let mut fast = create_rgba_buffer(40, 40).unwrap();
            let mut full = create_rgba_buffer(40, 40).unwrap();
            draw_circle(&mut fast, center, radius, Color::WHITE).unwrap();
            reference_circle(&mut full, center, radius as i64, Color::WHITE);
            assert_eq!(painted(&fast), painted(&full), "{:?} r={}", center, radius);
        }
    }

    #[test]
    fn test_huge_circle_is_cheap() {
        let mut buffer = create_rgba_buffer(5, 5).unwrap();
        draw_circle(&mut buffer, Position::new(2, 2), 1_000_000_000, Color::WHITE).unwrap();
        assert!(painted(&buffer).is_empty());

        // tangent to the top edge
        draw_circle(&mut buffer, Position::new(2, 1_000_000_000), 1_000_000_000, Color::WHITE)
            .unwrap();
        assert!(painted(&buffer).contains(&(2, 0)));
    }

    #[test]
    fn test_circle_radius_rules() {
        let mut buffer = create_rgba_buffer(9, 9).unwrap();
        assert!(matches!(
            draw_circle(&mut buffer, Position::new(4, 4), -1, Color::WHITE),
            Err(OverlayError::InvalidArgument(_))
        ));
        assert!(painted(&buffer).is_empty());

        draw_circle(&mut buffer, Position::new(4, 4), 0, Color::WHITE).unwrap();
        assert_eq!(painted(&buffer), vec![(4, 4)]);
    }

    #[test]
    fn test_circle_outline_touches_extremes() {
        let mut buffer = create_rgba_buffer(11, 11).unwrap();
        draw_circle(&mut buffer, Position::new(5, 5), 4, Color::WHITE).unwrap();
        let pixels = painted(&buffer);
        for extreme in [(9, 5), (1, 5), (5, 9), (5, 1)] {
            assert!(pixels.contains(&extreme), "missing {:?}", extreme);
        }
        // outline only
        assert!(!pixels.contains(&(5, 5)));
    }

    #[test]
    fn test_rectangle_clipped_at_negative_origin() {
        let mut buffer = create_rgba_buffer(20, 20).unwrap();
        draw_rectangle(&mut buffer, Position::new(-5, -5), Size::new(10, 10), Color::RED);
        let pixels = painted(&buffer);
        assert_eq!(pixels.len(), 25);
        assert!(pixels.iter().all(|&(x, y)| x < 5 && y < 5));
    }

    #[test]
    fn test_rectangle_zero_size_is_noop() {
        let mut buffer = create_rgba_buffer(4, 4).unwrap();
        draw_rectangle(&mut buffer, Position::new(1, 1), Size::new(0, 3), Color::RED);
        draw_rectangle(&mut buffer, Position::new(1, 1), Size::new(3, 0), Color::RED);
        assert!(painted(&buffer).is_empty());
    }

    #[test]
    fn test_draw_image_overwrites_including_alpha() {
        let mut buffer = create_rgba_buffer(3, 3).unwrap();
        fill_buffer_color(&mut buffer, Color::WHITE);
        let image = FrameBuffer::from_rgba(1, 1, vec![10, 20, 30, 0]).unwrap();
        draw_image(&mut buffer, Position::new(1, 1), &image);
        assert_eq!(
            buffer.get_pixel(Position::new(1, 1)).unwrap(),
            Color::new(10, 20, 30, 0)
        );

        draw_image_blended(&mut buffer, Position::new(0, 0), &image);
        assert_eq!(buffer.get_pixel(Position::new(0, 0)).unwrap(), Color::WHITE);
    }

    #[test]
    fn test_fill_buffer_rgba() {
        let mut buffer = create_rgba_buffer(2, 2).unwrap();
        fill_buffer_rgba(&mut buffer, &[1, 2, 3, 4]).unwrap();
        assert!(buffer.as_bytes().chunks_exact(4).all(|p| p == [1, 2, 3, 4]));
        assert!(fill_buffer_rgba(&mut buffer, &[]).is_err());
    }
}
