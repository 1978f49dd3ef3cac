//! Software frames and everything that draws into or hands them around.

pub mod frame_buffer;
pub mod frame_gate;
pub mod pixel_format;
pub mod primitives;

pub use frame_buffer::FrameBuffer;
pub use frame_gate::{FrameGate, FrameHandle};
pub use pixel_format::{blend_with_background, convert_pixel_format, PixelFormat};
pub use primitives::{
    create_rgba_buffer, draw_circle, draw_image, draw_image_blended, draw_line, draw_pixel,
    draw_rectangle, fill_buffer_color, fill_buffer_rgba,
};
