//! Always-on-top overlay windows that present a software RGBA8 frame
//! buffer, transparent where the backend allows it.
//!
//! The caller owns the loop: [`Overlay::poll_events`] never blocks,
//! drawing happens on the overlay's [`FrameBuffer`], and [`Overlay::render`]
//! presents it. [`Overlay::start`] wraps that loop for simple programs, and
//! [`FrameHandle`] lets other threads submit whole frames.

pub mod color;
pub mod display;
pub mod error;
pub mod overlay;
pub mod platform;
pub mod renderer;
pub mod types;
pub mod util;
pub mod window;

pub use color::{
    blend_colors, color_to_hex, color_to_rgb_hex, color_to_rgba, create_color, lerp_colors, Color,
};
pub use display::{
    blend_with_background, convert_pixel_format, create_rgba_buffer, draw_circle, draw_image,
    draw_image_blended, draw_line, draw_pixel, draw_rectangle, fill_buffer_color,
    fill_buffer_rgba, FrameBuffer, FrameHandle, PixelFormat,
};
pub use error::{OverlayError, Result};
pub use overlay::{FrameTick, Overlay, OverlayApp};
pub use platform::{HeadlessPlatform, NativeEvent, NativeWindow, Platform, SdlPlatform};
pub use types::{
    calculate_buffer_size, create_position, create_size, create_window_config, OverlayEvent,
    Position, Size, WindowConfig, WindowLevel, BYTES_PER_PIXEL,
};
pub use window::{PollOutcome, WindowManager, WindowState};
