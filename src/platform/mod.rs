//! Native windowing seam.
//!
//! A [`Platform`] creates native windows; a [`NativeWindow`] exposes the
//! small set of OS primitives the window manager and renderer are built on.
//! Everything stateful (event translation, state machine, size bookkeeping)
//! lives above this layer.
//!
//! Two backends ship with the crate:
//! - [`sdl::SdlPlatform`]: real windows through SDL2
//! - [`headless::HeadlessPlatform`]: in-memory windows for tests and CI

pub mod headless;
pub mod sdl;

use crate::error::Result;
use crate::types::{Position, Size, WindowConfig, WindowLevel};

pub use headless::{HeadlessPlatform, HeadlessProbe, HeadlessSurface, HeadlessWindow};
pub use sdl::{SdlPlatform, SdlSurface, SdlWindow};

/// Raw window notifications, before translation into `OverlayEvent`s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    CloseRequested,
    Resized(Size),
    Moved(Position),
    FocusGained,
    FocusLost,
    /// Window contents were damaged and must be redrawn
    Exposed,
    Minimized,
    Maximized,
    Restored,
    Shown,
    Hidden,
}

/// Window system connection. One per process for real backends.
pub trait Platform {
    type Window: NativeWindow;

    fn name(&self) -> &'static str;

    /// Create a hidden native window from `config`.
    ///
    /// Fails with `SurfaceCreationFailed` when the OS rejects the requested
    /// attributes (e.g. per-pixel transparency).
    fn create_window(&mut self, config: &WindowConfig) -> Result<Self::Window>;

    /// Drain platform-wide events; returns true once the user asked the
    /// whole application to quit
    fn poll_quit(&mut self) -> bool;
}

/// One native window plus its presentation primitives
pub trait NativeWindow {
    /// GPU-side image the frame is uploaded into
    type Surface;

    fn id(&self) -> u32;

    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;

    fn set_position(&mut self, position: Position);
    fn position(&self) -> Position;

    /// Request a new client size. The OS confirms asynchronously through
    /// a `NativeEvent::Resized`.
    fn set_size(&mut self, size: Size) -> Result<()>;
    /// Size as currently reported by the OS
    fn size(&self) -> Size;

    fn set_title(&mut self, title: &str) -> Result<()>;
    fn set_level(&mut self, level: WindowLevel) -> Result<()>;

    fn minimize(&mut self);
    fn maximize(&mut self);
    fn restore(&mut self);
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;

    /// Move every queued native event into `out`, never blocking
    fn drain_events(&mut self, out: &mut Vec<NativeEvent>);

    fn create_surface(&mut self, size: Size) -> Result<Self::Surface>;
    fn destroy_surface(&mut self, surface: Self::Surface);

    /// Upload `frame` (RGBA8, `pitch` bytes per row) into `surface` and
    /// show it. May block until vertical sync.
    fn present(&mut self, surface: &mut Self::Surface, frame: &[u8], pitch: usize) -> Result<()>;
}
