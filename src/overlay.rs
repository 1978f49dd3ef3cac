//! Public entry points: the application context and the overlay window.
//!
//! ```no_run
//! use overlay_engine::{Color, OverlayApp, Position, WindowConfig};
//!
//! let mut app = OverlayApp::new()?;
//! let config = WindowConfig::overlay().with_transparent(false).with_title("hud");
//! let mut overlay = app.create_window(config)?;
//! loop {
//!     if overlay.poll_events()?.close_requested {
//!         break;
//!     }
//!     overlay.clear_frame(Color::TRANSPARENT);
//!     overlay.draw_circle(Position::new(100, 100), 40, Color::RED)?;
//!     overlay.render()?;
//! }
//! # Ok::<(), overlay_engine::OverlayError>(())
//! ```

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::color::Color;
use crate::display::{
    convert_pixel_format, primitives, FrameBuffer, FrameGate, FrameHandle, PixelFormat,
};
use crate::error::{OverlayError, Result};
use crate::platform::{NativeWindow, Platform, SdlPlatform};
use crate::renderer::Renderer;
use crate::types::{OverlayEvent, Position, Size, WindowConfig, WindowLevel};
use crate::util::{FrameClock, ThreadAffinity};
use crate::window::{PollOutcome, WindowManager, WindowState};

/// Frames averaged by the loop's fps estimate
const FPS_SAMPLES: usize = 60;

/// Owns the platform connection and creates overlay windows
pub struct OverlayApp<P: Platform> {
    platform: P,
    affinity: ThreadAffinity,
}

impl OverlayApp<SdlPlatform> {
    /// Connect to the desktop through SDL2 on the calling thread
    pub fn new() -> Result<Self> {
        Ok(Self::with_platform(SdlPlatform::new()?))
    }
}

impl<P: Platform> OverlayApp<P> {
    pub fn with_platform(platform: P) -> Self {
        Self {
            platform,
            affinity: ThreadAffinity::current(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Create an overlay from `config`.
    ///
    /// The surface is bound at the configured size, the working frame starts
    /// transparent (or as `initial_frame`), and the window is shown if
    /// `config.visible` is set.
    pub fn create_window(&mut self, mut config: WindowConfig) -> Result<Overlay<P::Window>> {
        self.affinity.check()?;
        let initial_frame = config.initial_frame.take();

        let mut window = WindowManager::create(&mut self.platform, &config)?;
        let size = window.size();
        let mut renderer = Renderer::new(config.render_when_occluded);
        renderer.bind(&mut window, size)?;

        let mut overlay = Overlay {
            frame: FrameBuffer::allocate(size.width, size.height)?,
            gate: FrameGate::new(size)?,
            window,
            renderer,
            frame_interval: Duration::from_millis(config.frame_interval_ms),
            clock: FrameClock::new(FPS_SAMPLES),
        };
        if let Some(bytes) = initial_frame {
            overlay.frame.copy_from(&bytes)?;
        }
        if config.visible {
            overlay.window.show()?;
        }
        Ok(overlay)
    }

    /// Drain platform-wide events. Returns true once the user asked the
    /// application as a whole to quit.
    pub fn poll_events(&mut self) -> Result<bool> {
        self.affinity.check()?;
        Ok(self.platform.poll_quit())
    }
}

/// Timing and events handed to the `start()` callback each tick
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTick {
    /// 1-based frame number
    pub frame: u64,
    /// Time since the previous tick
    pub delta: Duration,
    /// Rolling average frames per second
    pub fps: f32,
    /// Events polled this tick (empty when a handler is registered)
    pub events: Vec<OverlayEvent>,
}

/// An overlay window, its presentation surface and its working frame
pub struct Overlay<W: NativeWindow> {
    window: WindowManager<W>,
    renderer: Renderer<W::Surface>,
    frame: FrameBuffer,
    gate: FrameGate,
    frame_interval: Duration,
    clock: FrameClock,
}

impl<W: NativeWindow> Overlay<W> {
    // ========================================================================
    // Events
    // ========================================================================

    /// Poll window events without blocking.
    ///
    /// A confirmed resize reallocates the working and staging frames and
    /// rebinds the surface before any event is handed out, so a caller
    /// reacting to `Resized` already draws at the new size. A surface that
    /// cannot be rebuilt does not cost the batch its events: the failure is
    /// logged, and `render()` retries the bind and reports it.
    pub fn poll_events(&mut self) -> Result<PollOutcome> {
        let outcome = self.window.drain()?;
        if outcome.resized().is_some() {
            let size = self.window.size();
            if let Err(err) = self.rebuild(size) {
                warn!(
                    "window {}: surface rebuild at {} failed, retrying on render: {}",
                    self.window.id(),
                    size,
                    err
                );
            }
        }
        Ok(self.window.dispatch(outcome))
    }

    /// Bring frames and surface to `size`; frames first, so they follow the
    /// window even when the surface cannot
    fn rebuild(&mut self, size: Size) -> Result<()> {
        if self.frame.size() != size {
            let mut frame = FrameBuffer::allocate(size.width, size.height)?;
            frame.blit(&self.frame, 0, 0);
            self.frame = frame;
            self.gate.resize(size)?;
            debug!("window {}: frames reallocated at {}", self.window.id(), size);
        }
        self.renderer.bind(&mut self.window, size)
    }

    pub fn on_event<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(&OverlayEvent) + Send + 'static,
    {
        self.window.on_event(handler)
    }

    pub fn clear_event_handler(&mut self) -> Result<()> {
        self.window.clear_event_handler()
    }

    pub fn request_redraw(&mut self) -> Result<()> {
        self.window.request_redraw()
    }

    // ========================================================================
    // Window
    // ========================================================================

    pub fn show(&mut self) -> Result<()> {
        self.window.show()
    }

    pub fn hide(&mut self) -> Result<()> {
        self.window.hide()
    }

    pub fn is_visible(&self) -> bool {
        self.window.is_visible()
    }

    pub fn is_occluded(&self) -> bool {
        self.window.is_occluded()
    }

    pub fn state(&self) -> WindowState {
        self.window.state()
    }

    pub fn set_position(&mut self, position: Position) -> Result<()> {
        self.window.set_position(position)
    }

    pub fn position(&self) -> Position {
        self.window.position()
    }

    /// Request a resize; takes effect on the `poll_events()` that confirms it
    pub fn set_size(&mut self, size: Size) -> Result<()> {
        self.window.set_size(size)
    }

    pub fn size(&self) -> Size {
        self.window.size()
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.window.set_title(title)
    }

    pub fn set_window_level(&mut self, level: WindowLevel) -> Result<()> {
        self.window.set_window_level(level)
    }

    pub fn minimize(&mut self) -> Result<()> {
        self.window.minimize()
    }

    pub fn maximize(&mut self) -> Result<()> {
        self.window.maximize()
    }

    pub fn restore(&mut self) -> Result<()> {
        self.window.restore()
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.window.set_fullscreen(fullscreen)
    }

    /// Hide the window and free the surface. The overlay stays usable for
    /// queries; window operations fail with `WindowClosed`.
    pub fn close(&mut self) -> Result<()> {
        self.window.close()?;
        self.renderer.release(&mut self.window);
        Ok(())
    }

    pub fn window(&self) -> &WindowManager<W> {
        &self.window
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn set_frame_interval(&mut self, interval: Duration) {
        self.frame_interval = interval;
    }

    pub fn frames_presented(&self) -> u64 {
        self.renderer.frames_presented()
    }

    // ========================================================================
    // Frame
    // ========================================================================

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    pub fn frame_size(&self) -> Size {
        self.frame.size()
    }

    pub fn clear_frame(&mut self, color: Color) {
        self.frame.fill_color(color);
    }

    pub fn draw_pixel(&mut self, pos: Position, color: Color) {
        primitives::draw_pixel(&mut self.frame, pos, color);
    }

    pub fn draw_line(&mut self, from: Position, to: Position, color: Color) {
        primitives::draw_line(&mut self.frame, from, to, color);
    }

    pub fn draw_circle(&mut self, center: Position, radius: i32, color: Color) -> Result<()> {
        primitives::draw_circle(&mut self.frame, center, radius, color)
    }

    pub fn draw_rectangle(&mut self, pos: Position, size: Size, color: Color) {
        primitives::draw_rectangle(&mut self.frame, pos, size, color);
    }

    pub fn draw_image(&mut self, pos: Position, image: &FrameBuffer) {
        primitives::draw_image(&mut self.frame, pos, image);
    }

    pub fn draw_image_blended(&mut self, pos: Position, image: &FrameBuffer) {
        primitives::draw_image_blended(&mut self.frame, pos, image);
    }

    /// Writer for other threads; see [`FrameHandle::update_frame`]
    pub fn frame_handle(&self) -> FrameHandle {
        self.gate.handle()
    }

    /// Replace the whole frame with `bytes` (RGBA8, current window size)
    pub fn update_frame(&mut self, bytes: &[u8]) -> Result<()> {
        self.gate.handle().update_frame(bytes)?;
        self.gate.swap_into(&mut self.frame);
        Ok(())
    }

    /// Like [`Overlay::update_frame`] for frames packed in another layout
    pub fn update_frame_from(&mut self, data: &[u8], format: PixelFormat) -> Result<()> {
        let rgba = convert_pixel_format(data, format, PixelFormat::Rgba, self.frame.size())?;
        self.update_frame(&rgba)
    }

    /// Present the latest frame: a pending cross-thread frame if there is
    /// one, otherwise the working frame as drawn
    ///
    /// A surface left behind by a failed rebuild is bound again first.
    pub fn render(&mut self) -> Result<bool> {
        let size = self.window.size();
        if self.renderer.bound_size() != size || self.frame.size() != size {
            self.rebuild(size)?;
        }
        self.gate.swap_into(&mut self.frame);
        self.renderer.render(&mut self.window, self.frame.as_bytes())
    }

    // ========================================================================
    // Blocking loop
    // ========================================================================

    /// Run `poll -> on_frame -> render -> pace` until the window is asked
    /// to close, then close it.
    ///
    /// Frames rejected for a size mismatch or a missing surface are logged
    /// and skipped; any other error ends the loop and is returned.
    pub fn start<F>(&mut self, mut on_frame: F) -> Result<()>
    where
        F: FnMut(&mut Self, &FrameTick) -> Result<()>,
    {
        info!(
            "window {}: frame loop started, interval {:?}",
            self.window.id(),
            self.frame_interval
        );
        loop {
            let started = Instant::now();
            let outcome = self.poll_events()?;
            if outcome.close_requested {
                break;
            }

            let (delta, fps) = self.clock.tick();
            let tick = FrameTick {
                frame: self.clock.frame_count(),
                delta: Duration::from_secs_f32(delta),
                fps,
                events: outcome.events,
            };
            on_frame(self, &tick)?;
            if self.window.state() == WindowState::Closed {
                break;
            }

            match self.render() {
                Ok(_) => {},
                Err(err) if err.is_recoverable() => {
                    warn!("window {}: frame {} skipped: {}", self.window.id(), tick.frame, err);
                },
                Err(OverlayError::SurfaceCreationFailed(reason)) => {
                    warn!(
                        "window {}: frame {} skipped, no surface: {}",
                        self.window.id(),
                        tick.frame,
                        reason
                    );
                },
                Err(err) => return Err(err),
            }
            FrameClock::pace(started, self.frame_interval);
        }

        info!(
            "window {}: frame loop ended after {} frames ({:.1} ms avg)",
            self.window.id(),
            self.clock.frame_count(),
            self.clock.avg_frame_time_ms()
        );
        self.close()
    }
}

impl<W: NativeWindow> Drop for Overlay<W> {
    fn drop(&mut self) {
        // Surface first: it belongs to the native window's renderer
        self.renderer.release(&mut self.window);
    }
}
