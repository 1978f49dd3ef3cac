//! Presentation surface bound to a window.
//!
//! A surface always has the exact size it was bound at. When the window is
//! resized the surface is rebuilt, never resized in place, and any frame
//! that does not match the bound size is rejected instead of stretched.

use log::{debug, trace};

use crate::error::{OverlayError, Result};
use crate::platform::NativeWindow;
use crate::types::Size;
use crate::window::WindowManager;

#[derive(Debug)]
pub struct Renderer<S> {
    surface: Option<S>,
    bound: Size,
    render_when_occluded: bool,
    presented: u64,
    skipped: u64,
}

impl<S> Renderer<S> {
    /// Unbound renderer; call [`Renderer::bind`] before rendering
    pub fn new(render_when_occluded: bool) -> Self {
        Self {
            surface: None,
            bound: Size::default(),
            render_when_occluded,
            presented: 0,
            skipped: 0,
        }
    }

    /// Size of the current surface, `0x0` when unbound
    pub fn bound_size(&self) -> Size {
        self.bound
    }

    pub fn is_bound(&self) -> bool {
        self.surface.is_some()
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    pub fn frames_skipped(&self) -> u64 {
        self.skipped
    }

    pub fn render_when_occluded(&self) -> bool {
        self.render_when_occluded
    }

    pub fn set_render_when_occluded(&mut self, render: bool) {
        self.render_when_occluded = render;
    }

    /// Destroy the current surface (if any) and create one of exactly `size`
    pub fn bind<W>(&mut self, window: &mut WindowManager<W>, size: Size) -> Result<()>
    where
        W: NativeWindow<Surface = S>,
    {
        window.ensure_open()?;
        let size = size.validate()?;
        if let Some(old) = self.surface.take() {
            window.native_mut().destroy_surface(old);
        }
        self.bound = Size::default();

        let surface = window.native_mut().create_surface(size)?;
        self.surface = Some(surface);
        self.bound = size;
        debug!("window {}: surface bound at {}", window.id(), size);
        Ok(())
    }

    /// Upload `frame` and present it.
    ///
    /// Returns `Ok(false)` when the window is occluded and occluded
    /// rendering is off. Fails with `SurfaceSizeMismatch` while the surface
    /// lags a confirmed resize, and with `SizeMismatch` when `frame` does
    /// not have the bound size.
    pub fn render<W>(&mut self, window: &mut WindowManager<W>, frame: &[u8]) -> Result<bool>
    where
        W: NativeWindow<Surface = S>,
    {
        window.ensure_open()?;

        if !self.render_when_occluded && window.is_occluded() {
            self.skipped += 1;
            trace!("window {}: occluded, frame skipped", window.id());
            return Ok(false);
        }

        let stale = OverlayError::SurfaceSizeMismatch {
            bound: self.bound,
            window: window.size(),
        };
        if self.bound != window.size() {
            return Err(stale);
        }
        let Some(surface) = self.surface.as_mut() else {
            return Err(stale);
        };

        let expected = self.bound.buffer_len();
        if frame.len() != expected {
            return Err(OverlayError::SizeMismatch {
                expected,
                actual: frame.len(),
            });
        }

        window
            .native_mut()
            .present(surface, frame, self.bound.pitch())?;
        self.presented += 1;
        Ok(true)
    }

    /// Destroy the surface now instead of waiting for the window to go
    pub fn release<W>(&mut self, window: &mut WindowManager<W>)
    where
        W: NativeWindow<Surface = S>,
    {
        if let Some(surface) = self.surface.take() {
            window.native_mut().destroy_surface(surface);
            debug!("window {}: surface released", window.id());
        }
        self.bound = Size::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessSurface;
    use crate::platform::{HeadlessPlatform, HeadlessProbe, HeadlessWindow};
    use crate::types::WindowConfig;

    type Fixture = (
        WindowManager<HeadlessWindow>,
        Renderer<HeadlessSurface>,
        HeadlessProbe,
    );

    fn bound(size: Size, render_when_occluded: bool) -> Fixture {
        let mut platform = HeadlessPlatform::new();
        let config = WindowConfig::default().with_size(size);
        let mut window = WindowManager::create(&mut platform, &config).unwrap();
        let probe = window.native().probe();
        window.show().unwrap();
        window.poll_events().unwrap();
        let mut renderer = Renderer::new(render_when_occluded);
        renderer.bind(&mut window, size).unwrap();
        (window, renderer, probe)
    }

    #[test_log::test]
    fn test_render_presents_matching_frame() {
        let size = Size::new(4, 3);
        let (mut window, mut renderer, probe) = bound(size, true);
        let frame = vec![200; size.buffer_len()];
        assert_eq!(renderer.render(&mut window, &frame), Ok(true));
        assert_eq!(probe.presented_frames(), 1);
        assert_eq!(probe.last_frame(), Some(frame));
        assert_eq!(renderer.frames_presented(), 1);
    }

    #[test_log::test]
    fn test_unbound_renderer_reports_stale_surface() {
        let mut platform = HeadlessPlatform::new();
        let mut window =
            WindowManager::create(&mut platform, &WindowConfig::default()).unwrap();
        window.show().unwrap();
        let mut renderer: Renderer<HeadlessSurface> = Renderer::new(true);
        assert!(matches!(
            renderer.render(&mut window, &[]),
            Err(OverlayError::SurfaceSizeMismatch { bound, .. }) if bound == Size::default()
        ));
    }

    #[test_log::test]
    fn test_stale_surface_then_stale_frame() {
        let old = Size::new(8, 6);
        let new = Size::new(10, 4);
        let (mut window, mut renderer, probe) = bound(old, true);
        let old_frame = vec![1; old.buffer_len()];

        window.set_size(new).unwrap();
        window.poll_events().unwrap();
        assert_eq!(
            renderer.render(&mut window, &old_frame),
            Err(OverlayError::SurfaceSizeMismatch {
                bound: old,
                window: new
            })
        );

        renderer.bind(&mut window, new).unwrap();
        assert_eq!(probe.live_surfaces(), 1);
        assert_eq!(
            renderer.render(&mut window, &old_frame),
            Err(OverlayError::SizeMismatch {
                expected: new.buffer_len(),
                actual: old.buffer_len()
            })
        );
        assert_eq!(renderer.render(&mut window, &vec![2; new.buffer_len()]), Ok(true));
        assert_eq!(probe.presented_frames(), 1);
    }

    #[test_log::test]
    fn test_occluded_window_skips_when_configured() {
        let size = Size::new(2, 2);
        let frame = vec![0; size.buffer_len()];

        let (mut window, mut renderer, probe) = bound(size, false);
        window.minimize().unwrap();
        assert_eq!(renderer.render(&mut window, &frame), Ok(false));
        assert_eq!(renderer.frames_skipped(), 1);
        assert_eq!(probe.presented_frames(), 0);

        let (mut window, mut renderer, probe) = bound(size, true);
        window.hide().unwrap();
        assert_eq!(renderer.render(&mut window, &frame), Ok(true));
        assert_eq!(probe.presented_frames(), 1);
    }

    #[test_log::test]
    fn test_release_and_closed_window() {
        let size = Size::new(2, 2);
        let (mut window, mut renderer, probe) = bound(size, true);
        renderer.release(&mut window);
        assert!(!renderer.is_bound());
        assert_eq!(probe.live_surfaces(), 0);

        window.close().unwrap();
        assert_eq!(
            renderer.render(&mut window, &vec![0; size.buffer_len()]),
            Err(OverlayError::WindowClosed)
        );
        assert_eq!(renderer.bind(&mut window, size), Err(OverlayError::WindowClosed));
    }
}
