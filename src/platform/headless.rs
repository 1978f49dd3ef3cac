//! In-memory platform backend.
//!
//! Windows live entirely in process memory: OS-side changes are recorded,
//! the matching native events are queued for the next poll, and presented
//! frames are kept for inspection. Every type here is `Send`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, trace};

use crate::error::{OverlayError, Result};
use crate::platform::{NativeEvent, NativeWindow, Platform};
use crate::types::{Position, Size, WindowConfig, WindowLevel};

#[derive(Debug)]
pub struct HeadlessPlatform {
    next_id: u32,
    supports_transparency: bool,
    max_window_size: Option<Size>,
    quit_requested: bool,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            supports_transparency: true,
            max_window_size: None,
            quit_requested: false,
        }
    }

    /// A platform whose compositor refuses transparent windows
    pub fn without_transparency() -> Self {
        Self {
            supports_transparency: false,
            ..Self::new()
        }
    }

    /// Clamp new windows to `max`, the way a window system fits windows
    /// to the screen
    pub fn with_max_window_size(mut self, max: Size) -> Self {
        self.max_window_size = Some(max);
        self
    }

    /// Simulate the user quitting the whole application
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }
}

impl Platform for HeadlessPlatform {
    type Window = HeadlessWindow;

    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_window(&mut self, config: &WindowConfig) -> Result<HeadlessWindow> {
        if config.transparent && !self.supports_transparency {
            return Err(OverlayError::SurfaceCreationFailed(
                "compositor does not support per-pixel transparency".to_string(),
            ));
        }

        let id = self.next_id;
        self.next_id += 1;
        info!("headless: window {} '{}' {}", id, config.title, config.size);

        let size = match self.max_window_size {
            Some(max) => Size::new(
                config.size.width.min(max.width),
                config.size.height.min(max.height),
            ),
            None => config.size,
        };
        let state = HeadlessState {
            title: config.title.clone(),
            size,
            position: config.position.unwrap_or(Position::ORIGIN),
            level: config.level(),
            ..HeadlessState::default()
        };
        Ok(HeadlessWindow {
            id,
            shared: Arc::new(Mutex::new(state)),
        })
    }

    fn poll_quit(&mut self) -> bool {
        self.quit_requested
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    title: String,
    size: Size,
    position: Position,
    level: WindowLevel,
    visible: bool,
    fullscreen: bool,
    queue: VecDeque<NativeEvent>,
    presented: usize,
    last_frame: Option<Vec<u8>>,
    live_surfaces: usize,
    /// Largest surface the fake GPU accepts
    surface_limit: Option<Size>,
}

fn lock(shared: &Mutex<HeadlessState>) -> MutexGuard<'_, HeadlessState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct HeadlessWindow {
    id: u32,
    shared: Arc<Mutex<HeadlessState>>,
}

impl HeadlessWindow {
    /// Observer that keeps working after the window moves into an `Overlay`
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            shared: Arc::clone(&self.shared),
        }
    }

    fn push(&self, event: NativeEvent) {
        lock(&self.shared).queue.push_back(event);
    }
}

/// Surface handle; only remembers the size it was created with
#[derive(Debug)]
pub struct HeadlessSurface {
    size: Size,
}

impl NativeWindow for HeadlessWindow {
    type Surface = HeadlessSurface;

    fn id(&self) -> u32 {
        self.id
    }

    fn show(&mut self) {
        let mut state = lock(&self.shared);
        if !state.visible {
            state.visible = true;
            state.queue.push_back(NativeEvent::Shown);
            state.queue.push_back(NativeEvent::Exposed);
        }
    }

    fn hide(&mut self) {
        let mut state = lock(&self.shared);
        if state.visible {
            state.visible = false;
            state.queue.push_back(NativeEvent::Hidden);
        }
    }

    fn is_visible(&self) -> bool {
        lock(&self.shared).visible
    }

    fn set_position(&mut self, position: Position) {
        let mut state = lock(&self.shared);
        state.position = position;
        state.queue.push_back(NativeEvent::Moved(position));
    }

    fn position(&self) -> Position {
        lock(&self.shared).position
    }

    fn set_size(&mut self, size: Size) -> Result<()> {
        let mut state = lock(&self.shared);
        state.size = size;
        state.queue.push_back(NativeEvent::Resized(size));
        Ok(())
    }

    fn size(&self) -> Size {
        lock(&self.shared).size
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        if title.contains('\0') {
            return Err(OverlayError::Platform("title contains a NUL byte".to_string()));
        }
        lock(&self.shared).title = title.to_string();
        Ok(())
    }

    fn set_level(&mut self, level: WindowLevel) -> Result<()> {
        lock(&self.shared).level = level;
        Ok(())
    }

    fn minimize(&mut self) {
        self.push(NativeEvent::Minimized);
    }

    fn maximize(&mut self) {
        self.push(NativeEvent::Maximized);
    }

    fn restore(&mut self) {
        self.push(NativeEvent::Restored);
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        lock(&self.shared).fullscreen = fullscreen;
        Ok(())
    }

    fn drain_events(&mut self, out: &mut Vec<NativeEvent>) {
        out.extend(lock(&self.shared).queue.drain(..));
    }

    fn create_surface(&mut self, size: Size) -> Result<HeadlessSurface> {
        let size = size.validate()?;
        let mut state = lock(&self.shared);
        if let Some(limit) = state.surface_limit {
            if size.width > limit.width || size.height > limit.height {
                return Err(OverlayError::SurfaceCreationFailed(format!(
                    "{} exceeds the {} surface limit",
                    size, limit
                )));
            }
        }
        state.live_surfaces += 1;
        Ok(HeadlessSurface { size })
    }

    fn destroy_surface(&mut self, _surface: HeadlessSurface) {
        let mut state = lock(&self.shared);
        state.live_surfaces = state.live_surfaces.saturating_sub(1);
    }

    fn present(&mut self, surface: &mut HeadlessSurface, frame: &[u8], pitch: usize) -> Result<()> {
        if frame.len() != surface.size.buffer_len() || pitch != surface.size.pitch() {
            return Err(OverlayError::PresentFailed(format!(
                "{} byte frame with pitch {} does not fit a {} surface",
                frame.len(),
                pitch,
                surface.size
            )));
        }
        let mut state = lock(&self.shared);
        state.presented += 1;
        state.last_frame = Some(frame.to_vec());
        trace!("headless: window {} presented frame {}", self.id, state.presented);
        Ok(())
    }
}

/// Read/inject access to a headless window from tests
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    shared: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    /// Queue a native event as if the OS sent it
    pub fn push_event(&self, event: NativeEvent) {
        lock(&self.shared).queue.push_back(event);
    }

    /// Simulate the user resizing the window
    pub fn user_resize(&self, size: Size) {
        let mut state = lock(&self.shared);
        state.size = size;
        state.queue.push_back(NativeEvent::Resized(size));
    }

    /// Make surface creation fail above `limit`, like a GPU's maximum
    /// texture size; `None` lifts the limit
    pub fn set_surface_limit(&self, limit: Option<Size>) {
        lock(&self.shared).surface_limit = limit;
    }

    pub fn presented_frames(&self) -> usize {
        lock(&self.shared).presented
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        lock(&self.shared).last_frame.clone()
    }

    pub fn title(&self) -> String {
        lock(&self.shared).title.clone()
    }

    pub fn level(&self) -> WindowLevel {
        lock(&self.shared).level
    }

    pub fn size(&self) -> Size {
        lock(&self.shared).size
    }

    pub fn position(&self) -> Position {
        lock(&self.shared).position
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.shared).visible
    }

    pub fn is_fullscreen(&self) -> bool {
        lock(&self.shared).fullscreen
    }

    pub fn live_surfaces(&self) -> usize {
        lock(&self.shared).live_surfaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_can_be_refused() {
        let config = WindowConfig::overlay();
        assert!(HeadlessPlatform::new().create_window(&config).is_ok());
        assert!(matches!(
            HeadlessPlatform::without_transparency().create_window(&config),
            Err(OverlayError::SurfaceCreationFailed(_))
        ));
    }

    #[test]
    fn test_window_ids_are_unique() {
        let mut platform = HeadlessPlatform::new();
        let config = WindowConfig::default();
        let a = platform.create_window(&config).unwrap();
        let b = platform.create_window(&config).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_set_size_queues_resize() {
        let mut window = HeadlessPlatform::new()
            .create_window(&WindowConfig::default())
            .unwrap();
        window.set_size(Size::new(10, 20)).unwrap();
        let mut events = Vec::new();
        window.drain_events(&mut events);
        assert_eq!(events, vec![NativeEvent::Resized(Size::new(10, 20))]);
        window.drain_events(&mut events);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_present_records_frame() {
        let mut window = HeadlessPlatform::new()
            .create_window(&WindowConfig::default())
            .unwrap();
        let probe = window.probe();
        let size = Size::new(2, 1);
        let mut surface = window.create_surface(size).unwrap();
        assert_eq!(probe.live_surfaces(), 1);

        window.present(&mut surface, &[5; 8], size.pitch()).unwrap();
        assert_eq!(probe.presented_frames(), 1);
        assert_eq!(probe.last_frame(), Some(vec![5; 8]));
        assert!(window.present(&mut surface, &[5; 4], 8).is_err());

        window.destroy_surface(surface);
        assert_eq!(probe.live_surfaces(), 0);
    }

    #[test]
    fn test_surface_limit() {
        let mut window = HeadlessPlatform::new()
            .create_window(&WindowConfig::default())
            .unwrap();
        let probe = window.probe();
        probe.set_surface_limit(Some(Size::new(100, 100)));
        assert!(matches!(
            window.create_surface(Size::new(101, 10)),
            Err(OverlayError::SurfaceCreationFailed(_))
        ));
        assert_eq!(probe.live_surfaces(), 0);
        let surface = window.create_surface(Size::new(100, 100)).unwrap();
        window.destroy_surface(surface);
    }
}
