//! Geometry, window configuration and event value types.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_TITLE: &str = "Overlay";
/// ~60 frames per second for the blocking `start()` loop
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// RGBA = 4 bytes per pixel
pub const BYTES_PER_PIXEL: usize = 4;

#[inline]
pub fn calculate_buffer_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// Window or pixel position; may be negative (off-screen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `self` if both dimensions are non-zero
    pub fn validate(self) -> Result<Self> {
        if self.is_empty() {
            Err(OverlayError::InvalidSize {
                width: self.width,
                height: self.height,
            })
        } else {
            Ok(self)
        }
    }

    /// Byte length of an RGBA8 frame of this size
    #[inline]
    pub fn buffer_len(&self) -> usize {
        calculate_buffer_size(self.width, self.height)
    }

    /// Bytes per row of an RGBA8 frame of this size
    #[inline]
    pub fn pitch(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Stacking level of the overlay window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum WindowLevel {
    #[default]
    Normal = 0,
    AlwaysOnTop = 1,
    AlwaysOnBottom = 2,
}

impl WindowLevel {
    /// Integral constant handed to the binding layer
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(WindowLevel::Normal),
            1 => Some(WindowLevel::AlwaysOnTop),
            2 => Some(WindowLevel::AlwaysOnBottom),
            _ => None,
        }
    }
}

/// Events reported by `poll_events()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    CloseRequested,
    Resized(Size),
    Moved(Position),
    Focused,
    Unfocused,
    RedrawRequested,
}

impl OverlayEvent {
    /// Integral constant handed to the binding layer
    pub const fn code(&self) -> u32 {
        match self {
            OverlayEvent::CloseRequested => 0,
            OverlayEvent::Resized(_) => 1,
            OverlayEvent::Moved(_) => 2,
            OverlayEvent::Focused => 3,
            OverlayEvent::Unfocused => 4,
            OverlayEvent::RedrawRequested => 5,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            OverlayEvent::CloseRequested => "CloseRequested",
            OverlayEvent::Resized(_) => "Resized",
            OverlayEvent::Moved(_) => "Moved",
            OverlayEvent::Focused => "Focused",
            OverlayEvent::Unfocused => "Unfocused",
            OverlayEvent::RedrawRequested => "RedrawRequested",
        }
    }
}

/// Window creation parameters. Consumed by `OverlayApp::create_window`;
/// later changes go through the window's setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub size: Size,
    /// `None` centers the window
    pub position: Option<Position>,
    pub transparent: bool,
    pub decorations: bool,
    pub resizable: bool,
    pub always_on_top: bool,
    pub render_when_occluded: bool,
    /// Show the window as soon as it is created
    pub visible: bool,
    /// Lock presentation to the display refresh
    pub vsync: bool,
    /// Tick cadence of the blocking `start()` loop
    pub frame_interval_ms: u64,
    /// RGBA8 bytes copied into the frame at creation
    #[serde(skip)]
    pub initial_frame: Option<Vec<u8>>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            size: Size::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            position: None,
            transparent: false,
            decorations: true,
            resizable: false,
            always_on_top: false,
            render_when_occluded: true,
            visible: true,
            vsync: true,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            initial_frame: None,
        }
    }
}

impl WindowConfig {
    /// Borderless, transparent, always-on-top: the usual overlay setup
    pub fn overlay() -> Self {
        Self {
            transparent: true,
            decorations: false,
            always_on_top: true,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_decorations(mut self, decorations: bool) -> Self {
        self.decorations = decorations;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_always_on_top(mut self, always_on_top: bool) -> Self {
        self.always_on_top = always_on_top;
        self
    }

    pub fn with_render_when_occluded(mut self, render: bool) -> Self {
        self.render_when_occluded = render;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_frame_interval_ms(mut self, interval: u64) -> Self {
        self.frame_interval_ms = interval;
        self
    }

    pub fn with_initial_frame(mut self, frame: Vec<u8>) -> Self {
        self.initial_frame = Some(frame);
        self
    }

    /// Level implied by `always_on_top`
    pub fn level(&self) -> WindowLevel {
        if self.always_on_top {
            WindowLevel::AlwaysOnTop
        } else {
            WindowLevel::Normal
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OverlayError::Config(e.to_string()))
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| OverlayError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| OverlayError::Config(e.to_string()))?;
        fs::write(path, json).map_err(|e| OverlayError::Config(e.to_string()))
    }
}

// Binding-surface helpers

pub fn create_position(x: i32, y: i32) -> Position {
    Position::new(x, y)
}

pub fn create_size(width: u32, height: u32) -> Size {
    Size::new(width, height)
}

pub fn create_window_config() -> WindowConfig {
    WindowConfig::default()
}
