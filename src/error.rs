//! Error taxonomy shared by every layer of the engine.

use std::thread::ThreadId;

use thiserror::Error;

use crate::types::Size;

pub type Result<T> = std::result::Result<T, OverlayError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("invalid size {width}x{height}: both dimensions must be greater than zero")]
    InvalidSize { width: u32, height: u32 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("buffer size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("pixel ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("no native windowing backend available: {0}")]
    UnsupportedPlatform(String),
    #[error("failed to create window surface: {0}")]
    SurfaceCreationFailed(String),
    #[error("surface is bound at {bound} but the window is {window}; rebind before rendering")]
    SurfaceSizeMismatch { bound: Size, window: Size },
    #[error("window resources belong to thread {owner:?} but were used from {current:?}")]
    WrongThread { owner: ThreadId, current: ThreadId },
    #[error("window has been closed")]
    WindowClosed,
    #[error("native window call failed: {0}")]
    Platform(String),
    #[error("failed to present frame: {0}")]
    PresentFailed(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl OverlayError {
    /// Per-frame failures the caller can fix by rebinding or reallocating
    /// and trying again on the next tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OverlayError::SizeMismatch { .. } | OverlayError::SurfaceSizeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        let mismatch = OverlayError::SizeMismatch {
            expected: 16,
            actual: 12,
        };
        assert!(mismatch.is_recoverable());
        assert!(OverlayError::SurfaceSizeMismatch {
            bound: Size::new(1, 1),
            window: Size::new(2, 2),
        }
        .is_recoverable());
        assert!(!OverlayError::WindowClosed.is_recoverable());
        assert!(!OverlayError::InvalidSize { width: 0, height: 4 }.is_recoverable());
    }

    #[test]
    fn test_messages_name_the_sizes() {
        let err = OverlayError::SurfaceSizeMismatch {
            bound: Size::new(640, 480),
            window: Size::new(800, 600),
        };
        let text = err.to_string();
        assert!(text.contains("640x480"));
        assert!(text.contains("800x600"));
    }
}
