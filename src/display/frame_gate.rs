//! Cross-thread handoff of whole frames.
//!
//! Writers on any thread copy a complete frame into a staging buffer under
//! one lock hold. The render thread swaps the staging buffer with its
//! working buffer under the same lock, so a presented frame is always
//! exactly one writer's bytes.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::display::frame_buffer::FrameBuffer;
use crate::error::{OverlayError, Result};
use crate::types::Size;

#[derive(Debug)]
struct Staging {
    frame: FrameBuffer,
    pending: bool,
}

/// Double-buffer gate shared between the render thread and writers
#[derive(Debug)]
pub struct FrameGate {
    staging: Arc<Mutex<Staging>>,
}

/// Send + Clone writer for the staging frame
#[derive(Debug, Clone)]
pub struct FrameHandle {
    staging: Arc<Mutex<Staging>>,
}

// Byte storage is always left at full length, so a panicked writer cannot
// leave anything unsafe to read; recover the guard.
fn lock(staging: &Mutex<Staging>) -> MutexGuard<'_, Staging> {
    staging.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FrameGate {
    pub fn new(size: Size) -> Result<Self> {
        let frame = FrameBuffer::allocate(size.width, size.height)?;
        Ok(Self {
            staging: Arc::new(Mutex::new(Staging {
                frame,
                pending: false,
            })),
        })
    }

    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            staging: Arc::clone(&self.staging),
        }
    }

    /// Swap a pending staged frame into `working`. Returns false when no
    /// writer has submitted since the last swap.
    pub fn swap_into(&self, working: &mut FrameBuffer) -> bool {
        let mut staging = lock(&self.staging);
        if !staging.pending || staging.frame.size() != working.size() {
            return false;
        }
        mem::swap(&mut staging.frame, working);
        staging.pending = false;
        trace!("swapped staged frame {}", working.size());
        true
    }

    /// Reallocate the staging frame; any pending frame at the old size is dropped
    pub fn resize(&self, size: Size) -> Result<()> {
        let frame = FrameBuffer::allocate(size.width, size.height)?;
        let mut staging = lock(&self.staging);
        staging.frame = frame;
        staging.pending = false;
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.staging).pending
    }
}

impl FrameHandle {
    /// Stage a complete RGBA8 frame for the next `render()`.
    ///
    /// Fails with `SizeMismatch` when `bytes` does not match the current
    /// window size, e.g. a frame produced just before a resize.
    pub fn update_frame(&self, bytes: &[u8]) -> Result<()> {
        let mut staging = lock(&self.staging);
        let expected = staging.frame.len();
        if bytes.len() != expected {
            return Err(OverlayError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        staging.frame.as_bytes_mut().copy_from_slice(bytes);
        staging.pending = true;
        Ok(())
    }

    /// Size frames must currently have
    pub fn size(&self) -> Size {
        lock(&self.staging).frame.size()
    }
}
