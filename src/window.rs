//! Window lifecycle state machine and event translation.
//!
//! ```text
//! Created --show--> Shown <--> { Minimized, Maximized, Fullscreen }
//!                      \______________ close ______________> Closed
//! ```
//!
//! Visibility is tracked separately from the state: hiding a maximized
//! window leaves it `Maximized`.

use std::fmt;
use std::mem;

use log::{debug, info, trace};

use crate::error::{OverlayError, Result};
use crate::platform::{NativeEvent, NativeWindow, Platform};
use crate::types::{OverlayEvent, Position, Size, WindowConfig, WindowLevel};
use crate::util::ThreadAffinity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Created,
    Shown,
    Minimized,
    Maximized,
    Fullscreen,
    /// Terminal; every later operation fails with `WindowClosed`
    Closed,
}

/// Result of one non-blocking poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub close_requested: bool,
    /// Empty when an event handler is registered
    pub events: Vec<OverlayEvent>,
}

impl PollOutcome {
    pub fn resized(&self) -> Option<Size> {
        self.events.iter().rev().find_map(|event| match event {
            OverlayEvent::Resized(size) => Some(*size),
            _ => None,
        })
    }
}

pub type EventHandler = Box<dyn FnMut(&OverlayEvent) + Send>;

pub struct WindowManager<W: NativeWindow> {
    native: W,
    state: WindowState,
    visible: bool,
    /// Last size confirmed by a drained `Resized`
    size: Size,
    position: Position,
    redraw_requested: bool,
    handler: Option<EventHandler>,
    scratch: Vec<NativeEvent>,
    affinity: ThreadAffinity,
}

impl<W: NativeWindow> fmt::Debug for WindowManager<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManager")
            .field("id", &self.native.id())
            .field("state", &self.state)
            .field("visible", &self.visible)
            .field("size", &self.size)
            .field("position", &self.position)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl<W: NativeWindow> WindowManager<W> {
    /// Create a hidden native window in the `Created` state, owned by the
    /// calling thread
    pub fn create<P>(platform: &mut P, config: &WindowConfig) -> Result<Self>
    where
        P: Platform<Window = W>,
    {
        let requested = config.size.validate()?;
        let native = platform.create_window(config)?;
        let position = native.position();
        // The OS may clamp the requested size
        let size = match native.size() {
            reported if reported.is_empty() || reported == requested => requested,
            reported => {
                debug!("window {}: asked for {}, got {}", native.id(), requested, reported);
                reported
            },
        };
        let visible = native.is_visible();
        info!(
            "window {}: created '{}' {} at {} on {}",
            native.id(),
            config.title,
            size,
            position,
            platform.name()
        );

        Ok(Self {
            native,
            state: WindowState::Created,
            visible,
            size,
            position,
            redraw_requested: false,
            handler: None,
            scratch: Vec::new(),
            affinity: ThreadAffinity::current(),
        })
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        self.affinity.check()?;
        if self.state == WindowState::Closed {
            return Err(OverlayError::WindowClosed);
        }
        Ok(())
    }

    fn transition(&mut self, next: WindowState) {
        if self.state != next {
            debug!("window {}: {:?} -> {:?}", self.native.id(), self.state, next);
            self.state = next;
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hidden or minimized
    pub fn is_occluded(&self) -> bool {
        !self.visible || self.state == WindowState::Minimized
    }

    pub fn id(&self) -> u32 {
        self.native.id()
    }

    pub fn show(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.native.show();
        self.visible = true;
        if self.state == WindowState::Created {
            self.transition(WindowState::Shown);
        }
        Ok(())
    }

    pub fn hide(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.native.hide();
        self.visible = false;
        Ok(())
    }

    pub fn set_position(&mut self, position: Position) -> Result<()> {
        self.ensure_open()?;
        self.native.set_position(position);
        self.position = position;
        Ok(())
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Ask the OS for a new size. `size()` keeps reporting the old size
    /// until the matching `Resized` event has been polled.
    pub fn set_size(&mut self, size: Size) -> Result<()> {
        self.ensure_open()?;
        let size = size.validate()?;
        debug!("window {}: requesting size {}", self.native.id(), size);
        self.native.set_size(size)
    }

    /// Last confirmed size
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.ensure_open()?;
        self.native.set_title(title)
    }

    pub fn set_window_level(&mut self, level: WindowLevel) -> Result<()> {
        self.ensure_open()?;
        self.native.set_level(level)?;
        debug!("window {}: level {:?}", self.native.id(), level);
        Ok(())
    }

    pub fn minimize(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.native.minimize();
        self.transition(WindowState::Minimized);
        Ok(())
    }

    pub fn maximize(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.state == WindowState::Fullscreen {
            self.native.set_fullscreen(false)?;
        }
        self.native.maximize();
        self.transition(WindowState::Maximized);
        Ok(())
    }

    /// Return a minimized, maximized or fullscreen window to `Shown`
    pub fn restore(&mut self) -> Result<()> {
        self.ensure_open()?;
        match self.state {
            WindowState::Fullscreen => {
                self.native.set_fullscreen(false)?;
                self.native.restore();
                self.transition(WindowState::Shown);
            },
            WindowState::Minimized | WindowState::Maximized => {
                self.native.restore();
                self.transition(WindowState::Shown);
            },
            _ => {},
        }
        Ok(())
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.ensure_open()?;
        self.native.set_fullscreen(fullscreen)?;
        if fullscreen {
            self.transition(WindowState::Fullscreen);
        } else if self.state == WindowState::Fullscreen {
            self.transition(WindowState::Shown);
        }
        Ok(())
    }

    /// Schedule one `RedrawRequested` for the next poll
    pub fn request_redraw(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.redraw_requested = true;
        Ok(())
    }

    /// Register the event handler, replacing any previous one. Events are
    /// then delivered to it during `poll_events()` instead of returned.
    pub fn on_event<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(&OverlayEvent) + Send + 'static,
    {
        self.ensure_open()?;
        if self.handler.replace(Box::new(handler)).is_some() {
            debug!("window {}: event handler replaced", self.native.id());
        }
        Ok(())
    }

    pub fn clear_event_handler(&mut self) -> Result<()> {
        self.affinity.check()?;
        self.handler = None;
        Ok(())
    }

    /// Act on a close request: hide the window and enter `Closed`.
    /// Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        self.affinity.check()?;
        if self.state == WindowState::Closed {
            return Ok(());
        }
        self.native.hide();
        self.visible = false;
        self.transition(WindowState::Closed);
        info!("window {}: closed", self.native.id());
        Ok(())
    }

    /// Drain and translate native events without blocking
    pub fn poll_events(&mut self) -> Result<PollOutcome> {
        let outcome = self.drain()?;
        Ok(self.dispatch(outcome))
    }

    /// First half of a poll: drain and translate, updating the confirmed
    /// size, position and state. Nothing is handed to the handler yet.
    pub(crate) fn drain(&mut self) -> Result<PollOutcome> {
        self.affinity.check()?;
        if self.state == WindowState::Closed {
            return Ok(PollOutcome {
                close_requested: true,
                events: Vec::new(),
            });
        }

        let mut natives = mem::take(&mut self.scratch);
        self.native.drain_events(&mut natives);

        let mut outcome = PollOutcome::default();
        let mut redraw_emitted = false;
        for native in natives.drain(..) {
            trace!("window {}: native {:?}", self.native.id(), native);
            let event = match native {
                NativeEvent::CloseRequested => {
                    outcome.close_requested = true;
                    Some(OverlayEvent::CloseRequested)
                },
                NativeEvent::Resized(size) if !size.is_empty() && size != self.size => {
                    debug!("window {}: size confirmed {} -> {}", self.native.id(), self.size, size);
                    self.size = size;
                    Some(OverlayEvent::Resized(size))
                },
                NativeEvent::Resized(_) => None,
                NativeEvent::Moved(position) if position != self.position => {
                    self.position = position;
                    Some(OverlayEvent::Moved(position))
                },
                NativeEvent::Moved(_) => None,
                NativeEvent::FocusGained => Some(OverlayEvent::Focused),
                NativeEvent::FocusLost => Some(OverlayEvent::Unfocused),
                NativeEvent::Exposed if !redraw_emitted => {
                    redraw_emitted = true;
                    Some(OverlayEvent::RedrawRequested)
                },
                NativeEvent::Exposed => None,
                NativeEvent::Minimized => {
                    self.transition(WindowState::Minimized);
                    None
                },
                NativeEvent::Maximized => {
                    self.transition(WindowState::Maximized);
                    None
                },
                NativeEvent::Restored => {
                    if matches!(self.state, WindowState::Minimized | WindowState::Maximized) {
                        self.transition(WindowState::Shown);
                    }
                    None
                },
                NativeEvent::Shown => {
                    self.visible = true;
                    None
                },
                NativeEvent::Hidden => {
                    self.visible = false;
                    None
                },
            };
            outcome.events.extend(event);
        }
        self.scratch = natives;

        if mem::take(&mut self.redraw_requested) && !redraw_emitted {
            outcome.events.push(OverlayEvent::RedrawRequested);
        }
        Ok(outcome)
    }

    /// Second half of a poll: hand events to the handler, if any
    pub(crate) fn dispatch(&mut self, mut outcome: PollOutcome) -> PollOutcome {
        if let Some(handler) = self.handler.as_mut() {
            for event in outcome.events.drain(..) {
                handler(&event);
            }
        }
        outcome
    }

    pub fn native(&self) -> &W {
        &self.native
    }

    pub(crate) fn native_mut(&mut self) -> &mut W {
        &mut self.native
    }
}
