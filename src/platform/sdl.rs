//! SDL2 backend.
//!
//! SDL delivers every event through one process-wide pump. The pump lives
//! in an [`EventRouter`] shared by the platform and its windows; whoever
//! polls first sorts the events into per-window queues.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use log::{debug, info, trace, warn};
use sdl2::event::{Event, WindowEvent};
use sdl2::pixels::{Color as SdlColor, PixelFormatEnum};
use sdl2::render::{Texture, TextureCreator, WindowCanvas};
use sdl2::sys::{SDL_SetWindowAlwaysOnTop, SDL_WindowFlags, SDL_bool};
use sdl2::video::{FullscreenType, WindowContext, WindowPos};
use sdl2::{EventPump, Sdl, VideoSubsystem};

use crate::error::{OverlayError, Result};
use crate::platform::{NativeEvent, NativeWindow, Platform};
use crate::types::{Position, Size, WindowConfig, WindowLevel};

/// First thread to bring SDL up; it owns every SDL resource afterwards
static UI_THREAD: OnceLock<ThreadId> = OnceLock::new();

fn claim_ui_thread() -> Result<()> {
    let current = thread::current().id();
    let owner = *UI_THREAD.get_or_init(|| current);
    if owner == current {
        Ok(())
    } else {
        Err(OverlayError::WrongThread { owner, current })
    }
}

/// Translate one SDL window event. `Resized` is ignored because SDL always
/// follows it with `SizeChanged`, which also covers programmatic changes.
pub(crate) fn translate_window_event(event: WindowEvent) -> Option<NativeEvent> {
    match event {
        WindowEvent::Close => Some(NativeEvent::CloseRequested),
        WindowEvent::SizeChanged(w, h) if w > 0 && h > 0 => {
            Some(NativeEvent::Resized(Size::new(w as u32, h as u32)))
        },
        WindowEvent::Moved(x, y) => Some(NativeEvent::Moved(Position::new(x, y))),
        WindowEvent::FocusGained => Some(NativeEvent::FocusGained),
        WindowEvent::FocusLost => Some(NativeEvent::FocusLost),
        WindowEvent::Exposed => Some(NativeEvent::Exposed),
        WindowEvent::Minimized => Some(NativeEvent::Minimized),
        WindowEvent::Maximized => Some(NativeEvent::Maximized),
        WindowEvent::Restored => Some(NativeEvent::Restored),
        WindowEvent::Shown => Some(NativeEvent::Shown),
        WindowEvent::Hidden => Some(NativeEvent::Hidden),
        _ => None,
    }
}

/// Reject window attributes SDL2 cannot provide.
///
/// SDL2 only offers whole-window opacity, so a window whose alpha-0 pixels
/// show the desktop through cannot be created here.
pub(crate) fn check_window_attributes(config: &WindowConfig) -> Result<()> {
    if config.transparent {
        return Err(OverlayError::SurfaceCreationFailed(
            "sdl2 has no per-pixel transparent windows".to_string(),
        ));
    }
    Ok(())
}

/// Demultiplexes the SDL event pump into per-window queues
struct EventRouter {
    pump: EventPump,
    queues: HashMap<u32, VecDeque<NativeEvent>>,
    quit_requested: bool,
}

impl EventRouter {
    fn pump(&mut self) {
        for event in self.pump.poll_iter() {
            match event {
                Event::Quit { .. } => {
                    // Last window closed or SIGINT: every window is asked to close
                    self.quit_requested = true;
                    for queue in self.queues.values_mut() {
                        queue.push_back(NativeEvent::CloseRequested);
                    }
                },
                Event::Window {
                    window_id,
                    win_event,
                    ..
                } => {
                    let Some(native) = translate_window_event(win_event) else {
                        continue;
                    };
                    match self.queues.get_mut(&window_id) {
                        Some(queue) => queue.push_back(native),
                        None => trace!("sdl: dropping {:?} for unknown window {}", native, window_id),
                    }
                },
                _ => {},
            }
        }
    }
}

pub struct SdlPlatform {
    _sdl: Sdl,
    video: VideoSubsystem,
    router: Rc<RefCell<EventRouter>>,
}

impl SdlPlatform {
    /// Initialize SDL video on the calling thread.
    ///
    /// The first successful call claims the UI thread for the process; a
    /// call from any other thread fails with `WrongThread`.
    pub fn new() -> Result<Self> {
        claim_ui_thread()?;
        let sdl = sdl2::init().map_err(OverlayError::UnsupportedPlatform)?;
        let video = sdl.video().map_err(OverlayError::UnsupportedPlatform)?;
        let pump = sdl.event_pump().map_err(OverlayError::UnsupportedPlatform)?;
        info!("sdl: video driver '{}'", video.current_video_driver());

        Ok(Self {
            _sdl: sdl,
            video,
            router: Rc::new(RefCell::new(EventRouter {
                pump,
                queues: HashMap::new(),
                quit_requested: false,
            })),
        })
    }
}

impl Platform for SdlPlatform {
    type Window = SdlWindow;

    fn name(&self) -> &'static str {
        "sdl2"
    }

    fn create_window(&mut self, config: &WindowConfig) -> Result<SdlWindow> {
        let size = config.size.validate()?;
        check_window_attributes(config)?;

        let mut builder = self.video.window(&config.title, size.width, size.height);
        builder.hidden();
        match config.position {
            Some(pos) => builder.position(pos.x, pos.y),
            None => builder.position_centered(),
        };
        if !config.decorations {
            builder.borderless();
        }
        if config.resizable {
            builder.resizable();
        }
        if config.always_on_top {
            builder.set_window_flags(SDL_WindowFlags::SDL_WINDOW_ALWAYS_ON_TOP as u32);
        }

        let window = builder
            .build()
            .map_err(|e| OverlayError::SurfaceCreationFailed(e.to_string()))?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if config.vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder
            .build()
            .map_err(|e| OverlayError::SurfaceCreationFailed(e.to_string()))?;

        let id = canvas.window().id();
        self.router.borrow_mut().queues.insert(id, VecDeque::new());
        info!("sdl: window {} '{}' {}", id, config.title, size);

        Ok(SdlWindow {
            textures: canvas.texture_creator(),
            canvas,
            router: Rc::clone(&self.router),
            id,
        })
    }

    fn poll_quit(&mut self) -> bool {
        let mut router = self.router.borrow_mut();
        router.pump();
        router.quit_requested
    }
}

pub struct SdlWindow {
    canvas: WindowCanvas,
    textures: TextureCreator<WindowContext>,
    router: Rc<RefCell<EventRouter>>,
    id: u32,
}

/// Streaming RGBA32 texture the frame is uploaded into
pub struct SdlSurface {
    texture: Texture,
    size: Size,
}

impl NativeWindow for SdlWindow {
    type Surface = SdlSurface;

    fn id(&self) -> u32 {
        self.id
    }

    fn show(&mut self) {
        self.canvas.window_mut().show();
    }

    fn hide(&mut self) {
        self.canvas.window_mut().hide();
    }

    fn is_visible(&self) -> bool {
        self.canvas.window().window_flags() & SDL_WindowFlags::SDL_WINDOW_SHOWN as u32 != 0
    }

    fn set_position(&mut self, position: Position) {
        self.canvas
            .window_mut()
            .set_position(WindowPos::Positioned(position.x), WindowPos::Positioned(position.y));
    }

    fn position(&self) -> Position {
        let (x, y) = self.canvas.window().position();
        Position::new(x, y)
    }

    fn set_size(&mut self, size: Size) -> Result<()> {
        self.canvas
            .window_mut()
            .set_size(size.width, size.height)
            .map_err(|e| OverlayError::Platform(e.to_string()))
    }

    fn size(&self) -> Size {
        let (w, h) = self.canvas.window().size();
        Size::new(w, h)
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.canvas
            .window_mut()
            .set_title(title)
            .map_err(|e| OverlayError::Platform(e.to_string()))
    }

    fn set_level(&mut self, level: WindowLevel) -> Result<()> {
        let on_top = match level {
            WindowLevel::Normal => SDL_bool::SDL_FALSE,
            WindowLevel::AlwaysOnTop => SDL_bool::SDL_TRUE,
            WindowLevel::AlwaysOnBottom => {
                return Err(OverlayError::Platform(
                    "SDL cannot keep a window below all others".to_string(),
                ));
            },
        };
        // SAFETY: the raw handle is valid for as long as the canvas is alive
        unsafe { SDL_SetWindowAlwaysOnTop(self.canvas.window().raw(), on_top) };
        Ok(())
    }

    fn minimize(&mut self) {
        self.canvas.window_mut().minimize();
    }

    fn maximize(&mut self) {
        self.canvas.window_mut().maximize();
    }

    fn restore(&mut self) {
        self.canvas.window_mut().restore();
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        let mode = if fullscreen {
            FullscreenType::Desktop
        } else {
            FullscreenType::Off
        };
        self.canvas
            .window_mut()
            .set_fullscreen(mode)
            .map_err(OverlayError::Platform)
    }

    fn drain_events(&mut self, out: &mut Vec<NativeEvent>) {
        let mut router = self.router.borrow_mut();
        router.pump();
        if let Some(queue) = router.queues.get_mut(&self.id) {
            out.extend(queue.drain(..));
        }
    }

    fn create_surface(&mut self, size: Size) -> Result<SdlSurface> {
        let size = size.validate()?;
        let texture = self
            .textures
            .create_texture_streaming(PixelFormatEnum::RGBA32, size.width, size.height)
            .map_err(|e| OverlayError::SurfaceCreationFailed(e.to_string()))?;
        debug!("sdl: window {} surface {}", self.id, size);
        Ok(SdlSurface { texture, size })
    }

    fn destroy_surface(&mut self, surface: SdlSurface) {
        // SAFETY: the texture was created by this window's renderer, which
        // is still alive
        unsafe { surface.texture.destroy() };
    }

    fn present(&mut self, surface: &mut SdlSurface, frame: &[u8], pitch: usize) -> Result<()> {
        surface
            .texture
            .update(None, frame, pitch)
            .map_err(|e| OverlayError::PresentFailed(e.to_string()))?;

        self.canvas.set_draw_color(SdlColor::RGB(0, 0, 0));
        self.canvas.clear();
        self.canvas
            .copy(&surface.texture, None, None)
            .map_err(OverlayError::PresentFailed)?;
        self.canvas.present();
        trace!("sdl: window {} presented {}", self.id, surface.size);
        Ok(())
    }
}

impl Drop for SdlWindow {
    fn drop(&mut self) {
        match self.router.try_borrow_mut() {
            Ok(mut router) => {
                router.queues.remove(&self.id);
            },
            Err(_) => warn!("sdl: event router busy while dropping window {}", self.id),
        }
        debug!("sdl: window {} destroyed", self.id);
    }
}
