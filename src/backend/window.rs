//! Desktop window backends on winit + softbuffer.
//!
//! The event loop is pumped from [`InputSource::poll`], so the viewer keeps
//! its blocking one-event-per-step loop even though winit is callback based.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use super::compositor::{Chrome, SizeNegotiation, negotiate};
use super::{APP_NAME, Display, Insets, PageStatus, ViewportGeometry};
use crate::config::WindowConfig;
use crate::error::{Result, ViewerError};
use crate::input::{Command, InputSource, ViewerEvent, command_for_char};
use crate::surface::{ChannelOrder, PixelSurface};

type SoftSurface = softbuffer::Surface<Rc<Window>, Rc<Window>>;

const STARTUP_PUMP: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStyle {
    /// Decorated by the window manager.
    Simple,
    /// Undecorated; chrome is drawn into the surface.
    Compositor(Chrome),
}

impl WindowStyle {
    fn insets(&self) -> Insets {
        match self {
            WindowStyle::Simple => Insets::default(),
            WindowStyle::Compositor(chrome) => chrome.insets(),
        }
    }
}

/// Map a window key to a command.
pub(super) fn map_key(key: &Key, modifiers: ModifiersState) -> Option<Command> {
    match key {
        Key::Character(s) if modifiers.control_key() => (s.as_str() == "c").then_some(Command::Quit),
        Key::Character(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => command_for_char(c),
                _ => None,
            }
        }
        Key::Named(NamedKey::Space) => Some(Command::Next),
        Key::Named(NamedKey::ArrowLeft | NamedKey::ArrowUp | NamedKey::PageUp) => {
            Some(Command::Prev)
        }
        Key::Named(NamedKey::ArrowRight | NamedKey::ArrowDown | NamedKey::PageDown) => {
            Some(Command::Next)
        }
        _ => None,
    }
}

/// Scrolling up goes back a page.
pub(super) fn map_scroll(delta: MouseScrollDelta) -> Option<Command> {
    let dy = match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64,
        MouseScrollDelta::PixelDelta(pos) => pos.y,
    };
    if dy > 0.0 {
        Some(Command::Prev)
    } else if dy < 0.0 {
        Some(Command::Next)
    } else {
        None
    }
}

pub(super) fn window_title(status: &PageStatus<'_>) -> String {
    format!(
        "{} - {}/{} - {APP_NAME}",
        status.name, status.page, status.page_count
    )
}

/// What to do with a size the window system reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ResizeAction {
    /// Nothing to redraw: unchanged, or minimized to zero area.
    Ignore,
    /// Too small for the compositor window; request this size instead.
    Offer(u32, u32),
    Apply(u32, u32),
}

pub(super) fn resize_action(
    style: WindowStyle,
    min: (u32, u32),
    current: (u32, u32),
    requested: (u32, u32),
) -> ResizeAction {
    let (width, height) = requested;
    if width == 0 || height == 0 || requested == current {
        return ResizeAction::Ignore;
    }
    if let WindowStyle::Compositor(_) = style
        && let SizeNegotiation::Offer { width, height } = negotiate(requested, min)
    {
        return ResizeAction::Offer(width, height);
    }
    ResizeAction::Apply(width, height)
}

// ---------------------------------------------------------------------------
// Shell: the winit application handler
// ---------------------------------------------------------------------------

enum ShellEvent {
    Command(Command),
    Resized(u32, u32),
    Redraw,
    Close,
}

struct Shell {
    style: WindowStyle,
    initial_size: PhysicalSize<u32>,
    min_size: PhysicalSize<u32>,
    window: Option<Rc<Window>>,
    soft: Option<SoftSurface>,
    pending: VecDeque<ShellEvent>,
    modifiers: ModifiersState,
    cursor_y: f64,
    error: Option<String>,
}

impl Shell {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> std::result::Result<(), String> {
        let mut attrs = Window::default_attributes()
            .with_title(APP_NAME)
            .with_inner_size(self.initial_size)
            .with_decorations(matches!(self.style, WindowStyle::Simple));
        if let WindowStyle::Simple = self.style {
            attrs = attrs.with_min_inner_size(self.min_size);
        }
        let window = Rc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| format!("cannot create window: {e}"))?,
        );
        let context = softbuffer::Context::new(Rc::clone(&window))
            .map_err(|e| format!("cannot connect to display: {e}"))?;
        let soft = softbuffer::Surface::new(&context, Rc::clone(&window))
            .map_err(|e| format!("cannot create window surface: {e}"))?;
        info!("window: created {:?} ({:?})", window.inner_size(), self.style);
        self.window = Some(window);
        self.soft = Some(soft);
        Ok(())
    }
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.pending.push_back(ShellEvent::Close);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.pending
                    .push_back(ShellEvent::Resized(size.width, size.height));
            }
            WindowEvent::RedrawRequested => self.pending.push_back(ShellEvent::Redraw),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(cmd) = map_key(&logical_key, self.modifiers) {
                    self.pending.push_back(ShellEvent::Command(cmd));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(cmd) = map_scroll(delta) {
                    self.pending.push_back(ShellEvent::Command(cmd));
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor_y = position.y,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let (WindowStyle::Compositor(chrome), Some(window)) = (self.style, &self.window)
                    && chrome.in_title_bar(self.cursor_y)
                    && let Err(e) = window.drag_window()
                {
                    warn!("window: cannot start move: {e}");
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// WindowBackend
// ---------------------------------------------------------------------------

pub struct WindowBackend {
    shell: Shell,
    surface: PixelSurface,
    geometry: ViewportGeometry,
    // Dropped after the window and surface it drives.
    event_loop: EventLoop<()>,
}

impl WindowBackend {
    /// Open a window whose page area is `config.width`x`config.height`.
    pub fn new(style: WindowStyle, config: &WindowConfig) -> anyhow::Result<Self> {
        let insets = style.insets();
        let mut event_loop = EventLoop::new()?;
        let mut shell = Shell {
            style,
            initial_size: PhysicalSize::new(
                config.width + insets.horizontal(),
                config.height + insets.vertical(),
            ),
            min_size: PhysicalSize::new(config.min_width, config.min_height),
            window: None,
            soft: None,
            pending: VecDeque::new(),
            modifiers: ModifiersState::empty(),
            cursor_y: -1.0,
            error: None,
        };

        let size = loop {
            let status = event_loop.pump_app_events(Some(STARTUP_PUMP), &mut shell);
            if let Some(e) = shell.error.take() {
                anyhow::bail!(e);
            }
            if let Some(window) = &shell.window {
                break window.inner_size();
            }
            if let PumpStatus::Exit(code) = status {
                anyhow::bail!("event loop exited before the window opened (code {code})");
            }
        };

        let geometry = ViewportGeometry::within(size.width, size.height, insets);
        Ok(Self {
            shell,
            surface: PixelSurface::new(size.width, size.height, ChannelOrder::Bgra),
            geometry,
            event_loop,
        })
    }

    fn window(&self) -> Result<&Rc<Window>> {
        self.shell
            .window
            .as_ref()
            .ok_or_else(|| ViewerError::backend("window is gone"))
    }

    fn translate(&mut self, event: ShellEvent) -> Result<ViewerEvent> {
        match event {
            ShellEvent::Command(cmd) => Ok(ViewerEvent::Command(cmd)),
            ShellEvent::Close => Ok(ViewerEvent::Close),
            ShellEvent::Redraw => {
                self.present()?;
                Ok(ViewerEvent::Ignored)
            }
            ShellEvent::Resized(width, height) => self.resized(width, height),
        }
    }

    fn resized(&mut self, width: u32, height: u32) -> Result<ViewerEvent> {
        let min = (self.shell.min_size.width, self.shell.min_size.height);
        let current = (self.surface.width(), self.surface.height());
        match resize_action(self.shell.style, min, current, (width, height)) {
            ResizeAction::Ignore => Ok(ViewerEvent::Ignored),
            ResizeAction::Offer(w, h) => {
                debug!("window: rejecting {width}x{height}, offering {w}x{h}");
                match self.window()?.request_inner_size(PhysicalSize::new(w, h)) {
                    // Applied at once; no Resized event will follow.
                    Some(size) if negotiate((size.width, size.height), min) == SizeNegotiation::Accept => {
                        self.resized(size.width, size.height)
                    }
                    _ => Ok(ViewerEvent::Ignored),
                }
            }
            ResizeAction::Apply(w, h) => {
                debug!("window: resize {}x{} -> {w}x{h}", current.0, current.1);
                self.surface.resize(w, h);
                self.geometry = ViewportGeometry::within(w, h, self.shell.style.insets());
                Ok(ViewerEvent::Resize(self.geometry))
            }
        }
    }
}

impl Display for WindowBackend {
    fn viewport(&self) -> ViewportGeometry {
        self.geometry
    }

    fn surface_mut(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }

    fn show_status(&mut self, status: &PageStatus<'_>) -> Result<()> {
        self.window()?.set_title(&window_title(status));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        if let WindowStyle::Compositor(chrome) = self.shell.style {
            chrome.paint(&mut self.surface);
        }
        let (Some(width), Some(height)) = (
            NonZeroU32::new(self.surface.width()),
            NonZeroU32::new(self.surface.height()),
        ) else {
            return Ok(());
        };
        let soft = self
            .shell
            .soft
            .as_mut()
            .ok_or_else(|| ViewerError::backend("window surface is gone"))?;
        soft.resize(width, height)
            .map_err(|e| ViewerError::backend(format!("cannot resize window surface: {e}")))?;
        let mut buffer = soft
            .buffer_mut()
            .map_err(|e| ViewerError::backend(format!("cannot map window surface: {e}")))?;
        // softbuffer pixels are 0x00RRGGBB; the surface is stored as BGRA bytes.
        for (dst, px) in buffer.iter_mut().zip(self.surface.data().chunks_exact(4)) {
            *dst = u32::from_le_bytes([px[0], px[1], px[2], 0]);
        }
        buffer
            .present()
            .map_err(|e| ViewerError::backend(format!("cannot present window surface: {e}")))
    }
}

impl InputSource for WindowBackend {
    fn poll(&mut self) -> Result<ViewerEvent> {
        loop {
            if let Some(event) = self.shell.pending.pop_front() {
                return self.translate(event);
            }
            let status = self.event_loop.pump_app_events(None, &mut self.shell);
            if let Some(e) = self.shell.error.take() {
                return Err(ViewerError::backend(e));
            }
            if let PumpStatus::Exit(code) = status
                && self.shell.pending.is_empty()
            {
                debug!("window: event loop exited ({code})");
                return Ok(ViewerEvent::Close);
            }
        }
    }
}
