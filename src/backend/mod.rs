#[cfg(feature = "x11")]
pub(crate) mod x11;

use std::time::Duration;

use bitflags::bitflags;

use crate::{error::Error, render::Canvas};

/// Default scale factor for rendering
pub(crate) const DEFAULT_SCALE: f32 = 1.0;

/// Trait for connecting to a display server.
pub(crate) trait DisplayConnection: Sized {
    type Window: Window;

    fn connect() -> Result<Self, Error>;
    fn create_window(&self, options: &WindowOptions) -> Result<Self::Window, Error>;
}

/// Initial geometry and window manager hints.
#[derive(Debug, Clone, Default)]
pub(crate) struct WindowOptions {
    pub width: u16,
    pub height: u16,
    pub min_width: u16,
    pub min_height: u16,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
}

/// Cursor shape types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CursorShape {
    /// Default arrow cursor.
    #[default]
    Default,
    /// Text input (I-beam) cursor.
    Text,
}

/// Trait for interacting with a window.
pub(crate) trait Window {
    fn set_title(&mut self, title: &str) -> Result<(), Error>;
    fn set_contents(&mut self, canvas: &Canvas) -> Result<(), Error>;
    fn show(&mut self) -> Result<(), Error>;
    fn poll_for_event(&mut self) -> Result<Option<WindowEvent>, Error>;
    /// Waits for an event for at most `timeout`.
    fn wait_for_event_timeout(&mut self, timeout: Duration) -> Result<Option<WindowEvent>, Error>;
    fn start_drag(&mut self) -> Result<(), Error>;
    fn scale_factor(&self) -> f32;
    fn set_cursor(&mut self, shape: CursorShape) -> Result<(), Error>;
}

/// Events that can be emitted by a window.
#[derive(Debug, Clone)]
pub(crate) enum WindowEvent {
    CloseRequested,
    RedrawRequested,
    Resized(u32, u32),
    CursorEnter(CursorPos),
    CursorMove(CursorPos),
    CursorLeave,
    ButtonPress(MouseButton, Modifiers),
    ButtonRelease(MouseButton, Modifiers),
    Scroll(ScrollDirection),
    KeyPress(KeyEvent),
    TextInput(char),
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CursorPos {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub(crate) struct KeyEvent {
    pub keysym: u32,
    pub modifiers: Modifiers,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub(crate) struct Modifiers: u8 {
        const SHIFT = 0x01;
        const CTRL  = 0x02;
        const ALT   = 0x04;
        const SUPER = 0x08;
    }
}

/// XKB keysyms the dialog reacts to.
pub(crate) mod keys {
    pub const BACKSPACE: u32 = 0xff08;
    pub const TAB: u32 = 0xff09;
    pub const RETURN: u32 = 0xff0d;
    pub const ESCAPE: u32 = 0xff1b;
    pub const HOME: u32 = 0xff50;
    pub const LEFT: u32 = 0xff51;
    pub const UP: u32 = 0xff52;
    pub const RIGHT: u32 = 0xff53;
    pub const DOWN: u32 = 0xff54;
    pub const PAGE_UP: u32 = 0xff55;
    pub const PAGE_DOWN: u32 = 0xff56;
    pub const END: u32 = 0xff57;
    pub const KP_ENTER: u32 = 0xff8d;
    pub const ISO_LEFT_TAB: u32 = 0xfe20;
    pub const DELETE: u32 = 0xffff;
}

#[cfg(feature = "x11")]
pub(crate) type PlatformWindow = x11::X11Window;

/// Opens a window on the X server named by `$DISPLAY`.
#[cfg(feature = "x11")]
pub(crate) fn create_window(options: &WindowOptions) -> Result<PlatformWindow, Error> {
    if std::env::var_os("DISPLAY").is_none() {
        return Err(Error::NoDisplay);
    }
    let conn = x11::Connection::connect()?;
    conn.create_window(options)
}

#[cfg(not(feature = "x11"))]
compile_error!("the 'x11' feature must be enabled");
