//! X11 backend implementation.

use std::{
    io,
    ops::Deref,
    os::fd::AsRawFd,
    rc::Rc,
    time::{Duration, Instant},
};

use kbvm::{lookup::LookupTable, xkb::x11::KbvmX11Ext};
use x11rb::{
    connection::{Connection as X11rbConnection, RequestConnection as _},
    properties::WmSizeHints,
    protocol::{
        Event,
        xproto::{
            self, AtomEnum, ClientMessageEvent, ConfigureWindowAux, ConnectionExt as _,
            CreateWindowAux, EventMask, ImageFormat, KeyButMask, PropMode, StackMode, VisualClass,
            WindowClass,
        },
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
};

use super::{
    CursorPos, CursorShape, DisplayConnection, KeyEvent, Modifiers, MouseButton, ScrollDirection,
    Window, WindowEvent, WindowOptions,
};
use crate::{
    error::{Error, X11Error},
    render::Canvas,
};

x11rb::atom_manager! {
    pub Atoms: AtomCookie {
        UTF8_STRING,

        WM_PROTOCOLS,
        WM_DELETE_WINDOW,

        _NET_WM_NAME,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DIALOG,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_SKIP_TASKBAR,

        _NET_WM_MOVERESIZE,
    }
}

#[derive(Clone)]
pub(crate) struct Connection {
    inner: Rc<RustConnection>,
    screen: usize,
}

impl Deref for Connection {
    type Target = RustConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DisplayConnection for Connection {
    type Window = X11Window;

    fn connect() -> Result<Self, Error> {
        let (conn, screen) = x11rb::connect(None)?;
        Ok(Self {
            inner: Rc::new(conn),
            screen,
        })
    }

    fn create_window(&self, options: &WindowOptions) -> Result<Self::Window, Error> {
        X11Window::create(self.clone(), options)
    }
}

const MOVERESIZE_MOVE: u32 = 8;
const WM_CLASS: &[u8] = b"guid\0Guid\0";

// X11 cursor font character for the text I-beam.
const XC_XTERM: u16 = 152;

pub(crate) struct X11Window {
    atoms: Atoms,
    conn: Connection,
    window: xproto::Window,
    gc: xproto::Gcontext,
    lookup_table: LookupTable,
    xkb_group: u8,
    cursor_text: xproto::Cursor,
    current_cursor: CursorShape,
    size: (u16, u16),
}

impl X11Window {
    fn create(conn: Connection, options: &WindowOptions) -> Result<Self, Error> {
        let atoms = Atoms::new(&conn.inner)?.reply()?;

        let screen = conn
            .inner
            .setup()
            .roots
            .get(conn.screen)
            .ok_or(Error::X11(X11Error::NoVisual))?;

        // The canvas is blitted as 32-bit BGRX, which needs a 24-bit TrueColor visual.
        let vid = screen
            .allowed_depths
            .iter()
            .filter(|d| d.depth == 24)
            .flat_map(|d| d.visuals.iter())
            .find(|v| {
                v.class == VisualClass::TRUE_COLOR
                    && v.red_mask == 0xff0000
                    && v.green_mask == 0xff00
                    && v.blue_mask == 0xff
            })
            .map(|v| v.visual_id)
            .ok_or(Error::X11(X11Error::NoVisual))?;

        let attrs = CreateWindowAux::new()
            .event_mask(
                EventMask::EXPOSURE
                    | EventMask::STRUCTURE_NOTIFY
                    | EventMask::KEY_PRESS
                    | EventMask::POINTER_MOTION
                    | EventMask::ENTER_WINDOW
                    | EventMask::LEAVE_WINDOW
                    | EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE,
            )
            .border_pixel(0)
            .colormap(0);

        let window = conn.generate_id()?;
        conn.inner
            .create_window(
                24,
                window,
                screen.root,
                0,
                0,
                options.width,
                options.height,
                0,
                WindowClass::INPUT_OUTPUT,
                vid,
                &attrs,
            )?
            .check()?;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, window, &xproto::CreateGCAux::new().graphics_exposures(0))?;

        // Opt into getting ClientMessage event on close instead of SIGTERM
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[atoms.WM_DELETE_WINDOW],
        )?;

        WmSizeHints {
            min_size: Some((options.min_width.into(), options.min_height.into())),
            ..Default::default()
        }
        .set_normal_hints(&conn.inner, window)?
        .check()?;

        conn.setup_xkb_extension()
            .map_err(|_| Error::X11(X11Error::Keyboard))?;
        let device_id = conn
            .get_xkb_core_device_id()
            .map_err(|_| Error::X11(X11Error::Keyboard))?;
        let keymap = conn
            .get_xkb_keymap(device_id)
            .map_err(|_| Error::X11(X11Error::Keyboard))?;
        let lookup_table = keymap.to_builder().build_lookup_table();

        // Only the I-beam is a glyph cursor. Clearing the window cursor restores the
        // themed default pointer.
        let cursor_font = conn.generate_id()?;
        conn.open_font(cursor_font, b"cursor")?;
        let cursor_text = conn.generate_id()?;
        conn.create_glyph_cursor(
            cursor_text,
            cursor_font,
            cursor_font,
            XC_XTERM,
            XC_XTERM + 1,
            0,
            0,
            0,
            0xffff,
            0xffff,
            0xffff,
        )?;
        conn.close_font(cursor_font)?;

        let win = X11Window {
            atoms,
            conn,
            window,
            gc,
            lookup_table,
            xkb_group: 0,
            cursor_text,
            current_cursor: CursorShape::Default,
            size: (options.width, options.height),
        };
        win.set_class(WM_CLASS)?;
        win.set_dialog_type()?;
        win.set_states(options)?;

        Ok(win)
    }

    fn set_class(&self, cls: &[u8]) -> Result<(), Error> {
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                cls,
            )?
            .check()?;
        Ok(())
    }

    fn set_dialog_type(&self) -> Result<(), Error> {
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_WINDOW_TYPE,
                AtomEnum::ATOM,
                &[self.atoms._NET_WM_WINDOW_TYPE_DIALOG],
            )?
            .check()?;
        Ok(())
    }

    /// Initial `_NET_WM_STATE`, read by the window manager when the window is mapped.
    fn set_states(&self, options: &WindowOptions) -> Result<(), Error> {
        let mut states = Vec::new();
        if options.always_on_top {
            states.push(self.atoms._NET_WM_STATE_ABOVE);
        }
        if options.skip_taskbar {
            states.push(self.atoms._NET_WM_STATE_SKIP_TASKBAR);
        }
        if states.is_empty() {
            return Ok(());
        }
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_STATE,
                AtomEnum::ATOM,
                &states,
            )?
            .check()?;
        Ok(())
    }

    fn lookup(&self, detail: u8, state: KeyButMask) -> kbvm::lookup::Lookup<'_> {
        let keycode = kbvm::Keycode::from_x11(detail.into());
        let group = kbvm::GroupIndex(self.xkb_group as u32);
        self.lookup_table.lookup(group, convert_to_kbvm_mods(state), keycode)
    }

    fn cvt_event(&mut self, ev: Event) -> Option<WindowEvent> {
        Some(match ev {
            Event::ClientMessage(msg) if msg.data.as_data32()[0] == self.atoms.WM_DELETE_WINDOW => {
                WindowEvent::CloseRequested
            }
            Event::KeyPress(press) if press.event == self.window => {
                let modifiers = convert_modifiers(press.state);
                let lookup = self.lookup(press.detail, press.state);

                let keysym = lookup
                    .clone()
                    .into_iter()
                    .next()
                    .map(|p| p.keysym().0)
                    .unwrap_or(0);

                // Printable characters arrive as text; everything else as key presses.
                let ch: Option<char> = lookup.into_iter().flat_map(|p| p.char()).next();
                if let Some(c) = ch {
                    if !c.is_control() && !modifiers.contains(Modifiers::CTRL) {
                        return Some(WindowEvent::TextInput(c));
                    }
                }

                WindowEvent::KeyPress(KeyEvent {
                    keysym,
                    modifiers,
                })
            }
            Event::Expose(ex) if ex.count == 0 => WindowEvent::RedrawRequested,
            Event::ConfigureNotify(e) if e.window == self.window => {
                if (e.width, e.height) == self.size {
                    return None;
                }
                self.size = (e.width, e.height);
                WindowEvent::Resized(e.width.into(), e.height.into())
            }
            Event::EnterNotify(e) => WindowEvent::CursorEnter(CursorPos {
                x: e.event_x,
                y: e.event_y,
            }),
            Event::LeaveNotify(_) => WindowEvent::CursorLeave,
            Event::MotionNotify(e) => WindowEvent::CursorMove(CursorPos {
                x: e.event_x,
                y: e.event_y,
            }),
            Event::ButtonPress(e) => match e.detail {
                4 => WindowEvent::Scroll(ScrollDirection::Up),
                5 => WindowEvent::Scroll(ScrollDirection::Down),
                _ => WindowEvent::ButtonPress(mouse_button(e.detail)?, convert_modifiers(e.state)),
            },
            Event::ButtonRelease(e) => match e.detail {
                4 | 5 => return None,
                _ => WindowEvent::ButtonRelease(mouse_button(e.detail)?, convert_modifiers(e.state)),
            },
            _ => return None,
        })
    }
}

fn convert_modifiers(state: KeyButMask) -> Modifiers {
    let mut mods = Modifiers::empty();
    if state.contains(KeyButMask::SHIFT) {
        mods |= Modifiers::SHIFT;
    }
    if state.contains(KeyButMask::CONTROL) {
        mods |= Modifiers::CTRL;
    }
    if state.contains(KeyButMask::MOD1) {
        mods |= Modifiers::ALT;
    }
    if state.contains(KeyButMask::MOD4) {
        mods |= Modifiers::SUPER;
    }
    mods
}

fn convert_to_kbvm_mods(state: KeyButMask) -> kbvm::ModifierMask {
    let mut mods = kbvm::ModifierMask::NONE;
    if state.contains(KeyButMask::SHIFT) {
        mods = mods | kbvm::ModifierMask::SHIFT;
    }
    if state.contains(KeyButMask::LOCK) {
        mods = mods | kbvm::ModifierMask::LOCK;
    }
    if state.contains(KeyButMask::CONTROL) {
        mods = mods | kbvm::ModifierMask::CONTROL;
    }
    if state.contains(KeyButMask::MOD1) {
        mods = mods | kbvm::ModifierMask::MOD1;
    }
    if state.contains(KeyButMask::MOD2) {
        mods = mods | kbvm::ModifierMask::MOD2;
    }
    if state.contains(KeyButMask::MOD4) {
        mods = mods | kbvm::ModifierMask::MOD4;
    }
    mods
}

impl Window for X11Window {
    fn set_title(&mut self, title: &str) -> Result<(), Error> {
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                title.as_bytes(),
            )?
            .check()?;
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_NAME,
                self.atoms.UTF8_STRING,
                title.as_bytes(),
            )?
            .check()?;

        Ok(())
    }

    fn set_contents(&mut self, canvas: &Canvas) -> Result<(), Error> {
        let too_large = || Error::Canvas(canvas.width(), canvas.height());
        let width = u16::try_from(canvas.width()).map_err(|_| too_large())?;
        u16::try_from(canvas.height()).map_err(|_| too_large())?;

        // Large windows exceed the maximum request size, so send horizontal strips.
        let data = canvas.as_bgra();
        let stride = usize::from(width) * 4;
        let max_bytes = self.conn.maximum_request_bytes().saturating_sub(64);
        let rows_per_strip = (max_bytes / stride).max(1);

        for (i, strip) in data.chunks(rows_per_strip * stride).enumerate() {
            let rows = (strip.len() / stride) as u16;
            let y = (i * rows_per_strip) as i16;
            self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                self.window,
                self.gc,
                width,
                rows,
                0,
                y,
                0,
                24,
                strip,
            )?;
        }
        self.conn.flush()?;
        Ok(())
    }

    fn show(&mut self) -> Result<(), Error> {
        self.conn.map_window(self.window)?;
        self.conn.configure_window(
            self.window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn poll_for_event(&mut self) -> Result<Option<WindowEvent>, Error> {
        while let Some(ev) = self.conn.poll_for_event()? {
            if let Some(ev) = self.cvt_event(ev) {
                return Ok(Some(ev));
            }
        }
        Ok(None)
    }

    fn wait_for_event_timeout(&mut self, timeout: Duration) -> Result<Option<WindowEvent>, Error> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(ev) = self.poll_for_event()? {
                return Ok(Some(ev));
            }
            self.conn.flush()?;

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let millis = (deadline - now).as_millis().min(i32::MAX as u128) as i32;

            let mut fds = libc::pollfd {
                fd: self.conn.stream().as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            // SAFETY: `fds` is a single valid pollfd that outlives the call.
            let ready = unsafe { libc::poll(&mut fds, 1, millis) };
            if ready < 0 {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(err.into());
                }
            }
        }
    }

    fn start_drag(&mut self) -> Result<(), Error> {
        let pointer = self.conn.query_pointer(self.window)?.reply()?;

        let window_pos = self
            .conn
            .translate_coordinates(self.window, pointer.root, 0, 0)?
            .reply()?;

        let x = (window_pos.dst_x + pointer.win_x) as u32;
        let y = (window_pos.dst_y + pointer.win_y) as u32;

        self.conn
            .send_event(
                false,
                pointer.root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                ClientMessageEvent::new(
                    32,
                    self.window,
                    self.atoms._NET_WM_MOVERESIZE,
                    [x, y, MOVERESIZE_MOVE, 1, 1],
                ),
            )?
            .check()?;

        Ok(())
    }

    fn scale_factor(&self) -> f32 {
        super::DEFAULT_SCALE
    }

    fn set_cursor(&mut self, shape: CursorShape) -> Result<(), Error> {
        if self.current_cursor == shape {
            return Ok(());
        }

        let cursor_id: u32 = match shape {
            CursorShape::Text => self.cursor_text,
            CursorShape::Default => 0,
        };

        self.conn.change_window_attributes(
            self.window,
            &xproto::ChangeWindowAttributesAux::new().cursor(cursor_id),
        )?;
        self.conn.flush()?;

        self.current_cursor = shape;
        Ok(())
    }
}

fn mouse_button(detail: u8) -> Option<MouseButton> {
    Some(match detail {
        1 => MouseButton::Left,
        2 => MouseButton::Middle,
        3 => MouseButton::Right,
        _ => return None,
    })
}
