//! The `--forms` dialog window.
//!
//! The window is split top to bottom into an optional menu bar, a scrolling viewport
//! with the header, the form label and the rows, an optional footer and the button
//! row. Field values live in the [`Form`]; widgets only hold view state.

use std::{
    io::{self, Write as _},
    path::PathBuf,
    time::{Duration, Instant},
};

use super::{
    Colors,
    file_select::{FilePicker, Outcome},
    layout::{self, FrameKind, HEADER_TITLE_SCALE, Layout, PADDING},
    theme,
    widgets::{
        self, Ctx, FieldWidget, Input, Response,
        button::Button,
        clipped, draw_scrollbar,
        menu_bar::{self, MenuBar},
        parse_color, tab_bar,
        text::{align_factor, draw_styled},
        text_area::parse_font,
        text_width,
    },
};
use crate::{
    backend::{
        CursorShape, DEFAULT_SCALE, Modifiers, MouseButton, ScrollDirection, Window, WindowEvent,
        WindowOptions, create_window, keys,
    },
    cli::GeneralOptions,
    config::{Config, FileSelectionConfig},
    error::Error,
    forms::{
        action,
        footer::Footer,
        menu::{MenuOutcome, MessageKind},
        model::{Field, FieldKind, Form, Item, Row},
        source::FileMonitor,
        values,
    },
    render::{Canvas, Font, Fonts, Rect, Rgba},
};

const DEFAULT_TITLE: &str = "Forms dialog";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(400);
const DOUBLE_CLICK_DISTANCE: i32 = 4;
const TOOLTIP_DELAY: Duration = Duration::from_millis(600);

const BUTTON_GAP: f32 = 10.0;
const FOOTER_PADDING: f32 = 8.0;
const FRAME_ALLOWANCE: f32 = 40.0;
const MIN_WIDTH: f32 = 420.0;
const MAX_AUTO_WIDTH: f32 = 900.0;
const MIN_HEIGHT: f32 = 160.0;
const MAX_AUTO_HEIGHT: f32 = 720.0;
const MIN_WINDOW_WIDTH: u16 = 240;
const MIN_WINDOW_HEIGHT: u16 = 140;
const WHEEL_STEP: f32 = 48.0;
const TOOLTIP_PADDING: f32 = 6.0;
const TOOLTIP_MAX_WIDTH: f32 = 320.0;

/// How the forms dialog ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormsResult {
    /// OK was clicked and the values were printed.
    Accepted,
    Cancelled,
    /// The window manager closed the window.
    Closed,
    Timeout,
    /// A menu item with an exit code was clicked.
    MenuExit(u8),
}

impl FormsResult {
    pub fn exit_code(&self) -> i32 {
        match self {
            FormsResult::Accepted => 0,
            FormsResult::Cancelled => 1,
            FormsResult::Closed => 255,
            FormsResult::Timeout => 5,
            FormsResult::MenuExit(code) => i32::from(*code),
        }
    }
}

/// Forms dialog builder.
pub struct FormsBuilder {
    form: Form,
    options: GeneralOptions,
    config: Config,
}

impl FormsBuilder {
    pub fn new(form: Form) -> Self {
        Self {
            form,
            options: GeneralOptions::default(),
            config: Config::default(),
        }
    }

    pub fn options(mut self, options: GeneralOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn show(self) -> Result<FormsResult, Error> {
        let Self {
            form,
            options,
            config,
        } = self;

        let widgets = build_widgets(&form)?;
        let style = Style::load(&form, &config, DEFAULT_SCALE)?;
        let mut dialog = Dialog::new(form, widgets, style, &options, config.file_selection.clone());

        // Size from content at scale 1, then redo everything at the window's scale.
        let (width, height) = dialog.natural_size(&options);
        let mut window = create_window(&WindowOptions {
            width: to_u16(width),
            height: to_u16(height),
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
            always_on_top: options.always_on_top,
            skip_taskbar: options.no_taskbar,
        })?;
        window.set_title(options.title.as_deref().unwrap_or(DEFAULT_TITLE))?;

        let scale = window.scale_factor();
        if (scale - dialog.style.scale).abs() > f32::EPSILON {
            dialog.style = Style::load(&dialog.form, &config, scale)?;
        }
        dialog.resize((width as f32 * scale) as i32, (height as f32 * scale) as i32);
        dialog.focus_first();

        let result = dialog.run(&mut window, options.timeout)?;
        tracing::debug!(?result, "forms dialog finished");
        Ok(result)
    }
}

fn build_widgets(form: &Form) -> Result<Vec<Box<dyn FieldWidget>>, Error> {
    form.fields().into_iter().map(widgets::build).collect()
}

fn to_u16(value: i32) -> u16 {
    u16::try_from(value.max(1)).unwrap_or(u16::MAX)
}

/// Font families named by the form's text styles.
fn font_families(form: &Form) -> Vec<String> {
    let mut families: Vec<String> = form
        .label
        .iter()
        .filter_map(|label| label.style.font_family.clone())
        .collect();
    for field in form.fields() {
        match &field.kind {
            FieldKind::Text(text) => families.extend(text.style.font_family.clone()),
            FieldKind::TextInfo(info) => {
                families.extend(info.style.font_family.clone());
                if let Some(font) = &info.font {
                    families.extend(parse_font(font).0.map(str::to_string));
                }
            }
            _ => {}
        }
    }
    families.sort();
    families.dedup();
    families
}

/// Widest row label anywhere in `rows`.
fn widest_label(rows: &[Row], font: &Font) -> i32 {
    rows.iter()
        .map(|row| {
            let own = row.label.as_deref().map_or(0, |l| text_width(font, l));
            let nested = match &row.item {
                Item::Group(group) => widest_label(&group.rows, font),
                Item::Tabs(bar) => bar.tabs.iter().map(|t| widest_label(&t.rows, font)).max().unwrap_or(0),
                _ => 0,
            };
            own.max(nested)
        })
        .max()
        .unwrap_or(0)
}

fn emit(line: &str) -> Result<(), Error> {
    let mut out = io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

/// Fonts and colors shared by everything drawn in the dialog.
struct Style {
    fonts: Fonts,
    font: Font,
    colors: &'static Colors,
    scale: f32,
}

impl Style {
    fn load(form: &Form, config: &Config, scale: f32) -> Result<Self, Error> {
        let families = font_families(form);
        let fonts = Fonts::load(&config.font, families.iter().map(String::as_str), scale)?;
        Ok(Self {
            font: fonts.ui(),
            fonts,
            colors: theme(config.theme),
            scale,
        })
    }

    fn cx(&self, pointer: Option<(i32, i32)>) -> Ctx<'_> {
        Ctx {
            fonts: &self.fonts,
            font: &self.font,
            colors: self.colors,
            scale: self.scale,
            pointer,
        }
    }
}

/// Owner of the popup currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopupOwner {
    TopMenu,
    Field(usize),
}

struct Hover {
    field: usize,
    since: Instant,
    shown: bool,
}

struct Dialog {
    form: Form,
    widgets: Vec<Box<dyn FieldWidget>>,
    style: Style,
    layout: Layout,
    width: i32,
    height: i32,
    pointer: Option<(i32, i32)>,

    menu_rect: Rect,
    viewport: Rect,
    footer_rect: Option<Rect>,
    scroll: i32,

    focus: Option<usize>,
    /// Widget receiving motion and release until the button goes up.
    capture: Option<usize>,
    menu_bar: MenuBar,
    picker: Option<FilePicker>,
    hover: Option<Hover>,
    last_click: Option<(Instant, i32, i32)>,
    dragging: bool,
    dirty: bool,

    ok: Button,
    cancel: Option<Button>,
    ok_prefix: String,
    footer: Footer,
    footer_file: Option<PathBuf>,
    monitor: FileMonitor,
    header_colors: (Option<Rgba>, Option<Rgba>),
    file_config: FileSelectionConfig,
}

impl Dialog {
    fn new(
        form: Form,
        widgets: Vec<Box<dyn FieldWidget>>,
        style: Style,
        options: &GeneralOptions,
        file_config: FileSelectionConfig,
    ) -> Self {
        let settings = &form.settings;
        let mut footer = Footer::new(settings.footer.entries);
        if let Some(path) = &settings.footer.file {
            footer.load(path);
        }

        let mut monitor = FileMonitor::new();
        for path in form.monitored_paths() {
            monitor.watch(&path);
        }

        if settings.win_min_button || settings.win_max_button {
            tracing::debug!("window buttons are left to the window manager");
        }

        let header_colors = form.header.as_ref().map_or((None, None), |h| {
            (parse_color(h.background.as_deref()), parse_color(h.foreground.as_deref()))
        });
        let cancel = (!settings.no_cancel)
            .then(|| Button::new(options.cancel_label.as_deref().unwrap_or("Cancel")));

        Self {
            footer_file: settings.footer.file.clone(),
            form,
            widgets,
            style,
            layout: Layout::default(),
            width: 0,
            height: 0,
            pointer: None,
            menu_rect: Rect::default(),
            viewport: Rect::default(),
            footer_rect: None,
            scroll: 0,
            focus: None,
            capture: None,
            menu_bar: MenuBar::default(),
            picker: None,
            hover: None,
            last_click: None,
            dragging: false,
            dirty: true,
            ok: Button::new(options.ok_label.as_deref().unwrap_or("OK")),
            cancel,
            ok_prefix: options.output_prefix_ok.clone(),
            footer,
            monitor,
            header_colors,
            file_config,
        }
    }

    /// Window size in unscaled pixels, honouring `--width` and `--height`.
    fn natural_size(&self, options: &GeneralOptions) -> (i32, i32) {
        let cx = self.style.cx(None);
        let width = match options.width {
            Some(w) => w as i32,
            None => self.preferred_width(&cx),
        };
        let height = match options.height {
            Some(h) => h as i32,
            None => {
                let content = layout::compute(&self.form, &self.widgets, width, &cx).height;
                let (menu, footer, buttons) = self.chrome_heights(&cx);
                (content + menu + footer + buttons).clamp(cx.px(MIN_HEIGHT), cx.px(MAX_AUTO_HEIGHT))
            }
        };
        (width, height)
    }

    fn preferred_width(&self, cx: &Ctx) -> i32 {
        let max = cx.px(MAX_AUTO_WIDTH);
        let widest_field = self
            .form
            .fields()
            .into_iter()
            .zip(&self.widgets)
            .filter(|(field, _)| !field.meta.hidden)
            .map(|(field, widget)| match field.meta.field_width {
                Some(w) => cx.px(w as f32),
                None => widget.measure(field, max, cx).0,
            })
            .max()
            .unwrap_or(0);
        let header_rows = self.form.header.as_ref().map_or(&[][..], |h| &h.rows[..]);
        let labels = widest_label(&self.form.rows, cx.font).max(widest_label(header_rows, cx.font));
        let pad = cx.px(PADDING);
        let content = widest_field + labels + cx.px(FRAME_ALLOWANCE) + 2 * pad;

        let mut buttons = self.ok.measure(cx).0 + 2 * pad;
        if let Some(cancel) = &self.cancel {
            buttons += cancel.measure(cx).0 + cx.px(BUTTON_GAP);
        }
        content.max(buttons).clamp(cx.px(MIN_WIDTH), max)
    }

    fn footer_visible(&self) -> bool {
        self.form.settings.footer.is_enabled(&self.form.settings.ok_action) || self.footer.message.is_some()
    }

    /// Heights of the menu bar, the footer and the button row.
    fn chrome_heights(&self, cx: &Ctx) -> (i32, i32, i32) {
        let menu = if self.form.top_menu.is_some() { cx.px(menu_bar::BAR_HEIGHT) } else { 0 };
        let footer = if self.footer_visible() {
            let settings = &self.form.settings.footer;
            let message = self.footer.message.as_ref().map_or(0, |(_, text)| text.lines().count().max(1));
            let lines = usize::from(settings.name.is_some()) + settings.entries.max(1) + message;
            lines as i32 * cx.line_height() + 2 * cx.px(FOOTER_PADDING) + cx.px(BUTTON_GAP)
        } else {
            0
        };
        let buttons = self.ok.measure(cx).1 + cx.px(BUTTON_GAP) + cx.px(PADDING);
        (menu, footer, buttons)
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.relayout();
    }

    fn relayout(&mut self) {
        let cx = self.style.cx(self.pointer);
        let pad = cx.px(PADDING);
        let gap = cx.px(BUTTON_GAP);
        let (menu_h, footer_h, _) = self.chrome_heights(&cx);
        let (_, button_h) = self.ok.measure(&cx);

        let buttons_y = self.height - pad - button_h;
        let footer_y = buttons_y - footer_h;
        self.menu_rect = Rect::new(0, 0, self.width, menu_h);
        self.footer_rect = (footer_h > 0).then(|| Rect::new(pad, footer_y, self.width - 2 * pad, footer_h - gap));
        self.viewport = Rect::new(0, menu_h, self.width, (footer_y - gap - menu_h).max(0));

        self.layout = layout::compute(&self.form, &self.widgets, self.width, &cx);
        self.scroll = self.scroll.clamp(0, self.max_scroll());

        let enabled = !self.form.buttons_disabled();
        let mut x = self.width - pad;
        if let Some(cancel) = &mut self.cancel {
            let (w, _) = cancel.measure(&cx);
            x -= w;
            cancel.rect = Rect::new(x, buttons_y, w, button_h);
            cancel.enabled = enabled;
            x -= gap;
        }
        let (w, _) = self.ok.measure(&cx);
        self.ok.rect = Rect::new(x - w, buttons_y, w, button_h);
        self.ok.enabled = enabled;

        if let Some(picker) = &mut self.picker {
            picker.place(Rect::new(0, 0, self.width, self.height), &cx);
        }

        // Focus cannot stay on a field that is no longer shown.
        if self.focus.is_some_and(|i| self.field_rect(i).is_none()) {
            self.focus = None;
        }
        self.dirty = true;
    }

    fn max_scroll(&self) -> i32 {
        (self.layout.height - self.viewport.h).max(0)
    }

    /// Offset from content to window coordinates.
    fn dy(&self) -> i32 {
        self.viewport.y - self.scroll
    }

    /// Where field `index` is drawn, in window coordinates.
    fn field_rect(&self, index: usize) -> Option<Rect> {
        let rect = self.layout.fields.get(index).copied().flatten()?;
        Some(rect.translate(0, self.dy()))
    }

    fn field_at(&self, x: i32, y: i32) -> Option<usize> {
        if !self.viewport.contains(x, y) {
            return None;
        }
        (0..self.layout.fields.len()).find(|&i| self.field_rect(i).is_some_and(|r| r.contains(x, y)))
    }

    fn tab_at(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let dy = self.dy();
        self.layout.tab_bars.iter().find_map(|strip| {
            let tabs: Vec<Rect> = strip.tabs.iter().map(|r| r.translate(0, dy)).collect();
            tab_bar::tab_at(&tabs, x, y).map(|tab| (strip.bar, tab))
        })
    }

    fn send(&mut self, index: usize, input: &Input) -> Response {
        let Some(rect) = self.field_rect(index) else {
            return Response::Ignored;
        };
        let cx = self.style.cx(self.pointer);
        let (Some(widget), Some(field)) = (self.widgets.get_mut(index), field_mut(&mut self.form, index)) else {
            return Response::Ignored;
        };
        widget.event(field, rect, input, &cx)
    }

    fn top_menu_event(&mut self, input: &Input) -> Response {
        let Some(menu) = &self.form.top_menu else {
            return Response::Ignored;
        };
        let cx = self.style.cx(self.pointer);
        self.menu_bar.event(menu, self.menu_rect, input, &cx)
    }

    fn focusable(&self, index: usize) -> bool {
        let fields = self.form.fields();
        match (self.widgets.get(index), fields.get(index)) {
            (Some(widget), Some(field)) => self.field_rect(index).is_some() && widget.focusable(field),
            _ => false,
        }
    }

    fn notify_focus(&mut self, index: usize, focused: bool) -> Response {
        let (Some(widget), Some(field)) = (self.widgets.get_mut(index), field_mut(&mut self.form, index)) else {
            return Response::Ignored;
        };
        widget.set_focus(field, focused)
    }

    fn set_focus(&mut self, next: Option<usize>) {
        if next == self.focus {
            return;
        }
        let mut changed = false;
        if let Some(old) = self.focus {
            changed |= self.notify_focus(old, false) == Response::Changed;
        }
        self.focus = next;
        if let Some(new) = next {
            changed |= self.notify_focus(new, true) == Response::Changed;
            self.scroll_into_view(new);
        }
        if changed {
            self.relayout();
        }
    }

    fn focus_first(&mut self) {
        let first = (0..self.widgets.len()).find(|&i| self.focusable(i));
        self.set_focus(first);
    }

    fn move_focus(&mut self, forward: bool) {
        let candidates: Vec<usize> = (0..self.widgets.len()).filter(|&i| self.focusable(i)).collect();
        if candidates.is_empty() {
            return;
        }
        let position = self.focus.and_then(|f| candidates.iter().position(|&c| c == f));
        let next = match (position, forward) {
            (Some(p), true) => (p + 1) % candidates.len(),
            (Some(p), false) => (p + candidates.len() - 1) % candidates.len(),
            (None, true) => 0,
            (None, false) => candidates.len() - 1,
        };
        self.set_focus(Some(candidates[next]));
    }

    fn scroll_into_view(&mut self, index: usize) {
        let Some(rect) = self.layout.fields.get(index).copied().flatten() else {
            return;
        };
        let margin = self.style.cx(None).px(PADDING) / 2;
        if rect.y - margin < self.scroll {
            self.scroll = rect.y - margin;
        } else if rect.bottom() + margin > self.scroll + self.viewport.h {
            self.scroll = rect.bottom() + margin - self.viewport.h;
        }
        self.scroll = self.scroll.clamp(0, self.max_scroll());
    }

    fn open_popup(&self) -> Option<(PopupOwner, Rect)> {
        let cx = self.style.cx(self.pointer);
        if let Some(menu) = &self.form.top_menu {
            if let Some(rect) = self.menu_bar.popup_rect(menu, self.menu_rect, &cx) {
                return Some((PopupOwner::TopMenu, rect));
            }
        }
        let fields = self.form.fields();
        fields.iter().zip(&self.widgets).enumerate().find_map(|(i, (field, widget))| {
            let rect = self.field_rect(i)?;
            widget.popup_rect(field, rect, &cx).map(|popup| (PopupOwner::Field(i), popup))
        })
    }

    fn close_popups(&mut self) {
        self.menu_bar.close();
        for widget in &mut self.widgets {
            widget.close_popup();
        }
    }

    fn send_to(&mut self, owner: PopupOwner, input: &Input) -> Result<Option<FormsResult>, Error> {
        match owner {
            PopupOwner::TopMenu => {
                let response = self.top_menu_event(input);
                self.respond_top_menu(response)
            }
            PopupOwner::Field(index) => {
                let response = self.send(index, input);
                self.respond(index, response)
            }
        }
    }

    fn is_double_click(&mut self, x: i32, y: i32) -> bool {
        let now = Instant::now();
        let double = self.last_click.is_some_and(|(at, lx, ly)| {
            now.duration_since(at) <= DOUBLE_CLICK_TIME
                && (lx - x).abs() <= DOUBLE_CLICK_DISTANCE
                && (ly - y).abs() <= DOUBLE_CLICK_DISTANCE
        });
        self.last_click = if double { None } else { Some((now, x, y)) };
        double
    }

    fn handle<W: Window>(&mut self, event: WindowEvent, window: &mut W) -> Result<Option<FormsResult>, Error> {
        self.dirty = true;
        match event {
            WindowEvent::CloseRequested => return Ok(Some(FormsResult::Closed)),
            WindowEvent::RedrawRequested => {}
            WindowEvent::Resized(width, height) => {
                self.resize(width as i32, height as i32);
            }
            WindowEvent::CursorEnter(pos) | WindowEvent::CursorMove(pos) => {
                return self.motion(pos.x.into(), pos.y.into(), window);
            }
            WindowEvent::CursorLeave => {
                self.hover = None;
                if self.capture.is_none() {
                    self.pointer = None;
                }
            }
            WindowEvent::ButtonPress(button, modifiers) => return self.press(button, modifiers),
            WindowEvent::ButtonRelease(..) => return self.release(),
            WindowEvent::Scroll(direction) => return self.wheel(direction),
            WindowEvent::KeyPress(key) => return self.key(key.keysym, key.modifiers),
            WindowEvent::TextInput(c) => return self.text(c),
        }
        Ok(None)
    }

    fn motion<W: Window>(&mut self, x: i32, y: i32, window: &mut W) -> Result<Option<FormsResult>, Error> {
        self.pointer = Some((x, y));
        let input = Input::Motion {
            x,
            y,
        };

        if self.dragging {
            self.dragging = false;
            if let Err(e) = window.start_drag() {
                tracing::debug!("cannot start window drag: {e}");
            }
            return Ok(None);
        }

        if let Some(picker) = &mut self.picker {
            let cx = self.style.cx(self.pointer);
            picker.event(&input, &cx);
            return Ok(None);
        }

        self.ok.process(&input);
        if let Some(cancel) = &mut self.cancel {
            cancel.process(&input);
        }
        self.update_hover(x, y);

        if let Some(index) = self.capture {
            let response = self.send(index, &input);
            return self.respond(index, response);
        }
        match self.open_popup() {
            Some((owner, _)) => self.send_to(owner, &input),
            None => Ok(None),
        }
    }

    fn press(&mut self, button: MouseButton, modifiers: Modifiers) -> Result<Option<FormsResult>, Error> {
        let Some((x, y)) = self.pointer else {
            return Ok(None);
        };
        let double = button == MouseButton::Left && self.is_double_click(x, y);
        let input = Input::Press {
            x,
            y,
            button,
            modifiers,
            double,
        };
        self.hover = None;

        if let Some(picker) = &mut self.picker {
            let cx = self.style.cx(self.pointer);
            let outcome = picker.event(&input, &cx);
            self.picker_outcome(outcome);
            return Ok(None);
        }

        if let Some((owner, popup)) = self.open_popup() {
            let on_bar = owner == PopupOwner::TopMenu && self.menu_rect.contains(x, y);
            if popup.contains(x, y) || on_bar {
                if let PopupOwner::Field(index) = owner {
                    self.capture = Some(index);
                }
                return self.send_to(owner, &input);
            }
            // A click outside an open popup only closes it.
            self.close_popups();
            return Ok(None);
        }

        if self.menu_rect.contains(x, y) {
            let response = self.top_menu_event(&input);
            return self.respond_top_menu(response);
        }

        self.ok.process(&input);
        if let Some(cancel) = &mut self.cancel {
            cancel.process(&input);
        }
        let on_button = self.ok.rect.contains(x, y) || self.cancel.as_ref().is_some_and(|c| c.rect.contains(x, y));
        if on_button {
            return Ok(None);
        }

        if let Some((bar, tab)) = self.tab_at(x, y) {
            if let Some(tabs) = self.form.tab_bar_mut(bar) {
                tracing::debug!(bar, tab, "switching tab");
                tabs.current = tab;
            }
            self.relayout();
            return Ok(None);
        }

        if let Some(index) = self.field_at(x, y) {
            if self.focusable(index) {
                self.set_focus(Some(index));
            }
            let response = self.send(index, &input);
            if response.consumed() {
                self.capture = Some(index);
            }
            return self.respond(index, response);
        }

        if button == MouseButton::Left {
            self.dragging = true;
        }
        Ok(None)
    }

    fn release(&mut self) -> Result<Option<FormsResult>, Error> {
        self.dragging = false;
        let Some((x, y)) = self.pointer else {
            self.capture = None;
            return Ok(None);
        };
        let input = Input::Release {
            x,
            y,
        };

        if let Some(picker) = &mut self.picker {
            let cx = self.style.cx(self.pointer);
            let outcome = picker.event(&input, &cx);
            self.picker_outcome(outcome);
            return Ok(None);
        }

        self.ok.process(&input);
        if self.ok.was_clicked() {
            return self.accept();
        }
        if let Some(cancel) = &mut self.cancel {
            cancel.process(&input);
            if cancel.was_clicked() {
                return Ok(Some(FormsResult::Cancelled));
            }
        }

        match self.capture.take() {
            Some(index) => {
                let response = self.send(index, &input);
                self.respond(index, response)
            }
            None => Ok(None),
        }
    }

    fn wheel(&mut self, direction: ScrollDirection) -> Result<Option<FormsResult>, Error> {
        let Some((x, y)) = self.pointer else {
            return Ok(None);
        };
        let delta = match direction {
            ScrollDirection::Up => -1,
            ScrollDirection::Down => 1,
        };
        let input = Input::Scroll {
            x,
            y,
            delta,
        };
        self.hover = None;

        if let Some(picker) = &mut self.picker {
            let cx = self.style.cx(self.pointer);
            picker.event(&input, &cx);
            return Ok(None);
        }

        if let Some((owner, popup)) = self.open_popup() {
            if popup.contains(x, y) {
                return self.send_to(owner, &input);
            }
            return Ok(None);
        }

        if let Some(index) = self.field_at(x, y) {
            let response = self.send(index, &input);
            if response.consumed() {
                return self.respond(index, response);
            }
        }

        if self.viewport.contains(x, y) {
            let step = self.style.cx(None).px(WHEEL_STEP);
            self.scroll = (self.scroll + delta * step).clamp(0, self.max_scroll());
        }
        Ok(None)
    }

    fn key(&mut self, keysym: u32, modifiers: Modifiers) -> Result<Option<FormsResult>, Error> {
        let input = Input::Key {
            keysym,
            modifiers,
        };
        self.hover = None;

        if let Some(picker) = &mut self.picker {
            let cx = self.style.cx(self.pointer);
            let outcome = picker.event(&input, &cx);
            self.picker_outcome(outcome);
            return Ok(None);
        }

        if let Some((owner, _)) = self.open_popup() {
            let response = match owner {
                PopupOwner::TopMenu => self.top_menu_event(&input),
                PopupOwner::Field(index) => self.send(index, &input),
            };
            if response.consumed() {
                return match owner {
                    PopupOwner::TopMenu => self.respond_top_menu(response),
                    PopupOwner::Field(index) => self.respond(index, response),
                };
            }
        }

        let ctrl = modifiers.contains(Modifiers::CTRL);
        let shift = modifiers.contains(Modifiers::SHIFT);
        match keysym {
            keys::RETURN | keys::KP_ENTER if ctrl => return self.accept(),
            keys::TAB => {
                self.move_focus(!shift);
                return Ok(None);
            }
            keys::ISO_LEFT_TAB => {
                self.move_focus(false);
                return Ok(None);
            }
            _ => {}
        }

        if let Some(index) = self.focus {
            let response = self.send(index, &input);
            if response.consumed() {
                self.scroll_into_view(index);
                return self.respond(index, response);
            }
        }

        if keysym == keys::ESCAPE {
            return Ok(Some(FormsResult::Cancelled));
        }
        Ok(None)
    }

    fn text(&mut self, c: char) -> Result<Option<FormsResult>, Error> {
        let input = Input::Text(c);
        if let Some(picker) = &mut self.picker {
            let cx = self.style.cx(self.pointer);
            picker.event(&input, &cx);
            return Ok(None);
        }
        match self.focus {
            Some(index) => {
                let response = self.send(index, &input);
                self.respond(index, response)
            }
            None => Ok(None),
        }
    }

    /// Acts on what field `index` reported.
    fn respond(&mut self, index: usize, response: Response) -> Result<Option<FormsResult>, Error> {
        match response {
            Response::Ignored | Response::Handled => Ok(None),
            Response::Changed => {
                self.print_partial(index)?;
                self.relayout();
                Ok(None)
            }
            Response::Accept => self.accept(),
            Response::Menu {
                top,
                sub,
            } => {
                let fields = self.form.fields();
                let outcome = match fields.get(index).map(|f| &f.kind) {
                    Some(FieldKind::Menu(menu)) => menu.item(top, sub).map(|item| item.activate(&self.ok_prefix)),
                    _ => None,
                };
                self.menu_clicked(outcome)
            }
            Response::OpenFilePicker => {
                self.open_picker(index);
                Ok(None)
            }
        }
    }

    fn respond_top_menu(&mut self, response: Response) -> Result<Option<FormsResult>, Error> {
        let Response::Menu {
            top,
            sub,
        } = response
        else {
            return Ok(None);
        };
        let outcome = self
            .form
            .top_menu
            .as_ref()
            .and_then(|menu| menu.item(top, sub))
            .map(|item| item.activate(&self.ok_prefix));
        self.menu_clicked(outcome)
    }

    fn menu_clicked(&mut self, outcome: Option<MenuOutcome>) -> Result<Option<FormsResult>, Error> {
        let Some(outcome) = outcome else {
            return Ok(None);
        };
        emit(&outcome.report)?;
        if let Some(message) = outcome.message {
            self.footer.message = Some(message);
            self.relayout();
        }
        Ok(outcome.exit.map(FormsResult::MenuExit))
    }

    /// Prints a scale's value on every change when it asks for it.
    fn print_partial(&self, index: usize) -> Result<(), Error> {
        let fields = self.form.fields();
        if let Some(FieldKind::Scale(scale)) = fields.get(index).map(|f| &f.kind) {
            if scale.print_partial {
                emit(&format!("{}{}", self.ok_prefix, scale.value))?;
            }
        }
        Ok(())
    }

    /// OK: prints the values, runs the OK command, then exits or resets the form.
    fn accept(&mut self) -> Result<Option<FormsResult>, Error> {
        if !self.ok.enabled {
            return Ok(None);
        }
        // Blurring commits text still being typed into a field.
        if let Some(index) = self.focus {
            self.notify_focus(index, false);
            self.notify_focus(index, true);
        }

        let line = values::print_line(&self.form, &self.ok_prefix);
        emit(&line)?;

        let action = self.form.settings.ok_action.clone();
        let output = match action.command_for(&line) {
            Some((program, args)) if action.command_to_footer => action::run_captured(&program, &args),
            Some((program, args)) => {
                action::spawn_detached(&program, &args);
                None
            }
            None => None,
        };

        if !action.keep_open {
            return Ok(Some(FormsResult::Accepted));
        }

        if action.values_to_footer {
            self.footer.push(line);
        }
        if let Some(output) = output {
            self.footer.push(output.trim());
        }
        self.form.reset();
        self.widgets = build_widgets(&self.form)?;
        if let Some(index) = self.focus {
            self.notify_focus(index, true);
        }
        self.relayout();
        Ok(None)
    }

    fn open_picker(&mut self, index: usize) {
        let fields = self.form.fields();
        let Some(FieldKind::FileSelection(sel)) = fields.get(index).map(|f| &f.kind) else {
            return;
        };
        let mut picker = FilePicker::new(index, sel, &self.form.settings.separator, &self.file_config);
        self.close_popups();
        self.capture = None;
        let cx = self.style.cx(self.pointer);
        picker.place(Rect::new(0, 0, self.width, self.height), &cx);
        self.picker = Some(picker);
    }

    fn picker_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Ignored | Outcome::Handled => {}
            Outcome::Cancelled => self.picker = None,
            Outcome::Chosen(paths) => {
                let Some(picker) = self.picker.take() else {
                    return;
                };
                tracing::debug!(paths, "file picker result");
                if let Some(Field {
                    kind: FieldKind::FileSelection(sel),
                    ..
                }) = field_mut(&mut self.form, picker.field)
                {
                    sel.path = paths;
                }
                self.focus = None;
                self.set_focus(Some(picker.field));
                self.relayout();
            }
        }
    }

    fn update_hover(&mut self, x: i32, y: i32) {
        let field = self.field_at(x, y);
        if self.hover.as_ref().map(|h| h.field) != field {
            self.hover = field.map(|field| Hover {
                field,
                since: Instant::now(),
                shown: false,
            });
        }
    }

    fn tooltip_text(&self, index: usize) -> Option<String> {
        self.form.fields().get(index).and_then(|f| f.meta.tooltip.clone())
    }

    /// When a pending tooltip should appear.
    fn tooltip_due(&self) -> Option<Instant> {
        let hover = self.hover.as_ref().filter(|h| !h.shown)?;
        self.tooltip_text(hover.field)?;
        Some(hover.since + TOOLTIP_DELAY)
    }

    fn show_due_tooltip(&mut self, now: Instant) -> bool {
        match (self.tooltip_due(), &mut self.hover) {
            (Some(due), Some(hover)) if now >= due => {
                hover.shown = true;
                true
            }
            _ => false,
        }
    }

    /// Polls monitored files and reloads whatever they feed.
    fn poll_sources(&mut self) -> bool {
        if self.monitor.is_empty() {
            return false;
        }
        let mut changed = false;
        for path in self.monitor.poll() {
            tracing::debug!(path = %path.display(), "monitored file changed");
            changed |= self.form.reload_sources(&path);
            if self.footer_file.as_deref() == Some(path.as_path()) {
                changed |= self.footer.load(&path);
            }
        }
        if changed {
            self.relayout();
        }
        changed
    }

    fn cursor_shape(&self) -> CursorShape {
        let Some((x, y)) = self.pointer else {
            return CursorShape::Default;
        };
        if self.picker.is_some() {
            return CursorShape::Default;
        }
        let Some(index) = self.field_at(x, y) else {
            return CursorShape::Default;
        };
        let (Some(rect), Some(widget)) = (self.field_rect(index), self.widgets.get(index)) else {
            return CursorShape::Default;
        };
        let fields = self.form.fields();
        let cx = self.style.cx(self.pointer);
        fields.get(index).map_or(CursorShape::Default, |field| widget.cursor(field, rect, x, y, &cx))
    }

    fn run<W: Window>(&mut self, window: &mut W, timeout: Option<u64>) -> Result<FormsResult, Error> {
        let mut canvas = Canvas::new(self.width as u32, self.height as u32)?;
        self.draw(&mut canvas);
        window.set_contents(&canvas)?;
        window.show()?;

        let deadline = timeout.map(|secs| Instant::now() + Duration::from_secs(secs));
        let mut next_poll = Instant::now() + POLL_INTERVAL;

        loop {
            let now = Instant::now();
            let mut wait = next_poll.saturating_duration_since(now);
            if let Some(deadline) = deadline {
                wait = wait.min(deadline.saturating_duration_since(now));
            }
            if let Some(due) = self.tooltip_due() {
                wait = wait.min(due.saturating_duration_since(now));
            }

            if let Some(event) = window.wait_for_event_timeout(wait)? {
                if let Some(result) = self.handle(event, window)? {
                    return Ok(result);
                }
                // Batch process pending events
                while let Some(event) = window.poll_for_event()? {
                    if let Some(result) = self.handle(event, window)? {
                        return Ok(result);
                    }
                }
            }

            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                tracing::debug!("timeout reached");
                return Ok(FormsResult::Timeout);
            }
            if now >= next_poll {
                next_poll = now + POLL_INTERVAL;
                self.dirty |= self.poll_sources();
            }
            self.dirty |= self.show_due_tooltip(now);

            if canvas.width() != self.width as u32 || canvas.height() != self.height as u32 {
                canvas = Canvas::new(self.width as u32, self.height as u32)?;
                self.dirty = true;
            }
            if self.dirty {
                self.dirty = false;
                self.draw(&mut canvas);
                window.set_contents(&canvas)?;
            }
            window.set_cursor(self.cursor_shape())?;
        }
    }

    fn draw(&self, canvas: &mut Canvas) {
        let cx = self.style.cx(self.pointer);
        let colors = cx.colors;
        canvas.fill(colors.window_bg);

        clipped(canvas, self.viewport, |canvas| self.draw_content(canvas, &cx));
        draw_scrollbar(canvas, self.viewport, self.scroll, self.viewport.h, self.layout.height, &cx);

        if let Some(menu) = &self.form.top_menu {
            canvas.fill_rect(self.menu_rect, colors.tab_inactive);
            canvas.fill_rect(Rect::new(0, self.menu_rect.bottom() - 1, self.width, 1), colors.frame);
            self.menu_bar.draw(menu, self.menu_rect, canvas, &cx);
        }
        self.draw_footer(canvas, &cx);
        self.ok.draw(canvas, &cx);
        if let Some(cancel) = &self.cancel {
            cancel.draw(canvas, &cx);
        }

        // Popups go above everything else.
        let fields = self.form.fields();
        for (i, (field, widget)) in fields.iter().zip(&self.widgets).enumerate() {
            if let Some(rect) = self.field_rect(i) {
                widget.draw_popup(field, rect, canvas, &cx);
            }
        }
        if let Some(menu) = &self.form.top_menu {
            self.menu_bar.draw_popup(menu, self.menu_rect, canvas, &cx);
        }

        self.draw_tooltip(canvas, &cx);
        if let Some(picker) = &self.picker {
            picker.draw(canvas, &cx);
        }
    }

    fn draw_content(&self, canvas: &mut Canvas, cx: &Ctx) {
        let colors = cx.colors;
        let dy = self.dy();
        let (header_bg, header_fg) = self.header_colors;
        let header_area = self.layout.header.map(|r| r.translate(0, dy));

        if let Some(area) = header_area {
            canvas.fill_rect(area, header_bg.unwrap_or(colors.tab_inactive));
        }
        if let (Some(rect), Some(label)) = (self.layout.form_label, &self.form.label) {
            draw_styled(canvas, &label.text, &label.style, rect.translate(0, dy), true, cx);
        }

        for frame in &self.layout.frames {
            let rect = frame.rect.translate(0, dy);
            match frame.kind {
                FrameKind::Group => {
                    canvas.stroke_rounded_rect(rect, 5.0 * cx.scale, colors.frame, 1.0);
                    if let Some(title) = &frame.title {
                        let line_h = cx.line_height();
                        let x = rect.x + cx.px(10.0);
                        let y = rect.y - line_h / 2;
                        let bg = match header_area {
                            Some(area) if area.contains(x, rect.y) => header_bg.unwrap_or(colors.tab_inactive),
                            _ => colors.window_bg,
                        };
                        let w = text_width(cx.font, title);
                        canvas.fill_rect(Rect::new(x - cx.px(4.0), y, w + cx.px(8.0), line_h), bg);
                        cx.font.render(title).with_color(colors.text).bold(true).draw(canvas, x, y);
                    }
                }
                FrameKind::TabPanel => canvas.stroke_rounded_rect(rect, 0.0, colors.frame, 1.0),
            }
        }

        for strip in &self.layout.tab_bars {
            let tabs: Vec<Rect> = strip.tabs.iter().map(|r| r.translate(0, dy)).collect();
            tab_bar::draw(canvas, &tabs, &strip.names, strip.current, cx);
        }

        let title_font = cx.fonts.ui_scaled(HEADER_TITLE_SCALE);
        for label in &self.layout.labels {
            let rect = label.rect.translate(0, dy);
            let color = if label.header { header_fg.unwrap_or(colors.text) } else { colors.text };
            let font = if label.title { &title_font } else { cx.font };
            font.render(&label.text)
                .with_color(color)
                .bold(label.title)
                .with_max_width(rect.w.max(1) as f32)
                .with_align(align_factor(label.align))
                .draw(canvas, rect.x, rect.y);
        }

        let fields = self.form.fields();
        for (i, (field, widget)) in fields.iter().zip(&self.widgets).enumerate() {
            let Some(rect) = self.field_rect(i) else {
                continue;
            };
            if rect.intersect(self.viewport).is_some() {
                widget.draw(field, rect, self.focus == Some(i), canvas, cx);
            }
        }
    }

    fn draw_footer(&self, canvas: &mut Canvas, cx: &Ctx) {
        let Some(area) = self.footer_rect else {
            return;
        };
        let colors = cx.colors;
        canvas.fill_rounded_rect(area, 5.0 * cx.scale, colors.input_bg);
        canvas.stroke_rounded_rect(area, 5.0 * cx.scale, colors.frame, 1.0);

        let inner = area.inset(cx.px(FOOTER_PADDING));
        let line_h = cx.line_height();
        clipped(canvas, inner, |canvas| {
            let mut y = inner.y;
            if let Some(name) = &self.form.settings.footer.name {
                cx.font.render(name).with_color(colors.text).bold(true).draw(canvas, inner.x, y);
                y += line_h;
            }
            for entry in self.footer.entries() {
                cx.font.render(entry).with_color(colors.text).draw(canvas, inner.x, y);
                y += line_h;
            }
            if let Some((kind, text)) = &self.footer.message {
                let color = match kind {
                    MessageKind::Info => colors.info,
                    MessageKind::Warning => colors.warning,
                    MessageKind::Error => colors.error,
                };
                let bottom = inner.bottom() - text.lines().count().max(1) as i32 * line_h;
                cx.font.render(text).with_color(color).draw(canvas, inner.x, y.max(bottom));
            }
        });
    }

    fn draw_tooltip(&self, canvas: &mut Canvas, cx: &Ctx) {
        let Some(hover) = self.hover.as_ref().filter(|h| h.shown) else {
            return;
        };
        let (Some(text), Some((px, py))) = (self.tooltip_text(hover.field), self.pointer) else {
            return;
        };
        let pad = cx.px(TOOLTIP_PADDING);
        let renderer = cx.font.render(&text).with_max_width(cx.px(TOOLTIP_MAX_WIDTH) as f32);
        let (w, h) = renderer.measure();
        let (w, h) = (w.ceil() as i32 + 2 * pad, h.ceil() as i32 + 2 * pad);

        let x = (px + cx.px(12.0)).min(self.width - w).max(0);
        let below = py + cx.px(18.0);
        let y = if below + h > self.height { (py - h - cx.px(4.0)).max(0) } else { below };
        canvas.fill_rounded_rect(Rect::new(x, y, w, h), 4.0 * cx.scale, cx.colors.tooltip_bg);
        renderer.with_color(cx.colors.tooltip_text).draw(canvas, x + pad, y + pad);
    }
}

fn field_mut(form: &mut Form, index: usize) -> Option<&mut Field> {
    form.fields_mut().into_iter().nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{FormArg, compile};

    fn form(args: &[(&str, Option<&str>)]) -> Form {
        compile(args.iter().map(|(name, value)| FormArg::new(*name, *value)))
    }

    #[test]
    fn exit_codes() {
        assert_eq!(FormsResult::Accepted.exit_code(), 0);
        assert_eq!(FormsResult::Cancelled.exit_code(), 1);
        assert_eq!(FormsResult::Closed.exit_code(), 255);
        assert_eq!(FormsResult::Timeout.exit_code(), 5);
        assert_eq!(FormsResult::MenuExit(42).exit_code(), 42);
    }

    #[test]
    fn families_come_from_styles_and_text_info_fonts() {
        let form = form(&[
            ("add-text", Some("Title")),
            ("font-family", Some("Serif")),
            ("add-text-info", Some("Log")),
            ("font", Some("Monospace 10")),
        ]);
        let families = font_families(&form);
        assert!(families.contains(&"Monospace".to_string()), "{families:?}");
    }
}
