//! Widgets for form fields.
//!
//! A field's value lives in its [`Field`]; a widget keeps only view state such as a
//! caret, a scroll offset or an open popup. The dialog passes every call the field and
//! the rectangle the field was placed in, both in window coordinates.

pub(crate) mod button;
pub(crate) mod calendar;
pub(crate) mod checkbox;
pub(crate) mod combo;
pub(crate) mod file_selection;
pub(crate) mod list_view;
pub(crate) mod menu_bar;
pub(crate) mod qr;
pub(crate) mod rule;
pub(crate) mod slider;
pub(crate) mod spin_box;
pub(crate) mod tab_bar;
pub(crate) mod text;
pub(crate) mod text_area;
pub(crate) mod text_input;

use crate::{
    backend::{CursorShape, Modifiers, MouseButton},
    error::Error,
    forms::model::{Field, FieldKind},
    render::{Canvas, Font, Fonts, Rect, Rgba},
    ui::Colors,
};

/// Everything a widget needs to size and paint itself.
pub(crate) struct Ctx<'a> {
    pub fonts: &'a Fonts,
    /// The interface font.
    pub font: &'a Font,
    pub colors: &'a Colors,
    pub scale: f32,
    /// Pointer position in window coordinates.
    pub pointer: Option<(i32, i32)>,
}

impl Ctx<'_> {
    /// Scales a logical length to pixels.
    pub fn px(&self, logical: f32) -> i32 {
        (logical * self.scale).round() as i32
    }

    pub fn hovered(&self, rect: Rect) -> bool {
        self.pointer.is_some_and(|(x, y)| rect.contains(x, y))
    }

    pub fn line_height(&self) -> i32 {
        self.font.line_height() as i32
    }
}

/// Input routed to a widget, in window coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Input {
    Press {
        x: i32,
        y: i32,
        button: MouseButton,
        modifiers: Modifiers,
        double: bool,
    },
    Release {
        x: i32,
        y: i32,
    },
    Motion {
        x: i32,
        y: i32,
    },
    /// Wheel movement: negative scrolls up.
    Scroll {
        x: i32,
        y: i32,
        delta: i32,
    },
    Key {
        keysym: u32,
        modifiers: Modifiers,
    },
    Text(char),
}

/// What a widget did with an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Response {
    Ignored,
    /// Consumed; only the view changed.
    Handled,
    /// The field value changed.
    Changed,
    /// The user asked to accept the dialog.
    Accept,
    /// A menu item was clicked: top-level index and submenu index.
    Menu { top: usize, sub: Option<usize> },
    OpenFilePicker,
}

impl Response {
    pub fn consumed(self) -> bool {
        self != Response::Ignored
    }
}

pub(crate) trait FieldWidget {
    /// Preferred width and height when `width` pixels are available.
    fn measure(&self, field: &Field, width: i32, cx: &Ctx) -> (i32, i32);

    /// Whether the widget stretches to the width of its row.
    fn fills_width(&self) -> bool {
        true
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx);

    fn event(&mut self, _field: &mut Field, _rect: Rect, _input: &Input, _cx: &Ctx) -> Response {
        Response::Ignored
    }

    fn focusable(&self, _field: &Field) -> bool {
        false
    }

    /// Called when keyboard focus enters or leaves the widget.
    fn set_focus(&mut self, _field: &mut Field, _focused: bool) -> Response {
        Response::Ignored
    }

    /// Area of an open popup, drawn above everything else.
    fn popup_rect(&self, _field: &Field, _rect: Rect, _cx: &Ctx) -> Option<Rect> {
        None
    }

    fn draw_popup(&self, _field: &Field, _rect: Rect, _canvas: &mut Canvas, _cx: &Ctx) {}

    fn close_popup(&mut self) {}

    fn cursor(&self, _field: &Field, _rect: Rect, _x: i32, _y: i32, _cx: &Ctx) -> CursorShape {
        CursorShape::Default
    }
}

/// Creates the widget for `field`.
pub(crate) fn build(field: &Field) -> Result<Box<dyn FieldWidget>, Error> {
    Ok(match &field.kind {
        FieldKind::Calendar {
            date,
        } => Box::new(calendar::Calendar::new(*date)),
        FieldKind::Checkbox {
            ..
        } => Box::new(checkbox::Checkbox),
        FieldKind::Entry {
            text,
            mode,
        } => Box::new(text_input::Entry::new(text, *mode)),
        FieldKind::Combo(_) => Box::new(combo::Combo::default()),
        FieldKind::List(_) => Box::new(list_view::ListView::default()),
        FieldKind::Scale(_) => Box::new(slider::Slider::default()),
        FieldKind::SpinBox(_) => Box::new(spin_box::SpinBox::default()),
        FieldKind::Text(_) => Box::new(text::Label),
        FieldKind::TextInfo(_) => Box::new(text_area::TextArea::default()),
        FieldKind::HRule {
            ..
        }
        | FieldKind::VSpacer {
            ..
        } => Box::new(rule::Rule),
        FieldKind::Menu(_) => Box::new(menu_bar::MenuField::default()),
        FieldKind::QrCode {
            text, ..
        } => Box::new(qr::Qr::new(text)?),
        FieldKind::FileSelection(sel) => Box::new(file_selection::FileSelection::new(&sel.path)),
    })
}

/// Runs `f` with drawing restricted to `rect` inside the current clip.
pub(crate) fn clipped(canvas: &mut Canvas, rect: Rect, f: impl FnOnce(&mut Canvas)) {
    let Some(area) = rect.intersect(canvas.clip_rect()) else {
        return;
    };
    let previous = canvas.set_clip(Some(area));
    f(canvas);
    canvas.set_clip(previous);
}

/// Background and border of an input box.
pub(crate) fn draw_frame(canvas: &mut Canvas, rect: Rect, focused: bool, cx: &Ctx) {
    let radius = 5.0 * cx.scale;
    let colors = cx.colors;
    let bg = if focused { colors.input_bg_focused } else { colors.input_bg };
    let border = if focused { colors.input_border_focused } else { colors.input_border };
    canvas.fill_rounded_rect(rect, radius, bg);
    canvas.stroke_rounded_rect(rect, radius, border, if focused { 2.0 } else { 1.0 });
}

pub(crate) fn draw_check(canvas: &mut Canvas, rect: Rect, checked: bool, focused: bool, cx: &Ctx) {
    let colors = cx.colors;
    let border = if focused { colors.input_border_focused } else { colors.input_border };
    canvas.fill_rounded_rect(rect, 3.0 * cx.scale, colors.input_bg);
    canvas.stroke_rounded_rect(rect, 3.0 * cx.scale, border, 1.0);

    if checked {
        let (x, y, s) = (rect.x as f32, rect.y as f32, rect.w as f32);
        canvas.stroke_polyline(
            &[
                (x + s * 0.22, y + s * 0.52),
                (x + s * 0.42, y + s * 0.72),
                (x + s * 0.78, y + s * 0.30),
            ],
            colors.input_border_focused,
            2.0 * cx.scale,
        );
    }
}

pub(crate) fn draw_radio(canvas: &mut Canvas, rect: Rect, checked: bool, cx: &Ctx) {
    let colors = cx.colors;
    let r = rect.w as f32 / 2.0;
    canvas.fill_rounded_rect(rect, r, colors.input_bg);
    canvas.stroke_rounded_rect(rect, r, colors.input_border, 1.0);

    if checked {
        let inner = rect.inset(rect.w / 4);
        canvas.fill_rounded_rect(inner, inner.w as f32 / 2.0, colors.input_border_focused);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

/// A small filled triangle centered in `rect`.
pub(crate) fn draw_arrow(canvas: &mut Canvas, rect: Rect, dir: Arrow, color: Rgba) {
    let cx = rect.x as f32 + rect.w as f32 / 2.0;
    let cy = rect.y as f32 + rect.h as f32 / 2.0;
    let s = (rect.w.min(rect.h) as f32 / 4.0).max(2.0);
    let points = match dir {
        Arrow::Up => [(cx - s, cy + s / 2.0), (cx + s, cy + s / 2.0), (cx, cy - s / 2.0)],
        Arrow::Down => [(cx - s, cy - s / 2.0), (cx + s, cy - s / 2.0), (cx, cy + s / 2.0)],
        Arrow::Left => [(cx + s / 2.0, cy - s), (cx + s / 2.0, cy + s), (cx - s / 2.0, cy)],
        Arrow::Right => [(cx - s / 2.0, cy - s), (cx - s / 2.0, cy + s), (cx + s / 2.0, cy)],
    };
    canvas.fill_triangle(points, color);
}

/// A vertical scrollbar along the right edge of `track`.
pub(crate) fn draw_scrollbar(
    canvas: &mut Canvas,
    track: Rect,
    offset: i32,
    visible: i32,
    total: i32,
    cx: &Ctx,
) {
    if total <= visible || track.h <= 0 {
        return;
    }
    let width = cx.px(6.0);
    let thumb_h = ((track.h as i64 * visible as i64 / total as i64) as i32).max(cx.px(20.0));
    let range = (total - visible).max(1);
    let thumb_y = track.y + ((track.h - thumb_h) as i64 * offset as i64 / range as i64) as i32;
    canvas.fill_rounded_rect(
        Rect::new(track.right() - width - cx.px(2.0), thumb_y, width, thumb_h),
        width as f32 / 2.0,
        cx.colors.scrollbar,
    );
}

/// Text drawn vertically centered in `rect`, starting at its left edge.
pub(crate) fn draw_text_centered(
    canvas: &mut Canvas,
    font: &Font,
    text: &str,
    rect: Rect,
    color: Rgba,
) {
    let y = rect.y + (rect.h - font.line_height() as i32) / 2;
    font.render(text).with_color(color).draw(canvas, rect.x, y);
}

/// Width of `text` in whole pixels.
pub(crate) fn text_width(font: &Font, text: &str) -> i32 {
    font.render(text).measure().0.ceil() as i32
}

/// Parses a color option, warning about values that are not colors.
pub(crate) fn parse_color(value: Option<&str>) -> Option<Rgba> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    let color = Rgba::parse(value);
    if color.is_none() {
        tracing::warn!(value, "unknown color");
    }
    color
}
