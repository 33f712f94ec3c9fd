//! Single-line text editing, and the entry field built on it.

use super::{Ctx, FieldWidget, Input, Response, clipped, draw_frame};
use crate::{
    backend::{CursorShape, Modifiers, keys},
    forms::model::{EntryMode, Field, FieldKind},
    render::{Canvas, Font, Rect, Rgba},
};

const INPUT_HEIGHT: f32 = 32.0;
const INPUT_PADDING: f32 = 8.0;
const MIN_INPUT_WIDTH: f32 = 200.0;

/// Characters a text input accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Filter {
    #[default]
    Any,
    Int,
    Float,
}

impl Filter {
    fn accepts(self, text: &str, cursor: usize, c: char) -> bool {
        match self {
            Filter::Any => !c.is_control(),
            Filter::Int => c.is_ascii_digit() || (c == '-' && cursor == 0 && !text.starts_with('-')),
            Filter::Float => {
                c.is_ascii_digit()
                    || (c == '.' && !text.contains('.'))
                    || (c == '-' && cursor == 0 && !text.starts_with('-'))
            }
        }
    }
}

/// Caret of a single-line editor. The edited string is owned by the caller.
#[derive(Debug, Clone, Default)]
pub(crate) struct TextInput {
    cursor: usize,
    pub filter: Filter,
    pub password: bool,
}

impl TextInput {
    pub fn new(text: &str) -> Self {
        Self {
            cursor: text.chars().count(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_password(mut self, password: bool) -> Self {
        self.password = password;
        self
    }

    /// Keeps the caret inside `text` after it changed behind the editor's back.
    pub fn clamp(&mut self, text: &str) {
        self.cursor = self.cursor.min(text.chars().count());
    }

    pub fn move_end(&mut self, text: &str) {
        self.cursor = text.chars().count();
    }

    /// Returns the display text (masked if password mode).
    fn display_text(&self, text: &str) -> String {
        if self.password {
            "*".repeat(text.chars().count())
        } else {
            text.to_string()
        }
    }

    /// Converts a character position to a byte position.
    fn byte_position(text: &str, char_pos: usize) -> usize {
        text.char_indices().nth(char_pos).map(|(i, _)| i).unwrap_or(text.len())
    }

    /// Inserts a typed character. Returns `Changed` if the filter let it through.
    pub fn insert_char(&mut self, text: &mut String, c: char) -> Response {
        self.clamp(text);
        if !self.filter.accepts(text, self.cursor, c) {
            return Response::Handled;
        }
        let byte_pos = Self::byte_position(text, self.cursor);
        text.insert(byte_pos, c);
        self.cursor += 1;
        Response::Changed
    }

    fn delete_before(&mut self, text: &mut String) -> Response {
        if self.cursor == 0 {
            return Response::Handled;
        }
        let start = Self::byte_position(text, self.cursor - 1);
        let end = Self::byte_position(text, self.cursor);
        text.drain(start..end);
        self.cursor -= 1;
        Response::Changed
    }

    fn delete_after(&mut self, text: &mut String) -> Response {
        if self.cursor >= text.chars().count() {
            return Response::Handled;
        }
        let start = Self::byte_position(text, self.cursor);
        let end = Self::byte_position(text, self.cursor + 1);
        text.drain(start..end);
        Response::Changed
    }

    /// Applies an editing key. Return and Enter yield `Accept`.
    pub fn handle_key(&mut self, text: &mut String, keysym: u32, modifiers: Modifiers) -> Response {
        self.clamp(text);
        let len = text.chars().count();
        let ctrl = modifiers.contains(Modifiers::CTRL);
        match keysym {
            keys::BACKSPACE => self.delete_before(text),
            keys::DELETE => self.delete_after(text),
            keys::LEFT => {
                self.cursor = if ctrl { 0 } else { self.cursor.saturating_sub(1) };
                Response::Handled
            }
            keys::RIGHT => {
                self.cursor = if ctrl { len } else { (self.cursor + 1).min(len) };
                Response::Handled
            }
            keys::HOME => {
                self.cursor = 0;
                Response::Handled
            }
            keys::END => {
                self.cursor = len;
                Response::Handled
            }
            keys::RETURN | keys::KP_ENTER => Response::Accept,
            _ => Response::Ignored,
        }
    }

    /// Moves the caret to the click position `x` inside the input box `rect`.
    pub fn click(&mut self, text: &str, rect: Rect, x: i32, cx: &Ctx) {
        let display = self.display_text(text);
        let pad = cx.px(INPUT_PADDING);
        let offset = self.scroll_offset(&display, rect, cx.font, pad);
        self.cursor = cx.font.index_at(&display, (x - rect.x - pad) as f32 + offset);
    }

    /// Horizontal scroll that keeps the caret visible.
    fn scroll_offset(&self, display: &str, rect: Rect, font: &Font, pad: i32) -> f32 {
        let visible = (rect.w - 2 * pad) as f32;
        let caret = font.caret_x(display, self.cursor);
        (caret - visible + 2.0).max(0.0)
    }

    /// Draws the box, the text and, when focused, the caret.
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        rect: Rect,
        text: &str,
        placeholder: &str,
        focused: bool,
        cx: &Ctx,
    ) {
        draw_frame(canvas, rect, focused, cx);
        self.draw_text(canvas, rect, text, placeholder, focused, cx.colors.text, cx);
    }

    /// Draws only the text and caret inside `rect`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &self,
        canvas: &mut Canvas,
        rect: Rect,
        text: &str,
        placeholder: &str,
        focused: bool,
        color: Rgba,
        cx: &Ctx,
    ) {
        let font = cx.font;
        let pad = cx.px(INPUT_PADDING);
        let inner = Rect::new(rect.x + pad, rect.y, (rect.w - 2 * pad).max(0), rect.h);
        let display = self.display_text(text);
        let offset = self.scroll_offset(&display, rect, font, pad) as i32;
        let text_y = rect.y + (rect.h - font.line_height() as i32) / 2;

        clipped(canvas, inner, |canvas| {
            if display.is_empty() && !focused {
                font.render(placeholder)
                    .with_color(cx.colors.input_placeholder)
                    .draw(canvas, inner.x, text_y);
            } else {
                font.render(&display).with_color(color).draw(canvas, inner.x - offset, text_y);
            }

            if focused {
                let caret = font.caret_x(&display, self.cursor.min(display.chars().count()));
                let x = inner.x - offset + caret as i32;
                let margin = cx.px(6.0);
                canvas.fill_rect(Rect::new(x, rect.y + margin, 1, rect.h - 2 * margin), color);
            }
        });
    }
}

/// `--add-entry` and `--add-password`.
pub(crate) struct Entry {
    input: TextInput,
}

impl Entry {
    pub fn new(text: &str, mode: EntryMode) -> Self {
        let filter = match mode {
            EntryMode::Int => Filter::Int,
            EntryMode::Float => Filter::Float,
            EntryMode::Text | EntryMode::Password => Filter::Any,
        };
        Self {
            input: TextInput::new(text)
                .with_filter(filter)
                .with_password(mode == EntryMode::Password),
        }
    }
}

impl FieldWidget for Entry {
    fn measure(&self, _field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        (cx.px(MIN_INPUT_WIDTH), cx.px(INPUT_HEIGHT))
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::Entry {
            text, ..
        } = &field.kind
        else {
            return;
        };
        self.input.draw(canvas, rect, text, "", focused, cx);
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::Entry {
            text, ..
        } = &mut field.kind
        else {
            return Response::Ignored;
        };

        match *input {
            Input::Press {
                x,
                y,
                ..
            } if rect.contains(x, y) => {
                self.input.click(text, rect, x, cx);
                Response::Handled
            }
            Input::Key {
                keysym,
                modifiers,
            } => self.input.handle_key(text, keysym, modifiers),
            Input::Text(c) => self.input.insert_char(text, c),
            _ => Response::Ignored,
        }
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }

    fn set_focus(&mut self, field: &mut Field, focused: bool) -> Response {
        if let FieldKind::Entry {
            text, ..
        } = &field.kind
        {
            if focused {
                self.input.move_end(text);
            }
        }
        Response::Ignored
    }

    fn cursor(&self, _field: &Field, _rect: Rect, _x: i32, _y: i32, _cx: &Ctx) -> CursorShape {
        CursorShape::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_the_caret() {
        let mut text = "héllo".to_string();
        let mut input = TextInput::new(&text);
        input.handle_key(&mut text, keys::LEFT, Modifiers::empty());
        input.handle_key(&mut text, keys::BACKSPACE, Modifiers::empty());
        assert_eq!(text, "hélo");
        input.handle_key(&mut text, keys::HOME, Modifiers::empty());
        input.insert_char(&mut text, '>');
        assert_eq!(text, ">hélo");
        input.handle_key(&mut text, keys::DELETE, Modifiers::empty());
        assert_eq!(text, ">élo");
    }

    #[test]
    fn numeric_filters() {
        let mut text = String::new();
        let mut input = TextInput::new(&text).with_filter(Filter::Int);
        for c in "-1a2.3".chars() {
            input.insert_char(&mut text, c);
        }
        assert_eq!(text, "-123");

        let mut text = String::new();
        let mut input = TextInput::new(&text).with_filter(Filter::Float);
        for c in "3.1.4-".chars() {
            input.insert_char(&mut text, c);
        }
        assert_eq!(text, "3.14");
    }

    #[test]
    fn return_accepts() {
        let mut text = String::from("x");
        let mut input = TextInput::new(&text);
        assert_eq!(input.handle_key(&mut text, keys::RETURN, Modifiers::empty()), Response::Accept);
        assert_eq!(input.handle_key(&mut text, keys::TAB, Modifiers::empty()), Response::Ignored);
    }

    #[test]
    fn caret_survives_external_reset() {
        let mut text = String::from("long text");
        let mut input = TextInput::new(&text);
        text.clear();
        assert_eq!(input.handle_key(&mut text, keys::BACKSPACE, Modifiers::empty()), Response::Handled);
        assert_eq!(input.insert_char(&mut text, 'a'), Response::Changed);
        assert_eq!(text, "a");
    }
}
