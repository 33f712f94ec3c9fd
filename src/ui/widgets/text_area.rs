//! `--add-text-info` and `--add-text-browser`: a scrolling text box, editable on request.

use super::{Ctx, FieldWidget, Input, Response, clipped, draw_frame, draw_scrollbar, parse_color};
use crate::{
    backend::{CursorShape, MouseButton, keys},
    forms::model::{Field, FieldKind, TextInfoField},
    render::{Canvas, Font, Rect},
};

const MIN_WIDTH: f32 = 200.0;
const HEIGHT: f32 = 150.0;
const PADDING: f32 = 6.0;
const WHEEL_LINES: i32 = 3;

#[derive(Default)]
pub(crate) struct TextArea {
    /// Vertical scroll in pixels.
    scroll: i32,
    /// Caret as a char index, used when editable.
    caret: usize,
}

/// Splits a Pango-style font name such as `Monospace Bold 12` into family and size.
pub(crate) fn parse_font(spec: &str) -> (Option<&str>, Option<f32>) {
    let spec = spec.trim();
    match spec.rsplit_once(' ') {
        Some((family, size)) => match size.parse::<f32>() {
            Ok(size) => (Some(family.trim()).filter(|f| !f.is_empty()), Some(size)),
            Err(_) => (Some(spec), None),
        },
        None => match spec.parse::<f32>() {
            Ok(size) => (None, Some(size)),
            Err(_) => (Some(spec).filter(|f| !f.is_empty()), None),
        },
    }
}

fn font_for(info: &TextInfoField, cx: &Ctx) -> Font {
    let (family, size) = match info.font.as_deref() {
        Some(spec) => parse_font(spec),
        None => (info.style.font_family.as_deref(), info.style.font_size),
    };
    if family.is_none() && size.is_none() {
        cx.font.clone()
    } else {
        cx.fonts.styled(family, size)
    }
}

/// Line and column of char index `caret`.
fn line_col(text: &str, caret: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    for c in text.chars().take(caret) {
        if c == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Char index of `col` on `line`, clamped to the line's end.
fn index_of(text: &str, line: usize, col: usize) -> usize {
    let mut index = 0;
    for (i, l) in text.split('\n').enumerate() {
        let len = l.chars().count();
        if i == line {
            return index + col.min(len);
        }
        index += len + 1;
    }
    text.chars().count()
}

fn byte_at(text: &str, index: usize) -> usize {
    text.char_indices().nth(index).map_or(text.len(), |(i, _)| i)
}

impl TextArea {
    fn inner(rect: Rect, cx: &Ctx) -> Rect {
        rect.inset(cx.px(PADDING))
    }

    fn content_height(info: &TextInfoField, width: i32, font: &Font) -> i32 {
        if info.editable {
            let lines = info.text.split('\n').count() as f32;
            (lines * font.line_height()).ceil() as i32
        } else {
            font.render(&info.plain_text()).with_max_width(width.max(1) as f32).measure().1.ceil() as i32
        }
    }

    fn scroll_by(&mut self, delta: i32, info: &TextInfoField, inner: Rect, font: &Font) -> bool {
        let max = (Self::content_height(info, inner.w, font) - inner.h).max(0);
        let scroll = (self.scroll + delta).clamp(0, max);
        let changed = scroll != self.scroll;
        self.scroll = scroll;
        changed
    }

    fn keep_caret_visible(&mut self, text: &str, inner: Rect, font: &Font) {
        let line_h = font.line_height() as i32;
        let top = line_col(text, self.caret).0 as i32 * line_h;
        if top < self.scroll {
            self.scroll = top;
        } else if top + line_h > self.scroll + inner.h {
            self.scroll = top + line_h - inner.h;
        }
    }

    fn insert(&mut self, text: &mut String, s: &str) {
        self.caret = self.caret.min(text.chars().count());
        text.insert_str(byte_at(text, self.caret), s);
        self.caret += s.chars().count();
    }

    fn key(&mut self, text: &mut String, keysym: u32) -> Response {
        let len = text.chars().count();
        self.caret = self.caret.min(len);
        let (line, col) = line_col(text, self.caret);
        match keysym {
            keys::BACKSPACE if self.caret > 0 => {
                let start = byte_at(text, self.caret - 1);
                let end = byte_at(text, self.caret);
                text.drain(start..end);
                self.caret -= 1;
                return Response::Changed;
            }
            keys::DELETE if self.caret < len => {
                let start = byte_at(text, self.caret);
                let end = byte_at(text, self.caret + 1);
                text.drain(start..end);
                return Response::Changed;
            }
            keys::BACKSPACE | keys::DELETE => {}
            keys::RETURN | keys::KP_ENTER => {
                self.insert(text, "\n");
                return Response::Changed;
            }
            keys::LEFT => self.caret = self.caret.saturating_sub(1),
            keys::RIGHT => self.caret = (self.caret + 1).min(len),
            keys::UP if line > 0 => self.caret = index_of(text, line - 1, col),
            keys::DOWN => self.caret = index_of(text, line + 1, col),
            keys::HOME => self.caret = index_of(text, line, 0),
            keys::END => self.caret = index_of(text, line, usize::MAX),
            keys::UP => self.caret = 0,
            _ => return Response::Ignored,
        }
        Response::Handled
    }

    fn click(&mut self, text: &str, inner: Rect, (x, y): (i32, i32), font: &Font) {
        let line_h = (font.line_height() as i32).max(1);
        let line = ((y - inner.y + self.scroll).max(0) / line_h) as usize;
        let content = text.split('\n').nth(line).unwrap_or("");
        let col = font.index_at(content, (x - inner.x) as f32);
        self.caret = index_of(text, line, col);
    }
}

impl FieldWidget for TextArea {
    fn measure(&self, _field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        (cx.px(MIN_WIDTH), cx.px(HEIGHT))
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::TextInfo(info) = &field.kind else {
            return;
        };
        let font = font_for(info, cx);
        let inner = Self::inner(rect, cx);
        draw_frame(canvas, rect, focused, cx);
        if let Some(background) = parse_color(info.style.background.as_deref()) {
            canvas.fill_rounded_rect(rect.inset(1), 5.0 * cx.scale, background);
        }
        let color = parse_color(info.style.foreground.as_deref()).unwrap_or(cx.colors.text);
        let style = &info.style;

        clipped(canvas, inner, |canvas| {
            if info.editable {
                let line_h = font.line_height() as i32;
                for (i, line) in info.text.split('\n').enumerate() {
                    let y = inner.y + i as i32 * line_h - self.scroll;
                    if y + line_h < inner.y || y > inner.bottom() {
                        continue;
                    }
                    font.render(line)
                        .with_color(color)
                        .bold(style.bold)
                        .italic(style.italic)
                        .underline(style.underline)
                        .draw(canvas, inner.x, y);
                }
                if focused {
                    let (line, col) = line_col(&info.text, self.caret);
                    let content = info.text.split('\n').nth(line).unwrap_or("");
                    let x = inner.x + font.caret_x(content, col) as i32;
                    let y = inner.y + line as i32 * line_h - self.scroll;
                    canvas.fill_rect(Rect::new(x, y, 1, line_h), color);
                }
            } else {
                font.render(&info.plain_text())
                    .with_color(color)
                    .bold(style.bold)
                    .italic(style.italic)
                    .underline(style.underline)
                    .with_max_width(inner.w as f32)
                    .draw(canvas, inner.x, inner.y - self.scroll);
            }
        });

        let total = Self::content_height(info, inner.w, &font);
        draw_scrollbar(canvas, rect.inset(1), self.scroll, inner.h, total, cx);
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::TextInfo(info) = &mut field.kind else {
            return Response::Ignored;
        };
        let font = font_for(info, cx);
        let inner = Self::inner(rect, cx);
        let line_h = font.line_height() as i32;

        match *input {
            Input::Scroll {
                delta, ..
            } => {
                if self.scroll_by(delta * WHEEL_LINES * line_h, info, inner, &font) {
                    Response::Handled
                } else {
                    Response::Ignored
                }
            }
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } if rect.contains(x, y) && info.editable => {
                self.click(&info.text, inner, (x, y), &font);
                Response::Handled
            }
            Input::Key {
                keysym, ..
            } if info.editable => {
                let response = self.key(&mut info.text, keysym);
                if response.consumed() {
                    self.keep_caret_visible(&info.text, inner, &font);
                }
                response
            }
            Input::Key {
                keysym, ..
            } => {
                let page = inner.h.max(line_h);
                let delta = match keysym {
                    keys::UP => -line_h,
                    keys::DOWN => line_h,
                    keys::PAGE_UP => -page,
                    keys::PAGE_DOWN => page,
                    keys::HOME => -self.scroll,
                    keys::END => i32::MAX / 2,
                    _ => return Response::Ignored,
                };
                self.scroll_by(delta, info, inner, &font);
                Response::Handled
            }
            Input::Text(c) if info.editable => {
                let mut buf = [0; 4];
                self.insert(&mut info.text, c.encode_utf8(&mut buf));
                self.keep_caret_visible(&info.text, inner, &font);
                Response::Changed
            }
            _ => Response::Ignored,
        }
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }

    fn set_focus(&mut self, field: &mut Field, focused: bool) -> Response {
        if let FieldKind::TextInfo(info) = &field.kind {
            if focused {
                self.caret = self.caret.min(info.text.chars().count());
            }
        }
        Response::Ignored
    }

    fn cursor(&self, field: &Field, _rect: Rect, _x: i32, _y: i32, _cx: &Ctx) -> CursorShape {
        match &field.kind {
            FieldKind::TextInfo(info) if info.editable => CursorShape::Text,
            _ => CursorShape::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_names_split_into_family_and_size() {
        assert_eq!(parse_font("Monospace 12"), (Some("Monospace"), Some(12.0)));
        assert_eq!(parse_font("DejaVu Sans Mono 9.5"), (Some("DejaVu Sans Mono"), Some(9.5)));
        assert_eq!(parse_font("Serif"), (Some("Serif"), None));
        assert_eq!(parse_font("14"), (None, Some(14.0)));
    }

    #[test]
    fn vertical_moves_keep_the_column() {
        let mut text = "abcdef\nxy\n12345".to_string();
        let mut area = TextArea {
            scroll: 0,
            caret: 4,
        };
        area.key(&mut text, keys::DOWN);
        assert_eq!(line_col(&text, area.caret), (1, 2));
        area.key(&mut text, keys::DOWN);
        assert_eq!(line_col(&text, area.caret), (2, 2));
        area.key(&mut text, keys::END);
        assert_eq!(area.caret, text.chars().count());
    }

    #[test]
    fn return_inserts_a_newline() {
        let mut text = "ab".to_string();
        let mut area = TextArea {
            scroll: 0,
            caret: 1,
        };
        assert_eq!(area.key(&mut text, keys::RETURN), Response::Changed);
        assert_eq!(text, "a\nb");
        assert_eq!(area.key(&mut text, keys::BACKSPACE), Response::Changed);
        assert_eq!(text, "ab");
    }
}
