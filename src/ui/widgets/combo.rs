//! `--add-combo`: a drop-down list, optionally with an editable text.

use super::{
    Arrow, Ctx, FieldWidget, Input, Response, clipped, draw_arrow, draw_frame, draw_scrollbar,
    draw_text_centered, text_input::TextInput, text_width,
};
use crate::{
    backend::{CursorShape, keys},
    forms::model::{ComboField, Field, FieldKind},
    render::{Canvas, Rect},
};

const HEIGHT: f32 = 32.0;
const ARROW_WIDTH: f32 = 28.0;
const PADDING: f32 = 8.0;
const ITEM_HEIGHT: f32 = 26.0;
const MAX_VISIBLE_ITEMS: usize = 8;

#[derive(Default)]
pub(crate) struct Combo {
    open: bool,
    /// Item under the keyboard highlight while the popup is open.
    highlight: usize,
    /// First item shown in the popup.
    first: usize,
    input: TextInput,
}

impl Combo {
    fn open_popup(&mut self, combo: &ComboField) {
        self.open = true;
        self.highlight = combo.current.unwrap_or(0);
        self.first = self.highlight.saturating_sub(MAX_VISIBLE_ITEMS - 1);
    }

    fn visible_items(combo: &ComboField) -> usize {
        combo.items.len().min(MAX_VISIBLE_ITEMS)
    }

    fn popup(&self, combo: &ComboField, rect: Rect, cx: &Ctx) -> Option<Rect> {
        if !self.open || combo.items.is_empty() {
            return None;
        }
        let h = Self::visible_items(combo) as i32 * cx.px(ITEM_HEIGHT) + 2;
        Some(Rect::new(rect.x, rect.bottom() + 1, rect.w, h))
    }

    fn item_at(&self, popup: Rect, y: i32, cx: &Ctx) -> usize {
        self.first + ((y - popup.y - 1) / cx.px(ITEM_HEIGHT)).max(0) as usize
    }

    fn scroll_to(&mut self, index: usize) {
        if index < self.first {
            self.first = index;
        } else if index >= self.first + MAX_VISIBLE_ITEMS {
            self.first = index + 1 - MAX_VISIBLE_ITEMS;
        }
    }

    fn key(&mut self, combo: &mut ComboField, keysym: u32, input: &Input) -> Response {
        let count = combo.items.len();
        if self.open {
            match keysym {
                keys::UP => self.highlight = self.highlight.saturating_sub(1),
                keys::DOWN => self.highlight = (self.highlight + 1).min(count.saturating_sub(1)),
                keys::RETURN | keys::KP_ENTER => {
                    self.open = false;
                    combo.select(self.highlight);
                    self.input.move_end(&combo.edit_text);
                    return Response::Changed;
                }
                keys::ESCAPE => self.open = false,
                _ => return Response::Handled,
            }
            self.scroll_to(self.highlight);
            return Response::Handled;
        }

        match keysym {
            keys::UP | keys::DOWN if count > 0 => {
                let current = combo.current.unwrap_or(0);
                let next = if keysym == keys::UP {
                    current.saturating_sub(1)
                } else {
                    (current + 1).min(count - 1)
                };
                if combo.current == Some(next) {
                    return Response::Handled;
                }
                combo.select(next);
                self.input.move_end(&combo.edit_text);
                Response::Changed
            }
            _ if combo.editable => {
                let Input::Key {
                    keysym,
                    modifiers,
                } = *input
                else {
                    return Response::Ignored;
                };
                match self.input.handle_key(&mut combo.edit_text, keysym, modifiers) {
                    Response::Accept => Response::Ignored,
                    other => other,
                }
            }
            _ => Response::Ignored,
        }
    }
}

impl FieldWidget for Combo {
    fn measure(&self, field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        let FieldKind::Combo(combo) = &field.kind else {
            return (0, 0);
        };
        let widest = combo.items.iter().map(|i| text_width(cx.font, i)).max().unwrap_or(0);
        let width = widest + cx.px(ARROW_WIDTH + PADDING * 2.0);
        (width.max(cx.px(120.0)), cx.px(HEIGHT))
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::Combo(combo) = &field.kind else {
            return;
        };
        let (text_rect, arrow_rect) = rect.split_right(cx.px(ARROW_WIDTH));

        if combo.editable {
            self.input.draw(canvas, rect, &combo.edit_text, "", focused, cx);
            canvas.fill_rect(
                Rect::new(arrow_rect.x, rect.y + cx.px(6.0), 1, rect.h - cx.px(12.0)),
                cx.colors.input_border,
            );
        } else {
            draw_frame(canvas, rect, focused || self.open, cx);
            let inner = Rect::new(
                text_rect.x + cx.px(PADDING),
                rect.y,
                text_rect.w - cx.px(PADDING),
                rect.h,
            );
            clipped(canvas, inner, |canvas| {
                draw_text_centered(canvas, cx.font, combo.current_text(), inner, cx.colors.text);
            });
        }

        let arrow = if self.open { Arrow::Up } else { Arrow::Down };
        draw_arrow(canvas, arrow_rect.inset(cx.px(6.0)), arrow, cx.colors.text);
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::Combo(combo) = &mut field.kind else {
            return Response::Ignored;
        };

        match *input {
            Input::Press {
                x,
                y,
                ..
            } => {
                if let Some(popup) = self.popup(combo, rect, cx) {
                    self.open = false;
                    let index = self.item_at(popup, y, cx);
                    if popup.contains(x, y) && index < combo.items.len() {
                        combo.select(index);
                        self.input.move_end(&combo.edit_text);
                        return Response::Changed;
                    }
                    return Response::Handled;
                }
                if !rect.contains(x, y) {
                    return Response::Ignored;
                }
                let (text_rect, _) = rect.split_right(cx.px(ARROW_WIDTH));
                if combo.editable && text_rect.contains(x, y) {
                    self.input.click(&combo.edit_text, rect, x, cx);
                } else if !combo.items.is_empty() {
                    self.open_popup(combo);
                }
                Response::Handled
            }
            Input::Motion {
                x,
                y,
            } => match self.popup(combo, rect, cx) {
                Some(popup) if popup.contains(x, y) => {
                    let index = self.item_at(popup, y, cx).min(combo.items.len().saturating_sub(1));
                    let changed = index != self.highlight;
                    self.highlight = index;
                    if changed { Response::Handled } else { Response::Ignored }
                }
                _ => Response::Ignored,
            },
            Input::Scroll {
                delta, ..
            } if self.open => {
                let max_first = combo.items.len().saturating_sub(MAX_VISIBLE_ITEMS);
                self.first = (self.first as i64 + delta as i64).clamp(0, max_first as i64) as usize;
                Response::Handled
            }
            Input::Key {
                keysym, ..
            } => self.key(combo, keysym, input),
            Input::Text(c) if combo.editable && !self.open => {
                self.input.insert_char(&mut combo.edit_text, c)
            }
            Input::Text(' ') if !self.open && !combo.items.is_empty() => {
                self.open_popup(combo);
                Response::Handled
            }
            _ => Response::Ignored,
        }
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }

    fn set_focus(&mut self, field: &mut Field, focused: bool) -> Response {
        if !focused {
            self.open = false;
        } else if let FieldKind::Combo(combo) = &field.kind {
            self.input.move_end(&combo.edit_text);
        }
        Response::Ignored
    }

    fn popup_rect(&self, field: &Field, rect: Rect, cx: &Ctx) -> Option<Rect> {
        let FieldKind::Combo(combo) = &field.kind else {
            return None;
        };
        self.popup(combo, rect, cx)
    }

    fn draw_popup(&self, field: &Field, rect: Rect, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::Combo(combo) = &field.kind else {
            return;
        };
        let Some(popup) = self.popup(combo, rect, cx) else {
            return;
        };
        let colors = cx.colors;
        canvas.fill_rect(popup, colors.popup_bg);
        canvas.stroke_rounded_rect(popup, 0.0, colors.input_border, 1.0);

        let item_h = cx.px(ITEM_HEIGHT);
        let visible = Self::visible_items(combo);
        for (row, index) in (self.first..combo.items.len()).take(visible).enumerate() {
            let item_rect = Rect::new(popup.x + 1, popup.y + 1 + row as i32 * item_h, popup.w - 2, item_h);
            let selected = index == self.highlight;
            if selected {
                canvas.fill_rect(item_rect, colors.selection);
            }
            let color = if selected { colors.selection_text } else { colors.text };
            let text_rect = Rect::new(item_rect.x + cx.px(PADDING), item_rect.y, item_rect.w, item_h);
            clipped(canvas, item_rect, |canvas| {
                draw_text_centered(canvas, cx.font, &combo.items[index], text_rect, color);
            });
        }

        draw_scrollbar(
            canvas,
            popup.inset(1),
            self.first as i32,
            visible as i32,
            combo.items.len() as i32,
            cx,
        );
    }

    fn close_popup(&mut self) {
        self.open = false;
    }

    fn cursor(&self, field: &Field, _rect: Rect, _x: i32, _y: i32, _cx: &Ctx) -> CursorShape {
        match &field.kind {
            FieldKind::Combo(combo) if combo.editable && !self.open => CursorShape::Text,
            _ => CursorShape::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Modifiers;

    fn combo(items: &[&str]) -> ComboField {
        let mut combo = ComboField::default();
        combo.set_items(items.iter().map(|s| s.to_string()).collect());
        combo
    }

    fn key(keysym: u32) -> Input {
        Input::Key {
            keysym,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn arrows_step_through_items_when_closed() {
        let mut field = combo(&["a", "b", "c"]);
        let mut widget = Combo::default();
        assert_eq!(widget.key(&mut field, keys::DOWN, &key(keys::DOWN)), Response::Changed);
        assert_eq!(field.current_text(), "b");
        widget.key(&mut field, keys::DOWN, &key(keys::DOWN));
        assert_eq!(widget.key(&mut field, keys::DOWN, &key(keys::DOWN)), Response::Handled);
        assert_eq!(field.current_text(), "c");
    }

    #[test]
    fn popup_selection_with_keys() {
        let mut field = combo(&["a", "b", "c"]);
        let mut widget = Combo::default();
        widget.open_popup(&field);
        widget.key(&mut field, keys::DOWN, &key(keys::DOWN));
        widget.key(&mut field, keys::DOWN, &key(keys::DOWN));
        assert_eq!(widget.key(&mut field, keys::RETURN, &key(keys::RETURN)), Response::Changed);
        assert!(!widget.open);
        assert_eq!(field.current, Some(2));
    }

    #[test]
    fn escape_only_closes_the_popup() {
        let mut field = combo(&["a", "b"]);
        let mut widget = Combo::default();
        widget.open_popup(&field);
        assert_eq!(widget.key(&mut field, keys::ESCAPE, &key(keys::ESCAPE)), Response::Handled);
        assert!(!widget.open);
        assert_eq!(widget.key(&mut field, keys::ESCAPE, &key(keys::ESCAPE)), Response::Ignored);
    }
}
