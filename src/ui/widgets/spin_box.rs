//! `--add-spin-box` and `--add-double-spin-box`.

use super::{
    Arrow, Ctx, FieldWidget, Input, Response, draw_arrow, draw_frame,
    text_input::{Filter, TextInput},
};
use crate::{
    backend::{CursorShape, MouseButton, keys},
    forms::model::{Field, FieldKind, SpinField},
    render::{Canvas, Rect},
};

const HEIGHT: f32 = 32.0;
const MIN_WIDTH: f32 = 140.0;
const BUTTON_WIDTH: f32 = 22.0;
const PAGE_STEPS: f64 = 10.0;

/// Text typed by the user, applied on Return or when focus leaves.
struct Edit {
    text: String,
    input: TextInput,
}

#[derive(Default)]
pub(crate) struct SpinBox {
    edit: Option<Edit>,
}

impl SpinBox {
    fn begin_edit(&mut self, spin: &SpinField) -> &mut Edit {
        self.edit.get_or_insert_with(|| {
            let text = spin.value_text();
            let filter = if spin.integer { Filter::Int } else { Filter::Float };
            Edit {
                input: TextInput::new(&text).with_filter(filter),
                text,
            }
        })
    }

    /// Applies the edit buffer. Unparsable text restores the previous value.
    fn commit(&mut self, spin: &mut SpinField) -> Response {
        let Some(edit) = self.edit.take() else {
            return Response::Ignored;
        };
        let before = spin.value;
        match edit.text.trim().parse::<f64>() {
            Ok(value) => spin.set_value(value),
            Err(_) => tracing::debug!(text = %edit.text, "discarding spin box text"),
        }
        if spin.value != before { Response::Changed } else { Response::Handled }
    }

    fn step(&mut self, spin: &mut SpinField, steps: f64) -> Response {
        self.commit(spin);
        let before = spin.value;
        spin.step_by(steps);
        if spin.value != before { Response::Changed } else { Response::Handled }
    }
}

/// Areas of the up and down buttons in `rect`.
fn buttons(rect: Rect, cx: &Ctx) -> (Rect, Rect) {
    let (_, column) = rect.split_right(cx.px(BUTTON_WIDTH));
    let half = column.h / 2;
    (
        Rect::new(column.x, column.y, column.w, half),
        Rect::new(column.x, column.y + half, column.w, column.h - half),
    )
}

impl FieldWidget for SpinBox {
    fn measure(&self, _field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        (cx.px(MIN_WIDTH), cx.px(HEIGHT))
    }

    fn fills_width(&self) -> bool {
        false
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::SpinBox(spin) = &field.kind else {
            return;
        };
        let colors = cx.colors;
        draw_frame(canvas, rect, focused, cx);

        let (text_rect, _) = rect.split_right(cx.px(BUTTON_WIDTH));
        match &self.edit {
            Some(edit) => edit.input.draw_text(canvas, text_rect, &edit.text, "", focused, colors.text, cx),
            None => {
                let shown = spin.display_text();
                TextInput::new(&shown).draw_text(canvas, text_rect, &shown, "", false, colors.text, cx);
            }
        }

        let (up, down) = buttons(rect, cx);
        for (button, arrow) in [(up, Arrow::Up), (down, Arrow::Down)] {
            if cx.hovered(button) {
                canvas.fill_rect(button.inset(1), colors.button_hover);
            }
            draw_arrow(canvas, button.inset(cx.px(3.0)), arrow, colors.text);
        }
        canvas.fill_rect(Rect::new(up.x, up.y + cx.px(4.0), 1, rect.h - cx.px(8.0)), colors.input_border);
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::SpinBox(spin) = &mut field.kind else {
            return Response::Ignored;
        };

        match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } if rect.contains(x, y) => {
                let (up, down) = buttons(rect, cx);
                if up.contains(x, y) {
                    self.step(spin, 1.0)
                } else if down.contains(x, y) {
                    self.step(spin, -1.0)
                } else {
                    let (text_rect, _) = rect.split_right(cx.px(BUTTON_WIDTH));
                    let edit = self.begin_edit(spin);
                    edit.input.click(&edit.text, text_rect, x, cx);
                    Response::Handled
                }
            }
            Input::Scroll {
                delta, ..
            } => self.step(spin, -delta as f64),
            Input::Key {
                keysym,
                modifiers,
            } => match keysym {
                keys::UP => self.step(spin, 1.0),
                keys::DOWN => self.step(spin, -1.0),
                keys::PAGE_UP => self.step(spin, PAGE_STEPS),
                keys::PAGE_DOWN => self.step(spin, -PAGE_STEPS),
                keys::RETURN | keys::KP_ENTER if self.edit.is_some() => self.commit(spin),
                keys::ESCAPE if self.edit.is_some() => {
                    self.edit = None;
                    Response::Handled
                }
                _ => {
                    let edit = self.begin_edit(spin);
                    match edit.input.handle_key(&mut edit.text, keysym, modifiers) {
                        Response::Changed => Response::Handled,
                        other => other,
                    }
                }
            },
            Input::Text(c) => {
                let edit = self.begin_edit(spin);
                edit.input.insert_char(&mut edit.text, c);
                Response::Handled
            }
            _ => Response::Ignored,
        }
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }

    fn set_focus(&mut self, field: &mut Field, focused: bool) -> Response {
        match &mut field.kind {
            FieldKind::SpinBox(spin) if !focused => self.commit(spin),
            _ => Response::Ignored,
        }
    }

    fn cursor(&self, _field: &Field, rect: Rect, x: i32, _y: i32, cx: &Ctx) -> CursorShape {
        if x < rect.right() - cx.px(BUTTON_WIDTH) {
            CursorShape::Text
        } else {
            CursorShape::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Modifiers;

    #[test]
    fn typed_value_applies_on_commit() {
        let mut spin = SpinField::double();
        spin.max = 50.0;
        let mut widget = SpinBox::default();
        let edit = widget.begin_edit(&spin);
        edit.input.handle_key(&mut edit.text, keys::BACKSPACE, Modifiers::empty());
        for c in "12.346".chars() {
            edit.input.insert_char(&mut edit.text, c);
        }
        assert_eq!(spin.value, 0.0);
        assert_eq!(widget.commit(&mut spin), Response::Changed);
        assert_eq!(spin.value, 12.35);
    }

    #[test]
    fn out_of_range_text_clamps() {
        let mut spin = SpinField::integer();
        let mut widget = SpinBox::default();
        let edit = widget.begin_edit(&spin);
        edit.text = "500".to_string();
        widget.commit(&mut spin);
        assert_eq!(spin.value, 99.0);
    }

    #[test]
    fn stepping_discards_nothing() {
        let mut spin = SpinField::integer();
        let mut widget = SpinBox::default();
        widget.begin_edit(&spin).text = "7".to_string();
        assert_eq!(widget.step(&mut spin, 1.0), Response::Changed);
        assert_eq!(spin.value, 8.0);
    }
}
