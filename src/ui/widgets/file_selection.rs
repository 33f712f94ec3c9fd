//! `--add-file-selection`: a path entry and a button that opens the file picker.

use super::{
    Ctx, FieldWidget, Input, Response,
    button::{ButtonState, draw_button, measure_button},
    text_input::TextInput,
};
use crate::{
    backend::{CursorShape, MouseButton},
    forms::model::{Field, FieldKind},
    render::{Canvas, Rect},
};

const HEIGHT: f32 = 32.0;
const MIN_WIDTH: f32 = 250.0;
const GAP: f32 = 6.0;
const DEFAULT_BUTTON: &str = "Browse\u{2026}";

pub(crate) struct FileSelection {
    input: TextInput,
    pressed: bool,
}

impl FileSelection {
    pub fn new(path: &str) -> Self {
        Self {
            input: TextInput::new(path),
            pressed: false,
        }
    }
}

fn button_label(text: &str) -> &str {
    if text.is_empty() { DEFAULT_BUTTON } else { text }
}

/// Entry and button areas of the field placed in `rect`.
fn parts(label: &str, rect: Rect, cx: &Ctx) -> (Rect, Rect) {
    let (button_w, _) = measure_button(label, cx);
    let button = Rect::new(rect.right() - button_w, rect.y, button_w, rect.h);
    let entry = Rect::new(rect.x, rect.y, (button.x - cx.px(GAP) - rect.x).max(0), rect.h);
    (entry, button)
}

impl FieldWidget for FileSelection {
    fn measure(&self, field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        let FieldKind::FileSelection(sel) = &field.kind else {
            return (0, 0);
        };
        let (button_w, _) = measure_button(button_label(&sel.button_text), cx);
        (cx.px(MIN_WIDTH).max(button_w * 2), cx.px(HEIGHT))
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::FileSelection(sel) = &field.kind else {
            return;
        };
        let label = button_label(&sel.button_text);
        let (entry, button) = parts(label, rect, cx);
        self.input.draw(canvas, entry, &sel.path, "", focused, cx);
        let state = ButtonState {
            hovered: cx.hovered(button),
            pressed: self.pressed,
            enabled: true,
            focused: false,
        };
        draw_button(canvas, button, label, state, cx);
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::FileSelection(sel) = &mut field.kind else {
            return Response::Ignored;
        };
        let (entry, button) = parts(button_label(&sel.button_text), rect, cx);

        match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } => {
                if button.contains(x, y) {
                    self.pressed = true;
                    Response::Handled
                } else if entry.contains(x, y) {
                    self.input.click(&sel.path, entry, x, cx);
                    Response::Handled
                } else {
                    Response::Ignored
                }
            }
            Input::Release {
                x,
                y,
            } if self.pressed => {
                self.pressed = false;
                if button.contains(x, y) { Response::OpenFilePicker } else { Response::Handled }
            }
            Input::Key {
                keysym,
                modifiers,
            } => self.input.handle_key(&mut sel.path, keysym, modifiers),
            Input::Text(c) => self.input.insert_char(&mut sel.path, c),
            _ => Response::Ignored,
        }
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }

    fn set_focus(&mut self, field: &mut Field, focused: bool) -> Response {
        if let FieldKind::FileSelection(sel) = &field.kind {
            if focused {
                self.input.move_end(&sel.path);
            }
        }
        Response::Ignored
    }

    fn cursor(&self, field: &Field, rect: Rect, x: i32, y: i32, cx: &Ctx) -> CursorShape {
        let FieldKind::FileSelection(sel) = &field.kind else {
            return CursorShape::Default;
        };
        let (entry, _) = parts(button_label(&sel.button_text), rect, cx);
        if entry.contains(x, y) { CursorShape::Text } else { CursorShape::Default }
    }
}
