use super::{Ctx, FieldWidget, Input, Response, draw_check, draw_text_centered, text_width};
use crate::{
    backend::MouseButton,
    forms::model::{Field, FieldKind},
    render::{Canvas, Rect},
};

const BOX_SIZE: f32 = 18.0;
const GAP: f32 = 8.0;
const HEIGHT: f32 = 24.0;

/// `--add-checkbox`: a box followed by its text.
pub(crate) struct Checkbox;

impl FieldWidget for Checkbox {
    fn measure(&self, field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        let FieldKind::Checkbox {
            text, ..
        } = &field.kind
        else {
            return (0, 0);
        };
        let width = cx.px(BOX_SIZE + GAP) + text_width(cx.font, text);
        (width, cx.px(HEIGHT).max(cx.line_height()))
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::Checkbox {
            text,
            checked,
            ..
        } = &field.kind
        else {
            return;
        };
        let size = cx.px(BOX_SIZE);
        let box_rect = Rect::new(rect.x, rect.y + (rect.h - size) / 2, size, size);
        draw_check(canvas, box_rect, *checked, focused, cx);

        let text_x = box_rect.right() + cx.px(GAP);
        let text_rect = Rect::new(text_x, rect.y, rect.right() - text_x, rect.h);
        draw_text_centered(canvas, cx.font, text, text_rect, cx.colors.text);
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, _cx: &Ctx) -> Response {
        let FieldKind::Checkbox {
            checked, ..
        } = &mut field.kind
        else {
            return Response::Ignored;
        };
        let toggle = match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } => rect.contains(x, y),
            Input::Text(' ') => true,
            _ => false,
        };
        if !toggle {
            return Response::Ignored;
        }
        *checked = !*checked;
        Response::Changed
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }
}
