use super::{Ctx, FieldWidget, parse_color};
use crate::{
    forms::model::{Field, FieldKind},
    render::{Canvas, Rect},
};

const RULE_HEIGHT: f32 = 9.0;

/// `--add-hrule` and `--add-vspacer`.
pub(crate) struct Rule;

impl FieldWidget for Rule {
    fn measure(&self, field: &Field, width: i32, cx: &Ctx) -> (i32, i32) {
        match &field.kind {
            FieldKind::VSpacer {
                height,
            } => (0, cx.px(*height as f32)),
            _ => (width, cx.px(RULE_HEIGHT)),
        }
    }

    fn draw(&self, field: &Field, rect: Rect, _focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::HRule {
            color,
        } = &field.kind
        else {
            return;
        };
        let color = parse_color(color.as_deref()).unwrap_or(cx.colors.input_border);
        let thickness = cx.px(1.0).max(1);
        canvas.fill_rect(Rect::new(rect.x, rect.y + (rect.h - thickness) / 2, rect.w, thickness), color);
    }
}
