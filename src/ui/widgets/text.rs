//! Styled text: the `--add-text` label and the form label above the fields.

use super::{Ctx, FieldWidget, parse_color};
use crate::{
    forms::model::{Align, Field, FieldKind, TextStyle},
    render::{Canvas, Font, Rect},
};

/// `--add-text`.
pub(crate) struct Label;

fn font_for(style: &TextStyle, cx: &Ctx) -> Font {
    if style.font_family.is_none() && style.font_size.is_none() {
        return cx.font.clone();
    }
    cx.fonts.styled(style.font_family.as_deref(), style.font_size)
}

pub(crate) fn align_factor(align: Align) -> f32 {
    match align {
        Align::Left => 0.0,
        Align::Center => 0.5,
        Align::Right => 1.0,
    }
}

/// Size of `text` drawn with `style`, wrapped at `width` when `wrap` is set.
pub(crate) fn measure_styled(text: &str, style: &TextStyle, width: i32, wrap: bool, cx: &Ctx) -> (i32, i32) {
    let font = font_for(style, cx);
    let renderer = font.render(text).bold(style.bold).small_caps(style.small_caps);
    let renderer = if wrap { renderer.with_max_width(width.max(1) as f32) } else { renderer };
    let (w, h) = renderer.measure();
    (w.ceil() as i32, (h.ceil() as i32).max(font.line_height() as i32))
}

/// Draws `text` inside `rect`, aligned and colored per `style`.
pub(crate) fn draw_styled(canvas: &mut Canvas, text: &str, style: &TextStyle, rect: Rect, wrap: bool, cx: &Ctx) {
    if let Some(background) = parse_color(style.background.as_deref()) {
        canvas.fill_rect(rect, background);
    }
    let color = parse_color(style.foreground.as_deref()).unwrap_or(cx.colors.text);
    let font = font_for(style, cx);
    let renderer = font
        .render(text)
        .with_color(color)
        .bold(style.bold)
        .italic(style.italic)
        .underline(style.underline)
        .small_caps(style.small_caps);
    let align = align_factor(style.align);

    if wrap {
        renderer
            .with_max_width(rect.w as f32)
            .with_align(align)
            .draw(canvas, rect.x, rect.y);
    } else {
        let width = renderer.measure().0;
        let x = rect.x + ((rect.w as f32 - width) * align).max(0.0) as i32;
        renderer.draw(canvas, x, rect.y);
    }
}

impl FieldWidget for Label {
    fn measure(&self, field: &Field, width: i32, cx: &Ctx) -> (i32, i32) {
        let FieldKind::Text(text) = &field.kind else {
            return (0, 0);
        };
        measure_styled(&text.text, &text.style, width, text.wrap, cx)
    }

    fn draw(&self, field: &Field, rect: Rect, _focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::Text(text) = &field.kind else {
            return;
        };
        draw_styled(canvas, &text.text, &text.style, rect, text.wrap, cx);
    }
}
