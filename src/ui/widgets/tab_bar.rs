//! The strip of tab buttons above a tab panel.

use super::{Ctx, text_width};
use crate::render::{Canvas, Rect};

pub(crate) const STRIP_HEIGHT: f32 = 32.0;
const TAB_PADDING: f32 = 14.0;
const TAB_GAP: f32 = 2.0;

/// Button areas of the tabs named `names`, laid out left to right in `strip`.
pub(crate) fn tab_rects<S: AsRef<str>>(names: &[S], strip: Rect, cx: &Ctx) -> Vec<Rect> {
    let pad = cx.px(TAB_PADDING);
    let gap = cx.px(TAB_GAP);
    let mut x = strip.x;
    names
        .iter()
        .map(|name| {
            let w = text_width(cx.font, name.as_ref()) + 2 * pad;
            let r = Rect::new(x, strip.y, w, strip.h);
            x += w + gap;
            r
        })
        .collect()
}

pub(crate) fn tab_at(tabs: &[Rect], x: i32, y: i32) -> Option<usize> {
    tabs.iter().position(|r| r.contains(x, y))
}

pub(crate) fn draw<S: AsRef<str>>(canvas: &mut Canvas, tabs: &[Rect], names: &[S], current: usize, cx: &Ctx) {
    let colors = cx.colors;
    let radius = 5.0 * cx.scale;
    for (i, (r, name)) in tabs.iter().zip(names).enumerate() {
        let selected = i == current;
        // Extend below the strip so only the top corners show rounded.
        let shape = Rect::new(r.x, r.y, r.w, r.h + cx.px(6.0));
        let fill = if selected {
            colors.window_bg
        } else if cx.hovered(*r) {
            colors.button_hover
        } else {
            colors.tab_inactive
        };
        super::clipped(canvas, *r, |canvas| {
            canvas.fill_rounded_rect(shape, radius, fill);
            canvas.stroke_rounded_rect(shape, radius, colors.frame, 1.0);
        });

        let font = cx.font;
        let color = if selected { colors.text } else { colors.text_disabled };
        font.render(name.as_ref())
            .with_color(color)
            .bold(selected)
            .with_max_width(r.w as f32)
            .with_align(0.5)
            .draw(canvas, r.x, r.y + (r.h - cx.line_height()) / 2);
    }
}
