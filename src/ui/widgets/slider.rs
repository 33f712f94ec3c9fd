//! `--add-scale`: a horizontal slider with the current value beside it.

use super::{Ctx, FieldWidget, Input, Response, draw_text_centered, text_width};
use crate::{
    backend::{MouseButton, keys},
    forms::model::{Field, FieldKind, ScaleField},
    render::{Canvas, Rect},
};

const HEIGHT: f32 = 32.0;
const TRACK_HEIGHT: f32 = 8.0;
const THUMB_SIZE: f32 = 20.0;
const VALUE_GAP: f32 = 10.0;
const MIN_WIDTH: f32 = 200.0;
const PAGE_STEPS: i32 = 10;

#[derive(Default)]
pub(crate) struct Slider {
    dragging: bool,
}

/// Track and value areas of a slider placed in `rect`.
struct Parts {
    track: Rect,
    value: Option<Rect>,
    thumb: i32,
}

impl Parts {
    fn new(scale: &ScaleField, rect: Rect, cx: &Ctx) -> Self {
        let value_w = if scale.hide_value {
            0
        } else {
            let widest = [scale.min, scale.max]
                .iter()
                .map(|v| text_width(cx.font, &v.to_string()))
                .max()
                .unwrap_or(0);
            widest + cx.px(VALUE_GAP)
        };
        let (track, value) = rect.split_right(value_w);
        Self {
            track,
            value: (!scale.hide_value).then_some(value),
            thumb: cx.px(THUMB_SIZE),
        }
    }

    fn thumb_x(&self, scale: &ScaleField) -> i32 {
        let range = (scale.max - scale.min) as f32;
        let ratio = if range > 0.0 { (scale.value - scale.min) as f32 / range } else { 0.0 };
        self.track.x + (ratio * (self.track.w - self.thumb).max(0) as f32) as i32
    }

    /// Value under `x`, snapped to the step.
    fn value_at(&self, scale: &ScaleField, x: i32) -> i32 {
        let start = self.track.x + self.thumb / 2;
        let width = self.track.w - self.thumb;
        let ratio = if width > 0 { ((x - start) as f32 / width as f32).clamp(0.0, 1.0) } else { 0.0 };
        let raw = scale.min as f32 + ratio * (scale.max - scale.min) as f32;
        let step = scale.step.max(1) as f32;
        let snapped = scale.min + (((raw - scale.min as f32) / step).round() * step) as i32;
        snapped.clamp(scale.min, scale.max.max(scale.min))
    }
}

fn change(changed: bool) -> Response {
    if changed { Response::Changed } else { Response::Handled }
}

impl FieldWidget for Slider {
    fn measure(&self, _field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        (cx.px(MIN_WIDTH), cx.px(HEIGHT))
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::Scale(scale) = &field.kind else {
            return;
        };
        let colors = cx.colors;
        let parts = Parts::new(scale, rect, cx);
        let track_h = cx.px(TRACK_HEIGHT);
        let radius = track_h as f32 / 2.0;
        let track = Rect::new(
            parts.track.x,
            rect.y + (rect.h - track_h) / 2,
            parts.track.w,
            track_h,
        );

        canvas.fill_rounded_rect(track, radius, colors.input_bg);
        let thumb_x = parts.thumb_x(scale);
        let filled = (thumb_x - track.x + parts.thumb / 2).min(track.w);
        if filled > 0 {
            canvas.fill_rounded_rect(Rect::new(track.x, track.y, filled, track.h), radius, colors.selection);
        }
        canvas.stroke_rounded_rect(track, radius, colors.input_border, 1.0);

        let thumb = Rect::new(thumb_x, rect.y + (rect.h - parts.thumb) / 2, parts.thumb, parts.thumb);
        let fill = if self.dragging {
            colors.button_pressed
        } else if cx.hovered(thumb) {
            colors.button_hover
        } else {
            colors.button
        };
        let outline = if focused { colors.input_border_focused } else { colors.button_outline };
        let r = parts.thumb as f32 / 2.0;
        canvas.fill_rounded_rect(thumb, r, fill);
        canvas.stroke_rounded_rect(thumb, r, outline, if focused { 2.0 } else { 1.0 });

        if let Some(value) = parts.value {
            let text = scale.value.to_string();
            let x = value.right() - text_width(cx.font, &text);
            draw_text_centered(canvas, cx.font, &text, Rect::new(x, value.y, value.w, value.h), colors.text);
        }
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::Scale(scale) = &mut field.kind else {
            return Response::Ignored;
        };
        let parts = Parts::new(scale, rect, cx);
        let step = scale.step.max(1);

        match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } if parts.track.contains(x, y) => {
                self.dragging = true;
                change(scale.set_value(parts.value_at(scale, x)))
            }
            Input::Motion {
                x, ..
            } if self.dragging => change(scale.set_value(parts.value_at(scale, x))),
            Input::Release {
                ..
            } if self.dragging => {
                self.dragging = false;
                Response::Handled
            }
            Input::Scroll {
                delta, ..
            } => {
                let value = scale.value - delta * step;
                if scale.set_value(value) { Response::Changed } else { Response::Ignored }
            }
            Input::Key {
                keysym, ..
            } => {
                let value = match keysym {
                    keys::LEFT | keys::DOWN => scale.value - step,
                    keys::RIGHT | keys::UP => scale.value + step,
                    keys::PAGE_DOWN => scale.value - step * PAGE_STEPS,
                    keys::PAGE_UP => scale.value + step * PAGE_STEPS,
                    keys::HOME => scale.min,
                    keys::END => scale.max,
                    _ => return Response::Ignored,
                };
                change(scale.set_value(value))
            }
            _ => Response::Ignored,
        }
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(min: i32, max: i32, step: i32) -> ScaleField {
        ScaleField {
            min,
            max,
            step,
            value: min,
            ..Default::default()
        }
    }

    #[test]
    fn positions_snap_to_the_step() {
        let field = scale(0, 100, 10);
        let parts = Parts {
            track: Rect::new(0, 0, 120, 32),
            value: None,
            thumb: 20,
        };
        assert_eq!(parts.value_at(&field, 10), 0);
        assert_eq!(parts.value_at(&field, 60), 50);
        assert_eq!(parts.value_at(&field, 64), 50);
        assert_eq!(parts.value_at(&field, 500), 100);
        assert_eq!(parts.value_at(&field, -40), 0);
    }

    #[test]
    fn thumb_follows_the_value() {
        let mut field = scale(0, 10, 1);
        let parts = Parts {
            track: Rect::new(5, 0, 120, 32),
            value: None,
            thumb: 20,
        };
        assert_eq!(parts.thumb_x(&field), 5);
        field.set_value(10);
        assert_eq!(parts.thumb_x(&field), 105);
    }
}
