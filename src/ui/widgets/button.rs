//! Push buttons: the dialog's OK and Cancel, the file picker's buttons, and the small
//! buttons embedded in fields.

use super::{Ctx, Input, text_width};
use crate::{
    backend::MouseButton,
    render::{Canvas, Rect},
};

const BASE_BUTTON_HEIGHT: f32 = 32.0;
const BASE_BUTTON_PADDING: f32 = 24.0;
const BASE_BUTTON_RADIUS: f32 = 5.0;
const BASE_MIN_BUTTON_WIDTH: f32 = 80.0;

/// Visual state of a button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ButtonState {
    pub hovered: bool,
    pub pressed: bool,
    pub enabled: bool,
    pub focused: bool,
}

/// A clickable button widget.
#[derive(Debug, Clone)]
pub(crate) struct Button {
    label: String,
    pub rect: Rect,
    hovered: bool,
    pressed: bool,
    clicked: bool,
    pub enabled: bool,
}

impl Button {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            rect: Rect::default(),
            hovered: false,
            pressed: false,
            clicked: false,
            enabled: true,
        }
    }

    /// Width and height the button asks for.
    pub fn measure(&self, cx: &Ctx) -> (i32, i32) {
        measure_button(&self.label, cx)
    }

    /// Returns true if the button was clicked since the last call.
    pub fn was_clicked(&mut self) -> bool {
        let clicked = self.clicked;
        self.clicked = false;
        clicked
    }

    /// Tracks hover and press state. Returns true if the button needs a redraw.
    pub fn process(&mut self, input: &Input) -> bool {
        if !self.enabled {
            let changed = self.hovered || self.pressed;
            self.hovered = false;
            self.pressed = false;
            return changed;
        }
        match *input {
            Input::Motion {
                x,
                y,
            } => {
                let hovered = self.rect.contains(x, y);
                let changed = hovered != self.hovered;
                self.hovered = hovered;
                changed
            }
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } if self.rect.contains(x, y) => {
                self.hovered = true;
                self.pressed = true;
                true
            }
            Input::Release {
                x,
                y,
            } if self.pressed => {
                if self.rect.contains(x, y) {
                    self.clicked = true;
                }
                self.pressed = false;
                true
            }
            _ => false,
        }
    }

    pub fn draw(&self, canvas: &mut Canvas, cx: &Ctx) {
        let state = ButtonState {
            hovered: self.hovered,
            pressed: self.pressed,
            enabled: self.enabled,
            focused: false,
        };
        draw_button(canvas, self.rect, &self.label, state, cx);
    }
}

pub(crate) fn measure_button(label: &str, cx: &Ctx) -> (i32, i32) {
    let width = (text_width(cx.font, label) + cx.px(BASE_BUTTON_PADDING) * 2)
        .max(cx.px(BASE_MIN_BUTTON_WIDTH));
    (width, cx.px(BASE_BUTTON_HEIGHT))
}

/// Paints a button with a centered label.
pub(crate) fn draw_button(canvas: &mut Canvas, rect: Rect, label: &str, state: ButtonState, cx: &Ctx) {
    let colors = cx.colors;
    let radius = BASE_BUTTON_RADIUS * cx.scale;

    let bg = if !state.enabled {
        colors.button.with_alpha(140)
    } else if state.pressed {
        colors.button_pressed
    } else if state.hovered {
        colors.button_hover
    } else {
        colors.button
    };
    canvas.fill_rounded_rect(rect, radius, bg);

    let outline = if state.focused { colors.input_border_focused } else { colors.button_outline };
    canvas.stroke_rounded_rect(rect, radius, outline, 1.0);

    let color = if state.enabled { colors.button_text } else { colors.text_disabled };
    let font = cx.font;
    let text_w = text_width(font, label);
    let x = rect.x + (rect.w - text_w) / 2;
    let y = rect.y + (rect.h - font.line_height() as i32) / 2;
    font.render(label).with_color(color).draw(canvas, x, y);
}
