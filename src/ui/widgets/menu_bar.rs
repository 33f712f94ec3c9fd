//! Menu bars: the `--add-menu` field and the window's top menu.

use super::{Ctx, FieldWidget, Input, Response, draw_text_centered, text_width};
use crate::{
    backend::{MouseButton, keys},
    forms::{
        menu::{Menu, MenuEntry, MenuItem},
        model::{Field, FieldKind},
    },
    render::{Canvas, Rect},
};

pub(crate) const BAR_HEIGHT: f32 = 28.0;
const ENTRY_PADDING: f32 = 10.0;
const ITEM_HEIGHT: f32 = 26.0;
const POPUP_MIN_WIDTH: f32 = 140.0;
const SUBMENU_MARK: &str = " \u{25be}";

/// A row of menu entries with at most one submenu open.
#[derive(Default)]
pub(crate) struct MenuBar {
    open: Option<usize>,
}

fn entry_label(entry: &MenuEntry) -> String {
    match entry {
        MenuEntry::Item(item) => item.name.clone(),
        MenuEntry::Submenu {
            name, ..
        } => format!("{name}{SUBMENU_MARK}"),
        MenuEntry::Separator(text) => text.clone(),
    }
}

impl MenuBar {
    fn entry_rects(menu: &Menu, rect: Rect, cx: &Ctx) -> Vec<Rect> {
        let pad = cx.px(ENTRY_PADDING);
        let mut x = rect.x;
        menu.entries
            .iter()
            .map(|entry| {
                let w = text_width(cx.font, &entry_label(entry)) + 2 * pad;
                let r = Rect::new(x, rect.y, w, rect.h);
                x += w;
                r
            })
            .collect()
    }

    pub fn measure(menu: &Menu, cx: &Ctx) -> (i32, i32) {
        let width = Self::entry_rects(menu, Rect::default(), cx).iter().map(|r| r.w).sum();
        (width, cx.px(BAR_HEIGHT))
    }

    fn submenu_items(menu: &Menu, index: usize) -> Option<&[MenuItem]> {
        match menu.entries.get(index)? {
            MenuEntry::Submenu {
                items, ..
            } => Some(items),
            _ => None,
        }
    }

    pub fn popup_rect(&self, menu: &Menu, rect: Rect, cx: &Ctx) -> Option<Rect> {
        let index = self.open?;
        let items = Self::submenu_items(menu, index)?;
        let anchor = *Self::entry_rects(menu, rect, cx).get(index)?;
        let pad = cx.px(ENTRY_PADDING);
        let widest = items.iter().map(|i| text_width(cx.font, &i.name)).max().unwrap_or(0);
        let w = (widest + 2 * pad).max(cx.px(POPUP_MIN_WIDTH));
        let h = items.len() as i32 * cx.px(ITEM_HEIGHT) + 2;
        Some(Rect::new(anchor.x, anchor.bottom(), w, h))
    }

    pub fn draw(&self, menu: &Menu, rect: Rect, canvas: &mut Canvas, cx: &Ctx) {
        let colors = cx.colors;
        let pad = cx.px(ENTRY_PADDING);
        for (index, (entry, r)) in menu.entries.iter().zip(Self::entry_rects(menu, rect, cx)).enumerate() {
            let separator = matches!(entry, MenuEntry::Separator(_));
            if !separator && (self.open == Some(index) || cx.hovered(r)) {
                canvas.fill_rect(r, colors.button_hover);
            }
            let color = if separator { colors.text_disabled } else { colors.text };
            let text_rect = Rect::new(r.x + pad, r.y, r.w - pad, r.h);
            draw_text_centered(canvas, cx.font, &entry_label(entry), text_rect, color);
        }
    }

    pub fn draw_popup(&self, menu: &Menu, rect: Rect, canvas: &mut Canvas, cx: &Ctx) {
        let (Some(popup), Some(items)) =
            (self.popup_rect(menu, rect, cx), self.open.and_then(|i| Self::submenu_items(menu, i)))
        else {
            return;
        };
        let colors = cx.colors;
        let item_h = cx.px(ITEM_HEIGHT);
        let pad = cx.px(ENTRY_PADDING);
        canvas.fill_rect(popup, colors.popup_bg);
        canvas.stroke_rounded_rect(popup, 0.0, colors.input_border, 1.0);
        for (i, item) in items.iter().enumerate() {
            let r = Rect::new(popup.x + 1, popup.y + 1 + i as i32 * item_h, popup.w - 2, item_h);
            let hovered = cx.hovered(r);
            if hovered {
                canvas.fill_rect(r, colors.selection);
            }
            let color = if hovered { colors.selection_text } else { colors.text };
            draw_text_centered(canvas, cx.font, &item.name, Rect::new(r.x + pad, r.y, r.w - pad, r.h), color);
        }
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn event(&mut self, menu: &Menu, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } => {
                if let (Some(popup), Some(top)) = (self.popup_rect(menu, rect, cx), self.open.take()) {
                    if popup.contains(x, y) {
                        let sub = ((y - popup.y - 1) / cx.px(ITEM_HEIGHT)).max(0) as usize;
                        if menu.item(top, Some(sub)).is_some() {
                            return Response::Menu {
                                top,
                                sub: Some(sub),
                            };
                        }
                        return Response::Handled;
                    }
                    // A second click on the open entry only closes it.
                    let anchor = Self::entry_rects(menu, rect, cx).get(top).copied();
                    if anchor.is_some_and(|r| r.contains(x, y)) {
                        return Response::Handled;
                    }
                }
                if !rect.contains(x, y) {
                    return Response::Ignored;
                }
                let rects = Self::entry_rects(menu, rect, cx);
                let Some(index) = rects.iter().position(|r| r.contains(x, y)) else {
                    return Response::Handled;
                };
                match &menu.entries[index] {
                    MenuEntry::Item(_) => Response::Menu {
                        top: index,
                        sub: None,
                    },
                    MenuEntry::Submenu {
                        ..
                    } => {
                        self.open = Some(index);
                        Response::Handled
                    }
                    MenuEntry::Separator(_) => Response::Handled,
                }
            }
            Input::Motion {
                x,
                y,
            } if self.open.is_some() => {
                let rects = Self::entry_rects(menu, rect, cx);
                match rects.iter().position(|r| r.contains(x, y)) {
                    Some(index) if Some(index) != self.open && Self::submenu_items(menu, index).is_some() => {
                        self.open = Some(index);
                        Response::Handled
                    }
                    _ => Response::Handled,
                }
            }
            Input::Key {
                keysym: keys::ESCAPE,
                ..
            } if self.open.is_some() => {
                self.open = None;
                Response::Handled
            }
            _ => Response::Ignored,
        }
    }
}

/// `--add-menu`.
#[derive(Default)]
pub(crate) struct MenuField {
    bar: MenuBar,
}

impl FieldWidget for MenuField {
    fn measure(&self, field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        match &field.kind {
            FieldKind::Menu(menu) => MenuBar::measure(menu, cx),
            _ => (0, 0),
        }
    }

    fn draw(&self, field: &Field, rect: Rect, _focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        if let FieldKind::Menu(menu) = &field.kind {
            self.bar.draw(menu, rect, canvas, cx);
        }
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        match &field.kind {
            FieldKind::Menu(menu) => self.bar.event(menu, rect, input, cx),
            _ => Response::Ignored,
        }
    }

    fn popup_rect(&self, field: &Field, rect: Rect, cx: &Ctx) -> Option<Rect> {
        match &field.kind {
            FieldKind::Menu(menu) => self.bar.popup_rect(menu, rect, cx),
            _ => None,
        }
    }

    fn draw_popup(&self, field: &Field, rect: Rect, canvas: &mut Canvas, cx: &Ctx) {
        if let FieldKind::Menu(menu) = &field.kind {
            self.bar.draw_popup(menu, rect, canvas, cx);
        }
    }

    fn close_popup(&mut self) {
        self.bar.close();
    }
}
