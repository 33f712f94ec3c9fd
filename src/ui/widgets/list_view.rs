//! `--add-list`: a table with optional check or radio column, in-place cell editing and
//! an add-row button.

use super::{
    Ctx, FieldWidget, Input, Response,
    button::{ButtonState, draw_button},
    clipped, draw_check, draw_frame, draw_radio, draw_scrollbar, draw_text_centered,
    text_input::TextInput,
    text_width,
};
use crate::{
    backend::{Modifiers, MouseButton, keys},
    forms::model::{CheckMode, Field, FieldKind, ListField},
    render::{Canvas, Rect},
};

const ROW_HEIGHT: f32 = 26.0;
const CELL_PADDING: f32 = 6.0;
const CHECK_SIZE: f32 = 16.0;
const LIST_HEIGHT: f32 = 180.0;
const ADD_BUTTON_HEIGHT: f32 = 28.0;
const ADD_BUTTON_GAP: f32 = 6.0;
const MIN_WIDTH: f32 = 200.0;
const ADD_ROW_LABEL: &str = "+";
/// Rows scanned when sizing columns.
const SIZING_ROWS: usize = 200;

/// A cell being edited in place.
struct CellEdit {
    row: usize,
    column: usize,
    text: String,
    input: TextInput,
}

#[derive(Default)]
pub(crate) struct ListView {
    /// First visible row.
    first: usize,
    /// Row under the keyboard cursor.
    cursor: usize,
    edit: Option<CellEdit>,
    add_pressed: bool,
}

/// Areas of the list inside its field rectangle.
struct Geometry {
    frame: Rect,
    header: Option<Rect>,
    body: Rect,
    add_button: Option<Rect>,
    row_h: i32,
    /// Left edge and width of each column, in window coordinates.
    columns: Vec<(i32, i32)>,
}

impl Geometry {
    fn new(list: &ListField, rect: Rect, cx: &Ctx) -> Self {
        let row_h = cx.px(ROW_HEIGHT);
        let (frame, add_button) = if list.add_row_button {
            let bh = cx.px(ADD_BUTTON_HEIGHT);
            let gap = cx.px(ADD_BUTTON_GAP);
            let frame = Rect::new(rect.x, rect.y, rect.w, (rect.h - bh - gap).max(row_h));
            let width = bh.max(cx.px(40.0));
            (frame, Some(Rect::new(rect.x, frame.bottom() + gap, width, bh)))
        } else {
            (rect, None)
        };

        let inner = frame.inset(1);
        let header = (list.show_header && !list.columns.is_empty())
            .then(|| Rect::new(inner.x, inner.y, inner.w, row_h));
        let top = header.map_or(inner.y, |h| h.bottom());
        let body = Rect::new(inner.x, top, inner.w, inner.bottom() - top);

        Self {
            frame,
            header,
            body,
            add_button,
            row_h,
            columns: column_widths(list, inner, cx),
        }
    }

    fn visible_rows(&self) -> usize {
        (self.body.h / self.row_h.max(1)).max(1) as usize
    }

    fn row_at(&self, first: usize, y: i32) -> Option<usize> {
        if y < self.body.y || y >= self.body.bottom() {
            return None;
        }
        Some(first + ((y - self.body.y) / self.row_h) as usize)
    }

    fn column_at(&self, x: i32) -> Option<usize> {
        self.columns.iter().position(|&(left, w)| x >= left && x < left + w)
    }

    fn cell(&self, first: usize, row: usize, column: usize) -> Option<Rect> {
        let (left, w) = *self.columns.get(column)?;
        let offset = row.checked_sub(first)? as i32;
        Some(Rect::new(left, self.body.y + offset * self.row_h, w, self.row_h))
    }
}

/// Splits `inner` among the columns in proportion to their content.
fn column_widths(list: &ListField, inner: Rect, cx: &Ctx) -> Vec<(i32, i32)> {
    let count = list.column_count();
    let pad = cx.px(CELL_PADDING) * 2;
    let check_w = cx.px(CHECK_SIZE) + pad;

    let mut wanted: Vec<i32> = (0..count)
        .map(|c| {
            if c == 0 && list.check_mode != CheckMode::Off {
                return check_w;
            }
            let header = list.columns.get(c).map_or(0, |h| text_width(cx.font, h));
            let cells = list
                .rows
                .iter()
                .take(SIZING_ROWS)
                .filter_map(|r| r.get(c))
                .map(|v| text_width(cx.font, v))
                .max()
                .unwrap_or(0);
            header.max(cells).max(cx.px(30.0)) + pad
        })
        .collect();

    let total: i32 = wanted.iter().sum();
    let available = inner.w;
    if total < available {
        if let Some(last) = wanted.last_mut() {
            *last += available - total;
        }
    } else if total > 0 {
        let fixed = if list.check_mode != CheckMode::Off { check_w } else { 0 };
        let flexible = (total - fixed).max(1);
        let room = (available - fixed).max(0);
        for (c, w) in wanted.iter_mut().enumerate() {
            if c == 0 && fixed > 0 {
                continue;
            }
            *w = (*w as i64 * room as i64 / flexible as i64) as i32;
        }
    }

    let mut x = inner.x;
    wanted
        .into_iter()
        .map(|w| {
            let col = (x, w);
            x += w;
            col
        })
        .collect()
}

impl ListView {
    fn clamp_scroll(&mut self, list: &ListField, visible: usize) {
        let max_first = list.rows.len().saturating_sub(visible);
        self.first = self.first.min(max_first);
    }

    fn ensure_visible(&mut self, row: usize, visible: usize) {
        if row < self.first {
            self.first = row;
        } else if row >= self.first + visible {
            self.first = row + 1 - visible;
        }
    }

    /// Writes an in-place edit back to the list.
    fn commit_edit(&mut self, list: &mut ListField) -> Response {
        let Some(edit) = self.edit.take() else {
            return Response::Ignored;
        };
        match list.rows.get_mut(edit.row).and_then(|r| r.get_mut(edit.column)) {
            Some(cell) if *cell != edit.text => {
                *cell = edit.text;
                Response::Changed
            }
            _ => Response::Handled,
        }
    }

    fn start_edit(&mut self, list: &ListField, row: usize, column: usize) {
        if !list.is_cell_editable(column) {
            return;
        }
        let Some(text) = list.rows.get(row).and_then(|r| r.get(column)).cloned() else {
            return;
        };
        self.edit = Some(CellEdit {
            row,
            column,
            input: TextInput::new(&text),
            text,
        });
    }

    /// First column that can be edited, if any.
    fn first_editable_column(list: &ListField) -> Option<usize> {
        (0..list.column_count()).find(|&c| list.is_cell_editable(c))
    }

    fn press(
        &mut self,
        list: &mut ListField,
        geo: &Geometry,
        (x, y): (i32, i32),
        modifiers: Modifiers,
        double: bool,
    ) -> Response {
        let mut response = self.commit_edit(list);

        if let Some(button) = geo.add_button {
            if button.contains(x, y) {
                self.add_pressed = true;
                return Response::Handled;
            }
        }
        if !geo.frame.contains(x, y) {
            return response;
        }
        let Some(row) = geo.row_at(self.first, y).filter(|&r| r < list.rows.len()) else {
            return response.max_with(Response::Handled);
        };
        let column = geo.column_at(x).unwrap_or(0);
        self.cursor = row;

        if list.check_mode != CheckMode::Off && column == 0 {
            list.toggle_check(row);
            return Response::Changed;
        }

        let extend = modifiers.contains(Modifiers::CTRL);
        let before = list.selected.clone();
        list.select(row, extend);
        if list.selected != before {
            response = Response::Changed;
        }

        if double {
            self.start_edit(list, row, column);
        }
        response.max_with(Response::Handled)
    }

    fn key(&mut self, list: &mut ListField, keysym: u32, modifiers: Modifiers, visible: usize) -> Response {
        if let Some(edit) = &mut self.edit {
            return match keysym {
                keys::ESCAPE => {
                    self.edit = None;
                    Response::Handled
                }
                keys::RETURN | keys::KP_ENTER => self.commit_edit(list),
                _ => match edit.input.handle_key(&mut edit.text, keysym, modifiers) {
                    Response::Ignored => Response::Handled,
                    other => other,
                },
            };
        }

        let count = list.rows.len();
        if count == 0 {
            return Response::Ignored;
        }
        let target = match keysym {
            keys::UP => self.cursor.saturating_sub(1),
            keys::DOWN => (self.cursor + 1).min(count - 1),
            keys::PAGE_UP => self.cursor.saturating_sub(visible),
            keys::PAGE_DOWN => (self.cursor + visible).min(count - 1),
            keys::HOME => 0,
            keys::END => count - 1,
            keys::RETURN | keys::KP_ENTER if list.editable => {
                if let Some(column) = Self::first_editable_column(list) {
                    self.start_edit(list, self.cursor, column);
                    return Response::Handled;
                }
                return Response::Ignored;
            }
            _ => return Response::Ignored,
        };
        self.cursor = target;
        self.ensure_visible(target, visible);
        if list.check_mode == CheckMode::Off {
            list.select(target, false);
            return Response::Changed;
        }
        Response::Handled
    }

    fn add_row(&mut self, list: &mut ListField, visible: usize) -> Response {
        list.add_row();
        let row = list.rows.len() - 1;
        self.cursor = row;
        self.ensure_visible(row, visible);
        if let Some(column) = Self::first_editable_column(list) {
            self.start_edit(list, row, column);
        }
        Response::Changed
    }
}

trait ResponseExt {
    fn max_with(self, other: Response) -> Response;
}

impl ResponseExt for Response {
    /// Keeps `Changed` over weaker responses.
    fn max_with(self, other: Response) -> Response {
        if self == Response::Changed { self } else { other }
    }
}

impl FieldWidget for ListView {
    fn measure(&self, field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        let FieldKind::List(list) = &field.kind else {
            return (0, 0);
        };
        let mut height = cx.px(LIST_HEIGHT);
        if list.add_row_button {
            height += cx.px(ADD_BUTTON_HEIGHT + ADD_BUTTON_GAP);
        }
        (cx.px(MIN_WIDTH), height)
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::List(list) = &field.kind else {
            return;
        };
        let geo = Geometry::new(list, rect, cx);
        let colors = cx.colors;
        let pad = cx.px(CELL_PADDING);
        draw_frame(canvas, geo.frame, focused, cx);

        if let Some(header) = geo.header {
            canvas.fill_rect(header, colors.button);
            for (c, &(left, w)) in geo.columns.iter().enumerate() {
                let title = list.columns.get(c).map(String::as_str).unwrap_or("");
                let cell = Rect::new(left + pad, header.y, w - pad, header.h);
                clipped(canvas, cell, |canvas| {
                    draw_text_centered(canvas, cx.font, title, cell, colors.text);
                });
            }
        }

        let visible = geo.visible_rows();
        clipped(canvas, geo.body, |canvas| {
            for row in (self.first..list.rows.len()).take(visible + 1) {
                let y = geo.body.y + (row - self.first) as i32 * geo.row_h;
                let row_rect = Rect::new(geo.body.x, y, geo.body.w, geo.row_h);
                let selected = list.selected.get(row).copied().unwrap_or(false);

                if selected {
                    canvas.fill_rect(row_rect, colors.selection);
                } else if row % 2 == 1 {
                    canvas.fill_rect(row_rect, colors.row_alt);
                }
                if focused && row == self.cursor {
                    canvas.stroke_rounded_rect(row_rect, 0.0, colors.input_border_focused, 1.0);
                }

                let text_color = if selected { colors.selection_text } else { colors.text };
                for (c, &(left, w)) in geo.columns.iter().enumerate() {
                    if c == 0 && list.check_mode != CheckMode::Off {
                        let size = cx.px(CHECK_SIZE);
                        let mark = Rect::new(left + pad, y + (geo.row_h - size) / 2, size, size);
                        let checked = list.checked.get(row).copied().unwrap_or(false);
                        if list.check_mode == CheckMode::Radiolist {
                            draw_radio(canvas, mark, checked, cx);
                        } else {
                            draw_check(canvas, mark, checked, false, cx);
                        }
                        continue;
                    }
                    let value = list.rows[row].get(c).map(String::as_str).unwrap_or("");
                    let text_rect = Rect::new(left + pad, y, (w - 2 * pad).max(0), geo.row_h);
                    clipped(canvas, text_rect, |canvas| {
                        draw_text_centered(canvas, cx.font, value, text_rect, text_color);
                    });
                }
            }
        });

        if let Some(edit) = &self.edit {
            if let Some(cell) = geo.cell(self.first, edit.row, edit.column) {
                if let Some(cell) = cell.intersect(geo.body) {
                    edit.input.draw(canvas, cell, &edit.text, "", true, cx);
                }
            }
        }

        draw_scrollbar(
            canvas,
            geo.body,
            self.first as i32,
            visible as i32,
            list.rows.len() as i32,
            cx,
        );

        if let Some(button) = geo.add_button {
            let state = ButtonState {
                hovered: cx.hovered(button),
                pressed: self.add_pressed,
                enabled: true,
                focused: false,
            };
            draw_button(canvas, button, ADD_ROW_LABEL, state, cx);
        }
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::List(list) = &mut field.kind else {
            return Response::Ignored;
        };
        let geo = Geometry::new(list, rect, cx);
        let visible = geo.visible_rows();
        if self.edit.as_ref().is_some_and(|e| e.row >= list.rows.len()) {
            self.edit = None;
        }
        self.cursor = self.cursor.min(list.rows.len().saturating_sub(1));

        match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                modifiers,
                double,
            } => self.press(list, &geo, (x, y), modifiers, double),
            Input::Press {
                ..
            } => self.commit_edit(list),
            Input::Release {
                x,
                y,
            } if self.add_pressed => {
                self.add_pressed = false;
                match geo.add_button {
                    Some(button) if button.contains(x, y) => self.add_row(list, visible),
                    _ => Response::Handled,
                }
            }
            Input::Scroll {
                delta, ..
            } => {
                let before = self.first;
                self.first = (self.first as i64 + delta as i64 * 3).max(0) as usize;
                self.clamp_scroll(list, visible);
                if self.first == before { Response::Ignored } else { Response::Handled }
            }
            Input::Key {
                keysym,
                modifiers,
            } => self.key(list, keysym, modifiers, visible),
            Input::Text(c) => {
                if let Some(edit) = &mut self.edit {
                    return edit.input.insert_char(&mut edit.text, c).max_with(Response::Handled);
                }
                if c != ' ' || list.rows.is_empty() {
                    return Response::Ignored;
                }
                if list.check_mode != CheckMode::Off {
                    list.toggle_check(self.cursor);
                } else {
                    list.select(self.cursor, true);
                }
                Response::Changed
            }
            _ => Response::Ignored,
        }
    }

    fn focusable(&self, _field: &Field) -> bool {
        true
    }

    fn set_focus(&mut self, field: &mut Field, focused: bool) -> Response {
        match &mut field.kind {
            FieldKind::List(list) if !focused => self.commit_edit(list),
            _ => Response::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[&str], columns: &[&str]) -> ListField {
        let mut list = ListField {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            editable: true,
            ..Default::default()
        };
        list.set_values(values.iter().map(|s| s.to_string()).collect());
        list
    }

    #[test]
    fn arrow_keys_move_the_selection() {
        let mut field = list(&["a", "b", "c"], &["Name"]);
        let mut view = ListView::default();
        assert_eq!(view.key(&mut field, keys::DOWN, Modifiers::empty(), 2), Response::Changed);
        assert_eq!(field.selected, vec![false, true, false]);
        view.key(&mut field, keys::END, Modifiers::empty(), 2);
        assert_eq!(field.selected, vec![false, false, true]);
        assert_eq!(view.first, 1);
    }

    #[test]
    fn in_place_edit_commits_on_return() {
        let mut field = list(&["a", "b"], &["Name"]);
        let mut view = ListView::default();
        view.start_edit(&field, 1, 0);
        view.key(&mut field, keys::BACKSPACE, Modifiers::empty(), 5);
        if let Some(edit) = &mut view.edit {
            edit.input.insert_char(&mut edit.text, 'z');
        }
        assert_eq!(view.key(&mut field, keys::RETURN, Modifiers::empty(), 5), Response::Changed);
        assert_eq!(field.rows[1], vec!["z"]);
        assert!(view.edit.is_none());
    }

    #[test]
    fn escape_discards_an_edit() {
        let mut field = list(&["a"], &["Name"]);
        let mut view = ListView::default();
        view.start_edit(&field, 0, 0);
        view.key(&mut field, keys::BACKSPACE, Modifiers::empty(), 5);
        assert_eq!(view.key(&mut field, keys::ESCAPE, Modifiers::empty(), 5), Response::Handled);
        assert_eq!(field.rows[0], vec!["a"]);
    }

    #[test]
    fn added_row_starts_editing_the_first_editable_column() {
        let mut field = list(&["true", "x"], &["Pick", "Name"]);
        field.check_mode = CheckMode::Checklist;
        field.add_row_button = true;
        let mut view = ListView::default();
        assert_eq!(view.add_row(&mut field, 5), Response::Changed);
        assert_eq!(field.rows.len(), 2);
        let edit = view.edit.as_ref().unwrap();
        assert_eq!((edit.row, edit.column), (1, 1));
    }
}
