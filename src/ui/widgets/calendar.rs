//! `--add-calendar`: a month grid with navigation arrows and a "Today" link.

use chrono::{Datelike, Days, Local, Months, NaiveDate};

use super::{Arrow, Ctx, FieldWidget, Input, Response, draw_arrow, draw_frame, text_width};
use crate::{
    backend::{MouseButton, keys},
    forms::model::{Field, FieldKind},
    render::{Canvas, Rect, rgb},
};

const WIDTH: f32 = 280.0;
const HEADER_HEIGHT: f32 = 36.0;
const DAY_HEADER_HEIGHT: f32 = 24.0;
const NAV_WIDTH: f32 = 28.0;
const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const TODAY: &str = "Today";

pub(crate) struct Calendar {
    /// First day of the month on screen.
    view: NaiveDate,
}

impl Calendar {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            view: first_of_month(date),
        }
    }

    fn shift_view(&mut self, forward: bool) {
        let shifted = if forward {
            self.view.checked_add_months(Months::new(1))
        } else {
            self.view.checked_sub_months(Months::new(1))
        };
        if let Some(view) = shifted {
            self.view = view;
        }
    }

    /// Moves the selection and brings its month on screen.
    fn select(&mut self, date: &mut NaiveDate, next: Option<NaiveDate>) -> Response {
        let Some(next) = next else {
            return Response::Handled;
        };
        self.view = first_of_month(next);
        if next == *date {
            return Response::Handled;
        }
        *date = next;
        Response::Changed
    }

    fn key(&mut self, date: &mut NaiveDate, keysym: u32) -> Response {
        let next = match keysym {
            keys::LEFT => date.checked_sub_days(Days::new(1)),
            keys::RIGHT => date.checked_add_days(Days::new(1)),
            keys::UP => date.checked_sub_days(Days::new(7)),
            keys::DOWN => date.checked_add_days(Days::new(7)),
            keys::PAGE_UP => date.checked_sub_months(Months::new(1)),
            keys::PAGE_DOWN => date.checked_add_months(Months::new(1)),
            keys::HOME => Some(first_of_month(*date)),
            keys::END => last_of_month(*date),
            _ => return Response::Ignored,
        };
        self.select(date, next)
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date).checked_add_months(Months::new(1))?.pred_opt()
}

/// Areas of one calendar placed in `rect`.
struct Grid {
    prev: Rect,
    next: Rect,
    today: Rect,
    title: Rect,
    days: Rect,
    cell_w: i32,
    cell_h: i32,
}

impl Grid {
    fn new(rect: Rect, cx: &Ctx) -> Self {
        let header_h = cx.px(HEADER_HEIGHT);
        let nav_w = cx.px(NAV_WIDTH);
        let today_w = text_width(cx.font, TODAY) + cx.px(12.0);
        let prev = Rect::new(rect.x, rect.y, nav_w, header_h);
        let next = Rect::new(rect.right() - nav_w, rect.y, nav_w, header_h);
        let today = Rect::new(next.x - today_w, rect.y, today_w, header_h);
        let title = Rect::new(prev.right(), rect.y, today.x - prev.right(), header_h);

        let top = rect.y + header_h + cx.px(DAY_HEADER_HEIGHT);
        let days = Rect::new(rect.x, top, rect.w, rect.bottom() - top);
        Self {
            prev,
            next,
            today,
            title,
            cell_w: (days.w / 7).max(1),
            cell_h: (days.h / 6).max(1),
            days,
        }
    }

    /// Index of the view's first day in the Sunday-first grid.
    fn offset(view: NaiveDate) -> i32 {
        view.weekday().num_days_from_sunday() as i32
    }

    fn cell(&self, view: NaiveDate, day: u32) -> Rect {
        let index = Self::offset(view) + day as i32 - 1;
        let (row, col) = (index / 7, index % 7);
        Rect::new(
            self.days.x + col * self.cell_w,
            self.days.y + row * self.cell_h,
            self.cell_w,
            self.cell_h,
        )
    }

    fn day_at(&self, view: NaiveDate, x: i32, y: i32) -> Option<NaiveDate> {
        if !self.days.contains(x, y) {
            return None;
        }
        let col = ((x - self.days.x) / self.cell_w).min(6);
        let row = (y - self.days.y) / self.cell_h;
        let day = row * 7 + col - Self::offset(view) + 1;
        u32::try_from(day).ok().and_then(|d| view.with_day(d))
    }
}

impl FieldWidget for Calendar {
    fn measure(&self, _field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        let cell = cx.px(WIDTH) / 7;
        (cx.px(WIDTH), cx.px(HEADER_HEIGHT + DAY_HEADER_HEIGHT) + cell * 6)
    }

    fn fills_width(&self) -> bool {
        false
    }

    fn draw(&self, field: &Field, rect: Rect, focused: bool, canvas: &mut Canvas, cx: &Ctx) {
        let FieldKind::Calendar {
            date,
        } = &field.kind
        else {
            return;
        };
        let colors = cx.colors;
        let font = cx.font;
        let grid = Grid::new(rect, cx);
        let line_h = cx.line_height();
        draw_frame(canvas, rect, focused, cx);

        for (button, arrow) in [(grid.prev, Arrow::Left), (grid.next, Arrow::Right)] {
            if cx.hovered(button) {
                canvas.fill_rounded_rect(button.inset(cx.px(4.0)), 4.0 * cx.scale, colors.button_hover);
            }
            draw_arrow(canvas, button.inset(cx.px(8.0)), arrow, colors.text);
        }

        let title = format!("{} {}", MONTHS[self.view.month0() as usize], self.view.year());
        font.render(&title)
            .with_color(colors.text)
            .bold(true)
            .with_max_width(grid.title.w as f32)
            .with_align(0.5)
            .draw(canvas, grid.title.x, grid.title.y + (grid.title.h - line_h) / 2);
        let today_color = if cx.hovered(grid.today) { rgb(60, 140, 80) } else { rgb(80, 160, 100) };
        font.render(TODAY).with_color(today_color).draw(
            canvas,
            grid.today.x,
            grid.today.y + (grid.today.h - line_h) / 2,
        );

        let small = cx.fonts.ui_scaled(0.85);
        let header_y = grid.title.bottom() + (cx.px(DAY_HEADER_HEIGHT) - small.line_height() as i32) / 2;
        for (i, name) in WEEKDAYS.iter().enumerate() {
            small
                .render(name)
                .with_color(colors.text_disabled)
                .with_max_width(grid.cell_w as f32)
                .with_align(0.5)
                .draw(canvas, grid.days.x + i as i32 * grid.cell_w, header_y);
        }

        let today = Local::now().date_naive();
        let mut day = self.view;
        while day.month() == self.view.month() {
            let cell = grid.cell(self.view, day.day());
            let inner = cell.inset(cx.px(2.0));
            let radius = 4.0 * cx.scale;
            let selected = day == *date;
            if selected {
                canvas.fill_rounded_rect(inner, radius, colors.selection);
            } else if cx.hovered(cell) {
                canvas.fill_rounded_rect(inner, radius, colors.input_bg.darken(0.08));
            }
            if day == today && !selected {
                canvas.stroke_rounded_rect(inner, radius, colors.input_border_focused, 1.5);
            }
            let color = if selected { colors.selection_text } else { colors.text };
            font.render(&day.day().to_string())
                .with_color(color)
                .with_max_width(cell.w as f32)
                .with_align(0.5)
                .draw(canvas, cell.x, cell.y + (cell.h - line_h) / 2);

            let Some(next) = day.succ_opt() else {
                break;
            };
            day = next;
        }
    }

    fn event(&mut self, field: &mut Field, rect: Rect, input: &Input, cx: &Ctx) -> Response {
        let FieldKind::Calendar {
            date,
        } = &mut field.kind
        else {
            return Response::Ignored;
        };

        match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                ..
            } if rect.contains(x, y) => {
                let grid = Grid::new(rect, cx);
                if grid.prev.contains(x, y) {
                    self.shift_view(false);
                    Response::Handled
                } else if grid.next.contains(x, y) {
                    self.shift_view(true);
                    Response::Handled
                } else if grid.today.contains(x, y) {
                    self.select(date, Some(Local::now().date_naive()))
                } else if let Some(day) = grid.day_at(self.view, x, y) {
                    self.select(date, Some(day))
                } else {
                    Response::Handled
                }
            }
            Input::Scroll {
                delta, ..
            } if delta != 0 => {
                self.shift_view(delta > 0);
                Response::Handled
            }
            Input::Key {
                keysym, ..
            } => self.key(date, keysym),
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keys_move_by_day_week_and_month() {
        let mut selected = date(2024, 1, 31);
        let mut calendar = Calendar::new(selected);
        assert_eq!(calendar.key(&mut selected, keys::RIGHT), Response::Changed);
        assert_eq!(selected, date(2024, 2, 1));
        assert_eq!(calendar.view, date(2024, 2, 1));
        calendar.key(&mut selected, keys::UP);
        assert_eq!(selected, date(2024, 1, 25));
        calendar.key(&mut selected, keys::PAGE_DOWN);
        assert_eq!(selected, date(2024, 2, 25));
        calendar.key(&mut selected, keys::END);
        assert_eq!(selected, date(2024, 2, 29));
    }

    #[test]
    fn grid_starts_on_sunday() {
        // March 2024 starts on a Friday.
        let view = date(2024, 3, 1);
        let grid = Grid {
            prev: Rect::default(),
            next: Rect::default(),
            today: Rect::default(),
            title: Rect::default(),
            days: Rect::new(0, 0, 70, 60),
            cell_w: 10,
            cell_h: 10,
        };
        assert_eq!(grid.cell(view, 1), Rect::new(50, 0, 10, 10));
        assert_eq!(grid.day_at(view, 55, 5), Some(view));
        assert_eq!(grid.day_at(view, 5, 5), None);
        assert_eq!(grid.day_at(view, 5, 15), Some(date(2024, 3, 3)));
        assert_eq!(grid.day_at(view, 5, 55), Some(date(2024, 3, 31)));
        assert_eq!(grid.day_at(view, 15, 55), None);
    }
}
