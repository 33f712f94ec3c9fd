//! Placement of a form's rows inside the scrolling area of the dialog.
//!
//! Rectangles are in content coordinates: `x` matches the window, `y` counts from the
//! top of the scrolled content. Fields are indexed like [`Form::fields`], so fields of
//! hidden tabs still take an index but get no rectangle.

use super::widgets::{Ctx, FieldWidget, tab_bar, text::measure_styled, text_width};
use crate::{
    forms::model::{Align, Columns, Field, Form, HSpacer, Item, ROW_SPACING, Row, TabBar, VAlign},
    render::Rect,
};

pub(crate) const PADDING: f32 = 16.0;
const LABEL_GAP: f32 = 12.0;
const FRAME_PADDING: f32 = 10.0;
const MAX_LABEL_SHARE: f32 = 0.4;
/// Height of a single-line control, used to center labels on the first line of a field.
const CONTROL_HEIGHT: f32 = 32.0;
pub(crate) const HEADER_TITLE_SCALE: f32 = 1.2;

/// A text label beside a field or a title.
#[derive(Debug, Clone)]
pub(crate) struct LabelBox {
    pub rect: Rect,
    pub text: String,
    pub align: Align,
    /// Drawn in the header foreground colour.
    pub header: bool,
    /// A header title, drawn larger and bold.
    pub title: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Group,
    TabPanel,
}

#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub rect: Rect,
    pub title: Option<String>,
    pub kind: FrameKind,
}

/// A tab bar's strip of buttons.
#[derive(Debug, Clone)]
pub(crate) struct TabStrip {
    /// Index for [`Form::tab_bar_mut`].
    pub bar: usize,
    pub rect: Rect,
    pub tabs: Vec<Rect>,
    pub names: Vec<String>,
    pub current: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Layout {
    pub fields: Vec<Option<Rect>>,
    pub labels: Vec<LabelBox>,
    pub frames: Vec<Frame>,
    pub tab_bars: Vec<TabStrip>,
    /// Background area of the header.
    pub header: Option<Rect>,
    pub form_label: Option<Rect>,
    /// Total content height.
    pub height: i32,
}

struct Builder<'a, 'b> {
    widgets: &'a [Box<dyn FieldWidget>],
    cx: &'a Ctx<'b>,
    label_align: Align,
    bars_seen: usize,
    out: Layout,
}

/// Lays out `form` for a window `width` pixels wide.
pub(crate) fn compute(form: &Form, widgets: &[Box<dyn FieldWidget>], width: i32, cx: &Ctx) -> Layout {
    let mut builder = Builder {
        widgets,
        cx,
        label_align: form.settings.label_align,
        bars_seen: 0,
        out: Layout::default(),
    };
    let pad = cx.px(PADDING);
    let x = pad;
    let inner_w = (width - 2 * pad).max(1);
    let spacing = cx.px(ROW_SPACING as f32);
    let mut y = pad;

    if let Some(header) = &form.header {
        if let Some(title) = &header.title {
            let h = cx.fonts.ui_scaled(HEADER_TITLE_SCALE).line_height() as i32;
            builder.out.labels.push(LabelBox {
                rect: Rect::new(x, y, inner_w, h),
                text: title.clone(),
                align: Align::Left,
                header: true,
                title: true,
            });
            y += h;
            if !header.rows.is_empty() {
                y += spacing;
            }
        }
        y = builder.rows(&header.rows, x, inner_w, y, true, true);
        y += pad;
        builder.out.header = Some(Rect::new(0, 0, width, y));
        y += pad;
    }

    if let Some(label) = &form.label {
        let (_, h) = measure_styled(&label.text, &label.style, inner_w, true, cx);
        builder.out.form_label = Some(Rect::new(x, y, inner_w, h));
        y += h + spacing;
    }

    y = builder.rows(&form.rows, x, inner_w, y, true, false);
    builder.out.height = y + pad;
    builder.out
}

impl Builder<'_, '_> {
    fn spacing(&self) -> i32 {
        self.cx.px(ROW_SPACING as f32)
    }

    /// Width of the label column for `rows`.
    fn label_width(&self, rows: &[Row], width: i32) -> i32 {
        let widest = rows
            .iter()
            .filter_map(|row| row.label.as_deref())
            .map(|text| text_width(self.cx.font, text))
            .max()
            .unwrap_or(0);
        widest.min((width as f32 * MAX_LABEL_SHARE) as i32)
    }

    /// Places `rows` starting at `y` and returns the bottom of the last one. Invisible
    /// rows only reserve their field and tab bar indices.
    fn rows(&mut self, rows: &[Row], x: i32, width: i32, mut y: i32, visible: bool, header: bool) -> i32 {
        if !visible {
            for row in rows {
                self.skip(&row.item);
            }
            return y;
        }

        let label_w = self.label_width(rows, width);
        let gap = if label_w > 0 { self.cx.px(LABEL_GAP) } else { 0 };
        let spacing = self.spacing();

        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                y += spacing;
            }
            let (fx, fw) = match row.label {
                Some(_) => (x + label_w + gap, (width - label_w - gap).max(1)),
                None => (x, width),
            };
            y = match &row.item {
                Item::Field(field) => {
                    let h = self.place_field(field, fx, fw, y, None);
                    if !field.meta.hidden {
                        self.row_label(row, Rect::new(x, y, label_w, h), header);
                    }
                    y + h
                }
                Item::Group(group) => {
                    self.row_label(row, Rect::new(x, y, label_w, self.cx.px(CONTROL_HEIGHT)), header);
                    self.group(&group.title, &group.rows, fx, fw, y, header)
                }
                Item::Tabs(bar) => {
                    self.row_label(row, Rect::new(x, y, label_w, self.cx.px(tab_bar::STRIP_HEIGHT)), header);
                    self.tabs(bar, fx, fw, y, header)
                }
                Item::Columns(cols) => {
                    let h = self.columns(cols, fx, fw, y, header);
                    if !cols.left.field.meta.hidden {
                        self.row_label(row, Rect::new(x, y, label_w, h), header);
                    }
                    y + h
                }
            };
        }
        y
    }

    fn skip(&mut self, item: &Item) {
        match item {
            Item::Field(_) => self.out.fields.push(None),
            Item::Group(group) => {
                self.rows(&group.rows, 0, 0, 0, false, false);
            }
            Item::Tabs(bar) => {
                self.bars_seen += 1;
                for tab in &bar.tabs {
                    self.rows(&tab.rows, 0, 0, 0, false, false);
                }
            }
            Item::Columns(_) => {
                self.out.fields.push(None);
                self.out.fields.push(None);
            }
        }
    }

    fn row_label(&mut self, row: &Row, area: Rect, header: bool) {
        if let Some(text) = &row.label {
            self.push_label(text, area, self.label_align, header);
        }
    }

    fn push_label(&mut self, text: &str, area: Rect, align: Align, header: bool) {
        let line_h = self.cx.line_height();
        let control_h = area.h.min(self.cx.px(CONTROL_HEIGHT));
        let y = area.y + ((control_h - line_h) / 2).max(0);
        self.out.labels.push(LabelBox {
            rect: Rect::new(area.x, y, area.w, line_h),
            text: text.to_string(),
            align,
            header,
            title: false,
        });
    }

    /// Size of `field` when `avail` pixels are free.
    fn field_size(&self, field: &Field, index: usize, avail: i32, spacer: Option<HSpacer>) -> (i32, i32) {
        let Some(widget) = self.widgets.get(index) else {
            return (0, 0);
        };
        let (pw, ph) = widget.measure(field, avail, self.cx);
        let w = match field.meta.field_width {
            Some(w) => self.cx.px(w as f32).min(avail),
            None if widget.fills_width() && spacer.is_none() => avail,
            None => pw.min(avail),
        };
        let h = field.meta.field_height.map_or(ph, |h| self.cx.px(h as f32));
        (w, h)
    }

    /// Places one field and returns its height. Hidden fields keep their space.
    fn place_field(&mut self, field: &Field, x: i32, avail: i32, y: i32, spacer: Option<HSpacer>) -> i32 {
        let index = self.out.fields.len();
        let (w, h) = self.field_size(field, index, avail, spacer);
        let x = match spacer {
            Some(HSpacer::Before) => x + avail - w,
            _ => x,
        };
        let rect = (!field.meta.hidden).then(|| Rect::new(x, y, w, h));
        self.out.fields.push(rect);
        h
    }

    fn group(&mut self, title: &str, rows: &[Row], x: i32, width: i32, y: i32, header: bool) -> i32 {
        let pad = self.cx.px(FRAME_PADDING);
        let title_h = if title.is_empty() { 0 } else { self.cx.line_height() };
        let frame_top = y + title_h / 2;
        let bottom = self.rows(rows, x + pad, width - 2 * pad, y + title_h + pad, true, header) + pad;
        self.out.frames.push(Frame {
            rect: Rect::new(x, frame_top, width, bottom - frame_top),
            title: (!title.is_empty()).then(|| title.to_string()),
            kind: FrameKind::Group,
        });
        bottom
    }

    fn tabs(&mut self, bar: &TabBar, x: i32, width: i32, y: i32, header: bool) -> i32 {
        let pad = self.cx.px(FRAME_PADDING);
        let strip = Rect::new(x, y, width, self.cx.px(tab_bar::STRIP_HEIGHT));
        let names: Vec<String> = bar.tabs.iter().map(|t| t.name.clone()).collect();
        self.out.tab_bars.push(TabStrip {
            bar: self.bars_seen,
            rect: strip,
            tabs: tab_bar::tab_rects(&names, strip, self.cx),
            names,
            current: bar.current,
        });
        self.bars_seen += 1;

        let top = strip.bottom();
        let mut bottom = top + pad;
        for (i, tab) in bar.tabs.iter().enumerate() {
            let shown = i == bar.current;
            let end = self.rows(&tab.rows, x + pad, width - 2 * pad, top + pad, shown, header);
            if shown {
                bottom = end;
            }
        }
        bottom += pad;
        self.out.frames.push(Frame {
            rect: Rect::new(x, top, width, bottom - top),
            title: None,
            kind: FrameKind::TabPanel,
        });
        bottom
    }

    /// Places a two-column row and returns its height.
    fn columns(&mut self, cols: &Columns, x: i32, width: i32, y: i32, header: bool) -> i32 {
        let gap = self.cx.px(LABEL_GAP);
        let half = ((width - gap) / 2).max(1);
        let right_x = x + half + gap;

        let left_index = self.out.fields.len();
        let left = self.field_size(&cols.left.field, left_index, half, cols.left.hspacer);

        let (label_w, right_field_x) = match &cols.right.label {
            Some(text) if !cols.right.field.meta.hidden => {
                let w = text_width(self.cx.font, text).min(half / 2);
                (w, right_x + w + gap)
            }
            _ => (0, right_x),
        };
        let right_avail = (x + width - right_field_x).max(1);
        let right = self.field_size(&cols.right.field, left_index + 1, right_avail, cols.right.hspacer);
        let row_h = left.1.max(right.1);

        let offset = |valign: VAlign, h: i32| match valign {
            VAlign::Top | VAlign::Baseline => 0,
            VAlign::Center => (row_h - h) / 2,
            VAlign::Bottom => row_h - h,
        };

        self.place_field(&cols.left.field, x, half, y + offset(cols.left.valign, left.1), cols.left.hspacer);
        let right_y = y + offset(cols.right.valign, right.1);
        self.place_field(&cols.right.field, right_field_x, right_avail, right_y, cols.right.hspacer);
        if label_w > 0 {
            if let Some(text) = &cols.right.label {
                self.push_label(text, Rect::new(right_x, right_y, label_w, right.1), Align::Left, header);
            }
        }
        row_h
    }
}
