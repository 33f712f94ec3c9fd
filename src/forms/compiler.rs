//! Compiles the linear `--forms` argument stream into a [`Form`].
//!
//! Widgets are built one at a time. The widget being configured stays outside the tree
//! until the next widget or container token arrives, so every option that follows it
//! lands on the right field regardless of order. Containers (header, groups, tab bars,
//! column rows) are kept on a stack and folded into their parent when closed.

use std::{mem, path::PathBuf};

use chrono::Local;

use super::{
    action::OkAction,
    menu::Menu,
    model::{
        Align, CheckMode, Column, Columns, ComboField, EntryMode, Field, FieldKind, FileFilter,
        FileSelField, Form, FormLabel, Group, HSpacer, Header, Item, ListField, Marker,
        PrintColumn, PrintValues, ROW_SPACING, Row, ScaleField, Selection, SpinField, Tab,
        TabBar, TextField, TextFormat, TextInfoField, TextStyle, VAlign,
    },
    settings::{self, WidgetSettings},
    source::FileSource,
};

/// One option of the forms stream, without its leading `--`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormArg {
    pub name: String,
    pub value: Option<String>,
}

impl FormArg {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
        }
    }
}

/// Options that consume an argument.
const VALUE_OPTIONS: &[&str] = &[
    "header",
    "group",
    "tab",
    "add-calendar",
    "add-checkbox",
    "add-combo",
    "add-double-spin-box",
    "add-entry",
    "add-file-selection",
    "add-hrule",
    "add-list",
    "add-menu",
    "add-password",
    "add-qr-code",
    "add-scale",
    "add-spin-box",
    "add-text",
    "add-text-browser",
    "add-text-info",
    "add-vspacer",
    "add-hspacer",
    "valign",
    "var",
    "int",
    "float",
    "field-width",
    "field-height",
    "prefix",
    "suffix",
    "decimals",
    "value",
    "min-value",
    "max-value",
    "step",
    "combo-values",
    "combo-values-from-file",
    "column-values",
    "list-values",
    "list-values-from-file",
    "print-column",
    "print-values",
    "read-only-column",
    "file-filter",
    "file-separator",
    "filename",
    "newline-separator",
    "font",
    "url",
    "curl-path",
    "tooltip",
    "align",
    "font-family",
    "font-size",
    "foreground-color",
    "background-color",
    "text",
    "separator",
    "list-row-separator",
    "forms-date-format",
    "forms-align",
    "comment",
    "action-after-ok-click",
    "footer-name",
    "footer-entries",
    "footer-from-file",
];

/// Returns true if `--name` takes an argument in a forms stream.
pub fn takes_value(name: &str) -> bool {
    VALUE_OPTIONS.contains(&name)
}

/// Builds a form from its options.
pub fn compile(args: impl IntoIterator<Item = FormArg>) -> Form {
    let mut compiler = Compiler::default();
    for arg in args {
        compiler.feed(arg);
    }
    compiler.finish()
}

fn unspecific(name: &str) {
    tracing::warn!("unspecific argument --{name}");
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

#[derive(Debug)]
enum Open {
    Group { label: Option<String>, group: Group },
    Tabs { label: Option<String>, bar: TabBar },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Group,
    Tabs,
}

impl Open {
    fn kind(&self) -> ContainerKind {
        match self {
            Open::Group { .. } => ContainerKind::Group,
            Open::Tabs { .. } => ContainerKind::Tabs,
        }
    }

    fn into_row(self) -> Row {
        match self {
            Open::Group { label, group } => Row { label, item: Item::Group(group) },
            Open::Tabs { label, bar } => Row { label, item: Item::Tabs(bar) },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Left = 0,
    Right = 1,
}

#[derive(Debug, Default)]
struct ColumnState {
    slot: Option<Slot>,
    /// Filled left column and the row label it brings.
    left: Option<(Option<String>, Column)>,
    hspacer: [Option<HSpacer>; 2],
    valign: [VAlign; 2],
}

/// The widget currently receiving options.
#[derive(Debug)]
struct Pending {
    label: Option<String>,
    field: Field,
    slot: Option<Slot>,
    list_values: Vec<String>,
}

#[derive(Debug, Default)]
struct Compiler {
    form: Form,
    in_header: bool,
    body: Vec<Open>,
    header: Vec<Open>,
    column: ColumnState,
    pending: Option<Pending>,
    label_is_last: bool,
    seen_widget: bool,
    no_bold: bool,
}

impl Compiler {
    fn feed(&mut self, arg: FormArg) {
        let FormArg { name, value } = arg;
        let value = value.unwrap_or_default();
        let v = value.as_str();

        match name.as_str() {
            "header" => self.header(v),
            "group" => self.group(v),
            "tab" => self.tab(v),
            "col1" => self.start_column(Slot::Left),
            "col2" => self.start_column(Slot::Right),
            "tab-visible" => self.tab_visible(),
            "add-hspacer" => self.column_hspacer(v),
            "valign" => self.column_valign(v),
            "text" => self.form_label(v),

            "separator" => self.form.settings.separator = value,
            "list-row-separator" => self.form.settings.list_row_separator = value,
            "forms-date-format" => self.form.settings.date_format = Some(value),
            "forms-align" => match Align::parse(v) {
                Some(align) => self.form.settings.label_align = align,
                None => tracing::warn!("argument --forms-align: unknown value {v}"),
            },
            "no-cancel" => self.form.settings.no_cancel = true,
            "comment" => {}
            "action-after-ok-click" => {
                let (ws, _) = settings::parse(v);
                self.form.settings.ok_action = OkAction::from_settings(&ws);
            }
            "win-min-button" => self.form.settings.win_min_button = true,
            "win-max-button" => self.form.settings.win_max_button = true,
            "footer-name" => self.form.settings.footer.name = Some(value),
            "footer-entries" => match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.form.settings.footer.entries = n,
                _ => tracing::warn!("argument --footer-entries: invalid value {v}"),
            },
            "footer-from-file" => {
                let (ws, path) = settings::parse(v);
                let path = PathBuf::from(path);
                if path.exists() {
                    self.form.settings.footer.file = Some(path);
                    self.form.settings.footer.monitor = ws.monitor;
                } else {
                    tracing::warn!(path = %path.display(), "footer file does not exist");
                }
            }
            "no-bold" => self.no_bold = true,

            n if n.starts_with("add-") => {
                if !self.add_widget(n, v) {
                    unspecific(n);
                }
            }
            n => {
                if !self.widget_option(n, v) {
                    unspecific(n);
                }
            }
        }
    }

    fn finish(mut self) -> Form {
        self.end_widget();

        self.in_header = true;
        while self.close_top().is_some() {}
        self.in_header = false;
        while self.close_top().is_some() {}

        if let Some(label) = &mut self.form.label {
            if !self.no_bold {
                label.style.bold = true;
            }
        }
        self.form
    }

    fn stack(&self) -> &Vec<Open> {
        if self.in_header { &self.header } else { &self.body }
    }

    fn stack_mut(&mut self) -> &mut Vec<Open> {
        if self.in_header { &mut self.header } else { &mut self.body }
    }

    fn push_row(&mut self, row: Row) {
        let (stack, root) = if self.in_header {
            let header = self.form.header.get_or_insert_with(Header::default);
            (&mut self.header, &mut header.rows)
        } else {
            (&mut self.body, &mut self.form.rows)
        };

        let target = match stack.last_mut() {
            Some(Open::Group { group, .. }) => &mut group.rows,
            Some(Open::Tabs { bar, .. }) => match bar.tabs.last_mut() {
                Some(tab) => &mut tab.rows,
                None => root,
            },
            None => root,
        };
        target.push(row);
    }

    /// Closes the innermost container into its parent.
    fn close_top(&mut self) -> Option<ContainerKind> {
        let open = self.stack_mut().pop()?;
        let kind = open.kind();
        self.push_row(open.into_row());
        Some(kind)
    }

    /// Closes containers up to and including the innermost one of `kind`.
    fn close_through(&mut self, kind: ContainerKind, option: &str) {
        if !self.stack().iter().any(|o| o.kind() == kind) {
            tracing::warn!("argument --{option}: nothing to stop");
            return;
        }
        while let Some(closed) = self.close_top() {
            if closed == kind {
                break;
            }
        }
    }

    /// Moves the widget being configured into the tree.
    fn place_pending(&mut self) {
        self.label_is_last = false;
        let Some(mut pending) = self.pending.take() else {
            return;
        };
        finish_field(&mut pending.field, mem::take(&mut pending.list_values));

        match pending.slot {
            None => self.push_row(Row::field(pending.label, pending.field)),
            Some(Slot::Left) => {
                self.flush_left();
                let column = self.make_column(Slot::Left, None, pending.field);
                self.column.left = Some((pending.label, column));
            }
            Some(Slot::Right) => match self.column.left.take() {
                Some((row_label, left)) => {
                    let right = self.make_column(Slot::Right, pending.label, pending.field);
                    self.push_row(Row {
                        label: row_label,
                        item: Item::Columns(Box::new(Columns { left, right })),
                    });
                    self.column = ColumnState::default();
                }
                None => {
                    tracing::warn!("argument --col2: no --col1 widget before it");
                    self.push_row(Row::field(pending.label, pending.field));
                    self.column = ColumnState::default();
                }
            },
        }
    }

    fn make_column(&mut self, slot: Slot, label: Option<String>, field: Field) -> Column {
        let i = slot as usize;
        Column {
            label,
            field,
            hspacer: self.column.hspacer[i].take(),
            valign: mem::take(&mut self.column.valign[i]),
        }
    }

    /// Turns a left column that never got a partner into a normal row.
    fn flush_left(&mut self) {
        if let Some((label, column)) = self.column.left.take() {
            self.push_row(Row::field(label, column.field));
        }
    }

    /// Ends the current widget and any half-built column row.
    fn end_widget(&mut self) {
        self.place_pending();
        self.flush_left();
        self.column = ColumnState::default();
    }

    fn header(&mut self, arg: &str) {
        self.end_widget();
        let (ws, title) = settings::parse(arg);

        if ws.stop {
            if self.in_header {
                while self.close_top().is_some() {}
            }
            self.in_header = false;
            return;
        }

        self.in_header = true;
        let header = self.form.header.get_or_insert_with(Header::default);
        if !ws.hide_label && header.title.is_none() {
            header.title = non_empty(title);
        }
        if !ws.background_color.is_empty() {
            header.background = Some(ws.background_color);
        }
        if !ws.foreground_color.is_empty() {
            header.foreground = Some(ws.foreground_color);
        }
    }

    fn group(&mut self, arg: &str) {
        self.end_widget();
        let (ws, title) = settings::parse(arg);

        if ws.stop {
            self.close_through(ContainerKind::Group, "group");
        } else {
            self.stack_mut().push(Open::Group {
                label: non_empty(ws.add_label),
                group: Group { title, rows: Vec::new() },
            });
        }
    }

    fn tab(&mut self, arg: &str) {
        self.end_widget();
        let (ws, name) = settings::parse(arg);

        if ws.stop {
            self.close_through(ContainerKind::Tabs, "tab");
            return;
        }

        match self.stack().iter().rposition(|o| o.kind() == ContainerKind::Tabs) {
            Some(i) => {
                if let Open::Tabs { bar, .. } = &self.stack()[i] {
                    if bar.tabs.last().is_some_and(|t| t.name == name) {
                        return;
                    }
                }
                // Groups left open in the previous tab end with it.
                while self.stack().len() > i + 1 {
                    self.close_top();
                }
            }
            None => self.stack_mut().push(Open::Tabs {
                label: non_empty(ws.add_label.clone()),
                bar: TabBar::default(),
            }),
        }

        if let Some(Open::Tabs { bar, .. }) = self.stack_mut().last_mut() {
            let index = bar.tabs.len();
            let name = if name.is_empty() { format!("Tab {index}") } else { name };
            bar.tabs.push(Tab {
                name,
                rows: Vec::new(),
                disable_buttons: ws.disable_buttons,
            });
            bar.verbose |= ws.verbose_tab_bar;
            if ws.selected {
                bar.current = index;
            }
        }
    }

    fn tab_visible(&mut self) {
        let bar = self.stack_mut().iter_mut().rev().find_map(|o| match o {
            Open::Tabs { bar, .. } => Some(bar),
            Open::Group { .. } => None,
        });
        match bar {
            Some(bar) => bar.current = bar.tabs.len().saturating_sub(1),
            None => unspecific("tab-visible"),
        }
    }

    fn start_column(&mut self, slot: Slot) {
        self.place_pending();
        self.column.slot = Some(slot);
    }

    fn column_hspacer(&mut self, v: &str) {
        let Some(slot) = self.column.slot else {
            unspecific("add-hspacer");
            return;
        };
        self.column.hspacer[slot as usize] = match v {
            "before" => Some(HSpacer::Before),
            "after" => Some(HSpacer::After),
            _ => {
                tracing::warn!("argument --add-hspacer: unknown value {v}");
                None
            }
        };
    }

    fn column_valign(&mut self, v: &str) {
        let Some(slot) = self.column.slot else {
            unspecific("valign");
            return;
        };
        let valign = match v {
            "top" => VAlign::Top,
            "center" => VAlign::Center,
            "bottom" => VAlign::Bottom,
            "baseline" => VAlign::Baseline,
            _ => {
                tracing::warn!("argument --valign: unknown value {v}");
                return;
            }
        };
        self.column.valign[slot as usize] = valign;
    }

    fn form_label(&mut self, arg: &str) {
        self.place_pending();
        let (_, text) = settings::parse(arg);
        self.form.label = Some(FormLabel {
            text,
            style: TextStyle::default(),
        });
        self.label_is_last = true;
        self.seen_widget = true;
    }

    /// Starts a widget. Returns false for an unknown `--add-*` option.
    fn add_widget(&mut self, name: &str, arg: &str) -> bool {
        let (ws, rest) = settings::parse(arg);

        // Checkbox, text, hrule, vspacer, menu and QR code take their row label from
        // `addLabel`; the argument is their content.
        let (kind, label_from_setting) = match name {
            "add-calendar" => (
                FieldKind::Calendar {
                    date: Local::now().date_naive(),
                },
                false,
            ),
            "add-checkbox" => (
                FieldKind::Checkbox {
                    text: rest.clone(),
                    checked: false,
                    default: false,
                },
                true,
            ),
            "add-entry" => (
                FieldKind::Entry {
                    text: String::new(),
                    mode: EntryMode::Text,
                },
                false,
            ),
            "add-password" => (
                FieldKind::Entry {
                    text: String::new(),
                    mode: EntryMode::Password,
                },
                false,
            ),
            "add-combo" => (FieldKind::Combo(ComboField::default()), false),
            "add-list" => (
                FieldKind::List(ListField {
                    add_row_button: ws.add_new_row_button,
                    ..ListField::default()
                }),
                false,
            ),
            "add-scale" => (FieldKind::Scale(ScaleField::default()), false),
            "add-spin-box" => (FieldKind::SpinBox(SpinField::integer()), false),
            "add-double-spin-box" => (FieldKind::SpinBox(SpinField::double()), false),
            "add-text" => (FieldKind::Text(text_field(&ws, rest.clone())), true),
            "add-hrule" => (
                FieldKind::HRule {
                    color: non_empty(rest.clone()),
                },
                true,
            ),
            "add-vspacer" => {
                let height = rest.trim().parse::<i64>().unwrap_or(0) - i64::from(ROW_SPACING);
                (
                    FieldKind::VSpacer {
                        height: u32::try_from(height.max(0)).unwrap_or(u32::MAX),
                    },
                    true,
                )
            }
            "add-text-info" => (FieldKind::TextInfo(TextInfoField::default()), false),
            "add-text-browser" => (
                FieldKind::TextInfo(TextInfoField {
                    browser: true,
                    format: TextFormat::Html,
                    ..TextInfoField::default()
                }),
                false,
            ),
            "add-menu" => (FieldKind::Menu(Menu::parse(&rest, &ws.sep)), true),
            "add-qr-code" => (
                FieldKind::QrCode {
                    text: rest.clone(),
                    align: Align::Left,
                },
                true,
            ),
            "add-file-selection" => (
                FieldKind::FileSelection(FileSelField {
                    button_text: non_empty(ws.button_text.clone())
                        .unwrap_or_else(|| "Select".to_string()),
                    ..FileSelField::default()
                }),
                false,
            ),
            _ => return false,
        };

        let is_top_menu = matches!(kind, FieldKind::Menu(_))
            && !self.seen_widget
            && self.pending.is_none()
            && self.column.slot.is_none();

        self.place_pending();
        self.seen_widget = true;

        if is_top_menu {
            if let FieldKind::Menu(menu) = kind {
                self.form.top_menu = Some(menu);
            }
            return true;
        }

        let label = if ws.hide_label {
            None
        } else if label_from_setting {
            non_empty(ws.add_label.clone())
        } else {
            Some(rest)
        };

        let mut field = Field::new(kind);
        field.meta.exclude_from_output = ws.exclude_from_output;

        self.pending = Some(Pending {
            label,
            field,
            slot: self.column.slot,
            list_values: Vec::new(),
        });
        true
    }

    /// Applies an option to the widget being configured. Returns false if the option
    /// is unknown or the widget does not take it.
    fn widget_option(&mut self, name: &str, v: &str) -> bool {
        if self.label_is_last {
            return match &mut self.form.label {
                Some(label) => apply_style(&mut label.style, name, v),
                None => false,
            };
        }

        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let meta = &mut pending.field.meta;
        let list_values = &mut pending.list_values;

        match (name, &mut pending.field.kind) {
            ("hide", FieldKind::VSpacer { .. }) => return false,
            ("hide", _) => meta.hidden = true,

            (
                "var",
                FieldKind::Calendar { .. }
                | FieldKind::Checkbox { .. }
                | FieldKind::Entry { .. }
                | FieldKind::SpinBox(_)
                | FieldKind::Scale(_)
                | FieldKind::Combo(_)
                | FieldKind::List(_),
            ) => meta.var = Some(v.to_string()),
            ("var", FieldKind::TextInfo(info)) if !info.browser => meta.var = Some(v.to_string()),

            ("int", FieldKind::Entry { text, mode }) if *mode != EntryMode::Password => {
                *mode = EntryMode::Int;
                *text = v.trim().parse::<i64>().unwrap_or(0).to_string();
            }
            ("float", FieldKind::Entry { text, mode }) if *mode != EntryMode::Password => {
                *mode = EntryMode::Float;
                *text = format!("{:.2}", v.trim().parse::<f64>().unwrap_or(0.0));
            }

            ("checked", FieldKind::Checkbox { checked, default, .. }) => {
                *checked = true;
                *default = true;
            }

            ("field-width", FieldKind::Text(text)) => {
                text.wrap = true;
                meta.field_width = v.trim().parse().ok();
            }
            (
                "field-width",
                FieldKind::Entry { .. }
                | FieldKind::HRule { .. }
                | FieldKind::SpinBox(_)
                | FieldKind::Combo(_)
                | FieldKind::List(_)
                | FieldKind::TextInfo(_),
            ) => meta.field_width = v.trim().parse().ok(),
            (
                "field-height",
                FieldKind::List(_)
                | FieldKind::Text(_)
                | FieldKind::HRule { .. }
                | FieldKind::TextInfo(_),
            ) => meta.field_height = v.trim().parse().ok(),

            ("prefix", FieldKind::SpinBox(spin)) => spin.prefix = v.to_string(),
            ("suffix", FieldKind::SpinBox(spin)) => spin.suffix = v.to_string(),
            ("decimals", FieldKind::SpinBox(spin)) if !spin.integer => {
                spin.decimals = v.trim().parse::<u32>().unwrap_or(0).min(15);
            }
            ("value", FieldKind::SpinBox(spin)) => {
                spin.value = spin_number(v, spin.integer, spin.value);
                spin.default = Some(spin.value);
            }
            ("min-value", FieldKind::SpinBox(spin)) => spin.min = spin_number(v, spin.integer, spin.min),
            ("max-value", FieldKind::SpinBox(spin)) => spin.max = spin_number(v, spin.integer, spin.max),
            ("value", FieldKind::Scale(scale)) => {
                scale.value = int_number(v);
                scale.default = Some(scale.value);
            }
            ("min-value", FieldKind::Scale(scale)) => scale.min = int_number(v),
            ("max-value", FieldKind::Scale(scale)) => scale.max = int_number(v),
            ("step", FieldKind::Scale(scale)) => scale.step = int_number(v).max(1),
            ("print-partial", FieldKind::Scale(scale)) => scale.print_partial = true,
            ("hide-value", FieldKind::Scale(scale)) => scale.hide_value = true,

            ("combo-values", FieldKind::Combo(combo)) => {
                let (ws, values) = settings::parse(v);
                let items: Vec<String> = values.split('|').map(str::to_string).collect();
                set_combo_items(combo, items, &ws);
            }
            ("combo-values-from-file", FieldKind::Combo(combo)) => {
                let (ws, _) = settings::parse(v);
                let source = FileSource::parse(v);
                set_combo_items(combo, source.read_values(), &ws);
                combo.source = Some(source);
            }

            ("editable", FieldKind::List(list)) => list.editable = true,
            ("editable", FieldKind::Combo(combo)) => combo.editable = true,
            ("editable", FieldKind::TextInfo(info)) if !info.browser => info.editable = true,

            ("column-values", FieldKind::List(list)) => {
                list.columns = v.split('|').map(str::to_string).collect();
            }
            ("list-values", FieldKind::List(_)) => {
                *list_values = v.split('|').map(str::to_string).collect();
            }
            ("list-values-from-file", FieldKind::List(list)) => {
                let source = FileSource::parse(v);
                *list_values = source.read_values();
                list.add_value = source.add_value.clone();
                list.source = Some(source);
            }
            ("print-column", FieldKind::List(list)) => list.print_column = PrintColumn::parse(v),
            ("print-values", FieldKind::List(list)) => {
                list.print_values = if v.eq_ignore_ascii_case("all") {
                    PrintValues::All
                } else {
                    PrintValues::Selected
                };
            }
            ("checklist", FieldKind::List(list)) => list.check_mode = CheckMode::Checklist,
            ("radiolist", FieldKind::List(list)) => list.check_mode = CheckMode::Radiolist,
            ("no-selection", FieldKind::List(list)) => list.selection = Selection::None,
            ("read-only-column", FieldKind::List(list)) => {
                list.read_only_column = v.trim().parse::<usize>().ok().filter(|&n| n > 0);
            }
            ("show-header", FieldKind::List(list)) => list.show_header = true,
            ("multiple", FieldKind::List(list)) => list.selection = Selection::Multiple,

            ("multiple", FieldKind::FileSelection(sel)) => sel.multiple = true,
            ("directory", FieldKind::FileSelection(sel)) => sel.directory = true,
            ("file-filter", FieldKind::FileSelection(sel)) => sel.filters.push(FileFilter::parse(v)),
            ("file-separator", FieldKind::FileSelection(sel)) => sel.separator = Some(v.to_string()),
            ("filename", FieldKind::FileSelection(sel)) => match v.strip_suffix("/.") {
                Some(dir) => sel.start_dir = Some(PathBuf::from(if dir.is_empty() { "/" } else { dir })),
                None => sel.path = v.to_string(),
            },

            ("filename", FieldKind::TextInfo(info)) => {
                let (ws, path) = settings::parse(v);
                info.file = Some(PathBuf::from(path));
                info.monitor = ws.monitor && !info.browser;
            }
            ("newline-separator", FieldKind::TextInfo(info)) if !info.browser => {
                info.newline_separator = Some(v.to_string());
            }
            ("plain", FieldKind::TextInfo(info)) if !info.browser => info.format = TextFormat::Plain,
            ("html", FieldKind::TextInfo(info)) if !info.browser => info.format = TextFormat::Html,
            ("font", FieldKind::TextInfo(info)) if !info.browser => info.font = Some(v.to_string()),
            ("url" | "curl-path", FieldKind::TextInfo(_)) => {
                tracing::warn!("argument --{name}: remote text is not supported");
            }

            ("tooltip", FieldKind::Text(_)) => meta.tooltip = Some(v.to_string()),
            ("wrap", FieldKind::Text(text)) => text.wrap = true,
            (_, FieldKind::Text(text)) => return apply_style(&mut text.style, name, v),
            ("small-caps", FieldKind::TextInfo(_)) => return false,
            (_, FieldKind::TextInfo(info)) if !info.browser => {
                return apply_style(&mut info.style, name, v);
            }
            ("align", FieldKind::QrCode { align, .. }) => match Align::parse(v) {
                Some(a) => *align = a,
                None => tracing::warn!("argument --align: unknown value {v}"),
            },

            _ => return false,
        }
        true
    }
}

/// Text styling options shared by the form label, text and text-info widgets.
fn apply_style(style: &mut TextStyle, name: &str, v: &str) -> bool {
    match name {
        "align" => match Align::parse(v) {
            Some(align) => style.align = align,
            None => tracing::warn!("argument --align: unknown value {v}"),
        },
        "bold" => style.bold = true,
        "italics" => style.italic = true,
        "underline" => style.underline = true,
        "small-caps" => style.small_caps = true,
        "font-family" => style.font_family = Some(v.to_string()),
        "font-size" => match v.trim().parse::<f32>() {
            Ok(size) if size > 0.0 => style.font_size = Some(size),
            _ => tracing::warn!("argument --font-size: invalid value {v}"),
        },
        "foreground-color" => style.foreground = Some(v.to_string()),
        "background-color" => style.background = Some(v.to_string()),
        _ => return false,
    }
    true
}

fn int_number(v: &str) -> i32 {
    v.trim().parse().unwrap_or(0)
}

/// Parses a spin box number. Text that is not a finite number leaves `current`.
fn spin_number(v: &str, integer: bool, current: f64) -> f64 {
    if integer {
        return f64::from(int_number(v));
    }
    match v.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => {
            tracing::warn!(value = v, "ignoring spin box number");
            current
        }
    }
}

fn set_combo_items(combo: &mut ComboField, items: Vec<String>, ws: &WidgetSettings) {
    combo.default_index = match ws.default_index {
        Some(i) if i > 0 && (i as usize) < items.len() => i as usize,
        _ => 0,
    };
    combo.set_items(items);
}

fn text_field(ws: &WidgetSettings, content: String) -> TextField {
    let mut text = TextField::new(content);

    if !ws.image.is_empty() {
        tracing::debug!(image = %ws.image, "images in text widgets are not rendered");
        text.image = Some(ws.image.clone());
    }

    let bindings = ws
        .monitor_marker_files
        .iter()
        .zip(&ws.monitor_var_names)
        .zip(&ws.def_marker_vals);
    for (marker, ((file, var_name), default)) in text.markers.iter_mut().zip(bindings) {
        if file.is_empty() {
            continue;
        }
        *marker = Marker {
            file: Some(PathBuf::from(file)),
            var_name: var_name.clone(),
            default: default.clone(),
        };
    }

    text.refresh_markers();
    text
}

/// Completes a field once no more options can reach it.
fn finish_field(field: &mut Field, list_values: Vec<String>) {
    match &mut field.kind {
        FieldKind::List(list) => list.set_values(list_values),
        FieldKind::SpinBox(spin) => spin.set_value(spin.value),
        FieldKind::Scale(scale) => {
            scale.set_value(scale.value);
        }
        FieldKind::TextInfo(info) => {
            info.reload();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<FormArg> {
        list.iter()
            .map(|a| {
                let a = a.trim_start_matches("--");
                match a.split_once('=') {
                    Some((name, value)) => FormArg::new(name, Some(value)),
                    None => FormArg::new(a, None),
                }
            })
            .collect()
    }

    fn field(row: &Row) -> &Field {
        match &row.item {
            Item::Field(f) => f,
            other => panic!("expected field, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_spin_numbers_are_ignored() {
        let form = compile(args(&[
            "--add-double-spin-box=X",
            "--min-value=NaN",
            "--max-value=inf",
            "--value=-infinity",
        ]));
        match &field(&form.rows[0]).kind {
            FieldKind::SpinBox(spin) => {
                assert_eq!(spin.min, 0.0);
                assert_eq!(spin.max, 99.99);
                assert_eq!(spin.value, 0.0);
                assert_eq!(spin.value_text(), "0");
            }
            other => panic!("expected a spin box, got {other:?}"),
        }
    }

    #[test]
    fn labels_follow_widget_kind() {
        let form = compile(args(&[
            "--add-entry=Name",
            "--add-checkbox=Subscribe",
            "--add-checkbox=addLabel=Options@Notify",
            "--add-entry=hideLabel=true@Hidden label",
        ]));
        assert_eq!(form.rows.len(), 4);
        assert_eq!(form.rows[0].label.as_deref(), Some("Name"));
        assert_eq!(form.rows[1].label, None);
        assert_eq!(form.rows[2].label.as_deref(), Some("Options"));
        assert!(matches!(
            &field(&form.rows[2]).kind,
            FieldKind::Checkbox { text, .. } if text == "Notify"
        ));
        assert_eq!(form.rows[3].label, None);
    }

    #[test]
    fn options_apply_to_last_widget() {
        let form = compile(args(&[
            "--add-spin-box=Age",
            "--value=150",
            "--max-value=200",
            "--var=age",
            "--add-checkbox=Ok",
            "--checked",
        ]));
        let FieldKind::SpinBox(spin) = &field(&form.rows[0]).kind else {
            panic!("expected spin box");
        };
        assert_eq!(spin.value, 150.0);
        assert_eq!(field(&form.rows[0]).meta.var.as_deref(), Some("age"));
        assert!(matches!(
            field(&form.rows[1]).kind,
            FieldKind::Checkbox { checked: true, default: true, .. }
        ));
    }

    #[test]
    fn mismatched_option_is_ignored() {
        let form = compile(args(&["--add-entry=Name", "--checked", "--decimals=3"]));
        assert_eq!(form.rows.len(), 1);
        assert!(matches!(field(&form.rows[0]).kind, FieldKind::Entry { .. }));
    }

    #[test]
    fn groups_close_on_stop() {
        let form = compile(args(&[
            "--group=addLabel=Who@Person",
            "--add-entry=First",
            "--add-entry=Last",
            "--group=stop=1",
            "--add-entry=After",
        ]));
        assert_eq!(form.rows.len(), 2);
        assert_eq!(form.rows[0].label.as_deref(), Some("Who"));
        let Item::Group(group) = &form.rows[0].item else {
            panic!("expected group");
        };
        assert_eq!(group.title, "Person");
        assert_eq!(group.rows.len(), 2);
        assert_eq!(form.rows[1].label.as_deref(), Some("After"));
    }

    #[test]
    fn tabs_append_and_name() {
        let form = compile(args(&[
            "--tab=addLabel=Pages@One",
            "--add-entry=A",
            "--tab=One",
            "--add-entry=B",
            "--tab=",
            "--add-entry=C",
            "--tab-visible",
            "--tab=stop=1",
        ]));
        assert_eq!(form.rows.len(), 1);
        assert_eq!(form.rows[0].label.as_deref(), Some("Pages"));
        let Item::Tabs(bar) = &form.rows[0].item else {
            panic!("expected tabs");
        };
        assert_eq!(bar.tabs.len(), 2);
        assert_eq!(bar.tabs[0].rows.len(), 2);
        assert_eq!(bar.tabs[1].name, "Tab 1");
        assert_eq!(bar.current, 1);
    }

    #[test]
    fn groups_nest_inside_tabs() {
        let form = compile(args(&[
            "--tab=First",
            "--group=Inner",
            "--add-entry=A",
            "--tab=Second@disableButtons=1@selected=1",
            "--add-entry=B",
        ]));
        let Item::Tabs(bar) = &form.rows[0].item else {
            panic!("expected tabs");
        };
        assert!(matches!(bar.tabs[0].rows[0].item, Item::Group(_)));
        assert_eq!(bar.tabs[1].rows.len(), 1);
        assert!(bar.tabs[1].disable_buttons);
        assert!(bar.buttons_disabled());
    }

    #[test]
    fn columns_pair_up() {
        let form = compile(args(&[
            "--col1",
            "--add-entry=First",
            "--add-hspacer=after",
            "--col2",
            "--valign=center",
            "--add-entry=Last",
            "--col1",
            "--add-entry=Alone",
        ]));
        assert_eq!(form.rows.len(), 2);
        assert_eq!(form.rows[0].label.as_deref(), Some("First"));
        let Item::Columns(cols) = &form.rows[0].item else {
            panic!("expected columns");
        };
        assert_eq!(cols.left.hspacer, Some(HSpacer::After));
        assert_eq!(cols.right.label.as_deref(), Some("Last"));
        assert_eq!(cols.right.valign, VAlign::Center);
        assert_eq!(form.rows[1].label.as_deref(), Some("Alone"));
        assert!(matches!(form.rows[1].item, Item::Field(_)));
    }

    #[test]
    fn header_rows_are_separate() {
        let form = compile(args(&[
            "--header=backgroundColor=#333@Settings",
            "--add-text=Welcome",
            "--header=stop=1",
            "--add-entry=Name",
        ]));
        let header = form.header.as_ref().unwrap();
        assert_eq!(header.title.as_deref(), Some("Settings"));
        assert_eq!(header.background.as_deref(), Some("#333"));
        assert_eq!(header.rows.len(), 1);
        assert_eq!(form.rows.len(), 1);
    }

    #[test]
    fn first_menu_is_top_menu() {
        let form = compile(args(&["--add-menu=File#Quit;0", "--add-entry=A", "--add-menu=Help"]));
        assert!(form.top_menu.is_some());
        assert_eq!(form.rows.len(), 2);
        assert!(matches!(field(&form.rows[1]).kind, FieldKind::Menu(_)));
    }

    #[test]
    fn list_finishes_with_values() {
        let form = compile(args(&[
            "--add-list=Fruit",
            "--column-values=Pick|Name",
            "--checklist",
            "--list-values=TRUE|Apple|false|Pear",
            "--print-column=ALL",
        ]));
        let FieldKind::List(list) = &field(&form.rows[0]).kind else {
            panic!("expected list");
        };
        assert_eq!(list.rows.len(), 2);
        assert_eq!(list.checked, vec![true, false]);
        assert_eq!(list.print_column, PrintColumn::All);
    }

    #[test]
    fn combo_default_index_applies() {
        let form = compile(args(&["--add-combo=Size", "--combo-values=defaultIndex=2@S|M|L"]));
        let FieldKind::Combo(combo) = &field(&form.rows[0]).kind else {
            panic!("expected combo");
        };
        assert_eq!(combo.current_text(), "L");
    }

    #[test]
    fn vspacer_height_drops_spacing() {
        let form = compile(args(&["--add-vspacer=30", "--add-vspacer=5"]));
        assert!(matches!(field(&form.rows[0]).kind, FieldKind::VSpacer { height: 18 }));
        assert!(matches!(field(&form.rows[1]).kind, FieldKind::VSpacer { height: 0 }));
    }

    #[test]
    fn form_label_is_bold_unless_told() {
        let form = compile(args(&["--text=Hello", "--italics", "--add-entry=A"]));
        let label = form.label.unwrap();
        assert!(label.style.bold);
        assert!(label.style.italic);

        let form = compile(args(&["--no-bold", "--text=Hello"]));
        assert!(!form.label.unwrap().style.bold);
    }

    #[test]
    fn forms_settings() {
        let form = compile(args(&[
            "--separator=;",
            "--forms-date-format=%d/%m",
            "--action-after-ok-click=command=echo@keepOpen=1",
            "--footer-entries=5",
            "--no-cancel",
        ]));
        assert_eq!(form.settings.separator, ";");
        assert_eq!(form.settings.date_format.as_deref(), Some("%d/%m"));
        assert!(form.settings.ok_action.keep_open);
        assert_eq!(form.settings.footer.entries, 5);
        assert!(form.settings.no_cancel);
    }

    #[test]
    fn takes_value_table() {
        assert!(takes_value("add-entry"));
        assert!(takes_value("tab"));
        assert!(!takes_value("col1"));
        assert!(!takes_value("checklist"));
    }
}
