//! The compiled form tree.
//!
//! A [`Form`] is plain data: the compiler builds it, the dialog mutates field state in
//! place while the user interacts, and [`super::values`] reads it back out.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::{
    action::OkAction,
    menu::Menu,
    settings::MARKER_SLOTS,
    source::{self, FileSource},
};

pub const DEFAULT_SEPARATOR: &str = "|";
pub const DEFAULT_LIST_ROW_SEPARATOR: &str = "~";

/// Vertical gap between form rows, in logical pixels.
pub const ROW_SPACING: u32 = 12;

#[derive(Debug, Clone, Default)]
pub struct Form {
    pub label: Option<FormLabel>,
    pub header: Option<Header>,
    pub top_menu: Option<Menu>,
    pub rows: Vec<Row>,
    pub settings: FormSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormLabel {
    pub text: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub title: Option<String>,
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSettings {
    pub separator: String,
    pub list_row_separator: String,
    pub date_format: Option<String>,
    pub label_align: Align,
    pub no_cancel: bool,
    pub ok_action: OkAction,
    pub footer: FooterSettings,
    pub win_min_button: bool,
    pub win_max_button: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            list_row_separator: DEFAULT_LIST_ROW_SEPARATOR.to_string(),
            date_format: None,
            label_align: Align::Left,
            no_cancel: false,
            ok_action: OkAction::default(),
            footer: FooterSettings::default(),
            win_min_button: false,
            win_max_button: false,
        }
    }
}

/// Status area below the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FooterSettings {
    pub name: Option<String>,
    /// Number of entries kept on screen.
    pub entries: usize,
    pub file: Option<PathBuf>,
    pub monitor: bool,
}

impl Default for FooterSettings {
    fn default() -> Self {
        Self {
            name: None,
            entries: 3,
            file: None,
            monitor: false,
        }
    }
}

impl FooterSettings {
    pub fn is_enabled(&self, ok_action: &OkAction) -> bool {
        self.name.is_some()
            || self.file.is_some()
            || ok_action.values_to_footer
            || ok_action.command_to_footer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Text left of the item. `None` lets the item span the row.
    pub label: Option<String>,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Field(Field),
    Group(Group),
    Tabs(TabBar),
    Columns(Box<Columns>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub title: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabBar {
    pub tabs: Vec<Tab>,
    pub current: usize,
    pub verbose: bool,
}

impl TabBar {
    pub fn buttons_disabled(&self) -> bool {
        self.tabs.get(self.current).is_some_and(|t| t.disable_buttons)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tab {
    pub name: String,
    pub rows: Vec<Row>,
    pub disable_buttons: bool,
}

/// A two-field row. The left label is the row label; the right one is inline.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    pub left: Column,
    pub right: Column,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: Option<String>,
    pub field: Field,
    pub hspacer: Option<HSpacer>,
    pub valign: VAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HSpacer {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
    Baseline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub small_caps: bool,
    pub align: Align,
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub kind: FieldKind,
    pub meta: FieldMeta,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            meta: FieldMeta::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMeta {
    pub var: Option<String>,
    /// Hidden fields keep their space but are not user input.
    pub hidden: bool,
    pub exclude_from_output: bool,
    pub field_width: Option<u32>,
    pub field_height: Option<u32>,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Calendar { date: NaiveDate },
    Checkbox { text: String, checked: bool, default: bool },
    Entry { text: String, mode: EntryMode },
    Combo(ComboField),
    List(ListField),
    Scale(ScaleField),
    SpinBox(SpinField),
    Text(TextField),
    TextInfo(TextInfoField),
    HRule { color: Option<String> },
    VSpacer { height: u32 },
    Menu(Menu),
    QrCode { text: String, align: Align },
    FileSelection(FileSelField),
}

impl FieldKind {
    /// Name used in option diagnostics, matching the `--add-*` option.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Calendar { .. } => "calendar",
            FieldKind::Checkbox { .. } => "checkbox",
            FieldKind::Entry {
                mode: EntryMode::Password,
                ..
            } => "password",
            FieldKind::Entry { .. } => "entry",
            FieldKind::Combo(_) => "combo",
            FieldKind::List(_) => "list",
            FieldKind::Scale(_) => "scale",
            FieldKind::SpinBox(s) if s.integer => "spin-box",
            FieldKind::SpinBox(_) => "double-spin-box",
            FieldKind::Text(_) => "text",
            FieldKind::TextInfo(t) if t.browser => "text-browser",
            FieldKind::TextInfo(_) => "text-info",
            FieldKind::HRule { .. } => "hrule",
            FieldKind::VSpacer { .. } => "vspacer",
            FieldKind::Menu(_) => "menu",
            FieldKind::QrCode { .. } => "qr-code",
            FieldKind::FileSelection(_) => "file-selection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Text,
    Password,
    Int,
    Float,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComboField {
    pub items: Vec<String>,
    pub current: Option<usize>,
    /// Text of an editable combo.
    pub edit_text: String,
    pub editable: bool,
    pub default_index: usize,
    pub source: Option<FileSource>,
}

impl ComboField {
    pub fn set_items(&mut self, items: Vec<String>) {
        self.items = items;
        self.current = (!self.items.is_empty()).then_some(0);
        if self.default_index < self.items.len() {
            self.current = Some(self.default_index);
        }
        self.sync_edit_text();
    }

    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.current = Some(index);
            self.sync_edit_text();
        }
    }

    pub fn current_text(&self) -> &str {
        if self.editable {
            return &self.edit_text;
        }
        self.current
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn sync_edit_text(&mut self) {
        self.edit_text = self
            .current
            .and_then(|i| self.items.get(i))
            .cloned()
            .unwrap_or_default();
    }

    pub fn reset(&mut self) {
        self.current = (self.default_index < self.items.len()).then_some(self.default_index);
        self.sync_edit_text();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckMode {
    #[default]
    Off,
    Checklist,
    Radiolist,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Single,
    Multiple,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintColumn {
    All,
    /// 1-based. Zero matches no column.
    Index(usize),
}

impl PrintColumn {
    pub fn parse(s: &str) -> Self {
        let s = s.to_lowercase();
        if s == "all" {
            PrintColumn::All
        } else {
            PrintColumn::Index(s.trim().parse().unwrap_or(0))
        }
    }

    pub fn includes(self, index: usize) -> bool {
        match self {
            PrintColumn::All => true,
            PrintColumn::Index(n) => n == index + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrintValues {
    #[default]
    Selected,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListField {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub checked: Vec<bool>,
    pub selected: Vec<bool>,
    pub check_mode: CheckMode,
    pub selection: Selection,
    pub print_column: PrintColumn,
    pub print_values: PrintValues,
    /// 1-based column that stays read-only when the list is editable.
    pub read_only_column: Option<usize>,
    pub show_header: bool,
    pub editable: bool,
    pub add_row_button: bool,
    pub add_value: String,
    pub source: Option<FileSource>,
}

impl Default for ListField {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            checked: Vec::new(),
            selected: Vec::new(),
            check_mode: CheckMode::Off,
            selection: Selection::Single,
            print_column: PrintColumn::Index(1),
            print_values: PrintValues::Selected,
            read_only_column: None,
            show_header: false,
            editable: false,
            add_row_button: false,
            add_value: String::new(),
            source: None,
        }
    }
}

impl ListField {
    pub fn column_count(&self) -> usize {
        self.columns.len().max(1)
    }

    /// Replaces the rows from a flat list of cell values.
    pub fn set_values(&mut self, values: Vec<String>) {
        let columns = self.column_count();
        let values = insert_add_value(values, &self.add_value, columns);

        self.rows = values.chunks(columns).map(|c| c.to_vec()).collect();
        self.checked = self
            .rows
            .iter()
            .map(|row| {
                self.check_mode != CheckMode::Off
                    && row.first().is_some_and(|v| v.eq_ignore_ascii_case("true"))
            })
            .collect();
        if self.check_mode == CheckMode::Radiolist {
            let mut seen = false;
            for c in &mut self.checked {
                if *c && seen {
                    *c = false;
                }
                seen |= *c;
            }
        }
        self.selected = vec![false; self.rows.len()];
    }

    /// Toggles a check box or picks a radio button.
    pub fn toggle_check(&mut self, row: usize) {
        if row >= self.checked.len() {
            return;
        }
        match self.check_mode {
            CheckMode::Checklist => self.checked[row] = !self.checked[row],
            CheckMode::Radiolist => {
                for (i, c) in self.checked.iter_mut().enumerate() {
                    *c = i == row;
                }
            }
            CheckMode::Off => {}
        }
    }

    /// Applies a click on a row. `extend` adds to a multiple selection.
    pub fn select(&mut self, row: usize, extend: bool) {
        if row >= self.selected.len() || self.selection == Selection::None {
            return;
        }
        if self.selection == Selection::Multiple && extend {
            self.selected[row] = !self.selected[row];
        } else {
            for (i, s) in self.selected.iter_mut().enumerate() {
                *s = i == row;
            }
        }
    }

    pub fn add_row(&mut self) {
        let mut row = vec![String::new(); self.column_count()];
        if self.check_mode != CheckMode::Off {
            row[0] = "false".to_string();
        }
        self.rows.push(row);
        self.checked.push(false);
        self.selected.push(false);
    }

    pub fn is_cell_editable(&self, column: usize) -> bool {
        self.editable
            && !(self.check_mode != CheckMode::Off && column == 0)
            && self.read_only_column != Some(column + 1)
    }

    pub fn clear_selection(&mut self) {
        self.selected.iter_mut().for_each(|s| *s = false);
    }
}

/// Inserts `add_value` before every `columns - 1` values.
fn insert_add_value(values: Vec<String>, add_value: &str, columns: usize) -> Vec<String> {
    if add_value.is_empty() {
        return values;
    }
    let every = columns.saturating_sub(1).max(1);
    let mut out = Vec::with_capacity(values.len() + values.len() / every + 1);
    for (i, v) in values.into_iter().enumerate() {
        if i % every == 0 {
            out.push(add_value.to_string());
        }
        out.push(v);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleField {
    pub value: i32,
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: Option<i32>,
    pub hide_value: bool,
    pub print_partial: bool,
}

impl Default for ScaleField {
    fn default() -> Self {
        Self {
            value: 0,
            min: 0,
            max: 100,
            step: 1,
            default: None,
            hide_value: false,
            print_partial: false,
        }
    }
}

impl ScaleField {
    /// Sets the value clamped to the range. Returns true if it changed.
    pub fn set_value(&mut self, value: i32) -> bool {
        let value = value.clamp(self.min, self.max.max(self.min));
        let changed = value != self.value;
        self.value = value;
        changed
    }

    pub fn reset(&mut self) {
        self.set_value(self.default.unwrap_or(self.min));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinField {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub decimals: u32,
    pub prefix: String,
    pub suffix: String,
    pub default: Option<f64>,
    pub integer: bool,
}

impl SpinField {
    pub fn integer() -> Self {
        Self {
            value: 0.0,
            min: 0.0,
            max: 99.0,
            step: 1.0,
            decimals: 0,
            prefix: String::new(),
            suffix: String::new(),
            default: None,
            integer: true,
        }
    }

    pub fn double() -> Self {
        Self {
            max: 99.99,
            decimals: 2,
            integer: false,
            ..Self::integer()
        }
    }

    pub fn set_value(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        let factor = 10f64.powi(self.decimals as i32);
        let rounded = (value * factor).round() / factor;
        self.value = rounded.clamp(self.min, self.max.max(self.min));
    }

    pub fn step_by(&mut self, steps: f64) {
        self.set_value(self.value + self.step * steps);
    }

    /// Value as printed: rounded to `decimals` without trailing zeros.
    pub fn value_text(&self) -> String {
        format_number(self.value, if self.integer { 0 } else { self.decimals })
    }

    /// Value as displayed, with prefix, suffix and all decimals.
    pub fn display_text(&self) -> String {
        let precision = if self.integer { 0 } else { self.decimals as usize };
        format!("{}{:.*}{}", self.prefix, precision, self.value, self.suffix)
    }

    pub fn reset(&mut self) {
        self.set_value(self.default.unwrap_or(self.min));
    }
}

/// Formats `value` with at most `decimals` digits and no trailing zeros.
pub fn format_number(value: f64, decimals: u32) -> String {
    let text = format!("{:.*}", decimals as usize, value);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if text == "-0" { "0".to_string() } else { text }
}

/// One `GUID_MARKER_N` binding of a text widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Marker {
    pub file: Option<PathBuf>,
    pub var_name: String,
    pub default: String,
}

impl Marker {
    fn default_text(&self) -> &str {
        if self.default.is_empty() { "(?)" } else { &self.default }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextField {
    /// Content with `GUID_MARKER_N` placeholders.
    pub template: String,
    /// Content currently shown.
    pub text: String,
    pub style: TextStyle,
    pub wrap: bool,
    pub image: Option<String>,
    pub markers: [Marker; MARKER_SLOTS],
}

impl TextField {
    pub fn new(template: String) -> Self {
        Self {
            text: template.clone(),
            template,
            ..Default::default()
        }
    }

    pub fn has_markers(&self) -> bool {
        self.markers.iter().any(|m| m.file.is_some())
    }

    /// Substitutes marker placeholders from their files. Returns true if the shown
    /// text changed.
    pub fn refresh_markers(&mut self) -> bool {
        if !self.has_markers() {
            return false;
        }

        let mut text = self.template.clone();
        for (i, marker) in self.markers.iter().enumerate() {
            let placeholder = format!("GUID_MARKER_{}", i + 1);
            let value = marker
                .file
                .as_deref()
                .and_then(|path| source::read_marker(path, &marker.var_name))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| marker.default_text().to_string());
            text = text.replace(&placeholder, &value);
        }

        let changed = text != self.text;
        self.text = text;
        changed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextFormat {
    #[default]
    Guess,
    Plain,
    Html,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInfoField {
    pub text: String,
    pub editable: bool,
    pub format: TextFormat,
    pub newline_separator: Option<String>,
    pub file: Option<PathBuf>,
    pub monitor: bool,
    pub font: Option<String>,
    pub style: TextStyle,
    /// Read-only HTML viewer added with `--add-text-browser`.
    pub browser: bool,
}

impl TextInfoField {
    /// Reloads the text from its file.
    pub fn reload(&mut self) -> bool {
        let Some(path) = &self.file else {
            return false;
        };
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let text = text.trim_end_matches('\n').to_string();
                let changed = text != self.text;
                self.text = text;
                changed
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read text: {e}");
                false
            }
        }
    }

    /// Whether the text is shown as HTML with tags stripped.
    pub fn is_html(&self) -> bool {
        match self.format {
            TextFormat::Html => true,
            TextFormat::Plain => false,
            TextFormat::Guess => self.browser || looks_like_html(&self.text),
        }
    }

    /// Text as shown and printed.
    pub fn plain_text(&self) -> String {
        if self.is_html() { strip_html(&self.text) } else { self.text.clone() }
    }
}

/// Drops markup, turning line-breaking tags into newlines and decoding basic entities.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            rest = &rest[start..];
            break;
        };
        let tag = rest[start + 1..start + end].trim().to_lowercase();
        let name = tag.trim_start_matches('/').split([' ', '/']).next().unwrap_or("");
        if matches!(name, "br" | "p" | "div" | "li" | "tr" | "h1" | "h2" | "h3")
            && !out.is_empty()
            && !out.ends_with('\n')
        {
            out.push('\n');
        }
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);

    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim_end()
        .to_string()
}

fn looks_like_html(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    lower.starts_with("<!doctype") || lower.starts_with("<html") || lower.contains("<br")
}

/// A named set of glob patterns, written `Name | *.a *.b`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFilter {
    pub name: String,
    pub patterns: Vec<String>,
}

impl FileFilter {
    pub fn parse(spec: &str) -> Self {
        let (name, patterns) = match spec.split_once('|') {
            Some((name, patterns)) => (name.trim().to_string(), patterns),
            None => (spec.trim().to_string(), spec),
        };
        Self {
            name,
            patterns: patterns.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.patterns.iter().any(|p| glob_match(&p.to_lowercase(), &name))
    }
}

/// Matches `*` and `?` wildcards.
fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSelField {
    pub path: String,
    pub multiple: bool,
    pub directory: bool,
    pub filters: Vec<FileFilter>,
    /// Joins multiple paths. Falls back to the form separator.
    pub separator: Option<String>,
    pub button_text: String,
    /// Directory the picker opens in.
    pub start_dir: Option<PathBuf>,
}

impl Field {
    /// Restores the state a field has after `keepOpen` submission.
    pub fn reset(&mut self) {
        match &mut self.kind {
            FieldKind::Entry {
                text, ..
            } => text.clear(),
            FieldKind::Checkbox {
                checked,
                default,
                ..
            } => *checked = *default,
            FieldKind::Combo(combo) => combo.reset(),
            FieldKind::Scale(scale) => scale.reset(),
            FieldKind::SpinBox(spin) => spin.reset(),
            FieldKind::List(list) => list.clear_selection(),
            FieldKind::TextInfo(info) if info.editable => info.text.clear(),
            FieldKind::FileSelection(sel) => sel.path.clear(),
            _ => {}
        }
    }
}

impl Row {
    pub fn field(label: Option<String>, field: Field) -> Self {
        Self {
            label,
            item: Item::Field(field),
        }
    }
}

/// Calls `f` on every field in `rows`, depth first.
pub fn visit_fields_mut(rows: &mut [Row], f: &mut dyn FnMut(&mut Field)) {
    for row in rows {
        match &mut row.item {
            Item::Field(field) => f(field),
            Item::Group(group) => visit_fields_mut(&mut group.rows, f),
            Item::Tabs(bar) => {
                for tab in &mut bar.tabs {
                    visit_fields_mut(&mut tab.rows, f);
                }
            }
            Item::Columns(cols) => {
                f(&mut cols.left.field);
                f(&mut cols.right.field);
            }
        }
    }
}

impl Form {
    /// Calls `f` on every field of the header and the body.
    pub fn for_each_field_mut(&mut self, f: &mut dyn FnMut(&mut Field)) {
        if let Some(header) = &mut self.header {
            visit_fields_mut(&mut header.rows, f);
        }
        visit_fields_mut(&mut self.rows, f);
    }

    /// Resets every body field to its default.
    pub fn reset(&mut self) {
        visit_fields_mut(&mut self.rows, &mut |field| field.reset());
    }

    /// Returns true if a visible tab asks for the dialog buttons to be disabled.
    pub fn buttons_disabled(&self) -> bool {
        fn scan(rows: &[Row]) -> bool {
            rows.iter().any(|row| match &row.item {
                Item::Tabs(bar) => {
                    bar.buttons_disabled()
                        || bar.tabs.get(bar.current).is_some_and(|t| scan(&t.rows))
                }
                Item::Group(group) => scan(&group.rows),
                _ => false,
            })
        }
        scan(&self.rows)
    }

    /// Every field of the header and the body, depth first. Fields of hidden tabs are
    /// included, so an index into this list is stable for the life of the form.
    pub fn fields(&self) -> Vec<&Field> {
        let mut out = Vec::new();
        if let Some(header) = &self.header {
            collect_fields(&header.rows, &mut out);
        }
        collect_fields(&self.rows, &mut out);
        out
    }

    /// Mutable counterpart of [`Form::fields`], in the same order.
    pub fn fields_mut(&mut self) -> Vec<&mut Field> {
        let mut out = Vec::new();
        if let Some(header) = &mut self.header {
            collect_fields_mut(&mut header.rows, &mut out);
        }
        collect_fields_mut(&mut self.rows, &mut out);
        out
    }

    /// The tab bar at `index`, counting header then body, each bar before the bars
    /// nested in its tabs.
    pub fn tab_bar_mut(&mut self, index: usize) -> Option<&mut TabBar> {
        fn find<'a>(rows: &'a mut [Row], index: usize, seen: &mut usize) -> Option<&'a mut TabBar> {
            for row in rows {
                match &mut row.item {
                    Item::Tabs(bar) => {
                        if *seen == index {
                            return Some(bar);
                        }
                        *seen += 1;
                        for tab in &mut bar.tabs {
                            if let Some(found) = find(&mut tab.rows, index, seen) {
                                return Some(found);
                            }
                        }
                    }
                    Item::Group(group) => {
                        if let Some(found) = find(&mut group.rows, index, seen) {
                            return Some(found);
                        }
                    }
                    _ => {}
                }
            }
            None
        }

        let mut seen = 0;
        if let Some(header) = &mut self.header {
            if let Some(found) = find(&mut header.rows, index, &mut seen) {
                return Some(found);
            }
        }
        find(&mut self.rows, index, &mut seen)
    }

    /// Files that must be polled for changes.
    pub fn monitored_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for field in self.fields() {
            match &field.kind {
                FieldKind::Combo(ComboField {
                    source: Some(src), ..
                }) if src.monitor => paths.push(src.path.clone()),
                FieldKind::List(ListField {
                    source: Some(src), ..
                }) if src.monitor => paths.push(src.path.clone()),
                FieldKind::Text(text) => {
                    paths.extend(text.markers.iter().filter_map(|m| m.file.clone()));
                }
                FieldKind::TextInfo(info) if info.monitor => paths.extend(info.file.clone()),
                _ => {}
            }
        }
        if self.settings.footer.monitor {
            paths.extend(self.settings.footer.file.clone());
        }
        paths.sort();
        paths.dedup();
        paths
    }

    /// Reloads every field bound to `path`. Returns true if anything shown changed.
    pub fn reload_sources(&mut self, path: &Path) -> bool {
        let mut changed = false;
        for field in self.fields_mut() {
            match &mut field.kind {
                FieldKind::Combo(combo) => {
                    let values = match &combo.source {
                        Some(src) if src.monitor && src.path == path => src.read_values(),
                        _ => continue,
                    };
                    tracing::debug!(path = %path.display(), "reloading combo values");
                    combo.set_items(values);
                    changed = true;
                }
                FieldKind::List(list) => {
                    let values = match &list.source {
                        Some(src) if src.monitor && src.path == path => src.read_values(),
                        _ => continue,
                    };
                    tracing::debug!(path = %path.display(), "reloading list values");
                    list.set_values(values);
                    changed = true;
                }
                FieldKind::Text(text)
                    if text.markers.iter().any(|m| m.file.as_deref() == Some(path)) =>
                {
                    changed |= text.refresh_markers();
                }
                FieldKind::TextInfo(info)
                    if info.monitor && info.file.as_deref() == Some(path) =>
                {
                    changed |= info.reload();
                }
                _ => {}
            }
        }
        changed
    }
}

fn collect_fields<'a>(rows: &'a [Row], out: &mut Vec<&'a Field>) {
    for row in rows {
        match &row.item {
            Item::Field(field) => out.push(field),
            Item::Group(group) => collect_fields(&group.rows, out),
            Item::Tabs(bar) => {
                for tab in &bar.tabs {
                    collect_fields(&tab.rows, out);
                }
            }
            Item::Columns(cols) => {
                out.push(&cols.left.field);
                out.push(&cols.right.field);
            }
        }
    }
}

fn collect_fields_mut<'a>(rows: &'a mut [Row], out: &mut Vec<&'a mut Field>) {
    for row in rows {
        match &mut row.item {
            Item::Field(field) => out.push(field),
            Item::Group(group) => collect_fields_mut(&mut group.rows, out),
            Item::Tabs(bar) => {
                for tab in &mut bar.tabs {
                    collect_fields_mut(&mut tab.rows, out);
                }
            }
            Item::Columns(cols) => {
                out.push(&mut cols.left.field);
                out.push(&mut cols.right.field);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn tab_bar(names: &[&str], nested: Vec<Row>) -> Row {
        let mut tabs: Vec<Tab> = names
            .iter()
            .map(|name| Tab {
                name: name.to_string(),
                ..Default::default()
            })
            .collect();
        tabs[0].rows = nested;
        Row {
            label: None,
            item: Item::Tabs(TabBar {
                tabs,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn tab_bars_are_found_outer_before_nested() {
        let inner = tab_bar(&["Inner"], Vec::new());
        let grouped = Row {
            label: None,
            item: Item::Group(Group {
                title: "More".into(),
                rows: vec![tab_bar(&["Last"], Vec::new())],
            }),
        };
        let mut form = Form {
            rows: vec![tab_bar(&["Outer", "Second"], vec![inner]), grouped],
            ..Default::default()
        };

        let name = |form: &mut Form, index| form.tab_bar_mut(index).map(|bar| bar.tabs[0].name.clone());
        assert_eq!(name(&mut form, 0).as_deref(), Some("Outer"));
        assert_eq!(name(&mut form, 1).as_deref(), Some("Inner"));
        assert_eq!(name(&mut form, 2).as_deref(), Some("Last"));
        assert_eq!(name(&mut form, 3), None);

        form.tab_bar_mut(0).unwrap().current = 1;
        assert_eq!(form.tab_bar_mut(0).unwrap().current, 1);
    }

    #[test]
    fn list_rows_chunk_by_columns() {
        let mut list = ListField {
            columns: strings(&["Name", "Size"]),
            ..Default::default()
        };
        list.set_values(strings(&["a", "1", "b", "2", "c"]));
        assert_eq!(list.rows, vec![strings(&["a", "1"]), strings(&["b", "2"]), strings(&["c"])]);
        assert_eq!(list.selected, vec![false; 3]);
    }

    #[test]
    fn add_value_prefixes_each_row() {
        let mut list = ListField {
            columns: strings(&["", "Item", "Price"]),
            check_mode: CheckMode::Checklist,
            add_value: "false".into(),
            ..Default::default()
        };
        list.set_values(strings(&["apple", "1", "pear", "2"]));
        assert_eq!(list.rows[1], strings(&["false", "pear", "2"]));
        assert_eq!(list.checked, vec![false, false]);
    }

    #[test]
    fn radiolist_keeps_first_checked_only() {
        let mut list = ListField {
            columns: strings(&["", "Opt"]),
            check_mode: CheckMode::Radiolist,
            ..Default::default()
        };
        list.set_values(strings(&["TRUE", "a", "true", "b", "false", "c"]));
        assert_eq!(list.checked, vec![true, false, false]);
        list.toggle_check(2);
        assert_eq!(list.checked, vec![false, false, true]);
    }

    #[test]
    fn multiple_selection_extends() {
        let mut list = ListField {
            selection: Selection::Multiple,
            ..Default::default()
        };
        list.set_values(strings(&["a", "b", "c"]));
        list.select(0, false);
        list.select(2, true);
        assert_eq!(list.selected, vec![true, false, true]);
        list.select(1, false);
        assert_eq!(list.selected, vec![false, true, false]);
    }

    #[test]
    fn combo_default_index() {
        let mut combo = ComboField {
            default_index: 2,
            ..Default::default()
        };
        combo.set_items(strings(&["a", "b", "c"]));
        assert_eq!(combo.current_text(), "c");
        combo.select(0);
        combo.reset();
        assert_eq!(combo.current, Some(2));

        combo.default_index = 7;
        combo.set_items(strings(&["x"]));
        assert_eq!(combo.current_text(), "x");
    }

    #[test]
    fn spin_rounding_and_text() {
        let mut spin = SpinField::double();
        spin.max = 1000.0;
        spin.set_value(12.345);
        assert_eq!(spin.value_text(), "12.35");
        spin.set_value(3.0);
        assert_eq!(spin.value_text(), "3");
        spin.prefix = "$".into();
        assert_eq!(spin.display_text(), "$3.00");
        spin.set_value(5000.0);
        assert_eq!(spin.value, 1000.0);
        spin.set_value(f64::NAN);
        assert_eq!(spin.value, 1000.0);
    }

    #[test]
    fn format_number_trims() {
        assert_eq!(format_number(2.50, 2), "2.5");
        assert_eq!(format_number(-0.001, 2), "0");
        assert_eq!(format_number(42.0, 0), "42");
    }

    #[test]
    fn scale_clamps_and_resets() {
        let mut scale = ScaleField {
            min: 10,
            ..Default::default()
        };
        assert!(scale.set_value(500));
        assert_eq!(scale.value, 100);
        scale.reset();
        assert_eq!(scale.value, 10);
        scale.default = Some(40);
        scale.reset();
        assert_eq!(scale.value, 40);
    }

    #[test]
    fn file_filters() {
        let filter = FileFilter::parse("Images | *.png *.JPG");
        assert_eq!(filter.name, "Images");
        assert!(filter.matches("photo.jpg"));
        assert!(!filter.matches("notes.txt"));

        let bare = FileFilter::parse("*.tar.?z");
        assert!(bare.matches("src.tar.gz"));
        assert!(bare.matches("src.tar.xz"));
        assert!(!bare.matches("src.tar"));
    }

    #[test]
    fn html_is_stripped() {
        assert_eq!(strip_html("<b>Hi</b> &amp; bye<br>next"), "Hi & bye\nnext");
        assert_eq!(strip_html("<p>one</p><p>two</p>"), "one\ntwo");
        assert_eq!(strip_html("a < b"), "a < b");
    }

    #[test]
    fn read_only_cells() {
        let list = ListField {
            columns: strings(&["", "A", "B"]),
            check_mode: CheckMode::Checklist,
            editable: true,
            read_only_column: Some(3),
            ..Default::default()
        };
        assert!(!list.is_cell_editable(0));
        assert!(list.is_cell_editable(1));
        assert!(!list.is_cell_editable(2));
    }
}
