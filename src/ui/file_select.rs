//! The file picker a file-selection field opens over the dialog.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use super::widgets::{
    Ctx, Input, Response, button::Button, clipped, draw_scrollbar, draw_text_centered,
    text_input::TextInput,
};
use crate::{
    backend::{Modifiers, MouseButton, keys},
    config::FileSelectionConfig,
    forms::model::{FileFilter, FileSelField},
    render::{Canvas, Rect, Rgba, rgb},
};

const MARGIN: f32 = 24.0;
const PADDING: f32 = 12.0;
const BAR_HEIGHT: f32 = 32.0;
const ITEM_HEIGHT: f32 = 26.0;
const ICON_SIZE: f32 = 16.0;
const PLACES_WIDTH: f32 = 150.0;
const SEARCH_WIDTH: f32 = 200.0;
const WHEEL_ROWS: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
struct DirEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Place {
    name: String,
    path: PathBuf,
}

/// What a picker event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ignored,
    Handled,
    /// The chosen paths, joined by the field's separator.
    Chosen(String),
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default)]
struct Geometry {
    panel: Rect,
    path: Rect,
    search: Rect,
    places: Rect,
    list: Rect,
}

pub(crate) struct FilePicker {
    /// Index of the field the result goes to.
    pub field: usize,
    dir: PathBuf,
    entries: Vec<DirEntry>,
    /// Indices into `entries` that pass the search and the file filter.
    shown: Vec<usize>,
    /// Positions in `shown`, kept sorted.
    selected: Vec<usize>,
    anchor: Option<usize>,
    first: usize,
    search: String,
    search_input: TextInput,
    search_focused: bool,
    filters: Vec<FileFilter>,
    filter: usize,
    multiple: bool,
    directory: bool,
    separator: String,
    show_hidden: bool,
    places: Vec<Place>,
    geometry: Geometry,
    open: Button,
    cancel: Button,
    filter_button: Button,
}

impl FilePicker {
    pub fn new(field: usize, sel: &FileSelField, form_separator: &str, config: &FileSelectionConfig) -> Self {
        let mut picker = Self {
            field,
            dir: start_dir(sel),
            entries: Vec::new(),
            shown: Vec::new(),
            selected: Vec::new(),
            anchor: None,
            first: 0,
            search: String::new(),
            search_input: TextInput::default(),
            search_focused: false,
            filters: sel.filters.clone(),
            filter: 0,
            multiple: sel.multiple,
            directory: sel.directory,
            separator: sel.separator.clone().unwrap_or_else(|| form_separator.to_string()),
            show_hidden: config.show_hidden,
            places: build_places(&config.bookmarks),
            geometry: Geometry::default(),
            open: Button::new("Open"),
            cancel: Button::new("Cancel"),
            filter_button: Button::new(""),
        };
        picker.set_filter(0);
        picker.reload();
        tracing::debug!(dir = %picker.dir.display(), "file picker opened");
        picker
    }

    fn reload(&mut self) {
        load_directory(&self.dir, &mut self.entries, self.directory, self.show_hidden);
        self.refilter();
    }

    fn refilter(&mut self) {
        let filter = self.filters.get(self.filter);
        update_shown(&self.entries, &self.search.to_lowercase(), filter, &mut self.shown);
        self.selected.clear();
        self.anchor = None;
        self.first = 0;
    }

    fn set_filter(&mut self, index: usize) {
        self.filter = index;
        let rect = self.filter_button.rect;
        let label = self.filters.get(index).map_or(String::new(), |f| format!("{} \u{25be}", f.name));
        self.filter_button = Button::new(&label);
        self.filter_button.rect = rect;
    }

    fn navigate(&mut self, dir: PathBuf) {
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "not a directory");
            return;
        }
        self.dir = dir;
        self.search.clear();
        self.search_input = TextInput::default();
        self.reload();
    }

    /// Places the panel and its buttons inside the window area `bounds`.
    pub fn place(&mut self, bounds: Rect, cx: &Ctx) {
        let margin = cx.px(MARGIN);
        let pad = cx.px(PADDING);
        let bar = cx.px(BAR_HEIGHT);
        let panel = bounds.inset(margin.min(bounds.w / 8).min(bounds.h / 8));
        let inner = panel.inset(pad);

        let search_w = cx.px(SEARCH_WIDTH).min(inner.w / 2);
        let search = Rect::new(inner.right() - search_w, inner.y, search_w, bar);
        let path = Rect::new(inner.x, inner.y, (search.x - pad - inner.x).max(0), bar);

        let (open_w, _) = self.open.measure(cx);
        let (cancel_w, _) = self.cancel.measure(cx);
        let button_y = inner.bottom() - bar;
        self.open.rect = Rect::new(inner.right() - open_w, button_y, open_w, bar);
        self.cancel.rect = Rect::new(self.open.rect.x - pad - cancel_w, button_y, cancel_w, bar);
        self.filter_button.rect = if self.filters.is_empty() {
            Rect::default()
        } else {
            let (w, _) = self.filter_button.measure(cx);
            Rect::new(inner.x, button_y, w.min(inner.w / 2), bar)
        };

        let middle_y = search.bottom() + pad;
        let middle_h = (button_y - pad - middle_y).max(0);
        let places_w = cx.px(PLACES_WIDTH).min(inner.w / 3);
        let places = Rect::new(inner.x, middle_y, places_w, middle_h);
        let list = Rect::new(places.right() + pad, middle_y, (inner.right() - places.right() - pad).max(0), middle_h);

        self.geometry = Geometry {
            panel,
            path,
            search,
            places,
            list,
        };
        self.open.enabled = self.can_open();
    }

    fn rows_visible(&self, cx: &Ctx) -> usize {
        (self.geometry.list.h / cx.px(ITEM_HEIGHT).max(1)).max(1) as usize
    }

    fn row_at(&self, y: i32, cx: &Ctx) -> Option<usize> {
        let list = self.geometry.list;
        let row = self.first + ((y - list.y) / cx.px(ITEM_HEIGHT).max(1)) as usize;
        (row < self.shown.len()).then_some(row)
    }

    fn entry(&self, row: usize) -> Option<&DirEntry> {
        self.shown.get(row).and_then(|&i| self.entries.get(i))
    }

    /// Whether `entry` may end up in the result.
    fn selectable(&self, entry: &DirEntry) -> bool {
        entry.name != ".." && entry.is_dir == self.directory
    }

    fn can_open(&self) -> bool {
        self.directory || !self.chosen().is_empty()
    }

    fn chosen(&self) -> Vec<&Path> {
        self.selected
            .iter()
            .filter_map(|&row| self.entry(row))
            .filter(|e| self.selectable(e))
            .map(|e| e.path.as_path())
            .collect()
    }

    /// The result line, or `None` when nothing can be returned yet.
    fn result(&self) -> Option<String> {
        let chosen = self.chosen();
        if chosen.is_empty() {
            return self.directory.then(|| self.dir.display().to_string());
        }
        Some(
            chosen
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(&self.separator),
        )
    }

    fn select(&mut self, row: usize, modifiers: Modifiers) {
        let multiple = self.multiple;
        if multiple && modifiers.contains(Modifiers::SHIFT) {
            let anchor = self.anchor.unwrap_or(row);
            self.selected = (anchor.min(row)..=anchor.max(row)).collect();
            return;
        }
        if multiple && modifiers.contains(Modifiers::CTRL) {
            match self.selected.binary_search(&row) {
                Ok(pos) => {
                    self.selected.remove(pos);
                }
                Err(pos) => self.selected.insert(pos, row),
            }
        } else {
            self.selected = vec![row];
        }
        self.anchor = Some(row);
    }

    fn scroll_to(&mut self, row: usize, cx: &Ctx) {
        let visible = self.rows_visible(cx);
        if row < self.first {
            self.first = row;
        } else if row >= self.first + visible {
            self.first = row + 1 - visible;
        }
    }

    fn scroll_by(&mut self, rows: i32, cx: &Ctx) {
        let max = self.shown.len().saturating_sub(self.rows_visible(cx));
        self.first = (self.first as i64 + rows as i64).clamp(0, max as i64) as usize;
    }

    /// Opens the directory at `row`, or chooses it when it is a file.
    fn activate(&mut self, row: usize) -> Outcome {
        let Some(entry) = self.entry(row).cloned() else {
            return Outcome::Handled;
        };
        if entry.is_dir {
            self.navigate(entry.path);
            return Outcome::Handled;
        }
        self.selected = vec![row];
        self.finish()
    }

    fn finish(&self) -> Outcome {
        match self.result() {
            Some(result) => Outcome::Chosen(result),
            None => Outcome::Handled,
        }
    }

    fn key(&mut self, keysym: u32, modifiers: Modifiers, cx: &Ctx) -> Outcome {
        if self.search_focused {
            match self.search_input.handle_key(&mut self.search, keysym, modifiers) {
                Response::Changed => {
                    self.refilter();
                    return Outcome::Handled;
                }
                Response::Handled => return Outcome::Handled,
                _ => {}
            }
        }

        let last = self.shown.len().saturating_sub(1);
        let cursor = self.anchor;
        let next = match keysym {
            keys::ESCAPE => return Outcome::Cancelled,
            keys::TAB | keys::ISO_LEFT_TAB => {
                self.search_focused = !self.search_focused;
                return Outcome::Handled;
            }
            keys::RETURN | keys::KP_ENTER => {
                // Return on a directory that cannot be chosen opens it.
                let opens = match cursor.and_then(|row| self.entry(row)) {
                    Some(entry) => self.selected.len() == 1 && entry.is_dir && !self.selectable(entry),
                    None => false,
                };
                return match cursor {
                    Some(row) if opens => self.activate(row),
                    _ => self.finish(),
                };
            }
            keys::BACKSPACE => {
                if let Some(parent) = self.dir.parent().map(Path::to_path_buf) {
                    self.navigate(parent);
                }
                return Outcome::Handled;
            }
            keys::UP => cursor.map_or(0, |r| r.saturating_sub(1)),
            keys::DOWN => cursor.map_or(0, |r| (r + 1).min(last)),
            keys::PAGE_UP => cursor.map_or(0, |r| r.saturating_sub(self.rows_visible(cx))),
            keys::PAGE_DOWN => cursor.map_or(0, |r| (r + self.rows_visible(cx)).min(last)),
            keys::HOME => 0,
            keys::END => last,
            _ => return Outcome::Ignored,
        };
        if !self.shown.is_empty() {
            self.select(next, modifiers & Modifiers::SHIFT);
            self.scroll_to(next, cx);
        }
        Outcome::Handled
    }

    fn press(&mut self, x: i32, y: i32, modifiers: Modifiers, double: bool, cx: &Ctx) -> Outcome {
        let g = self.geometry;
        if !g.panel.contains(x, y) {
            return Outcome::Cancelled;
        }
        self.search_focused = g.search.contains(x, y);
        if self.search_focused {
            self.search_input.click(&self.search, g.search, x, cx);
            return Outcome::Handled;
        }
        if self.filter_button.rect.contains(x, y) && !self.filters.is_empty() {
            self.set_filter((self.filter + 1) % self.filters.len());
            self.refilter();
            return Outcome::Handled;
        }
        if g.places.contains(x, y) {
            let index = ((y - g.places.y) / cx.px(ITEM_HEIGHT).max(1)) as usize;
            if let Some(place) = self.places.get(index) {
                let path = place.path.clone();
                self.navigate(path);
            }
            return Outcome::Handled;
        }
        if g.list.contains(x, y) {
            if let Some(row) = self.row_at(y, cx) {
                if double {
                    return self.activate(row);
                }
                self.select(row, modifiers);
            }
        }
        Outcome::Handled
    }

    pub fn event(&mut self, input: &Input, cx: &Ctx) -> Outcome {
        self.open.process(input);
        self.cancel.process(input);
        if self.open.was_clicked() {
            return self.finish();
        }
        if self.cancel.was_clicked() {
            return Outcome::Cancelled;
        }

        let outcome = match *input {
            Input::Press {
                x,
                y,
                button: MouseButton::Left,
                modifiers,
                double,
            } if !self.open.rect.contains(x, y) && !self.cancel.rect.contains(x, y) => {
                self.press(x, y, modifiers, double, cx)
            }
            Input::Scroll {
                x,
                y,
                delta,
            } if self.geometry.list.contains(x, y) => {
                self.scroll_by(delta * WHEEL_ROWS, cx);
                Outcome::Handled
            }
            Input::Key {
                keysym,
                modifiers,
            } => self.key(keysym, modifiers, cx),
            Input::Text(c) => {
                self.search_focused = true;
                if self.search_input.insert_char(&mut self.search, c) == Response::Changed {
                    self.refilter();
                }
                Outcome::Handled
            }
            // The picker is modal: nothing reaches the form below it.
            _ => Outcome::Handled,
        };
        self.open.enabled = self.can_open();
        outcome
    }

    pub fn draw(&self, canvas: &mut Canvas, cx: &Ctx) {
        let colors = cx.colors;
        let g = self.geometry;
        let bounds = canvas.bounds();
        canvas.fill_rect(bounds, Rgba::new(0, 0, 0, 110));
        canvas.fill_rounded_rect(g.panel, 8.0 * cx.scale, colors.window_bg);
        canvas.stroke_rounded_rect(g.panel, 8.0 * cx.scale, colors.frame, 1.0);

        clipped(canvas, g.path, |canvas| {
            let text = self.dir.display().to_string();
            draw_text_centered(canvas, cx.font, &text, g.path, colors.text);
        });
        self.search_input.draw(canvas, g.search, &self.search, "Search", self.search_focused, cx);

        self.draw_places(canvas, cx);
        self.draw_list(canvas, cx);

        if !self.filters.is_empty() {
            self.filter_button.draw(canvas, cx);
        }
        self.cancel.draw(canvas, cx);
        self.open.draw(canvas, cx);
    }

    fn draw_places(&self, canvas: &mut Canvas, cx: &Ctx) {
        let colors = cx.colors;
        let area = self.geometry.places;
        let item_h = cx.px(ITEM_HEIGHT);
        clipped(canvas, area, |canvas| {
            for (i, place) in self.places.iter().enumerate() {
                let row = Rect::new(area.x, area.y + i as i32 * item_h, area.w, item_h);
                let current = place.path == self.dir;
                if current {
                    canvas.fill_rounded_rect(row, 4.0 * cx.scale, colors.button);
                } else if cx.hovered(row) {
                    canvas.fill_rounded_rect(row, 4.0 * cx.scale, colors.button_hover);
                }
                let text = Rect::new(row.x + cx.px(8.0), row.y, row.w - cx.px(8.0), row.h);
                draw_text_centered(canvas, cx.font, &place.name, text, colors.text);
            }
        });
    }

    fn draw_list(&self, canvas: &mut Canvas, cx: &Ctx) {
        let colors = cx.colors;
        let list = self.geometry.list;
        let item_h = cx.px(ITEM_HEIGHT);
        canvas.fill_rect(list, colors.input_bg);
        canvas.stroke_rounded_rect(list, 0.0, colors.input_border, 1.0);

        clipped(canvas, list.inset(1), |canvas| {
            for (slot, row) in (self.first..self.shown.len()).enumerate() {
                let y = list.y + 1 + slot as i32 * item_h;
                if y > list.bottom() {
                    break;
                }
                let Some(entry) = self.entry(row) else {
                    break;
                };
                let r = Rect::new(list.x + 1, y, list.w - 2, item_h);
                let selected = self.selected.binary_search(&row).is_ok();
                if selected {
                    canvas.fill_rect(r, colors.selection);
                } else if row % 2 == 1 {
                    canvas.fill_rect(r, colors.row_alt);
                }

                let icon = cx.px(ICON_SIZE);
                let icon_rect = Rect::new(r.x + cx.px(6.0), r.y + (r.h - icon) / 2, icon, icon);
                if entry.is_dir {
                    draw_folder_icon(canvas, icon_rect, cx.scale);
                } else {
                    draw_file_icon(canvas, icon_rect, &entry.name, cx.scale);
                }

                let color = if selected {
                    colors.selection_text
                } else if self.selectable(entry) || entry.is_dir {
                    colors.text
                } else {
                    colors.text_disabled
                };
                let text_x = icon_rect.right() + cx.px(8.0);
                draw_text_centered(canvas, cx.font, &entry.name, Rect::new(text_x, r.y, r.right() - text_x, r.h), color);
            }
        });

        let total = self.shown.len() as i32 * item_h;
        let offset = self.first as i32 * item_h;
        draw_scrollbar(canvas, list.inset(1), offset, list.h, total, cx);
    }
}

/// Where the picker starts: the field's start directory, the folder of its current
/// path, the working directory, then home.
fn start_dir(sel: &FileSelField) -> PathBuf {
    let from_path = sel
        .path
        .split(sel.separator.as_deref().unwrap_or("|"))
        .next()
        .map(Path::new)
        .filter(|p| !p.as_os_str().is_empty())
        .and_then(|p| if p.is_dir() { Some(p.to_path_buf()) } else { p.parent().map(Path::to_path_buf) });

    sel.start_dir
        .clone()
        .into_iter()
        .chain(from_path)
        .chain(env::current_dir().ok())
        .chain(dirs::home_dir())
        .find(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Home, the XDG user folders that exist, the filesystem root and the configured
/// bookmarks.
fn build_places(bookmarks: &[PathBuf]) -> Vec<Place> {
    let mut places = Vec::new();
    let mut add = |name: &str, path: Option<PathBuf>| {
        if let Some(path) = path.filter(|p| p.is_dir()) {
            if !places.iter().any(|p: &Place| p.path == path) {
                places.push(Place {
                    name: name.to_string(),
                    path,
                });
            }
        }
    };

    add("Home", dirs::home_dir());
    add("Desktop", dirs::desktop_dir());
    add("Documents", dirs::document_dir());
    add("Downloads", dirs::download_dir());
    add("Pictures", dirs::picture_dir());
    add("Music", dirs::audio_dir());
    add("Videos", dirs::video_dir());
    add("/", Some(PathBuf::from("/")));
    for bookmark in bookmarks {
        let name = bookmark
            .file_name()
            .map_or_else(|| bookmark.display().to_string(), |n| n.to_string_lossy().into_owned());
        add(&name, Some(bookmark.clone()));
    }
    places
}

/// Reads `path` into `entries`: a `..` entry, then directories, then files, each group
/// sorted by name ignoring case.
fn load_directory(path: &Path, entries: &mut Vec<DirEntry>, dirs_only: bool, show_hidden: bool) {
    entries.clear();

    if let Some(parent) = path.parent() {
        entries.push(DirEntry {
            name: "..".to_string(),
            path: parent.to_path_buf(),
            is_dir: true,
        });
    }

    let read_dir = match fs::read_dir(path) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            tracing::warn!(path = %path.display(), "cannot list directory: {e}");
            return;
        }
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in read_dir.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !show_hidden && name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        // Follows symlinks, so a link to a directory is listed as one.
        let is_dir = path.is_dir();
        if dirs_only && !is_dir {
            continue;
        }
        let entry = DirEntry {
            name,
            path,
            is_dir,
        };
        if is_dir {
            dirs.push(entry);
        } else {
            files.push(entry);
        }
    }

    dirs.sort_by_key(|e| e.name.to_lowercase());
    files.sort_by_key(|e| e.name.to_lowercase());
    entries.extend(dirs);
    entries.extend(files);
}

/// Directories are always shown; files must match `search` and `filter`.
fn update_shown(all: &[DirEntry], search: &str, filter: Option<&FileFilter>, shown: &mut Vec<usize>) {
    shown.clear();
    for (i, entry) in all.iter().enumerate() {
        let visible = entry.is_dir
            || (filter.is_none_or(|f| f.matches(&entry.name))
                && (search.is_empty() || entry.name.to_lowercase().contains(search)));
        if visible {
            shown.push(i);
        }
    }
}

fn draw_folder_icon(canvas: &mut Canvas, rect: Rect, scale: f32) {
    let color = rgb(240, 180, 70);
    let tab = Rect::new(rect.x, rect.y + rect.h / 8, rect.w / 2, rect.h / 3);
    let body = Rect::new(rect.x, rect.y + rect.h / 4, rect.w, rect.h * 3 / 4);
    canvas.fill_rounded_rect(tab, 2.0 * scale, color);
    canvas.fill_rounded_rect(body, 2.0 * scale, color);
}

fn draw_file_icon(canvas: &mut Canvas, rect: Rect, name: &str, scale: f32) {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()).unwrap_or_default();
    let color = match ext.as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" => rgb(100, 180, 100),
        "txt" | "md" | "log" => rgb(180, 180, 180),
        "sh" | "py" | "rs" | "js" => rgb(220, 120, 70),
        "json" | "yaml" | "yml" | "toml" | "conf" => rgb(150, 150, 150),
        _ => rgb(160, 160, 160),
    };
    let body = Rect::new(rect.x + rect.w / 8, rect.y, rect.w * 3 / 4, rect.h);
    canvas.fill_rounded_rect(body, 2.0 * scale, color);
    let corner = rect.w / 4;
    canvas.fill_rect(Rect::new(body.right() - corner, body.y, corner, corner), color.darken(0.2));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::create_dir(dir.path().join("Alpha")).unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("Photo.PNG"), "").unwrap();
        fs::write(dir.path().join("a.png"), "").unwrap();
        dir
    }

    fn picker(sel: FileSelField, dir: &Path) -> FilePicker {
        let sel = FileSelField {
            start_dir: Some(dir.to_path_buf()),
            ..sel
        };
        FilePicker::new(0, &sel, "|", &FileSelectionConfig::default())
    }

    fn row_of(picker: &FilePicker, name: &str) -> usize {
        picker.shown.iter().position(|&i| picker.entries[i].name == name).unwrap()
    }

    #[test]
    fn directories_come_first_sorted_without_case() {
        let dir = tree();
        let mut entries = Vec::new();
        load_directory(dir.path(), &mut entries, false, false);
        assert_eq!(names(&entries), vec!["..", "Alpha", "beta", "a.png", "notes.txt", "Photo.PNG"]);

        load_directory(dir.path(), &mut entries, true, true);
        assert_eq!(names(&entries), vec!["..", ".cache", "Alpha", "beta"]);
    }

    #[test]
    fn search_and_filter_only_hide_files() {
        let dir = tree();
        let mut entries = Vec::new();
        load_directory(dir.path(), &mut entries, false, false);

        let images = FileFilter::parse("Images | *.png");
        let mut shown = Vec::new();
        update_shown(&entries, "", Some(&images), &mut shown);
        let visible: Vec<&str> = shown.iter().map(|&i| entries[i].name.as_str()).collect();
        assert_eq!(visible, vec!["..", "Alpha", "beta", "a.png", "Photo.PNG"]);

        update_shown(&entries, "not", None, &mut shown);
        let visible: Vec<&str> = shown.iter().map(|&i| entries[i].name.as_str()).collect();
        assert_eq!(visible, vec!["..", "Alpha", "beta", "notes.txt"]);
    }

    #[test]
    fn multiple_files_join_with_the_separator() {
        let dir = tree();
        let mut picker = picker(
            FileSelField {
                multiple: true,
                separator: Some(";".to_string()),
                ..FileSelField::default()
            },
            dir.path(),
        );
        let a = row_of(&picker, "a.png");
        let notes = row_of(&picker, "notes.txt");
        picker.select(a, Modifiers::empty());
        picker.select(notes, Modifiers::CTRL);

        let expected = format!("{};{}", dir.path().join("a.png").display(), dir.path().join("notes.txt").display());
        assert_eq!(picker.result(), Some(expected));
    }

    #[test]
    fn plain_clicks_replace_the_selection() {
        let dir = tree();
        let mut picker = picker(FileSelField::default(), dir.path());
        picker.select(row_of(&picker, "a.png"), Modifiers::empty());
        picker.select(row_of(&picker, "notes.txt"), Modifiers::CTRL);
        assert_eq!(picker.result(), Some(dir.path().join("notes.txt").display().to_string()));
    }

    #[test]
    fn directory_mode_falls_back_to_the_current_directory() {
        let dir = tree();
        let mut picker = picker(
            FileSelField {
                directory: true,
                ..FileSelField::default()
            },
            dir.path(),
        );
        assert_eq!(picker.result(), Some(dir.path().display().to_string()));

        picker.select(row_of(&picker, "beta"), Modifiers::empty());
        assert_eq!(picker.result(), Some(dir.path().join("beta").display().to_string()));
    }

    #[test]
    fn directories_are_not_chosen_in_file_mode() {
        let dir = tree();
        let mut picker = picker(FileSelField::default(), dir.path());
        picker.select(row_of(&picker, "Alpha"), Modifiers::empty());
        assert_eq!(picker.result(), None);

        assert_eq!(picker.activate(row_of(&picker, "Alpha")), Outcome::Handled);
        assert_eq!(picker.dir, dir.path().join("Alpha"));
    }
}
