use std::{
    borrow::Cow,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use ab_glyph::{Font as _, FontArc, Glyph, PxScaleFont, ScaleFont, point};

use super::{Canvas, Rect, Rgba, rgb};
use crate::{config::FontConfig, error::Error};

const BASE_FONT_SIZE: f32 = 15.0;
const ZWSP: char = '\u{200b}';
const ITALIC_SHEAR: f32 = 0.2;

const FONT_DIRS: &[&str] = &["/usr/share/fonts", "/usr/local/share/fonts"];
const PREFERRED_FONTS: &[&str] = &[
    "DejaVuSans.ttf",
    "NotoSans-Regular.ttf",
    "LiberationSans-Regular.ttf",
    "Cantarell-Regular.otf",
    "FreeSans.ttf",
];

/// The faces used by one dialog: the default face plus any requested font families.
pub struct Fonts {
    regular: FontArc,
    families: HashMap<String, FontArc>,
    base_px: f32,
    scale: f32,
}

impl Fonts {
    /// Loads the default face and every family in `families`.
    /// Families that cannot be found fall back to the default face.
    pub fn load<'a>(
        config: &FontConfig,
        families: impl IntoIterator<Item = &'a str>,
        scale: f32,
    ) -> Result<Self, Error> {
        let regular = default_face(config.path.as_deref())?;

        let mut loaded = HashMap::new();
        for family in families {
            if loaded.contains_key(family) {
                continue;
            }
            match fc_match(family).map(|path| load_face(&path)) {
                Some(Ok(face)) => {
                    loaded.insert(family.to_string(), face);
                }
                Some(Err(e)) => tracing::warn!(family, "cannot load font family: {e}"),
                None => tracing::warn!(family, "font family not found"),
            }
        }

        Ok(Self {
            regular,
            families: loaded,
            base_px: config.size.filter(|s| *s > 0.0).unwrap_or(BASE_FONT_SIZE),
            scale,
        })
    }

    /// The interface font.
    pub fn ui(&self) -> Font {
        Font::new(self.regular.clone(), self.base_px * self.scale)
    }

    /// The interface font scaled by `factor`.
    pub fn ui_scaled(&self, factor: f32) -> Font {
        Font::new(self.regular.clone(), self.base_px * self.scale * factor)
    }

    /// A font for `family` at `points`, each falling back to the interface default.
    pub fn styled(&self, family: Option<&str>, points: Option<f32>) -> Font {
        let face = family
            .and_then(|f| self.families.get(f))
            .unwrap_or(&self.regular)
            .clone();
        let px = points.map(|pt| pt * 96.0 / 72.0).unwrap_or(self.base_px);
        Font::new(face, px * self.scale)
    }
}

fn default_face(configured: Option<&Path>) -> Result<FontArc, Error> {
    if let Some(path) = configured {
        match load_face(path) {
            Ok(face) => return Ok(face),
            Err(e) => tracing::warn!(path = %path.display(), "configured font unusable: {e}"),
        }
    }

    let candidates = fc_match("sans-serif").into_iter().chain(scan_font_dirs());
    for path in candidates {
        match load_face(&path) {
            Ok(face) => {
                tracing::debug!(path = %path.display(), "using font");
                return Ok(face);
            }
            Err(e) => tracing::debug!(path = %path.display(), "skipping font: {e}"),
        }
    }
    Err(Error::Font("no usable TrueType or OpenType font found".to_string()))
}

fn load_face(path: &Path) -> Result<FontArc, Error> {
    let data = fs::read(path)?;
    FontArc::try_from_vec(data).map_err(|e| Error::Font(format!("{}: {e}", path.display())))
}

/// Asks fontconfig for the file best matching `pattern`.
fn fc_match(pattern: &str) -> Option<PathBuf> {
    let output = Command::new("fc-match")
        .args(["--format=%{file}", pattern])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    path.is_file().then_some(path)
}

/// Font files under the usual directories, preferred faces first.
fn scan_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = FONT_DIRS.iter().map(PathBuf::from).collect();
    if let Some(data) = dirs::data_dir() {
        dirs.push(data.join("fonts"));
    }
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(".fonts"));
    }

    let mut found = Vec::new();
    for dir in dirs {
        collect_font_files(&dir, 4, &mut found);
    }

    let rank = |p: &PathBuf| {
        let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
        PREFERRED_FONTS.iter().position(|f| *f == name).unwrap_or(PREFERRED_FONTS.len())
    };
    found.sort_by_key(rank);
    found
}

fn collect_font_files(dir: &Path, depth: u32, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth > 0 {
                collect_font_files(&path, depth - 1, out);
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
        {
            out.push(path);
        }
    }
}

/// A face at one pixel size.
#[derive(Clone)]
pub struct Font {
    font: PxScaleFont<FontArc>,
}

impl Font {
    fn new(face: FontArc, px: f32) -> Self {
        Self {
            font: face.into_scaled(px),
        }
    }

    pub fn line_height(&self) -> f32 {
        (self.font.height() + self.font.line_gap()).ceil()
    }

    fn ascent(&self) -> f32 {
        self.font.ascent()
    }

    /// Horizontal offset of the caret placed before the char at `index`.
    pub fn caret_x(&self, text: &str, index: usize) -> f32 {
        let mut x = 0.0;
        let mut last = None;
        for c in text.chars().take(index) {
            let id = self.font.glyph_id(c);
            if let Some(prev) = last {
                x += self.font.kern(prev, id);
            }
            x += self.font.h_advance(id);
            last = Some(id);
        }
        x
    }

    /// Char index whose caret position is nearest to `x`.
    pub fn index_at(&self, text: &str, x: f32) -> usize {
        let mut pos = 0.0;
        let mut last = None;
        for (i, c) in text.chars().enumerate() {
            let id = self.font.glyph_id(c);
            if let Some(prev) = last {
                pos += self.font.kern(prev, id);
            }
            let advance = self.font.h_advance(id);
            if x < pos + advance / 2.0 {
                return i;
            }
            pos += advance;
            last = Some(id);
        }
        text.chars().count()
    }

    /// Returns a renderer for the given text.
    pub fn render<'a>(&'a self, text: &'a str) -> TextRenderer<'a> {
        TextRenderer {
            font: self,
            text: Cow::Borrowed(text),
            color: rgb(255, 255, 255),
            max_width: f32::MAX,
            align: 0.0,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

pub struct TextRenderer<'a> {
    font: &'a Font,
    text: Cow<'a, str>,
    color: Rgba,
    max_width: f32,
    align: f32,
    bold: bool,
    italic: bool,
    underline: bool,
}

struct Line {
    glyphs: Vec<Glyph>,
    width: f32,
}

impl<'a> TextRenderer<'a> {
    pub fn with_color(self, color: Rgba) -> Self {
        Self {
            color,
            ..self
        }
    }

    /// Wraps at spaces to stay within `max_width`.
    pub fn with_max_width(self, max_width: f32) -> Self {
        Self {
            max_width,
            ..self
        }
    }

    /// Horizontal placement of each line inside `max_width`: 0 left, 0.5 centre, 1 right.
    pub fn with_align(self, align: f32) -> Self {
        Self {
            align,
            ..self
        }
    }

    pub fn bold(self, bold: bool) -> Self {
        Self {
            bold,
            ..self
        }
    }

    pub fn italic(self, italic: bool) -> Self {
        Self {
            italic,
            ..self
        }
    }

    pub fn underline(self, underline: bool) -> Self {
        Self {
            underline,
            ..self
        }
    }

    /// Approximates small capitals by upper-casing the text.
    pub fn small_caps(self, small_caps: bool) -> Self {
        if !small_caps {
            return self;
        }
        let text = Cow::Owned(self.text.to_uppercase());
        Self {
            text,
            ..self
        }
    }

    /// Size of the laid out text.
    pub fn measure(&self) -> (f32, f32) {
        let lines = self.layout();
        let width = lines.iter().map(|l| l.width).fold(0.0, f32::max);
        (width, lines.len() as f32 * self.font.line_height())
    }

    /// Draws the text with its top-left corner at (`x`, `y`).
    pub fn draw(&self, canvas: &mut Canvas, x: i32, y: i32) {
        let line_height = self.font.line_height();
        let ascent = self.font.ascent();
        let box_width = if self.max_width < f32::MAX { self.max_width } else { 0.0 };

        for (i, line) in self.layout().into_iter().enumerate() {
            let offset = ((box_width - line.width) * self.align).max(0.0);
            let baseline = y as f32 + i as f32 * line_height + ascent;
            let left = x as f32 + offset;

            for glyph in line.glyphs {
                let mut glyph = glyph;
                glyph.position = point((left + glyph.position.x).round(), baseline.round());
                self.draw_glyph(canvas, glyph, baseline);
            }

            if self.underline && line.width > 0.0 {
                let thickness = (line_height / 16.0).max(1.0) as i32;
                let rect = Rect::new(
                    left.round() as i32,
                    (baseline + 2.0).round() as i32,
                    line.width.round() as i32,
                    thickness,
                );
                canvas.fill_rect(rect, self.color);
            }
        }
    }

    fn draw_glyph(&self, canvas: &mut Canvas, glyph: Glyph, baseline: f32) {
        let Some(outlined) = self.font.font.outline_glyph(glyph) else {
            return;
        };
        let bounds = outlined.px_bounds();
        let gx = bounds.min.x.floor() as i32;
        let gy = bounds.min.y.floor() as i32;
        let passes = if self.bold { 2 } else { 1 };

        outlined.draw(|px, py, coverage| {
            let py = gy + py as i32;
            let shear = if self.italic {
                ((baseline - py as f32) * ITALIC_SHEAR).round() as i32
            } else {
                0
            };
            for pass in 0..passes {
                canvas.blend_pixel(gx + px as i32 + shear + pass, py, self.color, coverage);
            }
        });
    }

    /// Lays out hard lines, soft-wrapping at spaces when a line exceeds `max_width`.
    fn layout(&self) -> Vec<Line> {
        let font = &self.font.font;
        let extra = if self.bold { 1.0 } else { 0.0 };
        let mut lines = Vec::new();

        for hard in self.text.split('\n') {
            let mut glyphs: Vec<Glyph> = Vec::new();
            let mut x = 0.0f32;
            let mut visible_end = 0.0f32;
            let mut last = None;
            // Index of the first glyph after the last space, the pen position there and
            // the visible width before the space.
            let mut softbreak: Option<(usize, f32, f32)> = None;

            for c in hard.chars().filter(|c| *c != '\r') {
                let mut glyph = font.scaled_glyph(if c == '\t' { ' ' } else { c });
                if let Some(prev) = last {
                    x += font.kern(prev, glyph.id);
                }
                glyph.position = point(x, 0.0);
                last = Some(glyph.id);
                x += font.h_advance(glyph.id) + extra;

                if c == ' ' || c == '\t' || c == ZWSP {
                    softbreak = Some((glyphs.len(), x, visible_end));
                    continue;
                }
                glyphs.push(glyph);
                visible_end = x;

                if x > self.max_width {
                    if let Some((at, break_x, width)) = softbreak.take() {
                        let mut rest = glyphs.split_off(at);
                        for g in &mut rest {
                            g.position.x -= break_x;
                        }
                        lines.push(Line {
                            glyphs,
                            width,
                        });
                        glyphs = rest;
                        x -= break_x;
                        visible_end -= break_x;
                    }
                }
            }

            lines.push(Line {
                glyphs,
                width: visible_end,
            });
        }

        lines
    }
}
