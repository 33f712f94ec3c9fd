mod text;

use tiny_skia::{FillRule, Mask, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Stroke, Transform};

pub(crate) use text::{Font, Fonts};

use crate::error::Error;

/// Largest canvas side accepted from a window size.
const MAX_SIDE: u32 = 16_384;

/// A canvas backed by a tiny-skia Pixmap.
/// Stores pixels in RGBA format internally, but can convert to BGRA for X11.
pub struct Canvas {
    pub(crate) pixmap: Pixmap,
    clip: Option<(Rect, Mask)>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, Error> {
        let pixmap = Pixmap::new(width.clamp(1, MAX_SIDE), height.clamp(1, MAX_SIDE))
            .ok_or(Error::Canvas(width, height))?;
        Ok(Self {
            pixmap,
            clip: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    /// Restricts drawing to `rect`, or lifts the restriction with `None`.
    /// Returns the previous clip so callers can restore it.
    pub fn set_clip(&mut self, rect: Option<Rect>) -> Option<Rect> {
        let previous = self.clip.take().map(|(r, _)| r);
        if let Some(rect) = rect {
            let rect = rect.intersect(self.bounds()).unwrap_or_default();
            if let Some(mut mask) = Mask::new(self.width(), self.height()) {
                if let Some(path) = rect.to_skia().map(PathBuilder::from_rect) {
                    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
                }
                self.clip = Some((rect, mask));
            }
        }
        previous
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip.as_ref().map(|(r, _)| *r).unwrap_or_else(|| self.bounds())
    }

    /// Fills the entire canvas with a color.
    pub fn fill(&mut self, color: Rgba) {
        self.pixmap.fill(color.into());
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(r) = rect.to_skia() else {
            return;
        };
        let paint = paint(color);
        let mask = self.clip.as_ref().map(|(_, m)| m);
        self.pixmap.fill_rect(r, &paint, Transform::identity(), mask);
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Rgba) {
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        let paint = paint(color);
        let mask = self.clip.as_ref().map(|(_, m)| m);
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), mask);
    }

    pub fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, color: Rgba, width: f32) {
        // Inset by half the stroke so the outline stays inside `rect`.
        let inset = RectF::from(rect).inset(width / 2.0);
        let Some(path) = rounded_rect_path_f(inset, radius) else {
            return;
        };
        let paint = paint(color);
        let stroke = Stroke {
            width,
            ..Default::default()
        };
        let mask = self.clip.as_ref().map(|(_, m)| m);
        self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), mask);
    }

    /// Strokes a polyline, used for check marks and arrows.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Rgba, width: f32) {
        let mut pb = PathBuilder::new();
        let mut iter = points.iter();
        let Some(&(x, y)) = iter.next() else {
            return;
        };
        pb.move_to(x, y);
        for &(x, y) in iter {
            pb.line_to(x, y);
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let paint = paint(color);
        let stroke = Stroke {
            width,
            line_cap: tiny_skia::LineCap::Round,
            line_join: tiny_skia::LineJoin::Round,
            ..Default::default()
        };
        let mask = self.clip.as_ref().map(|(_, m)| m);
        self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), mask);
    }

    pub fn fill_triangle(&mut self, points: [(f32, f32); 3], color: Rgba) {
        let mut pb = PathBuilder::new();
        pb.move_to(points[0].0, points[0].1);
        pb.line_to(points[1].0, points[1].1);
        pb.line_to(points[2].0, points[2].1);
        pb.close();
        let Some(path) = pb.finish() else {
            return;
        };
        let paint = paint(color);
        let mask = self.clip.as_ref().map(|(_, m)| m);
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), mask);
    }

    /// Blends one pixel of coverage `alpha` (0..=1) in `color`, honouring the clip.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba, alpha: f32) {
        if !self.clip_rect().contains(x, y) {
            return;
        }
        let width = self.width();
        let idx = y as usize * width as usize + x as usize;
        let Some(pix) = self.pixmap.pixels_mut().get_mut(idx) else {
            return;
        };

        let a = (alpha.clamp(0.0, 1.0) * f32::from(color.a)).round() as u32;
        if a == 0 {
            return;
        }
        let premul = |c: u8| u32::from(c) * a / 255;
        let inv = 255 - a;
        let out = |src: u32, dst: u8| (src + u32::from(dst) * inv / 255).min(255) as u8;

        let blended = PremultipliedColorU8::from_rgba(
            out(premul(color.r), pix.red()),
            out(premul(color.g), pix.green()),
            out(premul(color.b), pix.blue()),
            out(a, pix.alpha()),
        );
        if let Some(blended) = blended {
            *pix = blended;
        }
    }

    /// Returns the pixel data as BGRA bytes, the X11 ZPixmap order on little-endian
    /// 24-bit TrueColor visuals.
    pub fn as_bgra(&self) -> Vec<u8> {
        self.pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect()
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.into());
    paint.anti_alias = true;
    paint
}

/// Integer rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w,
            h,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        (r > x && b > y).then(|| Rect::new(x, y, r - x, b - y))
    }

    pub fn inset(&self, d: i32) -> Rect {
        Rect::new(self.x + d, self.y + d, (self.w - 2 * d).max(0), (self.h - 2 * d).max(0))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Splits off `w` pixels from the right edge.
    pub fn split_right(&self, w: i32) -> (Rect, Rect) {
        let w = w.min(self.w);
        (
            Rect::new(self.x, self.y, self.w - w, self.h),
            Rect::new(self.right() - w, self.y, w, self.h),
        )
    }

    fn to_skia(self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(self.x as f32, self.y as f32, self.w as f32, self.h as f32)
    }
}

#[derive(Debug, Clone, Copy)]
struct RectF {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl RectF {
    fn inset(self, d: f32) -> Self {
        Self {
            x: self.x + d,
            y: self.y + d,
            w: self.w - 2.0 * d,
            h: self.h - 2.0 * d,
        }
    }
}

impl From<Rect> for RectF {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x as f32,
            y: r.y as f32,
            w: r.w as f32,
            h: r.h as f32,
        }
    }
}

fn rounded_rect_path(rect: Rect, radius: f32) -> Option<tiny_skia::Path> {
    rounded_rect_path_f(rect.into(), radius)
}

fn rounded_rect_path_f(rect: RectF, r: f32) -> Option<tiny_skia::Path> {
    let RectF {
        x,
        y,
        w,
        h,
    } = rect;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            a,
        }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self {
            a,
            ..self
        }
    }

    pub fn darken(self, amount: f32) -> Self {
        let f = |c: u8| (f32::from(c) * (1.0 - amount)) as u8;
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
            a: self.a,
        }
    }

    /// Parses `#rgb`, `#rrggbb`, `#aarrggbb` or a basic color name.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return match hex.len() {
                3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
                6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
                8 => Some(Self::new(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
                _ => None,
            };
        }

        Some(match s.to_ascii_lowercase().as_str() {
            "black" => rgb(0, 0, 0),
            "white" => rgb(255, 255, 255),
            "red" => rgb(255, 0, 0),
            "darkred" => rgb(139, 0, 0),
            "green" => rgb(0, 128, 0),
            "darkgreen" => rgb(0, 100, 0),
            "lime" => rgb(0, 255, 0),
            "blue" => rgb(0, 0, 255),
            "darkblue" => rgb(0, 0, 139),
            "navy" => rgb(0, 0, 128),
            "yellow" => rgb(255, 255, 0),
            "orange" => rgb(255, 165, 0),
            "purple" => rgb(128, 0, 128),
            "magenta" | "fuchsia" => rgb(255, 0, 255),
            "cyan" | "aqua" => rgb(0, 255, 255),
            "gray" | "grey" => rgb(128, 128, 128),
            "darkgray" | "darkgrey" => rgb(169, 169, 169),
            "lightgray" | "lightgrey" => rgb(211, 211, 211),
            "silver" => rgb(192, 192, 192),
            "brown" => rgb(165, 42, 42),
            "pink" => rgb(255, 192, 203),
            "transparent" => Rgba::new(0, 0, 0, 0),
            _ => return None,
        })
    }
}

impl From<Rgba> for tiny_skia::Color {
    fn from(c: Rgba) -> Self {
        tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
    }
}

/// Convenience function to create an RGB color.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
    Rgba::rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colors() {
        assert_eq!(Rgba::parse("#fff"), Some(rgb(255, 255, 255)));
        assert_eq!(Rgba::parse("#1e90ff"), Some(rgb(30, 144, 255)));
        assert_eq!(Rgba::parse("#801e90ff"), Some(Rgba::new(30, 144, 255, 128)));
        assert_eq!(Rgba::parse(" Grey "), Some(rgb(128, 128, 128)));
        assert_eq!(Rgba::parse("#12"), None);
        assert_eq!(Rgba::parse("#ggg"), None);
        assert_eq!(Rgba::parse("chartreuse-ish"), None);
    }

    #[test]
    fn rect_geometry() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersect(b), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersect(Rect::new(20, 20, 1, 1)), None);
        assert!(a.contains(9, 0));
        assert!(!a.contains(10, 0));
        assert_eq!(a.split_right(4), (Rect::new(0, 0, 6, 10), Rect::new(6, 0, 4, 10)));
    }

    #[test]
    fn clip_limits_blending() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.set_clip(Some(Rect::new(0, 0, 2, 2)));
        canvas.blend_pixel(1, 1, rgb(255, 0, 0), 1.0);
        canvas.blend_pixel(3, 3, rgb(255, 0, 0), 1.0);
        let px = canvas.pixmap.pixels();
        assert_eq!(px[5].red(), 255);
        assert_eq!(px[15].alpha(), 0);
    }

    #[test]
    fn bgra_order() {
        let mut canvas = Canvas::new(1, 1).unwrap();
        canvas.fill(rgb(1, 2, 3));
        assert_eq!(canvas.as_bgra(), vec![3, 2, 1, 255]);
    }
}
