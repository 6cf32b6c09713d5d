//! Text shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, default_evented};
use crate::color::Color;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Font family options offered by the text tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Inter,
    Arial,
    CourierNew,
    TimesNewRoman,
    Georgia,
}

impl FontFamily {
    /// CSS family name.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter",
            FontFamily::Arial => "Arial",
            FontFamily::CourierNew => "Courier New",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::Georgia => "Georgia",
        }
    }

    /// Get all available font families.
    pub fn all() -> &'static [FontFamily] {
        &[
            FontFamily::Inter,
            FontFamily::Arial,
            FontFamily::CourierNew,
            FontFamily::TimesNewRoman,
            FontFamily::Georgia,
        ]
    }

    /// Average glyph advance as a fraction of the font size.
    fn char_width_factor(&self) -> f64 {
        match self {
            FontFamily::Inter => 0.55,
            FontFamily::Arial => 0.52,
            FontFamily::CourierNew => 0.60,
            FontFamily::TimesNewRoman => 0.48,
            FontFamily::Georgia => 0.55,
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FontFamily::all()
            .iter()
            .copied()
            .find(|family| family.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown font family: {s}"))
    }
}

/// A text shape. Glyphs are painted with `style.fill_color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of the text box).
    pub position: Point,
    /// The text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Font family.
    #[serde(default)]
    pub font_family: FontFamily,
    /// Style properties.
    pub style: ShapeStyle,
    #[serde(default = "default_evented")]
    pub evented: bool,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 32.0;
    pub const MIN_FONT_SIZE: f64 = 8.0;
    pub const MAX_FONT_SIZE: f64 = 96.0;
    /// Content of a freshly inserted text box.
    pub const PLACEHOLDER: &'static str = "Type here";

    /// Create a new text shape painted in black.
    pub fn new(position: Point, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            style: ShapeStyle {
                fill_color: Some(Color::BLACK),
                stroke_width: 0.0,
                ..ShapeStyle::default()
            },
            evented: true,
        }
    }

    /// Set the font size, clamped to the supported range.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Self::clamp_font_size(size);
        self
    }

    pub fn with_font_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.style.fill_color = Some(color);
        self
    }

    pub fn clamp_font_size(size: f64) -> f64 {
        size.clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE)
    }

    /// Glyph color.
    pub fn color(&self) -> Color {
        self.style.fill_color.unwrap_or(Color::BLACK)
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Line height used for layout and bounds.
    pub fn line_height(&self) -> f64 {
        self.font_size * 1.2
    }

    fn approximate_width(&self) -> f64 {
        let widest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        widest as f64 * self.font_size * self.font_family.char_width_factor()
    }

    fn approximate_height(&self) -> f64 {
        let mut lines = self.content.lines().count().max(1);
        if self.content.ends_with('\n') {
            lines += 1;
        }
        lines as f64 * self.line_height()
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let width = self.approximate_width().max(20.0);
        let height = self.approximate_height();
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + height,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        // Glyphs are laid out by the renderer; the box stands in for selection.
        let bounds = self.bounds();
        let mut path = BezPath::new();
        path.move_to(Point::new(bounds.x0, bounds.y0));
        path.line_to(Point::new(bounds.x1, bounds.y0));
        path.line_to(Point::new(bounds.x1, bounds.y1));
        path.line_to(Point::new(bounds.x0, bounds.y1));
        path.close_path();
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = Text::new(Point::new(100.0, 100.0), Text::PLACEHOLDER.to_string());
        assert_eq!(text.content(), "Type here");
        assert!((text.font_size - 32.0).abs() < f64::EPSILON);
        assert_eq!(text.color(), Color::BLACK);
        assert_eq!(text.font_family, FontFamily::Inter);
    }

    #[test]
    fn test_font_size_clamped() {
        let text = Text::new(Point::ZERO, "a".into()).with_font_size(200.0);
        assert!((text.font_size - 96.0).abs() < f64::EPSILON);
        let text = Text::new(Point::ZERO, "a".into()).with_font_size(1.0);
        assert!((text.font_size - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_multiline_bounds() {
        let text = Text::new(Point::new(10.0, 10.0), "ab\ncdef".into()).with_font_size(10.0);
        let bounds = text.bounds();
        assert!((bounds.height() - 24.0).abs() < 1e-9);
        assert!((bounds.width() - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_inside_box() {
        let text = Text::new(Point::new(0.0, 0.0), "Type here".into());
        assert!(text.hit_test(Point::new(10.0, 10.0), 0.0));
        assert!(!text.hit_test(Point::new(-10.0, 10.0), 0.0));
    }

    #[test]
    fn test_font_family_parse() {
        assert_eq!(
            "courier new".parse::<FontFamily>().unwrap(),
            FontFamily::CourierNew
        );
        assert!("Comic Sans".parse::<FontFamily>().is_err());
    }
}
