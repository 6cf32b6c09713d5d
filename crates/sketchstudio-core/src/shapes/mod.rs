//! Shape definitions for the sketch surface.

mod ellipse;
mod freehand;
mod line;
mod polygon;
mod rectangle;
mod text;

pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use line::Line;
pub use polygon::Polygon;
pub use rectangle::Rectangle;
pub use text::{FontFamily, Text};

use crate::color::Color;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Style properties shared by every shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: Color,
    /// Stroke width in canvas pixels.
    pub stroke_width: f64,
    /// Fill color (None = transparent).
    pub fill_color: Option<Color>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

pub(crate) fn default_evented() -> bool {
    true
}

impl ShapeStyle {
    /// Stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        self.stroke_color.with_opacity(self.opacity)
    }

    /// Fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.fill_color.map(|c| c.with_opacity(self.opacity))
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            stroke_width: 5.0,
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Axis-aligned bounds of a point set (`Rect::ZERO` when empty).
pub(crate) fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| {
            acc.union_pt(*p)
        })
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the bounding box in canvas coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point hits this shape's geometry.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Get the path representation for rendering.
    fn to_path(&self) -> BezPath;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;
}

/// Enum wrapper for all shape types.
///
/// Serialized with an inner `"type"` tag so scene documents read like
/// `{ "type": "rectangle", "position": ..., ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Freehand(Freehand),
    Line(Line),
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Polygon(Polygon),
    Text(Text),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Freehand($s) => $body,
            Shape::Line($s) => $body,
            Shape::Rectangle($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Polygon($s) => $body,
            Shape::Text($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        dispatch!(self, s => s.hit_test(point, tolerance))
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    /// Whether this shape currently takes part in hit-testing and selection.
    pub fn is_evented(&self) -> bool {
        dispatch!(self, s => s.evented)
    }

    pub fn set_evented(&mut self, evented: bool) {
        dispatch!(self, s => s.evented = evented)
    }

    /// Closed shapes have an interior that the fill tool can paint.
    pub fn is_closed(&self) -> bool {
        match self {
            Shape::Rectangle(_) | Shape::Ellipse(_) | Shape::Polygon(_) => true,
            Shape::Freehand(_) | Shape::Line(_) | Shape::Text(_) => false,
        }
    }

    /// Short lowercase name of the shape kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Freehand(_) => "freehand",
            Shape::Line(_) => "line",
            Shape::Rectangle(_) => "rectangle",
            Shape::Ellipse(_) => "ellipse",
            Shape::Polygon(_) => "polygon",
            Shape::Text(_) => "text",
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_shapes() {
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 10.0, 10.0));
        let ellipse = Shape::Ellipse(Ellipse::new(Point::ZERO, 5.0, 5.0));
        let polygon = Shape::Polygon(Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 10.0),
        ]));
        let line = Shape::Line(Line::new(Point::ZERO, Point::new(10.0, 0.0)));
        let stroke = Shape::Freehand(Freehand::from_points(vec![Point::ZERO]));
        let text = Shape::Text(Text::new(Point::ZERO, "hi".to_string()));

        assert!(rect.is_closed());
        assert!(ellipse.is_closed());
        assert!(polygon.is_closed());
        assert!(!line.is_closed());
        assert!(!stroke.is_closed());
        assert!(!text.is_closed());
    }

    #[test]
    fn test_serialized_tag() {
        let rect = Shape::Rectangle(Rectangle::new(Point::new(1.0, 2.0), 3.0, 4.0));
        let json = serde_json::to_value(&rect).unwrap();
        assert_eq!(json["type"], "rectangle");

        let back: Shape = serde_json::from_value(json).unwrap();
        assert_eq!(back, rect);
    }

    #[test]
    fn test_evented_defaults_true_when_missing() {
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 3.0, 4.0));
        let mut json = serde_json::to_value(&rect).unwrap();
        json.as_object_mut().unwrap().remove("evented");

        let back: Shape = serde_json::from_value(json).unwrap();
        assert!(back.is_evented());
    }

    #[test]
    fn test_segment_distance() {
        let d = point_to_segment_dist(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-9);
        let d = point_to_segment_dist(Point::new(-4.0, 3.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
    }
}
