//! Rectangle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, default_evented};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Width of the rectangle (never negative).
    pub width: f64,
    /// Height of the rectangle (never negative).
    pub height: f64,
    /// Style properties.
    pub style: ShapeStyle,
    #[serde(default = "default_evented")]
    pub evented: bool,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            style: ShapeStyle::default(),
            evented: true,
        }
    }

    /// Create a rectangle from two corner points, in either drag direction.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.width(), rect.height())
    }

    /// Re-span this rectangle between two corners, keeping id and style.
    pub fn set_corners(&mut self, p1: Point, p2: Point) {
        let rect = Rect::from_points(p1, p2);
        self.position = rect.origin();
        self.width = rect.width();
        self.height = rect.height();
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        // Interior counts as a hit whether or not the rectangle is filled.
        let reach = tolerance + self.style.stroke_width / 2.0;
        let outer = self.as_rect().inflate(reach, reach);
        point.x >= outer.x0 && point.x <= outer.x1 && point.y >= outer.y0 && point.y <= outer.y1
    }

    fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
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
    fn test_rectangle_creation() {
        let rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0);
        assert!((rect.position.x - 10.0).abs() < f64::EPSILON);
        assert!((rect.position.y - 20.0).abs() < f64::EPSILON);
        assert!((rect.width - 100.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_corners_normalizes_direction() {
        let backwards = Rectangle::from_corners(Point::new(100.0, 100.0), Point::new(10.0, 10.0));
        let forwards = Rectangle::from_corners(Point::new(10.0, 10.0), Point::new(100.0, 100.0));
        for rect in [&backwards, &forwards] {
            assert!((rect.position.x - 10.0).abs() < f64::EPSILON);
            assert!((rect.position.y - 10.0).abs() < f64::EPSILON);
            assert!((rect.width - 90.0).abs() < f64::EPSILON);
            assert!((rect.height - 90.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_mixed_direction_drag() {
        let mut rect = Rectangle::new(Point::ZERO, 0.0, 0.0);
        rect.set_corners(Point::new(50.0, 10.0), Point::new(20.0, 40.0));
        assert!((rect.position.x - 20.0).abs() < f64::EPSILON);
        assert!((rect.position.y - 10.0).abs() < f64::EPSILON);
        assert!((rect.width - 30.0).abs() < f64::EPSILON);
        assert!((rect.height - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_interior_without_fill() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(rect.style.fill_color.is_none());
        assert!(rect.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(!rect.hit_test(Point::new(150.0, 50.0), 0.0));
        assert!(rect.hit_test(Point::new(105.0, 50.0), 10.0));
    }
}
