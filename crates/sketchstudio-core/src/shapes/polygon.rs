//! Closed polygon shape built from clicked vertices.

use super::{ShapeId, ShapeStyle, ShapeTrait, default_evented, point_to_polyline_dist, points_bounds};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A closed polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub(crate) id: ShapeId,
    /// Vertices in click order. The last vertex connects back to the first.
    pub points: Vec<Point>,
    /// Style properties.
    pub style: ShapeStyle,
    #[serde(default = "default_evented")]
    pub evented: bool,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            style: ShapeStyle::default(),
            evented: true,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Even-odd ray cast against the closed outline.
    fn contains(&self, point: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.points[i], self.points[j]);
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

impl ShapeTrait for Polygon {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        points_bounds(&self.points)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.contains(point) {
            return true;
        }
        let Some(first) = self.points.first() else {
            return false;
        };
        let mut ring = self.points.clone();
        ring.push(*first);
        let reach = tolerance + self.style.stroke_width / 2.0;
        match ring.as_slice() {
            [only, _] => (point - *only).hypot() <= reach,
            ring => point_to_polyline_dist(point, ring) <= reach,
        }
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };
        path.move_to(*first);
        for point in rest {
            path.line_to(*point);
        }
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
