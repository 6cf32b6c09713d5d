//! Scene model and its JSON document form.

use crate::color::Color;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current scene document format version.
pub const SCENE_VERSION: u32 = 1;

/// Largest canvas side accepted from a document.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Background color of a fresh or cleared canvas.
pub const DEFAULT_BACKGROUND: Color = Color::WHITE;

/// Errors raised while decoding or loading scene documents.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported scene version {0} (expected {SCENE_VERSION})")]
    UnsupportedVersion(u32),
    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("duplicate shape id {0}")]
    DuplicateId(ShapeId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Ordered shapes (back to front) plus a background color.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    shapes: Vec<Shape>,
    pub background: Color,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            background: DEFAULT_BACKGROUND,
        }
    }

    /// Append a shape on top of the stack.
    pub fn push(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.shapes.push(shape);
        id
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.index_of(id)?;
        Some(self.shapes.remove(index))
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id() == id)
    }

    /// Shapes in paint order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Remove all shapes and reset the background.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.background = DEFAULT_BACKGROUND;
    }

    /// Topmost evented shape under `point`.
    pub fn shape_at(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .filter(|s| s.is_evented())
            .find(|s| s.hit_test(point, tolerance))
            .map(Shape::id)
    }

    /// Union of all shape bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, b| acc.union(b))
    }
}

/// Serialized form of a drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl SceneDocument {
    /// Empty document of the given size on the default background.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            version: SCENE_VERSION,
            width,
            height,
            background: DEFAULT_BACKGROUND,
            shapes: Vec::new(),
        }
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a document.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let doc: SceneDocument = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn load(path: &std::path::Path) -> SceneResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> SceneResult<()> {
        if self.version != SCENE_VERSION {
            return Err(SceneError::UnsupportedVersion(self.version));
        }
        let in_range = |side: u32| (1..=MAX_CANVAS_SIDE).contains(&side);
        if !in_range(self.width) || !in_range(self.height) {
            return Err(SceneError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(self.shapes.len());
        for shape in &self.shapes {
            if !seen.insert(shape.id()) {
                return Err(SceneError::DuplicateId(shape.id()));
            }
        }
        Ok(())
    }

    pub(crate) fn into_scene(self) -> Scene {
        Scene {
            shapes: self.shapes,
            background: self.background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, Rectangle};

    #[test]
    fn test_topmost_wins() {
        let mut scene = Scene::new();
        let below = scene.push(Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 100.0)));
        let above = scene.push(Shape::Ellipse(Ellipse::new(Point::new(50.0, 50.0), 20.0, 20.0)));

        assert_eq!(scene.shape_at(Point::new(50.0, 50.0), 0.0), Some(above));
        assert_eq!(scene.shape_at(Point::new(5.0, 5.0), 0.0), Some(below));
        assert_eq!(scene.shape_at(Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_non_evented_skipped() {
        let mut scene = Scene::new();
        let below = scene.push(Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 100.0)));
        let mut preview = Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 100.0));
        preview.set_evented(false);
        scene.push(preview);

        assert_eq!(scene.shape_at(Point::new(50.0, 50.0), 0.0), Some(below));
    }

    #[test]
    fn test_clear_resets_background() {
        let mut scene = Scene::new();
        scene.background = Color::BLACK;
        scene.push(Shape::Rectangle(Rectangle::new(Point::ZERO, 1.0, 1.0)));
        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.background, Color::WHITE);
    }

    #[test]
    fn test_document_rejects_bad_version() {
        let mut doc = SceneDocument::empty(800, 600);
        doc.version = 7;
        let json = serde_json::to_string(&doc).unwrap();
        assert!(matches!(
            SceneDocument::from_json(&json),
            Err(SceneError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_document_rejects_oversized_canvas() {
        let json = SceneDocument::empty(800, 600)
            .to_json()
            .unwrap()
            .replace("\"width\":800", "\"width\":4000000000");
        assert!(matches!(
            SceneDocument::from_json(&json),
            Err(SceneError::InvalidSize { width: 4000000000, .. })
        ));
        assert!(SceneDocument::empty(MAX_CANVAS_SIDE, MAX_CANVAS_SIDE).validate().is_ok());
        assert!(SceneDocument::empty(MAX_CANVAS_SIDE + 1, 1).validate().is_err());
    }

    #[test]
    fn test_document_rejects_duplicate_ids() {
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 1.0, 1.0));
        let mut doc = SceneDocument::empty(800, 600);
        doc.shapes = vec![rect.clone(), rect];
        let json = doc.to_json().unwrap();
        assert!(matches!(
            SceneDocument::from_json(&json),
            Err(SceneError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_document_json_roundtrip_keeps_order() {
        let mut doc = SceneDocument::empty(800, 600);
        doc.shapes.push(Shape::Rectangle(Rectangle::new(Point::ZERO, 1.0, 1.0)));
        doc.shapes.push(Shape::Ellipse(Ellipse::new(Point::ZERO, 1.0, 1.0)));
        let back = SceneDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
