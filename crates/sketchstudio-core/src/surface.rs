//! Drawing surface: owns the scene, the selection and the interaction modes.

use crate::color::Color;
use crate::scene::{Scene, SceneDocument, SceneResult, SCENE_VERSION};
use crate::shapes::{Shape, ShapeId, ShapeStyle};
use kurbo::Point;

/// Canvas size used when nothing else is configured.
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Pointer slack in canvas pixels for hit-testing.
pub const HIT_TOLERANCE: f64 = 2.0;

/// A live style edit coming from the stroke, fill or width pickers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleChange {
    StrokeColor(Color),
    /// `None` clears the fill.
    FillColor(Option<Color>),
    StrokeWidth(f64),
}

/// A retained-mode vector canvas.
///
/// Every mutation bumps [`DrawingSurface::revision`], which renderers compare
/// against the last value they drew to decide whether to repaint.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    scene: Scene,
    width: u32,
    height: u32,
    active: Option<ShapeId>,
    editing: Option<ShapeId>,
    drawing_mode: bool,
    selection_enabled: bool,
    revision: u64,
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            scene: Scene::new(),
            width,
            height,
            active: None,
            editing: None,
            drawing_mode: false,
            selection_enabled: true,
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn background(&self) -> Color {
        self.scene.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.scene.background = color;
        self.touch();
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Add a shape on top of the scene.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        log::debug!("add {} {}", shape.kind_name(), shape.id());
        let id = self.scene.push(shape);
        self.touch();
        id
    }

    /// Remove a shape, dropping it from the selection if needed.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let removed = self.scene.remove(id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        if self.editing == Some(id) {
            self.editing = None;
        }
        self.touch();
        Some(removed)
    }

    /// Remove every shape and reset the background to white.
    pub fn clear(&mut self) {
        self.scene.clear();
        self.active = None;
        self.editing = None;
        self.touch();
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.scene.get(id)
    }

    /// Mutate a shape in place. Returns false if the id is unknown.
    pub fn update_shape(&mut self, id: ShapeId, f: impl FnOnce(&mut Shape)) -> bool {
        let Some(shape) = self.scene.get_mut(id) else {
            return false;
        };
        f(shape);
        self.touch();
        true
    }

    pub fn shapes(&self) -> &[Shape] {
        self.scene.shapes()
    }

    pub fn len(&self) -> usize {
        self.scene.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scene.is_empty()
    }

    /// Snapshot the whole surface.
    pub fn serialize(&self) -> SceneDocument {
        SceneDocument {
            version: SCENE_VERSION,
            width: self.width,
            height: self.height,
            background: self.scene.background,
            shapes: self.scene.shapes().to_vec(),
        }
    }

    /// Replace the surface contents with a document. Selection and text
    /// editing are dropped; interaction modes are kept.
    pub fn restore(&mut self, doc: SceneDocument) -> SceneResult<()> {
        doc.validate()?;
        self.width = doc.width;
        self.height = doc.height;
        self.scene = doc.into_scene();
        self.active = None;
        self.editing = None;
        self.touch();
        Ok(())
    }

    /// Topmost evented shape containing `point`.
    pub fn hit_test(&self, point: Point) -> Option<ShapeId> {
        self.scene.shape_at(point, HIT_TOLERANCE)
    }

    // --- Selection ---

    pub fn active(&self) -> Option<ShapeId> {
        self.active
    }

    pub fn active_shape(&self) -> Option<&Shape> {
        self.active.and_then(|id| self.scene.get(id))
    }

    /// Make `id` the active shape. Refused while selection is disabled or
    /// when the shape is unknown or not evented.
    pub fn set_active(&mut self, id: ShapeId) -> bool {
        if !self.selection_enabled {
            return false;
        }
        match self.scene.get(id) {
            Some(shape) if shape.is_evented() => {
                self.active = Some(id);
                self.touch();
                true
            }
            _ => false,
        }
    }

    /// Programmatic selection, e.g. a freshly inserted text box. Ignores
    /// the selection mode.
    pub fn activate(&mut self, id: ShapeId) -> bool {
        if self.scene.get(id).is_none() {
            return false;
        }
        self.active = Some(id);
        self.touch();
        true
    }

    pub fn clear_active(&mut self) {
        if self.active.take().is_some() {
            self.touch();
        }
    }

    /// Select whatever is under `point`, or clear the selection on empty space.
    pub fn select_at(&mut self, point: Point) -> Option<ShapeId> {
        if !self.selection_enabled {
            return None;
        }
        match self.hit_test(point) {
            Some(id) => {
                self.set_active(id);
                Some(id)
            }
            None => {
                self.clear_active();
                None
            }
        }
    }

    /// Apply a picker change to the active shape.
    ///
    /// Closed shapes take stroke, fill and width. Lines and strokes take
    /// stroke and width. Text takes its glyph color from the fill picker.
    /// Returns whether anything changed.
    pub fn restyle_active(&mut self, change: StyleChange) -> bool {
        let Some(id) = self.active else {
            return false;
        };
        let Some(shape) = self.scene.get_mut(id) else {
            return false;
        };
        let applied = match shape {
            Shape::Rectangle(_) | Shape::Ellipse(_) | Shape::Polygon(_) => {
                apply_style(shape.style_mut(), change);
                true
            }
            Shape::Line(_) | Shape::Freehand(_) => match change {
                StyleChange::FillColor(_) => false,
                _ => {
                    apply_style(shape.style_mut(), change);
                    true
                }
            },
            Shape::Text(text) => match change {
                StyleChange::FillColor(Some(color)) if !color.is_transparent() => {
                    text.style.fill_color = Some(color);
                    true
                }
                _ => false,
            },
        };
        if applied {
            self.touch();
        }
        applied
    }

    // --- Text editing ---

    pub fn editing(&self) -> Option<ShapeId> {
        self.editing
    }

    pub fn enter_text_editing(&mut self, id: ShapeId) -> bool {
        if self.scene.get(id).and_then(Shape::as_text).is_none() {
            return false;
        }
        self.editing = Some(id);
        self.touch();
        true
    }

    pub fn exit_text_editing(&mut self) -> Option<ShapeId> {
        let id = self.editing.take();
        if id.is_some() {
            self.touch();
        }
        id
    }

    // --- Modes ---

    pub fn drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    pub fn selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    /// Switch free drawing and selection. Disabling selection drops the
    /// active shape.
    pub fn set_modes(&mut self, drawing_mode: bool, selection_enabled: bool) {
        self.drawing_mode = drawing_mode;
        self.selection_enabled = selection_enabled;
        if !selection_enabled {
            self.active = None;
        }
        self.touch();
    }
}

fn apply_style(style: &mut ShapeStyle, change: StyleChange) {
    match change {
        StyleChange::StrokeColor(color) => style.stroke_color = color,
        StyleChange::FillColor(color) => style.fill_color = color.and_then(Color::into_fill),
        StyleChange::StrokeWidth(width) => style.stroke_width = width.max(0.0),
    }
}
