//! Tool system: turns pointer gestures into scene edits.

mod brush;

pub use brush::{BrushKind, TextOptions};

use crate::color::Color;
use crate::shapes::{Ellipse, Freehand, Line, Polygon, Rectangle, Shape, ShapeId, ShapeStyle, Text};
use crate::surface::DrawingSurface;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Window after a text insertion during which further clicks insert nothing.
pub const TEXT_REENTRY_GUARD: Duration = Duration::from_millis(500);

/// A polygon click closer than this to the previous vertex is ignored.
const POLYGON_MERGE_DISTANCE: f64 = 1.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Freehand,
    Eraser,
    Line,
    Rectangle,
    Ellipse,
    Polygon,
    Fill,
    Text,
    Arrow,
    Star,
    Heart,
    Cloud,
}

impl ToolKind {
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Select,
            ToolKind::Freehand,
            ToolKind::Eraser,
            ToolKind::Line,
            ToolKind::Rectangle,
            ToolKind::Ellipse,
            ToolKind::Polygon,
            ToolKind::Fill,
            ToolKind::Text,
            ToolKind::Arrow,
            ToolKind::Star,
            ToolKind::Heart,
            ToolKind::Cloud,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Freehand => "freehand",
            ToolKind::Eraser => "eraser",
            ToolKind::Line => "line",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Polygon => "polygon",
            ToolKind::Fill => "fill",
            ToolKind::Text => "text",
            ToolKind::Arrow => "arrow",
            ToolKind::Star => "star",
            ToolKind::Heart => "heart",
            ToolKind::Cloud => "cloud",
        }
    }

    /// Toolbar entries that are accepted but do not draw anything yet.
    pub fn is_decorative(&self) -> bool {
        matches!(
            self,
            ToolKind::Arrow | ToolKind::Star | ToolKind::Heart | ToolKind::Cloud
        )
    }

    /// Surface modes `(drawing_mode, selection_enabled)` for this tool.
    pub fn surface_modes(&self) -> (bool, bool) {
        match self {
            ToolKind::Freehand | ToolKind::Eraser => (true, false),
            ToolKind::Select => (false, true),
            _ => (false, false),
        }
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "rect" => return Ok(ToolKind::Rectangle),
            "freedraw" | "draw" => return Ok(ToolKind::Freehand),
            _ => {}
        }
        ToolKind::all()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

/// Current picker values applied to new shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub stroke_color: Color,
    /// Fill for new closed shapes and for the fill tool. Transparent means none.
    pub fill_color: Color,
    pub stroke_width: f64,
    pub brush: BrushKind,
    pub text: TextOptions,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            fill_color: Color::TRANSPARENT,
            stroke_width: 5.0,
            brush: BrushKind::default(),
            text: TextOptions::default(),
        }
    }
}

impl ToolSettings {
    fn shape_style(&self, closed: bool) -> ShapeStyle {
        ShapeStyle {
            stroke_color: self.stroke_color,
            stroke_width: self.stroke_width,
            fill_color: if closed { self.fill_color.into_fill() } else { None },
            opacity: 1.0,
        }
    }
}

/// State of a drag interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ToolState {
    /// Waiting for a pointer press.
    #[default]
    Idle,
    /// Pointer is down and a preview shape is on the surface.
    Active {
        start: Point,
        current: Point,
        preview: ShapeId,
    },
}

/// A completed edit that should be captured in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// A shape was finalized on the surface.
    Created(ShapeId),
    /// The fill tool painted an existing shape.
    Filled(ShapeId),
}

impl Edit {
    pub fn shape_id(&self) -> ShapeId {
        match self {
            Edit::Created(id) | Edit::Filled(id) => *id,
        }
    }
}

/// Interprets pointer input for the active tool.
///
/// Holds only ids of in-progress shapes; the surface owns the shapes.
#[derive(Debug, Clone)]
pub struct ToolController {
    tool: ToolKind,
    pub settings: ToolSettings,
    state: ToolState,
    polygon_points: Vec<Point>,
    polygon_preview: Option<ShapeId>,
    last_text_insert: Option<Instant>,
    text_guard: Duration,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new(ToolSettings::default())
    }
}

impl ToolController {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            tool: ToolKind::default(),
            settings,
            state: ToolState::Idle,
            polygon_points: Vec::new(),
            polygon_preview: None,
            last_text_insert: None,
            text_guard: TEXT_REENTRY_GUARD,
        }
    }

    pub fn with_text_guard(mut self, guard: Duration) -> Self {
        self.text_guard = guard;
        self
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn is_pointer_down(&self) -> bool {
        matches!(self.state, ToolState::Active { .. })
    }

    pub fn polygon_points(&self) -> &[Point] {
        &self.polygon_points
    }

    /// Switch tools, discarding every piece of in-progress gesture state.
    pub fn set_tool(&mut self, tool: ToolKind, surface: &mut DrawingSurface) {
        self.reset(surface);
        let (drawing, selection) = tool.surface_modes();
        surface.set_modes(drawing, selection);
        log::debug!("tool {} -> {}", self.tool.name(), tool.name());
        self.tool = tool;
    }

    /// Drop uncommitted previews, polygon vertices and pending text
    /// insertion without changing the tool.
    pub fn reset(&mut self, surface: &mut DrawingSurface) {
        if let ToolState::Active { preview, .. } = self.state {
            surface.remove_shape(preview);
        }
        self.state = ToolState::Idle;
        if let Some(preview) = self.polygon_preview.take() {
            surface.remove_shape(preview);
        }
        self.polygon_points.clear();
        self.last_text_insert = None;
        surface.exit_text_editing();
    }

    /// Handle a pointer press at `now`.
    pub fn pointer_down(
        &mut self,
        surface: &mut DrawingSurface,
        point: Point,
        now: Instant,
    ) -> Option<Edit> {
        match self.tool {
            ToolKind::Select => {
                surface.select_at(point);
                None
            }
            ToolKind::Freehand | ToolKind::Eraser => {
                if !surface.drawing_mode() {
                    return None;
                }
                let mut stroke = Freehand::from_points(vec![point]);
                stroke.style = self.stroke_style(surface);
                stroke.evented = false;
                self.begin_drag(surface, point, Shape::Freehand(stroke));
                None
            }
            ToolKind::Line | ToolKind::Rectangle | ToolKind::Ellipse => {
                if surface.drawing_mode() {
                    return None;
                }
                let mut shape = match self.tool {
                    ToolKind::Line => Shape::Line(Line::new(point, point)),
                    ToolKind::Rectangle => Shape::Rectangle(Rectangle::new(point, 0.0, 0.0)),
                    _ => Shape::Ellipse(Ellipse::new(point, 0.0, 0.0)),
                };
                *shape.style_mut() = self.settings.shape_style(shape.is_closed());
                shape.set_evented(false);
                self.begin_drag(surface, point, shape);
                None
            }
            ToolKind::Polygon => {
                self.add_polygon_vertex(surface, point);
                None
            }
            ToolKind::Text => self.insert_text(surface, point, now),
            ToolKind::Fill => self.fill_at(surface, point),
            ToolKind::Arrow | ToolKind::Star | ToolKind::Heart | ToolKind::Cloud => {
                log::debug!("{} tool is not implemented", self.tool.name());
                None
            }
        }
    }

    /// Handle pointer motion. Only meaningful while a drag is active.
    pub fn pointer_move(&mut self, surface: &mut DrawingSurface, point: Point) {
        let ToolState::Active { start, preview, .. } = self.state else {
            return;
        };
        self.state = ToolState::Active {
            start,
            current: point,
            preview,
        };
        surface.update_shape(preview, |shape| match shape {
            Shape::Freehand(stroke) => stroke.add_point(point),
            Shape::Line(line) => line.end = point,
            Shape::Rectangle(rect) => rect.set_corners(start, point),
            Shape::Ellipse(ellipse) => ellipse.set_corners(start, point),
            Shape::Polygon(_) | Shape::Text(_) => {}
        });
    }

    /// Handle a pointer release, finalizing the dragged shape.
    pub fn pointer_up(&mut self, surface: &mut DrawingSurface, point: Point) -> Option<Edit> {
        let ToolState::Active { current, preview, .. } = self.state else {
            return None;
        };
        if current != point {
            self.pointer_move(surface, point);
        }
        self.state = ToolState::Idle;

        let degenerate = matches!(
            surface.shape(preview),
            Some(Shape::Freehand(stroke)) if stroke.len() < 2
        );
        if degenerate {
            surface.remove_shape(preview);
            return None;
        }
        surface
            .update_shape(preview, |shape| shape.set_evented(true))
            .then_some(Edit::Created(preview))
    }

    /// Handle a double click at `point`. The point becomes the polygon's last
    /// vertex (merged if it repeats the previous one), then a polygon with
    /// more than two vertices is finalized.
    pub fn double_click(&mut self, surface: &mut DrawingSurface, point: Point) -> Option<Edit> {
        if self.tool != ToolKind::Polygon {
            return None;
        }
        self.add_polygon_vertex(surface, point);
        if self.polygon_points.len() <= 2 {
            return None;
        }
        let preview = self.polygon_preview.take()?;
        let points = std::mem::take(&mut self.polygon_points);
        surface
            .update_shape(preview, |shape| {
                if let Shape::Polygon(poly) = shape {
                    poly.points = points;
                }
                shape.set_evented(true);
            })
            .then_some(Edit::Created(preview))
    }

    fn begin_drag(&mut self, surface: &mut DrawingSurface, point: Point, shape: Shape) {
        let preview = surface.add_shape(shape);
        self.state = ToolState::Active {
            start: point,
            current: point,
            preview,
        };
    }

    fn stroke_style(&self, surface: &DrawingSurface) -> ShapeStyle {
        if self.tool == ToolKind::Eraser {
            // Painting over with the background; nothing is removed.
            ShapeStyle {
                stroke_color: surface.background(),
                stroke_width: self.settings.stroke_width * 2.0,
                fill_color: None,
                opacity: 1.0,
            }
        } else {
            self.settings
                .brush
                .stroke_style(self.settings.stroke_color, self.settings.stroke_width)
        }
    }

    fn add_polygon_vertex(&mut self, surface: &mut DrawingSurface, point: Point) {
        if let Some(last) = self.polygon_points.last() {
            if (point - *last).hypot() < POLYGON_MERGE_DISTANCE {
                return;
            }
        }
        self.polygon_points.push(point);
        if self.polygon_points.len() < 2 {
            return;
        }
        let points = self.polygon_points.clone();
        let updated = self.polygon_preview.is_some_and(|id| {
            surface.update_shape(id, |shape| {
                if let Shape::Polygon(poly) = shape {
                    poly.points = points.clone();
                }
            })
        });
        if !updated {
            let mut poly = Polygon::new(points);
            poly.style = self.settings.shape_style(true);
            poly.evented = false;
            self.polygon_preview = Some(surface.add_shape(Shape::Polygon(poly)));
        }
    }

    fn insert_text(&mut self, surface: &mut DrawingSurface, point: Point, now: Instant) -> Option<Edit> {
        if let Some(last) = self.last_text_insert {
            if now.saturating_duration_since(last) < self.text_guard {
                log::debug!("text insertion suppressed by re-entry guard");
                return None;
            }
        }
        self.last_text_insert = Some(now);

        let options = self.settings.text;
        let text = Text::new(point, Text::PLACEHOLDER.to_string())
            .with_font_size(options.font_size)
            .with_font_family(options.font_family)
            .with_color(options.color);
        let id = surface.add_shape(Shape::Text(text));
        surface.activate(id);
        surface.enter_text_editing(id);
        Some(Edit::Created(id))
    }

    fn fill_at(&mut self, surface: &mut DrawingSurface, point: Point) -> Option<Edit> {
        let id = surface.hit_test(point)?;
        if !surface.shape(id)?.is_closed() {
            return None;
        }
        let fill = self.settings.fill_color.into_fill();
        surface.update_shape(id, |shape| shape.style_mut().fill_color = fill);
        log::debug!("fill {} with {}", id, self.settings.fill_color);
        Some(Edit::Filled(id))
    }
}
