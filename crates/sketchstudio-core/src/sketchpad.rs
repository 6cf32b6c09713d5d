//! The owning controller that wires surface, tools and history together.

use crate::color::Color;
use crate::config::StudioConfig;
use crate::history::History;
use crate::input::{InputState, MouseButton, PointerEvent};
use crate::scene::{SceneDocument, SceneResult};
use crate::shapes::{FontFamily, Shape, Text};
use crate::surface::{DrawingSurface, StyleChange};
use crate::tools::{BrushKind, Edit, ToolController, ToolKind, ToolSettings};
use kurbo::Point;
use std::time::Instant;

/// A sketch canvas with tools and undo/redo.
///
/// All scene mutation goes through `&mut Sketchpad`: pointer events reach
/// the tool controller, which edits the surface, and every committed edit is
/// snapshotted into history.
#[derive(Debug)]
pub struct Sketchpad {
    surface: DrawingSurface,
    tools: ToolController,
    history: History,
    input: InputState,
    /// Text content changed since editing began.
    text_dirty: bool,
}

impl Sketchpad {
    /// Empty 800x600 sketchpad with default settings.
    pub fn new() -> SceneResult<Self> {
        Self::with_config(&StudioConfig::default())
    }

    pub fn with_config(config: &StudioConfig) -> SceneResult<Self> {
        let mut surface = DrawingSurface::new(config.canvas_width, config.canvas_height);
        surface.set_background(config.background);
        let settings = ToolSettings {
            stroke_width: config.stroke_width,
            ..ToolSettings::default()
        };
        let mut tools = ToolController::new(settings).with_text_guard(config.text_guard());
        tools.set_tool(ToolKind::Select, &mut surface);
        let history = History::new(&surface.serialize())?;
        Ok(Self {
            surface,
            tools,
            history,
            input: InputState::new(),
            text_dirty: false,
        })
    }

    /// Open an existing document with `config`'s tool defaults. The
    /// document keeps its own size and background and becomes the initial
    /// history entry.
    pub fn open(doc: SceneDocument, config: &StudioConfig) -> SceneResult<Self> {
        let mut pad = Self::with_config(config)?;
        pad.surface.restore(doc)?;
        pad.history.reset(&pad.surface.serialize())?;
        Ok(pad)
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Vertices placed so far for an unfinished polygon.
    pub fn polygon_points(&self) -> &[Point] {
        self.tools.polygon_points()
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.tool()
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.tools.settings
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.finish_text_editing();
        self.tools.set_tool(tool, &mut self.surface);
    }

    // --- Pointer input ---

    pub fn pointer_down(&mut self, point: Point) {
        self.pointer_down_at(point, Instant::now());
    }

    /// Press at an explicit time (drives the text re-entry guard).
    pub fn pointer_down_at(&mut self, point: Point, now: Instant) {
        if self.tools.tool() != ToolKind::Text {
            self.finish_text_editing();
        }
        let edit = self.tools.pointer_down(&mut self.surface, point, now);
        self.commit(edit);
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.tools.pointer_move(&mut self.surface, point);
    }

    pub fn pointer_up(&mut self, point: Point) {
        let edit = self.tools.pointer_up(&mut self.surface, point);
        self.commit(edit);
    }

    pub fn double_click(&mut self, point: Point) {
        let edit = self.tools.double_click(&mut self.surface, point);
        self.commit(edit);
    }

    /// Feed a raw pointer event. A press that completes a double click is
    /// handled as a press followed by a double click, like a browser does.
    pub fn handle_event(&mut self, event: PointerEvent) {
        self.handle_event_at(event, Instant::now());
    }

    pub fn handle_event_at(&mut self, event: PointerEvent, now: Instant) {
        self.input.begin_frame();
        self.input.handle_pointer_event(event, now);
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => {
                self.pointer_down_at(position, now);
                if self.input.is_double_click() {
                    self.double_click(position);
                }
            }
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => self.pointer_up(position),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => {}
        }
    }

    // --- Pickers ---
    // Picker changes restyle the active shape live but are not history entries.

    pub fn set_stroke_color(&mut self, color: Color) {
        self.tools.settings.stroke_color = color;
        self.surface.restyle_active(StyleChange::StrokeColor(color));
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.tools.settings.fill_color = color;
        self.surface.restyle_active(StyleChange::FillColor(Some(color)));
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.tools.settings.stroke_width = width.max(0.0);
        self.surface
            .restyle_active(StyleChange::StrokeWidth(self.tools.settings.stroke_width));
    }

    pub fn set_brush(&mut self, brush: BrushKind) {
        self.tools.settings.brush = brush;
    }

    pub fn set_font_family(&mut self, family: FontFamily) {
        self.tools.settings.text.font_family = family;
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.tools.settings.text.font_size = Text::clamp_font_size(size);
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.tools.settings.text.color = color;
        if self.surface.active_shape().and_then(Shape::as_text).is_some() {
            self.surface.restyle_active(StyleChange::FillColor(Some(color)));
        }
    }

    pub fn set_background(&mut self, color: Color) {
        self.surface.set_background(color);
        self.record();
    }

    // --- Text editing ---

    /// Replace the content of the text box being edited.
    pub fn set_text_content(&mut self, content: &str) -> bool {
        let Some(id) = self.surface.editing() else {
            return false;
        };
        let changed = self.surface.update_shape(id, |shape| {
            if let Some(text) = shape.as_text_mut() {
                text.set_content(content);
            }
        });
        self.text_dirty |= changed;
        changed
    }

    /// Leave text editing, recording the edited text if it changed.
    pub fn finish_text_editing(&mut self) {
        if self.surface.exit_text_editing().is_some() && self.text_dirty {
            self.record();
        }
        self.text_dirty = false;
    }

    // --- Document operations ---

    /// Remove the active shape.
    pub fn delete_active(&mut self) -> bool {
        let Some(id) = self.surface.active() else {
            return false;
        };
        self.surface.remove_shape(id);
        self.record();
        true
    }

    /// Clear the canvas. Recorded like any other edit.
    pub fn clear(&mut self) {
        self.tools.reset(&mut self.surface);
        self.text_dirty = false;
        self.surface.clear();
        self.record();
    }

    /// Step back one snapshot. Returns whether anything changed.
    pub fn undo(&mut self) -> SceneResult<bool> {
        self.cancel_gesture();
        let Some(json) = self.history.undo() else {
            return Ok(false);
        };
        let doc = SceneDocument::from_json(json)?;
        self.surface.restore(doc)?;
        Ok(true)
    }

    /// Step forward one snapshot. Returns whether anything changed.
    pub fn redo(&mut self) -> SceneResult<bool> {
        self.cancel_gesture();
        let Some(json) = self.history.redo() else {
            return Ok(false);
        };
        let doc = SceneDocument::from_json(json)?;
        self.surface.restore(doc)?;
        Ok(true)
    }

    pub fn serialize(&self) -> SceneDocument {
        self.surface.serialize()
    }

    fn cancel_gesture(&mut self) {
        self.finish_text_editing();
        self.tools.reset(&mut self.surface);
    }

    fn commit(&mut self, edit: Option<Edit>) {
        if let Some(edit) = edit {
            log::debug!("committed {:?}", edit);
            self.record();
        }
    }

    fn record(&mut self) {
        if let Err(e) = self.history.record(&self.surface.serialize()) {
            log::warn!("failed to record history snapshot: {}", e);
        }
    }
}
