//! Replaying recorded sketch sessions.
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"tool": "rectangle"},
//!   {"fill_color": "#FF6B6B"},
//!   {"pointer": {"kind": "down", "position": {"x": 10, "y": 10}}},
//!   {"pointer": {"kind": "move", "position": {"x": 120, "y": 90}}},
//!   {"pointer": {"kind": "up", "position": {"x": 120, "y": 90}}},
//!   {"wait_ms": 600},
//!   "undo"
//! ]
//! ```

use anyhow::Context;
use serde::Deserialize;
use sketchstudio_core::color::Color;
use sketchstudio_core::input::PointerEvent;
use sketchstudio_core::shapes::FontFamily;
use sketchstudio_core::sketchpad::Sketchpad;
use sketchstudio_core::tools::{BrushKind, ToolKind};
use std::path::Path;
use std::time::{Duration, Instant};

/// Virtual time between consecutive steps.
const STEP_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Tool(ToolKind),
    Pointer(PointerEvent),
    WaitMs(u64),
    StrokeColor(Color),
    FillColor(Color),
    StrokeWidth(f64),
    Brush(BrushKind),
    FontFamily(FontFamily),
    FontSize(f64),
    TextColor(Color),
    Background(Color),
    /// Replace the content of the text being edited.
    Text(String),
    FinishText,
    DeleteActive,
    Clear,
    Undo,
    Redo,
}

pub fn load(path: &Path) -> anyhow::Result<Vec<Step>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing script {}", path.display()))
}

/// Feeds steps into a sketchpad on a virtual clock, so timing-sensitive
/// gestures (double clicks, the text guard) replay deterministically.
pub struct Player {
    clock: Instant,
}

impl Player {
    pub fn new() -> Self {
        Self {
            clock: Instant::now(),
        }
    }

    pub fn play(&mut self, pad: &mut Sketchpad, steps: &[Step]) -> anyhow::Result<()> {
        for (index, step) in steps.iter().enumerate() {
            self.clock += STEP_INTERVAL;
            self.apply(pad, step)
                .with_context(|| format!("step {} ({:?})", index, step))?;
        }
        pad.finish_text_editing();
        Ok(())
    }

    fn apply(&mut self, pad: &mut Sketchpad, step: &Step) -> anyhow::Result<()> {
        match step {
            Step::Tool(tool) => pad.set_tool(*tool),
            Step::Pointer(event) => pad.handle_event_at(*event, self.clock),
            Step::WaitMs(ms) => self.clock += Duration::from_millis(*ms),
            Step::StrokeColor(color) => pad.set_stroke_color(*color),
            Step::FillColor(color) => pad.set_fill_color(*color),
            Step::StrokeWidth(width) => pad.set_stroke_width(*width),
            Step::Brush(brush) => pad.set_brush(*brush),
            Step::FontFamily(family) => pad.set_font_family(*family),
            Step::FontSize(size) => pad.set_font_size(*size),
            Step::TextColor(color) => pad.set_text_color(*color),
            Step::Background(color) => pad.set_background(*color),
            Step::Text(content) => {
                if !pad.set_text_content(content) {
                    log::warn!("no text is being edited; ignoring {:?}", content);
                }
            }
            Step::FinishText => pad.finish_text_editing(),
            Step::DeleteActive => {
                pad.delete_active();
            }
            Step::Clear => pad.clear(),
            Step::Undo => {
                pad.undo()?;
            }
            Step::Redo => {
                pad.redo()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchstudio_core::shapes::Shape;

    fn play(json: &str) -> Sketchpad {
        let steps: Vec<Step> = serde_json::from_str(json).unwrap();
        let mut pad = Sketchpad::new().unwrap();
        Player::new().play(&mut pad, &steps).unwrap();
        pad
    }

    #[test]
    fn test_rectangle_then_undo() {
        let pad = play(
            r#"[
                {"tool": "rectangle"},
                {"pointer": {"kind": "down", "position": {"x": 100, "y": 100}}},
                {"pointer": {"kind": "move", "position": {"x": 10, "y": 10}}},
                {"pointer": {"kind": "up", "position": {"x": 10, "y": 10}}},
                {"tool": "ellipse"},
                {"pointer": {"kind": "down", "position": {"x": 200, "y": 200}}},
                {"pointer": {"kind": "up", "position": {"x": 260, "y": 240}}},
                "undo"
            ]"#,
        );
        let shapes = pad.surface().shapes();
        assert_eq!(shapes.len(), 1);
        assert!(matches!(shapes[0], Shape::Rectangle(_)));
        assert!(pad.history().can_redo());
    }

    #[test]
    fn test_polygon_with_double_click() {
        let pad = play(
            r#"[
                {"tool": "polygon"},
                {"pointer": {"kind": "down", "position": {"x": 10, "y": 10}}},
                {"pointer": {"kind": "up", "position": {"x": 10, "y": 10}}},
                {"wait_ms": 600},
                {"pointer": {"kind": "down", "position": {"x": 100, "y": 10}}},
                {"pointer": {"kind": "up", "position": {"x": 100, "y": 10}}},
                {"wait_ms": 600},
                {"pointer": {"kind": "down", "position": {"x": 50, "y": 90}}},
                {"pointer": {"kind": "up", "position": {"x": 50, "y": 90}}},
                {"pointer": {"kind": "down", "position": {"x": 50, "y": 90}}},
                {"pointer": {"kind": "up", "position": {"x": 50, "y": 90}}}
            ]"#,
        );
        let shapes = pad.surface().shapes();
        assert_eq!(shapes.len(), 1);
        match &shapes[0] {
            Shape::Polygon(polygon) => assert_eq!(polygon.vertex_count(), 3),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_text_entry() {
        let pad = play(
            r#"[
                {"tool": "text"},
                {"pointer": {"kind": "down", "position": {"x": 40, "y": 40}}},
                {"text": "Lehenga"},
                "finish_text"
            ]"#,
        );
        let text = pad.surface().shapes()[0].as_text().unwrap();
        assert_eq!(text.content(), "Lehenga");
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(serde_json::from_str::<Vec<Step>>(r#"[{"teleport": 1}]"#).is_err());
    }
}
