//! Pointer input state and double-click detection.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    Up {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    Move {
        position: Point,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => *position,
        }
    }
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks pointer state across events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position.
    pub pointer_position: Point,
    pressed_buttons: HashSet<MouseButton>,
    /// Whether the left button is held.
    pub is_dragging: bool,
    /// Start position of the current drag.
    pub drag_start: Option<Point>,
    last_click_time: Option<Instant>,
    last_click_position: Option<Point>,
    double_click_detected: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-event state. Call before feeding the next event.
    pub fn begin_frame(&mut self) {
        self.double_click_detected = false;
    }

    /// Process a pointer event that happened at `now`.
    pub fn handle_pointer_event(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.insert(button);

                if button == MouseButton::Left {
                    let is_double = match (self.last_click_time, self.last_click_position) {
                        (Some(last_time), Some(last_pos)) => {
                            now.saturating_duration_since(last_time) < DOUBLE_CLICK_TIME
                                && (position - last_pos).hypot() < DOUBLE_CLICK_DISTANCE
                        }
                        _ => false,
                    };
                    if is_double {
                        self.double_click_detected = true;
                        // A third click starts a new sequence.
                        self.last_click_time = None;
                        self.last_click_position = None;
                    } else {
                        self.last_click_time = Some(now);
                        self.last_click_position = Some(position);
                    }

                    if !self.is_dragging {
                        self.is_dragging = true;
                        self.drag_start = Some(position);
                    }
                }
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.remove(&button);
                if button == MouseButton::Left {
                    self.is_dragging = false;
                    self.drag_start = None;
                }
            }
            PointerEvent::Move { position } => {
                self.pointer_position = position;
            }
        }
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Whether the last processed press completed a double click.
    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    #[test]
    fn test_drag_tracking() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.handle_pointer_event(down(10.0, 10.0), now);
        assert!(input.is_dragging);
        assert_eq!(input.drag_start, Some(Point::new(10.0, 10.0)));
        assert!(input.is_button_pressed(MouseButton::Left));

        input.handle_pointer_event(
            PointerEvent::Up {
                position: Point::new(20.0, 20.0),
                button: MouseButton::Left,
            },
            now,
        );
        assert!(!input.is_dragging);
        assert_eq!(input.drag_start, None);
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_pointer_event(down(10.0, 10.0), t0);
        assert!(!input.is_double_click());

        input.begin_frame();
        input.handle_pointer_event(down(12.0, 11.0), t0 + Duration::from_millis(200));
        assert!(input.is_double_click());

        // Third click does not chain into another double click.
        input.begin_frame();
        input.handle_pointer_event(down(12.0, 11.0), t0 + Duration::from_millis(300));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_slow_or_far_clicks_are_single() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_pointer_event(down(10.0, 10.0), t0);
        input.begin_frame();
        input.handle_pointer_event(down(10.0, 10.0), t0 + Duration::from_millis(700));
        assert!(!input.is_double_click());
        input.begin_frame();
        input.handle_pointer_event(down(40.0, 10.0), t0 + Duration::from_millis(800));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_event_json_shape() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"kind":"down","position":{"x":1.0,"y":2.0}}"#).unwrap();
        assert_eq!(event, down(1.0, 2.0));
    }
}
