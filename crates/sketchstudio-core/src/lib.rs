//! SketchStudio Core Library
//!
//! Scene model, drawing tools, undo history and the sketch-to-design
//! generation workflow. Rendering lives in `sketchstudio-render`.

pub mod color;
pub mod config;
pub mod data_uri;
pub mod generation;
pub mod handoff;
pub mod history;
pub mod input;
pub mod scene;
pub mod shapes;
pub mod sketchpad;
pub mod surface;
pub mod tools;

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the async seams (generation client, handoff store).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use color::Color;
pub use config::{ConfigError, StudioConfig};
pub use generation::{
    GenerationClient, GenerationError, GenerationRequest, GenerationState, GenerationStatus,
    GenerationWorkflow, HttpGenerationClient,
};
pub use handoff::{DesignHandoff, HandoffError, HandoffMode, HandoffStore};
pub use history::History;
pub use input::{InputState, MouseButton, PointerEvent};
pub use scene::{Scene, SceneDocument, SceneError};
pub use shapes::{Shape, ShapeId, ShapeStyle};
pub use sketchpad::Sketchpad;
pub use surface::{DrawingSurface, StyleChange};
pub use tools::{BrushKind, ToolController, ToolKind, ToolSettings};
