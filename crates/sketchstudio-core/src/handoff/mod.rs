//! Transfer of a finished sketch and prompt to the generation step.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryHandoffStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileHandoffStore;

use crate::BoxFuture;
use crate::data_uri;
use crate::generation::GenerationRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Key used for the handoff written by the sketch screen.
pub const LATEST_HANDOFF_KEY: &str = "latest";

/// Prompt used by demo mode.
pub const DEMO_PROMPT: &str = "Lehenga with floral embroidery and pastel shades";

/// A 1×1 white PNG standing in for a real sketch in demo mode.
pub const DEMO_SKETCH: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGNgYAAAAAMAASsJTYQAAAAASUVORK5CYII=";

/// Handoff errors.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("invalid sketch image: {0}")]
    InvalidImage(String),
    #[error("Handoff not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for handoff operations.
pub type HandoffResult<T> = Result<T, HandoffError>;

/// Whether a handoff came from a real sketch or from demo mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    #[default]
    Live,
    Demo,
}

impl fmt::Display for HandoffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffMode::Live => f.write_str("live"),
            HandoffMode::Demo => f.write_str("demo"),
        }
    }
}

/// Prompt and exported sketch, validated on construction and on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawHandoff")]
pub struct DesignHandoff {
    prompt: String,
    sketch_image: String,
    mode: HandoffMode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHandoff {
    prompt: String,
    sketch_image: String,
    #[serde(default)]
    mode: HandoffMode,
}

impl TryFrom<RawHandoff> for DesignHandoff {
    type Error = HandoffError;

    fn try_from(raw: RawHandoff) -> HandoffResult<Self> {
        Self::new(raw.prompt, raw.sketch_image, raw.mode)
    }
}

impl DesignHandoff {
    /// The prompt must be non-blank and the sketch a PNG or JPEG data URI.
    pub fn new(
        prompt: impl Into<String>,
        sketch_image: impl Into<String>,
        mode: HandoffMode,
    ) -> HandoffResult<Self> {
        let prompt = prompt.into();
        let sketch_image = sketch_image.into();
        if prompt.trim().is_empty() {
            return Err(HandoffError::EmptyPrompt);
        }
        data_uri::decode(&sketch_image).map_err(HandoffError::InvalidImage)?;
        Ok(Self {
            prompt,
            sketch_image,
            mode,
        })
    }

    /// The sample sketch and prompt shown in demo mode.
    pub fn demo() -> Self {
        Self {
            prompt: DEMO_PROMPT.to_string(),
            sketch_image: DEMO_SKETCH.to_string(),
            mode: HandoffMode::Demo,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn sketch_image(&self) -> &str {
        &self.sketch_image
    }

    pub fn mode(&self) -> HandoffMode {
        self.mode
    }

    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt.clone(),
            sketch_image: self.sketch_image.clone(),
        }
    }

    pub fn to_json(&self) -> HandoffResult<String> {
        serde_json::to_string(self).map_err(|e| HandoffError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> HandoffResult<Self> {
        serde_json::from_str(json).map_err(|e| HandoffError::Serialization(e.to_string()))
    }
}

/// Keyed storage for handoffs.
pub trait HandoffStore: Send + Sync {
    fn save(&self, key: &str, handoff: &DesignHandoff) -> BoxFuture<'_, HandoffResult<()>>;

    fn load(&self, key: &str) -> BoxFuture<'_, HandoffResult<DesignHandoff>>;

    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, HandoffResult<()>>;

    fn exists(&self, key: &str) -> BoxFuture<'_, HandoffResult<bool>>;
}
