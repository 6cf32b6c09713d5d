//! SketchStudio Render Library
//!
//! CPU rasterization of scene documents with tiny-skia, plus PNG/JPEG
//! export and data-URI encoding for the generation upload.

mod export;
mod rasterizer;
#[cfg(feature = "text")]
mod text;

pub use export::{DEFAULT_JPEG_QUALITY, ImageFormat, SurfaceExport, encode};
pub use rasterizer::{MAX_OUTPUT_SIDE, Rasterizer};
#[cfg(feature = "text")]
pub use rasterizer::default_font;
pub use tiny_skia::Pixmap;

use thiserror::Error;

/// Rendering and export errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Font error: {0}")]
    Font(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
