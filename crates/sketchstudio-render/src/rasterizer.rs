//! tiny-skia rasterizer for scene documents.

use crate::{RenderError, RenderResult};
use kurbo::{BezPath, PathEl};
use sketchstudio_core::color::Color;
use sketchstudio_core::scene::SceneDocument;
use sketchstudio_core::shapes::{Shape, ShapeStyle, ShapeTrait, Text};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

#[cfg(feature = "text")]
use ab_glyph::FontArc;

/// Embedded DejaVu Sans, used for text when no other font is supplied
#[cfg(feature = "text")]
static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// The built-in text font.
#[cfg(feature = "text")]
pub fn default_font() -> RenderResult<FontArc> {
    FontArc::try_from_slice(DEJAVU_SANS).map_err(|e| RenderError::Font(e.to_string()))
}

/// Largest output side, after scaling.
pub const MAX_OUTPUT_SIDE: u32 = 16384;

fn sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(color));
    paint.anti_alias = true;
    paint
}

/// Convert a kurbo path to a tiny-skia path. `None` for paths with no area
/// to cover, such as a lone move.
pub(crate) fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Draws scene documents into RGBA pixmaps.
///
/// Shapes are painted in scene order over the document background, fill
/// first and stroke on top. Text uses the embedded DejaVu Sans unless another
/// font is set.
#[derive(Clone)]
pub struct Rasterizer {
    scale: f32,
    #[cfg(feature = "text")]
    font: Option<FontArc>,
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Rasterizer");
        s.field("scale", &self.scale);
        #[cfg(feature = "text")]
        s.field("font", &self.font.is_some());
        s.finish()
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        #[cfg(feature = "text")]
        let font = default_font()
            .inspect_err(|e| log::warn!("built-in font unavailable: {}", e))
            .ok();
        Self {
            scale: 1.0,
            #[cfg(feature = "text")]
            font,
        }
    }

    /// Drop the font so text shapes are skipped.
    #[cfg(feature = "text")]
    pub fn without_font(mut self) -> Self {
        self.font = None;
        self
    }

    /// Output resolution multiplier (1 = canvas size).
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[cfg(feature = "text")]
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Load a TrueType/OpenType font for text shapes.
    #[cfg(feature = "text")]
    pub fn with_font_file(self, path: &std::path::Path) -> RenderResult<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        log::debug!("loaded font {}", path.display());
        Ok(self.with_font(font))
    }

    /// Rasterize a document at the configured scale.
    pub fn render(&self, doc: &SceneDocument) -> RenderResult<Pixmap> {
        let width = (doc.width as f32 * self.scale).round() as u32;
        let height = (doc.height as f32 * self.scale).round() as u32;
        if width > MAX_OUTPUT_SIDE || height > MAX_OUTPUT_SIDE {
            return Err(RenderError::InvalidSize { width, height });
        }
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;
        pixmap.fill(sk_color(doc.background));

        let transform = Transform::from_scale(self.scale, self.scale);
        for shape in &doc.shapes {
            self.render_shape(&mut pixmap, shape, transform);
        }
        log::debug!("rendered {} shapes at {}x{}", doc.shapes.len(), width, height);
        Ok(pixmap)
    }

    fn render_shape(&self, pixmap: &mut Pixmap, shape: &Shape, transform: Transform) {
        match shape {
            Shape::Text(text) => self.render_text(pixmap, text),
            Shape::Freehand(stroke) if stroke.len() == 1 => {
                // A tap leaves a round dot the size of the brush.
                let p = stroke.points[0];
                let radius = (stroke.style.stroke_width / 2.0).max(0.5) as f32;
                if let Some(dot) = PathBuilder::from_circle(p.x as f32, p.y as f32, radius) {
                    let paint = paint(stroke.style.stroke_with_opacity());
                    pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
                }
            }
            _ => {
                if let Some(path) = to_skia_path(&shape.to_path()) {
                    render_path(pixmap, &path, shape.style(), shape.is_closed(), transform);
                }
            }
        }
    }

    #[cfg(feature = "text")]
    fn render_text(&self, pixmap: &mut Pixmap, text: &Text) {
        match &self.font {
            Some(font) => crate::text::draw_text(pixmap, font, text, self.scale),
            None => log::debug!("no font loaded, skipping text {}", text.id()),
        }
    }

    #[cfg(not(feature = "text"))]
    fn render_text(&self, _pixmap: &mut Pixmap, text: &Text) {
        log::debug!("text rendering disabled, skipping text {}", text.id());
    }
}

fn render_path(
    pixmap: &mut Pixmap,
    path: &tiny_skia::Path,
    style: &ShapeStyle,
    closed: bool,
    transform: Transform,
) {
    if closed {
        if let Some(fill) = style.fill_with_opacity() {
            pixmap.fill_path(path, &paint(fill), FillRule::EvenOdd, transform, None);
        }
    }
    if style.stroke_width > 0.0 {
        let stroke = Stroke {
            width: style.stroke_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(path, &paint(style.stroke_with_opacity()), &stroke, transform, None);
    }
}
