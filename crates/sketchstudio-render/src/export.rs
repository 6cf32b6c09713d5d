//! Encoding rasterized scenes for download or upload.

use crate::{Rasterizer, RenderError, RenderResult};
use image::codecs::jpeg::JpegEncoder;
use sketchstudio_core::data_uri::{self, ImageMime};
use sketchstudio_core::scene::SceneDocument;
use sketchstudio_core::sketchpad::Sketchpad;
use sketchstudio_core::surface::DrawingSurface;
use std::path::Path;
use tiny_skia::Pixmap;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    /// Quality 1-100. JPEG has no alpha; transparent pixels land on white.
    Jpeg { quality: u8 },
}

impl ImageFormat {
    pub fn mime(&self) -> ImageMime {
        match self {
            ImageFormat::Png => ImageMime::Png,
            ImageFormat::Jpeg { .. } => ImageMime::Jpeg,
        }
    }

    /// Pick a format from a file extension (`png`, `jpg`, `jpeg`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            }),
            _ => None,
        }
    }
}

/// Encode a pixmap.
pub fn encode(pixmap: &Pixmap, format: ImageFormat) -> RenderResult<Vec<u8>> {
    match format {
        ImageFormat::Png => pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string())),
        ImageFormat::Jpeg { quality } => encode_jpeg(pixmap, quality),
    }
}

fn encode_jpeg(pixmap: &Pixmap, quality: u8) -> RenderResult<Vec<u8>> {
    let mut rgb = image::RgbImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in rgb.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        let a = c.alpha() as u16;
        let over_white = |v: u8| ((v as u16 * a + 255 * (255 - a)) / 255) as u8;
        *dst = image::Rgb([over_white(c.red()), over_white(c.green()), over_white(c.blue())]);
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(out)
}

/// Anything that can be rasterized and exported as an image.
pub trait SurfaceExport {
    /// Snapshot of what to draw.
    fn scene_document(&self) -> SceneDocument;

    fn export_image(&self, rasterizer: &Rasterizer, format: ImageFormat) -> RenderResult<Vec<u8>> {
        let pixmap = rasterizer.render(&self.scene_document())?;
        encode(&pixmap, format)
    }

    /// Flatten at canvas resolution with the default rasterizer. Does not
    /// touch the scene.
    fn rasterize(&self, format: ImageFormat) -> RenderResult<Vec<u8>> {
        self.export_image(&Rasterizer::new(), format)
    }

    /// `data:image/png;base64,...` for upload to the generation endpoint.
    fn to_data_uri(&self, rasterizer: &Rasterizer) -> RenderResult<String> {
        let format = ImageFormat::Png;
        let bytes = self.export_image(rasterizer, format)?;
        Ok(data_uri::encode(format.mime(), &bytes))
    }

    /// Write the image to `path`, picking the format from its extension.
    fn export_to_file(&self, rasterizer: &Rasterizer, path: &Path) -> RenderResult<()> {
        let format = ImageFormat::from_path(path)
            .ok_or_else(|| RenderError::UnsupportedFormat(path.display().to_string()))?;
        let bytes = self.export_image(rasterizer, format)?;
        std::fs::write(path, bytes)?;
        log::info!("exported {}", path.display());
        Ok(())
    }
}

impl SurfaceExport for SceneDocument {
    fn scene_document(&self) -> SceneDocument {
        self.clone()
    }
}

impl SurfaceExport for DrawingSurface {
    fn scene_document(&self) -> SceneDocument {
        self.serialize()
    }
}

impl SurfaceExport for Sketchpad {
    fn scene_document(&self) -> SceneDocument {
        self.serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use sketchstudio_core::tools::ToolKind;
    use std::time::Instant;

    fn sketched() -> Sketchpad {
        let mut pad = Sketchpad::new().unwrap();
        pad.set_tool(ToolKind::Rectangle);
        pad.pointer_down_at(Point::new(10.0, 10.0), Instant::now());
        pad.pointer_move(Point::new(100.0, 100.0));
        pad.pointer_up(Point::new(100.0, 100.0));
        pad
    }

    #[test]
    fn test_png_data_uri() {
        let uri = sketched().to_data_uri(&Rasterizer::new()).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, _) = data_uri::decode(&uri).unwrap();
        assert_eq!(mime, ImageMime::Png);
    }

    #[test]
    fn test_rasterize_leaves_scene_untouched() {
        let pad = sketched();
        let before = pad.surface().revision();
        let png = pad.surface().rasterize(ImageFormat::Png).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(pad.surface().revision(), before);
        assert_eq!(pad.history().undo_len(), 2);
    }

    #[test]
    fn test_jpeg_export() {
        let bytes = sketched()
            .export_image(&Rasterizer::new(), ImageFormat::Jpeg { quality: 80 })
            .unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sketch.png");
        let doc = SceneDocument::empty(64, 48);
        doc.export_to_file(&Rasterizer::new(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let pixmap = Pixmap::decode_png(&bytes).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (64, 48));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let result = SceneDocument::empty(10, 10).export_to_file(&Rasterizer::new(), &dir.path().join("x.gif"));
        assert!(matches!(result, Err(RenderError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ImageFormat::from_path(Path::new("a.PNG")), Some(ImageFormat::Png));
        assert!(matches!(
            ImageFormat::from_path(Path::new("a.jpeg")),
            Some(ImageFormat::Jpeg { .. })
        ));
        assert_eq!(ImageFormat::from_path(Path::new("a")), None);
    }
}
