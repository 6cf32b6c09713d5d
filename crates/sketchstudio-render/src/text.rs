//! Glyph rasterization for text shapes.

use ab_glyph::{Font, FontArc, OutlinedGlyph, PxScale, ScaleFont, point};
use sketchstudio_core::color::Color;
use sketchstudio_core::shapes::Text;
use tiny_skia::{ColorU8, Pixmap, PixmapPaint, Transform};

/// Lay out `text` line by line from its top-left corner and paint each
/// glyph's coverage in the text color.
pub(crate) fn draw_text(pixmap: &mut Pixmap, font: &FontArc, text: &Text, scale: f32) {
    let px = text.font_size as f32 * scale;
    let scaled = font.as_scaled(PxScale::from(px));
    let color = text.color().with_opacity(text.style.opacity);
    let line_height = text.line_height() as f32 * scale;
    let left = text.position.x as f32 * scale;
    let mut baseline = text.position.y as f32 * scale + scaled.ascent();

    for line in text.content.lines() {
        let mut caret = left;
        let mut previous = None;
        for ch in line.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(px, point(caret, baseline));
            caret += scaled.h_advance(id);
            previous = Some(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                blit_glyph(pixmap, &outlined, color);
            }
        }
        baseline += line_height;
    }
}

fn blit_glyph(pixmap: &mut Pixmap, glyph: &OutlinedGlyph, color: Color) {
    let bounds = glyph.px_bounds();
    let width = bounds.width().ceil() as u32;
    let height = bounds.height().ceil() as u32;
    let Some(mut coverage) = Pixmap::new(width, height) else {
        return;
    };

    let pixels = coverage.pixels_mut();
    glyph.draw(|x, y, c| {
        if let Some(px) = pixels.get_mut((y * width + x) as usize) {
            let alpha = (c.clamp(0.0, 1.0) * color.a as f32).round() as u8;
            *px = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
        }
    });

    pixmap.draw_pixmap(
        bounds.min.x as i32,
        bounds.min.y as i32,
        coverage.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}
