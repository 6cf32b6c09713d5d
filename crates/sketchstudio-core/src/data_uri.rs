//! `data:` URI encoding for exported sketches.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Raster formats accepted for sketch images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageMime::Png),
            "image/jpeg" | "image/jpg" => Some(ImageMime::Jpeg),
            _ => None,
        }
    }

    fn magic(&self) -> &'static [u8] {
        match self {
            ImageMime::Png => PNG_MAGIC,
            ImageMime::Jpeg => JPEG_MAGIC,
        }
    }
}

/// Build `data:<mime>;base64,<payload>`.
pub fn encode(mime: ImageMime, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime.as_str(), STANDARD.encode(bytes))
}

/// Decode a base64 image data URI, checking that the payload carries the
/// signature of the declared format.
pub fn decode(uri: &str) -> Result<(ImageMime, Vec<u8>), String> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URI has no payload".to_string())?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| "data URI is not base64 encoded".to_string())?;
    let mime = ImageMime::from_mime(mime).ok_or_else(|| format!("unsupported media type {mime:?}"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 payload: {e}"))?;
    if !bytes.starts_with(mime.magic()) {
        return Err(format!("payload is not a {} image", mime.as_str()));
    }
    Ok((mime, bytes))
}
