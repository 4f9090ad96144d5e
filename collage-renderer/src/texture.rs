//! Preview image decoding.
//!
//! Decodes fetched preview bytes into RGBA texture data for the
//! export pipeline, and probes natural dimensions for media sizing.

use std::io::Cursor;

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Decoded preview pixels ready for embedding or display.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Original format of the image.
    pub format: TextureFormat,
}

/// Source formats the decoder recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl TextureFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        Self::Unknown
    }
}

/// Decode a fetched preview into RGBA texture data.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded as an image.
pub fn decode_preview(data: &[u8]) -> RenderResult<TextureData> {
    let format = TextureFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureData {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}

/// Probe the natural pixel dimensions of an encoded image without
/// decoding the pixel data.
///
/// # Errors
///
/// Returns an error if the header cannot be read.
pub fn probe_dimensions(data: &[u8]) -> RenderResult<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RenderError::Resource(format!("Failed to sniff image format: {e}")))?
        .into_dimensions()
        .map_err(|e| RenderError::Resource(format!("Failed to read image header: {e}")))
}

/// Encode a texture as a PNG data URI for SVG embedding.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn to_png_data_uri(texture: &TextureData) -> RenderResult<String> {
    let img =
        image::RgbaImage::from_raw(texture.width, texture.height, texture.data.clone())
            .ok_or_else(|| RenderError::Resource("Invalid texture data".to_string()))?;

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| RenderError::Resource(format!("PNG encoding failed: {e}")))?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
    Ok(format!("data:image/png;base64,{b64}"))
}

/// Create a solid color texture.
#[must_use]
pub fn create_solid_color(width: u32, height: u32, r: u8, g: u8, b: u8, a: u8) -> TextureData {
    let pixel_count = (width * height) as usize;
    let mut data = Vec::with_capacity(pixel_count * 4);
    for _ in 0..pixel_count {
        data.extend_from_slice(&[r, g, b, a]);
    }

    TextureData {
        width,
        height,
        data,
        format: TextureFormat::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 red pixel PNG.
    const TINY_PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn tiny_png() -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(TINY_PNG_B64)
            .expect("valid base64")
    }

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            TextureFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            TextureFormat::Png
        );
        assert_eq!(
            TextureFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            TextureFormat::Jpeg
        );
        assert_eq!(
            TextureFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            TextureFormat::WebP
        );
        assert_eq!(TextureFormat::from_magic_bytes(&[0, 1]), TextureFormat::Unknown);
    }

    #[test]
    fn test_decode_preview() {
        let texture = decode_preview(&tiny_png()).expect("decode");
        assert_eq!(texture.width, 1);
        assert_eq!(texture.height, 1);
        assert_eq!(texture.format, TextureFormat::Png);
        assert_eq!(&texture.data[0..3], &[255, 0, 0]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_preview(b"not an image").is_err());
    }

    #[test]
    fn test_probe_dimensions() {
        assert_eq!(probe_dimensions(&tiny_png()).expect("probe"), (1, 1));
        assert!(probe_dimensions(b"junk").is_err());
    }

    #[test]
    fn test_png_data_uri_round_trip() {
        let texture = create_solid_color(2, 3, 0, 128, 255, 255);
        let uri = to_png_data_uri(&texture).expect("encode");
        assert!(uri.starts_with("data:image/png;base64,"));

        let b64 = uri.trim_start_matches("data:image/png;base64,");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .expect("base64");
        let back = decode_preview(&bytes).expect("decode");
        assert_eq!((back.width, back.height), (2, 3));
        assert_eq!(&back.data[0..4], &[0, 128, 255, 255]);
    }

    #[test]
    fn test_create_solid_color() {
        let texture = create_solid_color(2, 2, 255, 0, 0, 255);
        assert_eq!(texture.data.len(), 16);
        assert_eq!(&texture.data[0..4], &[255, 0, 0, 255]);
    }
}
