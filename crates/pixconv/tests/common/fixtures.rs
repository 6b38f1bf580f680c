//! Fixture images built in memory.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use pixconv::FormatId;

/// Input formats the codec can rasterize, with the MIME type a client would
/// declare for them.
pub const RASTER_INPUTS: &[(FormatId, &str)] = &[
    (FormatId::Jpeg, "image/jpeg"),
    (FormatId::Png, "image/png"),
    (FormatId::Gif, "image/gif"),
    (FormatId::Bmp, "image/bmp"),
    (FormatId::Webp, "image/webp"),
    (FormatId::Tiff, "image/tiff"),
    (FormatId::Ico, "image/x-icon"),
];

/// Smooth gradient with a semi-transparent lower half.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) % 256) as u8;
        let a = if y < height / 2 { 255 } else { 200 };
        Rgba([r, g, b, a])
    })
}

/// High-frequency pattern. JPEG output size depends strongly on quality.
pub fn noise(width: u32, height: u32) -> RgbaImage {
    let mut state: u32 = 0x2545_f491;
    RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgba([r, g, b, 255])
    })
}

/// Encodes `image` as `format` with the `image` crate's default settings.
pub fn encode(image: &RgbaImage, format: FormatId) -> Vec<u8> {
    let image_format = format
        .image_format()
        .unwrap_or_else(|| panic!("{} is not a raster fixture format", format));

    let dynamic = match image_format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image.clone()).to_rgb8()),
        _ => DynamicImage::ImageRgba8(image.clone()),
    };

    let mut buf = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut buf, image_format)
        .unwrap_or_else(|e| panic!("failed to encode {} fixture: {}", format, e));
    buf.into_inner()
}

/// A 24x16 gradient in `format`.
pub fn fixture(format: FormatId) -> Vec<u8> {
    encode(&gradient(24, 16), format)
}

/// First 16 bytes of a JPEG: a valid signature with nothing decodable after.
pub fn truncated_jpeg() -> Vec<u8> {
    let mut bytes = fixture(FormatId::Jpeg);
    bytes.truncate(16);
    bytes
}

pub const MINIMAL_SVG: &[u8] =
    br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="red"/></svg>"#;

pub fn decode(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).expect("artifact should decode")
}
