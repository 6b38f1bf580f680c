use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use super::CodecError;
use crate::format::FormatId;

/// Encodes `image` as a raster format. `quality` is the 0-100 compression
/// level; codecs without a quality control ignore it.
pub fn encode(image: &DynamicImage, target: FormatId, quality: u8) -> Result<Vec<u8>, CodecError> {
    let err = |e: image::ImageError| CodecError::Encode {
        format: target,
        reason: e.to_string(),
    };

    let mut buf = Cursor::new(Vec::new());

    match target {
        FormatId::Jpeg | FormatId::Jpg => {
            let rgb = DynamicImage::ImageRgb8(flatten_onto_white(image));
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder).map_err(err)?;
        }
        FormatId::Png => {
            let compression = if quality == 100 {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            let encoder = PngEncoder::new_with_quality(&mut buf, compression, FilterType::Adaptive);
            // PNG has no floating point sample type.
            let narrowed;
            let source = match image {
                DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                    narrowed = DynamicImage::ImageRgba16(image.to_rgba16());
                    &narrowed
                }
                _ => image,
            };
            source.write_with_encoder(encoder).map_err(err)?;
        }
        FormatId::Webp => {
            let rgba = image.to_rgba8();
            if quality == 100 {
                DynamicImage::ImageRgba8(rgba)
                    .write_with_encoder(WebPEncoder::new_lossless(&mut buf))
                    .map_err(err)?;
            } else {
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode_simple(false, quality as f32)
                    .map_err(|e| CodecError::Encode {
                        format: target,
                        reason: format!("libwebp: {:?}", e),
                    })?;
                return Ok(encoded.to_vec());
            }
        }
        FormatId::Gif | FormatId::Bmp | FormatId::Tiff | FormatId::Ico => {
            let format = target.image_format().ok_or(CodecError::Encode {
                format: target,
                reason: "no raster encoder".to_string(),
            })?;
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_to(&mut buf, format).map_err(err)?;
        }
        FormatId::Svg | FormatId::Pdf => {
            return Err(CodecError::Encode {
                format: target,
                reason: "not a raster format".to_string(),
            });
        }
    }

    Ok(buf.into_inner())
}

/// Composites any alpha channel over white.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
