//! Decode/encode capability.
//!
//! Pixel work is delegated to the `image` crate. SVG and PDF targets have no
//! true encoder here: the raster is embedded in a minimal container of the
//! requested type and the result is flagged as degraded.

pub mod pdf;
pub mod raster;
pub mod svg;

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageReader, Limits};
use thiserror::Error;

use crate::format::{ArtifactKind, FormatId};

/// Default bound on decoded width and height.
pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("No decoder for {0}")]
    NoDecoder(FormatId),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode {format}: {reason}")]
    Encode { format: FormatId, reason: String },
}

/// Bytes produced by an encoder.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// True when the target was satisfied by a raster substitute.
    pub degraded: bool,
}

pub trait Codec: Send + Sync {
    fn decode(&self, input: &[u8], declared: FormatId) -> Result<DynamicImage, CodecError>;
    fn encode(
        &self,
        image: &DynamicImage,
        target: FormatId,
        quality: u8,
    ) -> Result<Encoded, CodecError>;
}

/// Production codec backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    max_dimension: u32,
}

impl ImageCodec {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl Codec for ImageCodec {
    fn decode(&self, input: &[u8], declared: FormatId) -> Result<DynamicImage, CodecError> {
        let declared_format = declared
            .image_format()
            .ok_or(CodecError::NoDecoder(declared))?;

        // Trust the content over the declared type; uploads are often mislabeled.
        let mut reader = ImageReader::new(Cursor::new(input))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            reader.set_format(declared_format);
        }

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        reader.limits(limits);

        reader
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        target: FormatId,
        quality: u8,
    ) -> Result<Encoded, CodecError> {
        let (width, height) = image.dimensions();

        match target.policy().artifact {
            ArtifactKind::Raster => Ok(Encoded {
                bytes: raster::encode(image, target, quality)?,
                width,
                height,
                degraded: false,
            }),
            ArtifactKind::Vector => {
                let png = raster::encode(image, FormatId::Png, quality)?;
                Ok(Encoded {
                    bytes: svg::embed_raster(&png, width, height),
                    width,
                    height,
                    degraded: true,
                })
            }
            ArtifactKind::Document => {
                let jpeg = raster::encode(image, FormatId::Jpeg, quality)?;
                let bytes = pdf::embed_jpeg_page(&jpeg, width, height).map_err(|reason| {
                    CodecError::Encode {
                        format: target,
                        reason,
                    }
                })?;
                Ok(Encoded {
                    bytes,
                    width,
                    height,
                    degraded: true,
                })
            }
        }
    }
}
