//! Format registry: accepted input MIME types, output format identifiers and
//! their encode policies.
//!
//! The set is closed and fixed at compile time. Lookups are pure.

pub mod policy;

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use policy::{ArtifactKind, DimensionConstraint, EncodePolicy, QualityMode};

/// Canonical format identifier, used both for inputs and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatId {
    Jpeg,
    Jpg,
    Png,
    Gif,
    Bmp,
    Webp,
    Svg,
    Ico,
    Tiff,
    Pdf,
}

impl FormatId {
    /// Every output format the registry accepts.
    pub const ALL: [FormatId; 10] = [
        FormatId::Jpeg,
        FormatId::Jpg,
        FormatId::Png,
        FormatId::Gif,
        FormatId::Bmp,
        FormatId::Webp,
        FormatId::Svg,
        FormatId::Ico,
        FormatId::Tiff,
        FormatId::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatId::Jpeg => "jpeg",
            FormatId::Jpg => "jpg",
            FormatId::Png => "png",
            FormatId::Gif => "gif",
            FormatId::Bmp => "bmp",
            FormatId::Webp => "webp",
            FormatId::Svg => "svg",
            FormatId::Ico => "ico",
            FormatId::Tiff => "tiff",
            FormatId::Pdf => "pdf",
        }
    }

    /// Parses an identifier case-insensitively. Returns `None` for anything
    /// outside the registry.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" => Some(FormatId::Jpeg),
            "jpg" => Some(FormatId::Jpg),
            "png" => Some(FormatId::Png),
            "gif" => Some(FormatId::Gif),
            "bmp" => Some(FormatId::Bmp),
            "webp" => Some(FormatId::Webp),
            "svg" => Some(FormatId::Svg),
            "ico" => Some(FormatId::Ico),
            "tiff" => Some(FormatId::Tiff),
            "pdf" => Some(FormatId::Pdf),
            _ => None,
        }
    }

    /// MIME type used to tag artifacts of this format.
    pub fn mime_type(&self) -> &'static str {
        mime_for_format(*self)
    }

    pub fn policy(&self) -> EncodePolicy {
        EncodePolicy::for_format(*self)
    }

    /// The `image` crate codec able to rasterize this format, if any.
    pub fn image_format(&self) -> Option<ImageFormat> {
        match self {
            FormatId::Jpeg | FormatId::Jpg => Some(ImageFormat::Jpeg),
            FormatId::Png => Some(ImageFormat::Png),
            FormatId::Gif => Some(ImageFormat::Gif),
            FormatId::Bmp => Some(ImageFormat::Bmp),
            FormatId::Webp => Some(ImageFormat::WebP),
            FormatId::Tiff => Some(ImageFormat::Tiff),
            FormatId::Ico => Some(ImageFormat::Ico),
            FormatId::Svg | FormatId::Pdf => None,
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatId::parse(s).ok_or_else(|| ValidationError::UnsupportedTargetFormat(s.to_string()))
    }
}

/// Input MIME types accepted for upload.
pub const INPUT_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
    "image/svg+xml",
    "image/x-icon",
    "application/pdf",
];

/// Lowercases a MIME type and strips any parameters (`; charset=...`).
fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_supported_input(mime: &str) -> bool {
    let mime = normalize_mime(mime);
    INPUT_MIME_TYPES.contains(&mime.as_str())
}

pub fn is_supported_output(format_id: &str) -> bool {
    FormatId::parse(format_id).is_some()
}

/// Maps an accepted input MIME type to its canonical format identifier.
///
/// `image/svg+xml` and `image/x-icon` are special-cased; every other type
/// maps to its MIME subtype.
pub fn canonical_format(mime: &str) -> Result<FormatId, ValidationError> {
    let normalized = normalize_mime(mime);
    if !INPUT_MIME_TYPES.contains(&normalized.as_str()) {
        return Err(ValidationError::UnrecognizedFormat(mime.to_string()));
    }

    let format = match normalized.as_str() {
        "image/svg+xml" => Some(FormatId::Svg),
        "image/x-icon" => Some(FormatId::Ico),
        other => other.split('/').nth(1).and_then(FormatId::parse),
    };

    format.ok_or_else(|| ValidationError::UnrecognizedFormat(mime.to_string()))
}

/// Inverse of [`canonical_format`].
pub fn mime_for_format(format: FormatId) -> &'static str {
    match format {
        FormatId::Svg => "image/svg+xml",
        FormatId::Ico => "image/x-icon",
        FormatId::Pdf => "application/pdf",
        FormatId::Jpeg => "image/jpeg",
        FormatId::Jpg => "image/jpg",
        FormatId::Png => "image/png",
        FormatId::Gif => "image/gif",
        FormatId::Bmp => "image/bmp",
        FormatId::Webp => "image/webp",
        FormatId::Tiff => "image/tiff",
    }
}

/// Whether the codec can turn this format into pixels.
pub fn is_decodable(format: FormatId) -> bool {
    format.image_format().is_some()
}

/// Whether `target` is reachable from `source`.
///
/// Raster sources reach every target. Vector and document sources cannot be
/// rasterized, so they only pass through to their own format.
pub fn is_convertible(source: FormatId, target: FormatId) -> bool {
    is_decodable(source) || source == target
}
