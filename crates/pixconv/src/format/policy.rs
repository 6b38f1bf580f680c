use super::FormatId;

/// Icon outputs are always this many pixels square.
pub const ICON_SIZE: u32 = 256;

/// A4 at 300 DPI, in pixels.
pub const PAGE_WIDTH_PX: u32 = 2480;
pub const PAGE_HEIGHT_PX: u32 = 3508;

/// How the 0–100 compression level maps onto the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    /// Passed straight through as the codec's quality.
    Lossy,
    /// Always lossless; maximum effort only at exactly 100.
    LosslessMaxEffortAt100,
    /// Lossy at the given quality; lossless only at exactly 100.
    LossyLosslessAt100,
    /// The codec has no quality control.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionConstraint {
    /// Exact square, filled and center-cropped.
    Square(u32),
    /// Fit inside the box preserving aspect ratio, never upscaling.
    FitWithin { width: u32, height: u32 },
}

impl DimensionConstraint {
    /// Target size for an image of `width` x `height`, or `None` when the
    /// image already satisfies the constraint.
    pub fn target_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        match *self {
            DimensionConstraint::Square(size) => {
                if width == size && height == size {
                    None
                } else {
                    Some((size, size))
                }
            }
            DimensionConstraint::FitWithin {
                width: max_w,
                height: max_h,
            } => {
                if width <= max_w && height <= max_h {
                    return None;
                }
                let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
                let new_w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
                let new_h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
                Some((new_w, new_h))
            }
        }
    }
}

/// What kind of artifact a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Raster,
    /// Vector target; raster input is embedded rather than traced.
    Vector,
    /// Paged document target; the image becomes a single page.
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodePolicy {
    pub quality: QualityMode,
    pub constraint: Option<DimensionConstraint>,
    pub artifact: ArtifactKind,
}

impl EncodePolicy {
    pub fn for_format(format: FormatId) -> Self {
        match format {
            FormatId::Jpeg | FormatId::Jpg => Self::raster(QualityMode::Lossy),
            FormatId::Png => Self::raster(QualityMode::LosslessMaxEffortAt100),
            FormatId::Webp => Self::raster(QualityMode::LossyLosslessAt100),
            FormatId::Gif | FormatId::Bmp | FormatId::Tiff => Self::raster(QualityMode::Ignored),
            FormatId::Ico => Self {
                quality: QualityMode::Ignored,
                constraint: Some(DimensionConstraint::Square(ICON_SIZE)),
                artifact: ArtifactKind::Raster,
            },
            FormatId::Svg => Self {
                quality: QualityMode::LosslessMaxEffortAt100,
                constraint: None,
                artifact: ArtifactKind::Vector,
            },
            FormatId::Pdf => Self {
                quality: QualityMode::Lossy,
                constraint: Some(DimensionConstraint::FitWithin {
                    width: PAGE_WIDTH_PX,
                    height: PAGE_HEIGHT_PX,
                }),
                artifact: ArtifactKind::Document,
            },
        }
    }

    fn raster(quality: QualityMode) -> Self {
        Self {
            quality,
            constraint: None,
            artifact: ArtifactKind::Raster,
        }
    }
}
