use image::DynamicImage;

use crate::format::FormatId;
use crate::job::ConversionSettings;

/// Working state threaded through the conversion steps.
pub struct PipelineContext<'a> {
    // Input
    pub input: &'a [u8],
    pub source: FormatId,
    pub target: FormatId,
    pub settings: &'a ConversionSettings,

    // Set by decode; replaced by background removal and constraint.
    pub image: Option<DynamicImage>,

    // Dimensions before the constraint step resized the image.
    pub resized_from: Option<(u32, u32)>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        input: &'a [u8],
        source: FormatId,
        target: FormatId,
        settings: &'a ConversionSettings,
    ) -> Self {
        Self {
            input,
            source,
            target,
            settings,
            image: None,
            resized_from: None,
        }
    }
}
