use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info_span};

use crate::codec::{Codec, CodecError, ImageCodec};
use crate::config::Config;
use crate::format::{self, DimensionConstraint, FormatId};
use crate::job::ConversionSettings;
use crate::segmentation::{self, BackgroundRemover, SegmentationError};

use super::artifact::OutputArtifact;
use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::ConversionError;
use super::progress::{ConversionPhase, ProgressReporter};

/// Decode, optional background removal, dimension constraint, encode.
///
/// Holds no per-job state, so one instance is shared by every worker.
pub struct ConversionPipeline {
    config: PipelineConfig,
    codec: Arc<dyn Codec>,
    remover: Arc<dyn BackgroundRemover>,
}

impl ConversionPipeline {
    /// Production constructor: `image`-backed codec and the configured
    /// segmentation service.
    pub fn from_config(config: &Config) -> Result<Self, SegmentationError> {
        let pipeline_config = PipelineConfig::from_config(config);
        let codec = Arc::new(ImageCodec::new(pipeline_config.max_dimension));
        let remover = segmentation::from_config(&config.segmentation)?;
        Ok(Self::new(pipeline_config, codec, remover))
    }

    pub fn new(
        config: PipelineConfig,
        codec: Arc<dyn Codec>,
        remover: Arc<dyn BackgroundRemover>,
    ) -> Self {
        Self {
            config,
            codec,
            remover,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn convert(
        &self,
        input: &[u8],
        source: FormatId,
        target: FormatId,
        settings: &ConversionSettings,
        progress: &dyn ProgressReporter,
    ) -> Result<OutputArtifact, ConversionError> {
        let _pipeline_span = info_span!("pipeline",
            source = %source,
            target = %target,
            bytes = input.len(),
            remove_background = settings.remove_background,
        )
        .entered();

        if !format::is_decodable(source) {
            return self.pass_through(input, source, target, settings);
        }

        let mut ctx = PipelineContext::new(input, source, target, settings);

        {
            let _step = info_span!("decode").entered();
            progress.report(ConversionPhase::Decoding);
            self.step_decode(&mut ctx)?;
        }

        if settings.remove_background {
            let _step = info_span!("remove_background").entered();
            progress.report(ConversionPhase::RemovingBackground);
            self.step_remove_background(&mut ctx)?;
        }

        {
            let _step = info_span!("constrain").entered();
            progress.report(ConversionPhase::Constraining);
            self.step_constrain(&mut ctx)?;
        }

        let _step = info_span!("encode").entered();
        progress.report(ConversionPhase::Encoding);
        self.step_encode(ctx)
    }

    /// Vector and document inputs are never rasterized. They can only be
    /// returned unchanged, and only when nothing was asked of the pixels.
    fn pass_through(
        &self,
        input: &[u8],
        source: FormatId,
        target: FormatId,
        settings: &ConversionSettings,
    ) -> Result<OutputArtifact, ConversionError> {
        if source != target || settings.remove_background {
            return Err(ConversionError::UnsupportedConversion {
                from: source,
                to: target,
            });
        }

        debug!("Passing {} input through unchanged", source);
        Ok(OutputArtifact {
            format: target,
            mime_type: target.mime_type().to_string(),
            bytes: input.to_vec(),
            dimensions: None,
            degraded: false,
        })
    }

    fn step_decode(&self, ctx: &mut PipelineContext<'_>) -> Result<(), ConversionError> {
        let image = self
            .codec
            .decode(ctx.input, ctx.source)
            .map_err(|e| match e {
                CodecError::NoDecoder(_) => ConversionError::UnsupportedConversion {
                    from: ctx.source,
                    to: ctx.target,
                },
                other => ConversionError::DecodeFailed {
                    format: ctx.source,
                    reason: other.to_string(),
                },
            })?;

        debug!(
            width = image.width(),
            height = image.height(),
            "Decoded input"
        );
        ctx.image = Some(image);
        Ok(())
    }

    fn step_remove_background(&self, ctx: &mut PipelineContext<'_>) -> Result<(), ConversionError> {
        let image = take_image(ctx)?;
        let expected = image.dimensions();
        let cutout = segmentation::remove_with_deadline(
            Arc::clone(&self.remover),
            image.into_rgba8(),
            self.config.segmentation_timeout,
        )?;
        if cutout.dimensions() != expected {
            return Err(SegmentationError::InvalidResponse(format!(
                "cutout is {}x{}, input was {}x{}",
                cutout.width(),
                cutout.height(),
                expected.0,
                expected.1
            ))
            .into());
        }
        ctx.image = Some(DynamicImage::ImageRgba8(cutout));
        Ok(())
    }

    fn step_constrain(&self, ctx: &mut PipelineContext<'_>) -> Result<(), ConversionError> {
        let Some(constraint) = ctx.target.policy().constraint else {
            return Ok(());
        };

        let image = take_image(ctx)?;
        let (width, height) = image.dimensions();

        let constrained = match constraint.target_size(width, height) {
            None => image,
            Some((new_w, new_h)) => {
                debug!(width, height, new_w, new_h, "Resizing for {}", ctx.target);
                ctx.resized_from = Some((width, height));
                match constraint {
                    DimensionConstraint::Square(_) => {
                        image.resize_to_fill(new_w, new_h, FilterType::Lanczos3)
                    }
                    DimensionConstraint::FitWithin { .. } => {
                        image.resize_exact(new_w, new_h, FilterType::Lanczos3)
                    }
                }
            }
        };

        ctx.image = Some(constrained);
        Ok(())
    }

    fn step_encode(&self, mut ctx: PipelineContext<'_>) -> Result<OutputArtifact, ConversionError> {
        let image = take_image(&mut ctx)?;
        let target = ctx.target;

        let encoded = self
            .codec
            .encode(&image, target, ctx.settings.compression_level)
            .map_err(|e| ConversionError::EncodeFailed {
                format: target,
                reason: e.to_string(),
            })?;

        debug!(
            bytes = encoded.bytes.len(),
            degraded = encoded.degraded,
            resized_from = ?ctx.resized_from,
            "Encoded output"
        );

        Ok(OutputArtifact {
            format: target,
            mime_type: target.mime_type().to_string(),
            bytes: encoded.bytes,
            dimensions: Some((encoded.width, encoded.height)),
            degraded: encoded.degraded,
        })
    }
}

/// The decode step always runs first, so a missing image means a step was
/// skipped out of order.
fn take_image(ctx: &mut PipelineContext<'_>) -> Result<DynamicImage, ConversionError> {
    let source = ctx.source;
    ctx.image.take().ok_or_else(|| ConversionError::DecodeFailed {
        format: source,
        reason: "no decoded image available".to_string(),
    })
}
