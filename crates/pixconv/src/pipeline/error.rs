use thiserror::Error;

use crate::error::ErrorKind;
use crate::format::FormatId;
use crate::segmentation::SegmentationError;

/// Failure of one conversion step. Each step has its own variant.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to decode {format} input: {reason}")]
    DecodeFailed { format: FormatId, reason: String },

    #[error("Background removal failed: {0}")]
    BackgroundRemovalFailed(#[from] SegmentationError),

    #[error("Cannot convert {from} to {to}")]
    UnsupportedConversion { from: FormatId, to: FormatId },

    #[error("Failed to encode {format}: {reason}")]
    EncodeFailed { format: FormatId, reason: String },
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            ConversionError::BackgroundRemovalFailed(_) => ErrorKind::BackgroundRemovalFailed,
            ConversionError::UnsupportedConversion { .. } => ErrorKind::UnsupportedConversion,
            ConversionError::EncodeFailed { .. } => ErrorKind::EncodeFailed,
        }
    }
}
