use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixconvError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] crate::pipeline::ConversionError),

    #[error("Job error: {0}")]
    Job(#[from] crate::job::JobError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Segmentation error: {0}")]
    Segmentation(#[from] crate::segmentation::SegmentationError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Request problems detected before a job record exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unrecognized input format: {0}")]
    UnrecognizedFormat(String),

    #[error("Unsupported target format: {0}")]
    UnsupportedTargetFormat(String),

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid conversion settings: {0}")]
    InvalidSettings(String),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::UnrecognizedFormat(_) => ErrorKind::UnrecognizedFormat,
            ValidationError::UnsupportedTargetFormat(_) => ErrorKind::UnsupportedTargetFormat,
            ValidationError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            ValidationError::InvalidSettings(_) => ErrorKind::InvalidSettings,
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Job {0} was abandoned by its worker")]
    JobAbandoned(String),
}

/// Stable, machine-readable failure categories.
///
/// Every failure a caller can observe maps to exactly one kind, either as the
/// error returned from a call or as the `kind` recorded on a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnrecognizedFormat,
    UnsupportedTargetFormat,
    DecodeFailed,
    BackgroundRemovalFailed,
    UnsupportedConversion,
    EncodeFailed,
    JobNotFound,
    PayloadTooLarge,
    InvalidSettings,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnrecognizedFormat => "unrecognized_format",
            ErrorKind::UnsupportedTargetFormat => "unsupported_target_format",
            ErrorKind::DecodeFailed => "decode_failed",
            ErrorKind::BackgroundRemovalFailed => "background_removal_failed",
            ErrorKind::UnsupportedConversion => "unsupported_conversion",
            ErrorKind::EncodeFailed => "encode_failed",
            ErrorKind::JobNotFound => "job_not_found",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::InvalidSettings => "invalid_settings",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unrecognized_format" => Some(ErrorKind::UnrecognizedFormat),
            "unsupported_target_format" => Some(ErrorKind::UnsupportedTargetFormat),
            "decode_failed" => Some(ErrorKind::DecodeFailed),
            "background_removal_failed" => Some(ErrorKind::BackgroundRemovalFailed),
            "unsupported_conversion" => Some(ErrorKind::UnsupportedConversion),
            "encode_failed" => Some(ErrorKind::EncodeFailed),
            "job_not_found" => Some(ErrorKind::JobNotFound),
            "payload_too_large" => Some(ErrorKind::PayloadTooLarge),
            "invalid_settings" => Some(ErrorKind::InvalidSettings),
            "internal" => Some(ErrorKind::Internal),
            _ => None,
        }
    }

    /// Whether resubmitting the same input may succeed.
    ///
    /// Segmentation failures depend on an external service and internal
    /// faults are not caused by the input. Every other kind needs the caller
    /// to change the input or the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::BackgroundRemovalFailed | ErrorKind::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, PixconvError>;
