use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorKind, ValidationError};
use crate::format::FormatId;
use crate::pipeline::{ConversionError, OutputArtifact};

use super::error::TransitionError;

/// Default compression level when the caller gives none.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSettings {
    /// 0-100. Interpreted per target format.
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,
    #[serde(default)]
    pub remove_background: bool,
}

fn default_compression_level() -> u8 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            remove_background: false,
        }
    }
}

impl ConversionSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.compression_level > 100 {
            return Err(ValidationError::InvalidSettings(format!(
                "compressionLevel must be between 0 and 100, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ConversionError> for JobFailure {
    fn from(err: &ConversionError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// A state change requested of the store.
#[derive(Debug, Clone)]
pub enum Transition {
    Start,
    Progress(u8),
    Complete(OutputArtifact),
    Fail(JobFailure),
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Progress(_) => "progress",
            Transition::Complete(_) => "complete",
            Transition::Fail(_) => "fail",
        }
    }
}

/// Persisted state of one conversion.
///
/// Mutated only through [`JobRecord::apply`], which enforces
/// `pending -> processing -> completed | failed`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: String,
    pub original_name: String,
    pub source_format: FormatId,
    pub target_format: FormatId,
    pub status: JobStatus,
    pub progress: u8,
    /// Set exactly when `status` is `Completed`.
    pub result: Option<OutputArtifact>,
    /// Set exactly when `status` is `Failed`.
    pub error: Option<JobFailure>,
    pub settings: ConversionSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(
        original_name: impl Into<String>,
        source_format: FormatId,
        target_format: FormatId,
        settings: ConversionSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            original_name: original_name.into(),
            source_format,
            target_format,
            status: JobStatus::Pending,
            progress: 0,
            result: None,
            error: None,
            settings,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn apply(&mut self, transition: Transition) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal {
                id: self.id.clone(),
                status: self.status,
            });
        }

        let now = Utc::now();
        match (self.status, transition) {
            (JobStatus::Pending, Transition::Start) => {
                self.status = JobStatus::Processing;
            }
            (JobStatus::Processing, Transition::Progress(percent)) => {
                // Only a completed job reports 100.
                self.progress = self.progress.max(percent.min(99));
            }
            (JobStatus::Processing, Transition::Complete(artifact)) => {
                self.status = JobStatus::Completed;
                self.progress = 100;
                self.result = Some(artifact);
                self.completed_at = Some(now);
            }
            (JobStatus::Processing, Transition::Fail(failure)) => {
                self.status = JobStatus::Failed;
                self.error = Some(failure);
                self.completed_at = Some(now);
            }
            (status, other) => {
                return Err(TransitionError::Invalid {
                    id: self.id.clone(),
                    status,
                    transition: other.name(),
                });
            }
        }
        self.updated_at = now;
        Ok(())
    }
}
