use crossbeam_channel::Sender;

use crate::format::FormatId;
use crate::job::{ConversionSettings, JobRecord, JobStatus, StoreError};

/// Final status of a task, or the store error that prevented recording it.
pub type TaskOutcome = Result<JobStatus, StoreError>;

/// One queued conversion. Carries the input bytes; the record itself stays
/// in the store.
pub struct ConversionTask {
    pub job_id: String,
    pub original_name: String,
    pub input: Vec<u8>,
    pub source: FormatId,
    pub target: FormatId,
    pub settings: ConversionSettings,
    /// Notified once the job is terminal.
    pub reply: Option<Sender<TaskOutcome>>,
}

impl ConversionTask {
    pub fn new(record: &JobRecord, input: Vec<u8>) -> Self {
        Self {
            job_id: record.id.clone(),
            original_name: record.original_name.clone(),
            input,
            source: record.source_format,
            target: record.target_format,
            settings: record.settings.clone(),
            reply: None,
        }
    }

    pub fn with_reply(mut self, reply: Sender<TaskOutcome>) -> Self {
        self.reply = Some(reply);
        self
    }
}

impl std::fmt::Debug for ConversionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionTask")
            .field("job_id", &self.job_id)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("input_len", &self.input.len())
            .finish()
    }
}
