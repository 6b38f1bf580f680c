use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info, info_span, warn};

use crate::error::ErrorKind;
use crate::events::{JobEvent, JobEventBroadcaster};
use crate::pipeline::{ConversionPhase, ConversionPipeline, ProgressReporter};
use crate::sanitize;
use crate::worker::ConversionTask;

use super::error::{StoreError, TransitionError};
use super::record::{JobFailure, JobRecord, Transition};
use super::store::JobStore;

/// Drives one job from `pending` to a terminal state.
///
/// Conversion failures end up on the record. A rejected store write is
/// turned into an `internal` failure when possible; the error is returned
/// only when the record could not be updated at all.
pub struct JobExecutor {
    store: Arc<dyn JobStore>,
    pipeline: Arc<ConversionPipeline>,
    events: JobEventBroadcaster,
}

impl JobExecutor {
    pub fn new(
        store: Arc<dyn JobStore>,
        pipeline: Arc<ConversionPipeline>,
        events: JobEventBroadcaster,
    ) -> Self {
        Self {
            store,
            pipeline,
            events,
        }
    }

    pub fn execute(&self, task: &ConversionTask) -> Result<JobRecord, StoreError> {
        let filename = sanitize::display_name(&task.original_name);
        let _job_span = info_span!("job",
            job_id = %task.job_id,
            filename = %filename,
        )
        .entered();

        let started = match self.store.apply(&task.job_id, Transition::Start) {
            Ok(record) => record,
            Err(e) => return self.fail_internal(&task.job_id, e, true),
        };
        self.events.send(JobEvent::from_record(&started));

        let progress = StoreProgress {
            store: self.store.as_ref(),
            events: &self.events,
            job_id: &task.job_id,
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pipeline.convert(
                &task.input,
                task.source,
                task.target,
                &task.settings,
                &progress,
            )
        }));

        let transition = match outcome {
            Ok(Ok(artifact)) => {
                info!(
                    bytes = artifact.len(),
                    mime = %artifact.mime_type,
                    degraded = artifact.degraded,
                    "Conversion completed"
                );
                Transition::Complete(artifact)
            }
            Ok(Err(e)) => {
                warn!(kind = %e.kind(), error = %e, "Conversion failed");
                Transition::Fail(JobFailure::from(&e))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(error = %message, "Conversion panicked");
                Transition::Fail(JobFailure::new(
                    ErrorKind::Internal,
                    format!("Conversion panicked: {}", message),
                ))
            }
        };

        let finished = match self.store.apply(&task.job_id, transition) {
            Ok(record) => record,
            Err(e) => return self.fail_internal(&task.job_id, e, false),
        };
        self.events.send(JobEvent::from_record(&finished));
        Ok(finished)
    }

    /// Best effort after the store rejected a write: leave the job `failed`
    /// with an internal error rather than stranded. Returns `cause` when
    /// the record is gone, already terminal, or cannot be updated either.
    fn fail_internal(
        &self,
        job_id: &str,
        cause: StoreError,
        start_first: bool,
    ) -> Result<JobRecord, StoreError> {
        if matches!(
            cause,
            StoreError::NotFound(_) | StoreError::Transition(TransitionError::Terminal { .. })
        ) {
            return Err(cause);
        }
        error!(error = %cause, "Store rejected job update, marking job failed");

        if start_first {
            if let Err(e) = self.store.apply(job_id, Transition::Start) {
                error!(error = %e, "Could not start job to record its failure");
                return Err(cause);
            }
        }

        let failure = JobFailure::new(
            ErrorKind::Internal,
            format!("Failed to record job state: {}", cause),
        );
        match self.store.apply(job_id, Transition::Fail(failure)) {
            Ok(record) => {
                self.events.send(JobEvent::from_record(&record));
                Ok(record)
            }
            Err(e) => {
                error!(error = %e, "Could not mark job failed");
                Err(cause)
            }
        }
    }
}

/// Records phase progress on the job as the pipeline advances.
struct StoreProgress<'a> {
    store: &'a dyn JobStore,
    events: &'a JobEventBroadcaster,
    job_id: &'a str,
}

impl ProgressReporter for StoreProgress<'_> {
    fn report(&self, phase: ConversionPhase) {
        tracing::debug!(%phase, "Phase started");
        match self.store.apply(self.job_id, Transition::Progress(phase.percent())) {
            Ok(record) => self.events.send(JobEvent::from_record(&record)),
            Err(e) => log::warn!("Failed to record progress for job {}: {}", self.job_id, e),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
