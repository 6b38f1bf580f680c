use std::sync::Arc;

use crossbeam_channel::bounded;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::schema::DEFAULT_MAX_UPLOAD_BYTES;
use crate::config::Config;
use crate::db::Database;
use crate::error::{PixconvError, ValidationError, WorkerError};
use crate::events::{JobEvent, JobEventBroadcaster};
use crate::format::{self, FormatId};
use crate::pipeline::ConversionPipeline;
use crate::sanitize;
use crate::worker::{ConversionTask, TaskOutcome, WorkerPool};

use super::error::JobError;
use super::executor::JobExecutor;
use super::record::{ConversionSettings, JobRecord};
use super::sqlite_store::SqliteJobStore;
use super::store::{JobQuery, JobStore};

/// An upload to convert.
#[derive(Clone)]
pub struct ConversionRequest {
    pub original_name: String,
    /// Declared MIME type of `data`.
    pub mime_type: String,
    /// Requested output format identifier, e.g. `"webp"`.
    pub target_format: String,
    pub data: Vec<u8>,
    pub settings: ConversionSettings,
}

impl std::fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("original_name", &self.original_name)
            .field("mime_type", &self.mime_type)
            .field("target_format", &self.target_format)
            .field("data_len", &self.data.len())
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub worker_count: usize,
    pub max_upload_bytes: usize,
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            worker_count: config.worker_count,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Entry point for conversions: validates requests, creates job records and
/// hands the work to the worker pool.
pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    events: JobEventBroadcaster,
    pool: Option<WorkerPool>,
    max_upload_bytes: usize,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        pipeline: ConversionPipeline,
        options: OrchestratorOptions,
    ) -> Result<Self, WorkerError> {
        let events = JobEventBroadcaster::default();
        let executor = Arc::new(JobExecutor::new(
            Arc::clone(&store),
            Arc::new(pipeline),
            events.clone(),
        ));
        let pool = WorkerPool::new(executor, options.worker_count)?;

        Ok(Self {
            store,
            events,
            pool: Some(pool),
            max_upload_bytes: options.max_upload_bytes,
        })
    }

    /// Production wiring: SQLite store at the configured path, `image`
    /// codecs and the configured segmentation service.
    pub fn from_config(config: &Config) -> Result<Self, PixconvError> {
        let db = Database::open(&config.database_path())?;
        let store = Arc::new(SqliteJobStore::new(db));
        let pipeline = ConversionPipeline::from_config(config)?;
        Ok(Self::new(
            store,
            pipeline,
            OrchestratorOptions::from_config(config),
        )?)
    }

    /// Validates, records and runs a conversion, returning once the job is
    /// terminal.
    ///
    /// Conversion failures do not make this return `Err`; they are recorded
    /// on the job. Read it back with [`get`](Self::get).
    pub fn submit(&self, request: ConversionRequest) -> Result<String, JobError> {
        let (reply_tx, reply_rx) = bounded::<TaskOutcome>(1);
        let id = self.dispatch(request, |task| task.with_reply(reply_tx))?;

        match reply_rx.recv() {
            Ok(Ok(status)) => {
                debug!(job_id = %id, %status, "Job finished");
                Ok(id)
            }
            Ok(Err(e)) => Err(JobError::Store(e)),
            Err(_) => Err(WorkerError::JobAbandoned(id).into()),
        }
    }

    /// Like [`submit`](Self::submit) but returns as soon as the job is
    /// queued. Completion is announced on [`subscribe`](Self::subscribe).
    pub fn enqueue(&self, request: ConversionRequest) -> Result<String, JobError> {
        self.dispatch(request, |task| task)
    }

    pub fn get(&self, id: &str) -> Result<JobRecord, JobError> {
        self.store
            .get(id)?
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    pub fn list(&self, query: &JobQuery) -> Result<Vec<JobRecord>, JobError> {
        Ok(self.store.list(query)?)
    }

    /// Administrative removal of a record.
    pub fn delete(&self, id: &str) -> Result<(), JobError> {
        if self.store.delete(id)? {
            info!(job_id = %id, "Job deleted");
            Ok(())
        } else {
            Err(JobError::NotFound(id.to_string()))
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Stops accepting work, finishes queued jobs and joins the workers.
    pub fn shutdown(mut self) {
        self.stop_pool();
    }

    fn stop_pool(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
            pool.wait();
        }
    }

    fn validate(&self, request: &ConversionRequest) -> Result<(FormatId, FormatId), ValidationError> {
        let source = format::canonical_format(&request.mime_type)?;

        let target = request.target_format.parse::<FormatId>()?;

        if request.data.len() > self.max_upload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size: request.data.len(),
                limit: self.max_upload_bytes,
            });
        }

        request.settings.validate()?;

        Ok((source, target))
    }

    fn dispatch<F>(&self, request: ConversionRequest, prepare: F) -> Result<String, JobError>
    where
        F: FnOnce(ConversionTask) -> ConversionTask,
    {
        let (source, target) = self.validate(&request).map_err(|e| {
            debug!(error = %e, "Rejected conversion request");
            e
        })?;

        let pool = self.pool.as_ref().ok_or(WorkerError::ChannelClosed)?;

        let record = JobRecord::new(request.original_name, source, target, request.settings);
        let task = prepare(ConversionTask::new(&record, request.data));
        let id = record.id.clone();

        info!(
            job_id = %id,
            filename = %sanitize::display_name(&record.original_name),
            source = %source,
            target = %target,
            "Job created"
        );

        self.store.create(record.clone())?;
        self.events.send(JobEvent::from_record(&record));

        if let Err(e) = pool.submit(task) {
            // Nothing will ever run it; do not leave a pending record behind.
            if let Err(cleanup) = self.store.delete(&id) {
                log::warn!("Failed to remove unqueued job {}: {}", id, cleanup);
            }
            return Err(e.into());
        }

        Ok(id)
    }
}

impl Drop for JobOrchestrator {
    fn drop(&mut self) {
        self.stop_pool();
    }
}
