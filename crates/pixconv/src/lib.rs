pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod format;
pub mod job;
pub mod pipeline;
pub mod sanitize;
pub mod segmentation;
pub mod telemetry;
pub mod worker;

pub use codec::{Codec, ImageCodec};
pub use config::{load_config, Config, LogSettings, SegmentationConfig};
pub use error::{ConfigError, ErrorKind, PixconvError, Result, ValidationError, WorkerError};
pub use events::{JobEvent, JobEventBroadcaster};
pub use format::FormatId;
pub use job::{
    ConversionRequest, ConversionSettings, JobError, JobFailure, JobOrchestrator, JobQuery,
    JobRecord, JobStatus, JobStore, MemoryJobStore, OrchestratorOptions, SqliteJobStore,
};
pub use pipeline::{ConversionError, ConversionPipeline, OutputArtifact, PipelineConfig};
pub use segmentation::{BackgroundRemover, SegmentationError};
pub use telemetry::init_tracing;
