//! Job records, their stores, and the orchestrator that drives them.

pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod record;
pub mod sqlite_store;
pub mod store;

pub use error::{JobError, StoreError, TransitionError};
pub use executor::JobExecutor;
pub use orchestrator::{ConversionRequest, JobOrchestrator, OrchestratorOptions};
pub use record::{
    ConversionSettings, JobFailure, JobRecord, JobStatus, Transition, DEFAULT_COMPRESSION_LEVEL,
};
pub use sqlite_store::SqliteJobStore;
pub use store::{JobQuery, JobStore, MemoryJobStore};
