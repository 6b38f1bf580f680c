pub mod artifact;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runner;

pub use artifact::OutputArtifact;
pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::ConversionError;
pub use progress::{ConversionPhase, NoopProgress, ProgressReporter};
pub use runner::ConversionPipeline;
