use std::time::Duration;

use crate::codec::DEFAULT_MAX_DIMENSION;
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Largest width or height the decoder accepts.
    pub max_dimension: u32,
    /// How long background removal may take before the job fails.
    pub segmentation_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_dimension: config.max_dimension,
            segmentation_timeout: Duration::from_secs(config.segmentation.timeout_secs),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            segmentation_timeout: Duration::from_secs(30),
        }
    }
}
