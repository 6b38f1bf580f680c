//! Orchestrator harness with pluggable background removal.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use tokio::sync::broadcast;

use pixconv::JobEvent;
use pixconv::pipeline::PipelineConfig;
use pixconv::{
    BackgroundRemover, ConversionPipeline, ConversionRequest, ConversionSettings, ImageCodec,
    JobOrchestrator, JobStore, MemoryJobStore, OrchestratorOptions, SegmentationError,
};

/// Makes the left half of the image transparent.
pub struct HalfCutout;

impl BackgroundRemover for HalfCutout {
    fn remove_background(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
        let mut out = image.clone();
        let half = out.width() / 2;
        for (x, _, px) in out.enumerate_pixels_mut() {
            if x < half {
                *px = Rgba([px[0], px[1], px[2], 0]);
            }
        }
        Ok(out)
    }
}

/// Sleeps past any reasonable deadline before answering.
pub struct Stalled(pub Duration);

impl BackgroundRemover for Stalled {
    fn remove_background(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
        std::thread::sleep(self.0);
        Ok(image.clone())
    }
}

/// Fails every call and counts them.
#[derive(Default)]
pub struct Rejecting {
    pub calls: AtomicUsize,
}

impl BackgroundRemover for Rejecting {
    fn remove_background(&self, _image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SegmentationError::Status {
            status: 503,
            body: "model loading".to_string(),
        })
    }
}

pub fn pipeline_with(remover: Arc<dyn BackgroundRemover>, timeout: Duration) -> ConversionPipeline {
    ConversionPipeline::new(
        PipelineConfig {
            segmentation_timeout: timeout,
            ..PipelineConfig::default()
        },
        Arc::new(ImageCodec::default()),
        remover,
    )
}

/// Orchestrator over a `MemoryJobStore` the test can inspect directly.
pub struct TestHarness {
    pub orchestrator: JobOrchestrator,
    pub store: Arc<MemoryJobStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_remover(Arc::new(HalfCutout), Duration::from_secs(5))
    }

    pub fn with_remover(remover: Arc<dyn BackgroundRemover>, timeout: Duration) -> Self {
        Self::build(remover, timeout, 4)
    }

    pub fn build(remover: Arc<dyn BackgroundRemover>, timeout: Duration, workers: usize) -> Self {
        let store = Arc::new(MemoryJobStore::new());
        let orchestrator = JobOrchestrator::new(
            store.clone() as Arc<dyn JobStore>,
            pipeline_with(remover, timeout),
            OrchestratorOptions {
                worker_count: workers,
                max_upload_bytes: 1024 * 1024,
            },
        )
        .expect("Failed to start orchestrator");
        Self {
            orchestrator,
            store,
        }
    }
}

pub fn request(
    name: &str,
    mime: &str,
    target: &str,
    data: Vec<u8>,
    settings: ConversionSettings,
) -> ConversionRequest {
    ConversionRequest {
        original_name: name.to_string(),
        mime_type: mime.to_string(),
        target_format: target.to_string(),
        data,
        settings,
    }
}

/// Collects events for `job_id` until a terminal one arrives.
pub fn events_until_terminal(
    rx: &mut broadcast::Receiver<JobEvent>,
    job_id: &str,
    timeout: Duration,
) -> Vec<JobEvent> {
    let deadline = Instant::now() + timeout;
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) if event.job_id == job_id => {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    return events;
                }
            }
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Empty) => {
                assert!(Instant::now() < deadline, "job {} never finished", job_id);
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => panic!("event channel error: {:?}", e),
        }
    }
}
