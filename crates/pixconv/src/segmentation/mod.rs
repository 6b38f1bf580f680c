//! Background removal.
//!
//! Segmentation itself happens elsewhere; this module only defines the seam,
//! an HTTP client for a segmentation service, and the deadline under which
//! any implementation is called.

mod http;

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use image::RgbaImage;
use thiserror::Error;

use crate::config::SegmentationConfig;

pub use http::HttpSegmenter;

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("No segmentation service is configured")]
    NotConfigured,

    #[error("Segmentation request failed: {0}")]
    Request(String),

    #[error("Segmentation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Segmentation service returned an unreadable image: {0}")]
    InvalidResponse(String),

    #[error("Segmentation did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Segmentation worker stopped without a result")]
    Abandoned,
}

/// Produces an RGBA image whose background pixels are transparent.
pub trait BackgroundRemover: Send + Sync {
    fn remove_background(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError>;
}

/// Used when no service is configured. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

impl BackgroundRemover for Unconfigured {
    fn remove_background(&self, _image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
        Err(SegmentationError::NotConfigured)
    }
}

/// Builds the remover described by `config`.
pub fn from_config(config: &SegmentationConfig) -> Result<Arc<dyn BackgroundRemover>, SegmentationError> {
    match config.endpoint.as_deref() {
        Some(endpoint) => {
            let api_key = config
                .api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty());
            let segmenter =
                HttpSegmenter::new(endpoint, api_key, Duration::from_secs(config.timeout_secs))?;
            Ok(Arc::new(segmenter))
        }
        None => Ok(Arc::new(Unconfigured)),
    }
}

/// Runs `remover` on a helper thread and waits at most `deadline`.
///
/// A call that overruns is abandoned: its thread keeps running until the
/// remover returns, but the result is discarded.
pub fn remove_with_deadline(
    remover: Arc<dyn BackgroundRemover>,
    image: RgbaImage,
    deadline: Duration,
) -> Result<RgbaImage, SegmentationError> {
    let (tx, rx) = bounded(1);

    std::thread::Builder::new()
        .name("pixconv-segmentation".to_string())
        .spawn(move || {
            let result = remover.remove_background(&image);
            // Receiver may already be gone after a timeout.
            let _ = tx.send(result);
        })
        .map_err(|e| SegmentationError::Request(format!("Failed to spawn thread: {}", e)))?;

    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(?deadline, "Background removal timed out");
            Err(SegmentationError::TimedOut(deadline))
        }
        Err(RecvTimeoutError::Disconnected) => Err(SegmentationError::Abandoned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct ClearAll;

    impl BackgroundRemover for ClearAll {
        fn remove_background(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
            let mut out = image.clone();
            for px in out.pixels_mut() {
                px.0[3] = 0;
            }
            Ok(out)
        }
    }

    struct Sleepy(Duration);

    impl BackgroundRemover for Sleepy {
        fn remove_background(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
            std::thread::sleep(self.0);
            Ok(image.clone())
        }
    }

    struct Panics;

    impl BackgroundRemover for Panics {
        fn remove_background(&self, _image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
            panic!("model crashed");
        }
    }

    fn opaque() -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn test_result_within_deadline() {
        let out = remove_with_deadline(Arc::new(ClearAll), opaque(), Duration::from_secs(5)).unwrap();
        assert!(out.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_timeout() {
        let result = remove_with_deadline(
            Arc::new(Sleepy(Duration::from_millis(500))),
            opaque(),
            Duration::from_millis(20),
        );
        assert!(matches!(result, Err(SegmentationError::TimedOut(_))));
    }

    #[test]
    fn test_panicking_remover_is_reported() {
        let result = remove_with_deadline(Arc::new(Panics), opaque(), Duration::from_secs(5));
        assert!(matches!(result, Err(SegmentationError::Abandoned)));
    }

    #[test]
    fn test_unconfigured_fails() {
        let config = SegmentationConfig::default();
        let remover = from_config(&config).unwrap();
        assert!(matches!(
            remover.remove_background(&opaque()),
            Err(SegmentationError::NotConfigured)
        ));
    }
}
