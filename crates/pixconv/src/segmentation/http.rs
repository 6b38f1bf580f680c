use std::io::Cursor;
use std::time::Duration;

use image::{ImageFormat, RgbaImage};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::{BackgroundRemover, SegmentationError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts a PNG to a segmentation service and expects a PNG with alpha back.
pub struct HttpSegmenter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpSegmenter {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SegmentationError> {
        let client = Client::builder()
            .user_agent(concat!("pixconv/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| SegmentationError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for HttpSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSegmenter")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl BackgroundRemover for HttpSegmenter {
    fn remove_background(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
        let _span = tracing::info_span!("segmentation.http", endpoint = %self.endpoint).entered();

        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| SegmentationError::Request(format!("Failed to encode request: {}", e)))?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "image/png")
            .header(ACCEPT, "image/png")
            .body(png.into_inner());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| SegmentationError::Request(format!("POST {}: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SegmentationError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| SegmentationError::Request(e.to_string()))?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| SegmentationError::InvalidResponse(e.to_string()))?;

        tracing::debug!(bytes = bytes.len(), "Segmentation response received");
        Ok(decoded.to_rgba8())
    }
}
