use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::format::FormatId;

/// Encoded conversion result.
#[derive(Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub format: FormatId,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Pixel size of the encoded raster. `None` for pass-through vector and
    /// document inputs, which are never rasterized.
    pub dimensions: Option<(u32, u32)>,
    /// True when the target format was satisfied by an embedded raster.
    pub degraded: bool,
}

impl OutputArtifact {
    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for OutputArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputArtifact")
            .field("format", &self.format)
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("dimensions", &self.dimensions)
            .field("degraded", &self.degraded)
            .finish()
    }
}
