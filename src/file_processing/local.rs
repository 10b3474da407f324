//! Local extraction provider.
//!
//! Reads plain-text files in-process without spawning anything. Binary
//! formats (PDF, Word, images) are reported as unsupported, so this
//! provider is mainly useful for development setups that have no
//! extraction routine installed.

use super::provider::{ExtractionReport, Extractor, ProcessingError};
use async_trait::async_trait;
use std::path::Path;

/// In-process extractor for text files.
#[derive(Debug, Default)]
pub struct LocalExtractor;

impl LocalExtractor {
    /// Create a new local extractor.
    pub fn new() -> Self {
        Self
    }

    fn supports_mime_type(mime_type: &str) -> bool {
        mime_type.starts_with("text/")
    }
}

#[async_trait]
impl Extractor for LocalExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractionReport, ProcessingError> {
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        if !Self::supports_mime_type(&mime_type) {
            return Err(ProcessingError::UnsupportedType(format!(
                "Local provider cannot process {mime_type}: configure the command provider"
            )));
        }

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(ExtractionReport::succeeded(content)),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(path = %path.display(), "File is not valid UTF-8 text");
                Ok(ExtractionReport::failed(""))
            }
            Err(e) => Err(ProcessingError::IoError(e)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "Local"
    }
}
