//! Core trait and types for extraction providers.

use async_trait::async_trait;
use std::path::Path;

/// What an extraction produced for one staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Captured text. On failure this holds whatever partial output was produced.
    pub text: String,
    /// Whether the extraction terminated normally.
    pub success: bool,
}

impl ExtractionReport {
    pub fn succeeded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }
}

/// Errors that prevent an extraction from running at all.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// The file type is not supported by this provider.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// The provider is not properly configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// The extraction routine could not be started.
    #[error("Failed to start extraction routine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred while talking to the routine or reading the file.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Trait for extraction providers.
///
/// Given the path of a staged file, an implementor returns the extracted
/// text and whether extraction succeeded. A routine that runs but fails is
/// reported as `Ok` with `success == false`; `Err` is reserved for cases
/// where nothing could be run.
#[async_trait]
pub trait Extractor: Send + Sync + std::fmt::Debug {
    /// Extract text from the file at `path`.
    async fn extract(&self, path: &Path) -> Result<ExtractionReport, ProcessingError>;

    /// Get the provider name for logging and debugging.
    fn provider_name(&self) -> &'static str;
}
