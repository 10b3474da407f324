//! Factory for creating extractors based on configuration.

use super::command::CommandExtractor;
use super::local::LocalExtractor;
use super::provider::{Extractor, ProcessingError};
use crate::config::ExtractionConfig;
use std::sync::Arc;

/// Factory for creating extractors based on configuration.
#[derive(Debug)]
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create an extractor for `config.provider`.
    ///
    /// - `command`: run `config.program` per staged file
    /// - `local`: read text files in-process
    pub fn create(config: &ExtractionConfig) -> Result<Arc<dyn Extractor>, ProcessingError> {
        match config.provider.as_str() {
            "command" => {
                if config.program.trim().is_empty() {
                    return Err(ProcessingError::ProviderNotConfigured(
                        "extraction.program must name the extraction routine".to_string(),
                    ));
                }
                if config.timeout_secs == 0 {
                    return Err(ProcessingError::ProviderNotConfigured(
                        "extraction.timeout_secs must be greater than zero".to_string(),
                    ));
                }
                tracing::info!(
                    program = %config.program,
                    args = ?config.args,
                    timeout_secs = config.timeout_secs,
                    "Using external command for extraction"
                );
                Ok(Arc::new(CommandExtractor::from_config(config)))
            }
            "local" => {
                tracing::info!("Using local extraction (text files only)");
                Ok(Arc::new(LocalExtractor::new()))
            }
            other => Err(ProcessingError::ProviderNotConfigured(format!(
                "Unknown extraction provider '{other}' (expected 'command' or 'local')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_command_provider() {
        let config = ExtractionConfig::default();
        let result = ExtractorFactory::create(&config);
        assert_eq!(result.unwrap().provider_name(), "Command");
    }

    #[test]
    fn test_create_local_provider() {
        let config = ExtractionConfig {
            provider: "local".to_string(),
            ..Default::default()
        };
        let result = ExtractorFactory::create(&config);
        assert_eq!(result.unwrap().provider_name(), "Local");
    }

    #[test]
    fn test_command_without_program() {
        let config = ExtractionConfig {
            program: "  ".to_string(),
            ..Default::default()
        };
        let result = ExtractorFactory::create(&config);
        assert!(matches!(
            result,
            Err(ProcessingError::ProviderNotConfigured(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ExtractionConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(ExtractorFactory::create(&config).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let config = ExtractionConfig {
            provider: "kreuzberg".to_string(),
            ..Default::default()
        };
        assert!(ExtractorFactory::create(&config).is_err());
    }
}
