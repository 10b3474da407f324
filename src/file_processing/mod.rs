//! Extraction providers.
//!
//! The batch pipeline only sees the [`Extractor`] trait: given the path of a
//! staged file it yields the extracted text and a success flag. How the text
//! is produced is a provider detail.
//!
//! # Providers
//!
//! - [`CommandExtractor`] - runs an isolated extraction routine per file (default)
//! - [`LocalExtractor`] - reads plain-text files in-process
//!
//! # Usage
//!
//! ```rust,ignore
//! use extract_gateway::file_processing::ExtractorFactory;
//!
//! let extractor = ExtractorFactory::create(&config.extraction)?;
//! let report = extractor.extract(Path::new("/tmp/files-1-abc.pdf")).await?;
//! println!("{} ({})", report.text, report.success);
//! ```

mod command;
mod factory;
mod local;
mod provider;

pub use command::CommandExtractor;
pub use factory::ExtractorFactory;
pub use local::LocalExtractor;
pub use provider::{ExtractionReport, Extractor, ProcessingError};
