//! Upload-to-text pipeline.
//!
//! - [`type_gate`]: extension allow-list
//! - [`staging`]: temporary on-disk copies of uploads
//! - [`batch`]: per-request orchestration

pub mod batch;
pub mod staging;
pub mod type_gate;

pub use batch::{BatchError, BatchOrchestrator, BatchResult, ExtractionOutcome, UploadedFile};
pub use staging::{StagedFile, StagingArea, StagingError};
pub use type_gate::Rejection;
