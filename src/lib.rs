//! Extract Gateway
//!
//! Accepts a batch of documents (PDF, plain text, Word, images) over
//! `POST /upload`, extracts the text of each one through an isolated
//! extraction routine and answers with one result per accepted file.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server with multipart uploads
//! - **Pipeline**: type gate, staging and batch orchestration
//! - **File processing**: pluggable extractors (external command or in-process)
//!
//! # Modules
//!
//! - [`api`]: HTTP handlers
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`file_processing`]: extractor trait and providers
//! - [`pipeline`]: per-request upload pipeline
//! - [`server`]: router and server bootstrap

pub mod api;
pub mod config;
pub mod error;
pub mod file_processing;
pub mod pipeline;
pub mod server;
pub mod telemetry;

use crate::config::AppConfig;
use crate::pipeline::BatchOrchestrator;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Global Configuration
    pub config: Arc<AppConfig>,
    /// Runs accepted uploads through staging and extraction.
    pub orchestrator: Arc<BatchOrchestrator>,
}
