//! Extract Gateway Server
//!
//! Entry point for the document upload and text extraction service.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use extract_gateway::{config::AppConfig, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before reading RUST_LOG or any setting
    let _ = dotenvy::dotenv();

    telemetry::init();

    let config = match AppConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        name: "config.loaded",
        port = config.server.port,
        provider = %config.extraction.provider,
        program = %config.extraction.program,
        timeout_secs = config.extraction.timeout_secs,
        batch_concurrency = config.extraction.batch_concurrency,
        "Configuration loaded"
    );

    server::start_server(config).await
}
