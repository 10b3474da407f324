use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Name of the bundled extraction routine binary.
pub const DEFAULT_EXTRACTOR_PROGRAM: &str = "extract-file";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Program invoked to extract text from each staged file
    #[arg(long, env = "EXTRACTOR_PROGRAM")]
    pub extractor_program: Option<String>,

    /// Per-file extraction timeout in seconds
    #[arg(long, env = "EXTRACTION_TIMEOUT_SECS")]
    pub extraction_timeout_secs: Option<u64>,

    /// Directory where uploads are staged during extraction
    #[arg(long, env = "STAGING_DIR")]
    pub staging_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub extraction: ExtractionConfig,
    pub staging: StagingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub body_limit_bytes: usize,
    /// Whole-request timeout. Zero disables it.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_files: usize,
    pub max_file_size_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// `command` or `local`.
    pub provider: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub timeout_secs: u64,
    /// Files of one batch extracted at the same time.
    pub batch_concurrency: usize,
    /// Extraction processes allowed across all requests. Zero means one per CPU.
    pub max_processes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StagingConfig {
    pub dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: "command".to_string(),
            program: DEFAULT_EXTRACTOR_PROGRAM.to_string(),
            args: Vec::new(),
            timeout_secs: 120,
            batch_concurrency: 1,
            max_processes: 0,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 5001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.body_limit_bytes", 100 * 1024 * 1024)?
            .set_default("server.request_timeout_secs", 0)?
            .set_default("upload.max_files", 32)?
            .set_default("upload.max_file_size_bytes", 50 * 1024 * 1024)?
            .set_default("extraction.provider", "command")?
            .set_default("extraction.program", default_extractor_program())?
            .set_default("extraction.timeout_secs", 120)?
            .set_default("extraction.batch_concurrency", 1)?
            .set_default("extraction.max_processes", 0)?
            .set_default("staging.dir", default_staging_dir())?;

        // 2. Config file: explicit path, otherwise an optional ./config.{yaml,toml,json}
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Environment variables, e.g. EXTRACT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("EXTRACT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and their env aliases such as PORT) win over everything else
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(program) = cli.extractor_program {
            builder = builder.set_override("extraction.program", program)?;
        }
        if let Some(timeout) = cli.extraction_timeout_secs {
            builder = builder.set_override("extraction.timeout_secs", timeout)?;
        }
        if let Some(dir) = cli.staging_dir {
            builder = builder.set_override("staging.dir", dir)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

/// Prefer the `extract-file` binary installed next to the server, falling
/// back to a `PATH` lookup.
fn default_extractor_program() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_EXTRACTOR_PROGRAM)))
        .filter(|candidate| candidate.is_file())
        .map_or_else(
            || DEFAULT_EXTRACTOR_PROGRAM.to_string(),
            |candidate| candidate.to_string_lossy().into_owned(),
        )
}

fn default_staging_dir() -> String {
    std::env::temp_dir()
        .join("extract-gateway")
        .join("uploads")
        .to_string_lossy()
        .into_owned()
}
