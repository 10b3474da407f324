//! External command extraction provider.
//!
//! Runs a single-purpose extraction routine as a child process with the
//! staged file path as its last argument. Standard output becomes the
//! extracted text, exit status zero means success. Anything the routine
//! writes to standard error goes to the log only.

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::config::ExtractionConfig;

use super::provider::{ExtractionReport, Extractor, ProcessingError};

/// Extraction provider backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    /// Create a provider that runs `program args... <path>`.
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractionReport, ProcessingError> {
        let started = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessingError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessingError::IoError(std::io::Error::other("missing stdout")))?;

        // Drained on its own task so a chatty routine never blocks on a full pipe.
        if let Some(stderr) = child.stderr.take() {
            let file = path.display().to_string();
            tokio::spawn(forward_diagnostics(stderr, file));
        }

        let mut captured = Vec::new();
        let run = async {
            let mut chunk = [0u8; 8192];
            loop {
                let n = stdout.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                captured.extend_from_slice(&chunk[..n]);
            }
            child.wait().await
        };

        let outcome = tokio::time::timeout(self.timeout, run).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(result) => Ok(report_for_exit(path, result, &captured, elapsed_ms)),
            Err(_) => {
                tracing::warn!(
                    path = %path.display(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Extraction routine timed out, terminating"
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to terminate extraction routine");
                }
                Ok(ExtractionReport::failed(
                    String::from_utf8_lossy(&captured).into_owned(),
                ))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "Command"
    }
}

/// Turn a finished run into a report. Output read before a pipe error is
/// kept as the text of the failed report.
fn report_for_exit(
    path: &Path,
    result: std::io::Result<ExitStatus>,
    captured: &[u8],
    elapsed_ms: u64,
) -> ExtractionReport {
    let text = String::from_utf8_lossy(captured).into_owned();
    match result {
        Ok(status) if status.success() => {
            tracing::debug!(
                path = %path.display(),
                bytes = captured.len(),
                elapsed_ms,
                "Extraction routine succeeded"
            );
            ExtractionReport::succeeded(text)
        }
        Ok(status) => {
            tracing::warn!(
                path = %path.display(),
                exit_code = ?status.code(),
                elapsed_ms,
                "Extraction routine exited with failure"
            );
            ExtractionReport::failed(text)
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                bytes = captured.len(),
                elapsed_ms,
                "Lost contact with extraction routine"
            );
            ExtractionReport::failed(text)
        }
    }
}

/// Log each line the routine writes to standard error.
async fn forward_diagnostics<R>(stream: R, file: String)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => {
                tracing::warn!(target: "extract_gateway::routine", file = %file, "{line}");
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(file = %file, error = %e, "Stopped reading routine diagnostics");
                break;
            }
        }
    }
}
