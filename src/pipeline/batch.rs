//! Batch orchestration: stage, extract, record, release for every accepted file.

use axum::body::Bytes;
use futures::{StreamExt, stream};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::file_processing::{ExtractionReport, Extractor};

use super::staging::{StagingArea, StagingError, new_staging_id};

/// An upload that passed the type gate.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as sent by the client.
    pub original_name: String,
    /// Lower-cased extension with leading dot.
    pub extension: String,
    pub content: Bytes,
    pub staging_id: String,
}

impl UploadedFile {
    pub fn new(
        original_name: impl Into<String>,
        extension: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            extension: extension.into(),
            content: content.into(),
            staging_id: new_staging_id(),
        }
    }
}

/// Result of extracting one file, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub file_name: String,
    pub text: String,
    pub success: bool,
}

/// One outcome per accepted file, in submission order.
pub type BatchResult = Vec<ExtractionOutcome>;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("No files uploaded or invalid file type")]
    Empty,

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("Batch task ended unexpectedly: {0}")]
    Aborted(String),
}

/// Drives accepted files through staging and extraction.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    staging: StagingArea,
    extractor: Arc<dyn Extractor>,
    batch_concurrency: usize,
    /// Shared by every batch; bounds live extraction processes.
    permits: Arc<Semaphore>,
}

impl BatchOrchestrator {
    /// `max_processes == 0` allows one extraction per CPU.
    pub fn new(
        staging: StagingArea,
        extractor: Arc<dyn Extractor>,
        batch_concurrency: usize,
        max_processes: usize,
    ) -> Self {
        let max_processes = if max_processes == 0 {
            num_cpus::get()
        } else {
            max_processes
        };
        Self {
            staging,
            extractor,
            batch_concurrency: batch_concurrency.max(1),
            permits: Arc::new(Semaphore::new(max_processes)),
        }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Process every file and return outcomes in submission order.
    ///
    /// Extraction failures are recorded per file. Only a staging failure
    /// aborts the batch; files staged up to that point are still removed.
    pub async fn process_batch(&self, files: Vec<UploadedFile>) -> Result<BatchResult, BatchError> {
        if files.is_empty() {
            return Err(BatchError::Empty);
        }

        let started = Instant::now();
        let file_count = files.len();
        let mut outcomes = Vec::with_capacity(file_count);

        // `buffered` yields in input order regardless of completion order.
        let mut pending = stream::iter(files)
            .map(|file| self.process_file(file))
            .buffered(self.batch_concurrency);

        while let Some(outcome) = pending.next().await {
            outcomes.push(outcome?);
        }

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            file_count,
            succeeded,
            failed = file_count - succeeded,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Batch processed"
        );

        Ok(outcomes)
    }

    /// Like [`process_batch`](Self::process_batch) but on a separate task.
    ///
    /// If the caller is dropped (client went away) the batch still runs to
    /// completion, so no routine is killed halfway and no staged file is left
    /// behind.
    pub async fn process_batch_detached(
        &self,
        files: Vec<UploadedFile>,
    ) -> Result<BatchResult, BatchError> {
        let this = self.clone();
        tokio::spawn(async move { this.process_batch(files).await })
            .await
            .map_err(|e| BatchError::Aborted(e.to_string()))?
    }

    async fn process_file(&self, file: UploadedFile) -> Result<ExtractionOutcome, StagingError> {
        // The semaphore is never closed, so acquiring cannot fail.
        let _permit = self.permits.acquire().await.ok();

        let staged = self
            .staging
            .stage(&file.staging_id, &file.extension, &file.content)
            .await?;

        let report = match self.extractor.extract(staged.path()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    file_name = %file.original_name,
                    staging_id = %file.staging_id,
                    provider = self.extractor.provider_name(),
                    error = %e,
                    "Extraction could not run"
                );
                ExtractionReport::failed("")
            }
        };

        staged.release().await;

        tracing::debug!(
            file_name = %file.original_name,
            staging_id = %file.staging_id,
            success = report.success,
            text_length = report.text.len(),
            "File processed"
        );

        Ok(ExtractionOutcome {
            file_name: file.original_name,
            text: report.text,
            success: report.success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_processing::ProcessingError;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Behaves according to the staged content:
    /// `ok:<text>`, `fail:<text>`, `error`, or `sleep:<ms>:<text>`.
    #[derive(Debug, Default)]
    struct ScriptedExtractor {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Extractor for ScriptedExtractor {
        async fn extract(&self, path: &Path) -> Result<ExtractionReport, ProcessingError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let script = tokio::fs::read_to_string(path).await?;
            let result = if let Some(text) = script.strip_prefix("ok:") {
                Ok(ExtractionReport::succeeded(text))
            } else if let Some(text) = script.strip_prefix("fail:") {
                Ok(ExtractionReport::failed(text))
            } else if let Some(rest) = script.strip_prefix("sleep:") {
                let (ms, text) = rest.split_once(':').unwrap();
                tokio::time::sleep(Duration::from_millis(ms.parse().unwrap())).await;
                Ok(ExtractionReport::succeeded(text))
            } else {
                Err(ProcessingError::UnsupportedType(script))
            };

            self.running.fetch_sub(1, Ordering::SeqCst);
            result
        }

        fn provider_name(&self) -> &'static str {
            "Scripted"
        }
    }

    async fn orchestrator(
        dir: &Path,
        batch_concurrency: usize,
        max_processes: usize,
    ) -> (BatchOrchestrator, Arc<ScriptedExtractor>) {
        let staging = StagingArea::prepare(dir).await.unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        let orchestrator = BatchOrchestrator::new(
            staging,
            Arc::clone(&extractor) as Arc<dyn Extractor>,
            batch_concurrency,
            max_processes,
        );
        (orchestrator, extractor)
    }

    fn file(name: &str, script: &str) -> UploadedFile {
        let ext = crate::pipeline::type_gate::check(name).unwrap();
        UploadedFile::new(name, ext, script.as_bytes().to_vec())
    }

    fn staged_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let (orchestrator, _) = orchestrator(root.path(), 1, 1).await;

        let err = orchestrator.process_batch(Vec::new()).await.unwrap_err();
        assert!(matches!(err, BatchError::Empty));
        assert_eq!(staged_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let root = tempfile::tempdir().unwrap();
        let (orchestrator, _) = orchestrator(root.path(), 1, 1).await;

        let results = orchestrator
            .process_batch(vec![
                file("report.pdf", "ok:Hello World"),
                file("corrupt.pdf", "fail:"),
                file("weird.docx", "error"),
                file("notes.txt", "ok:notes"),
            ])
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                ExtractionOutcome {
                    file_name: "report.pdf".to_string(),
                    text: "Hello World".to_string(),
                    success: true,
                },
                ExtractionOutcome {
                    file_name: "corrupt.pdf".to_string(),
                    text: String::new(),
                    success: false,
                },
                ExtractionOutcome {
                    file_name: "weird.docx".to_string(),
                    text: String::new(),
                    success: false,
                },
                ExtractionOutcome {
                    file_name: "notes.txt".to_string(),
                    text: "notes".to_string(),
                    success: true,
                },
            ]
        );
        assert_eq!(staged_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_order_preserved_with_concurrency() {
        let root = tempfile::tempdir().unwrap();
        let (orchestrator, _) = orchestrator(root.path(), 4, 4).await;

        // Earlier files finish last.
        let files: Vec<UploadedFile> = (0..4)
            .map(|i| {
                let delay = (4 - i) * 40;
                file(&format!("f{i}.txt"), &format!("sleep:{delay}:text{i}"))
            })
            .collect();

        let results = orchestrator.process_batch(files).await.unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["f0.txt", "f1.txt", "f2.txt", "f3.txt"]);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.text, format!("text{i}"));
        }
    }

    #[tokio::test]
    async fn test_sequential_by_default() {
        let root = tempfile::tempdir().unwrap();
        let (orchestrator, extractor) = orchestrator(root.path(), 1, 8).await;

        let files = (0..3)
            .map(|i| file(&format!("f{i}.txt"), "sleep:20:x"))
            .collect();
        orchestrator.process_batch(files).await.unwrap();

        assert_eq!(extractor.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_process_cap_applies_within_batch() {
        let root = tempfile::tempdir().unwrap();
        let (orchestrator, extractor) = orchestrator(root.path(), 6, 2).await;

        let files = (0..6)
            .map(|i| file(&format!("f{i}.txt"), "sleep:30:x"))
            .collect();
        orchestrator.process_batch(files).await.unwrap();

        assert!(extractor.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_staging_failure_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let (orchestrator, _) = orchestrator(&root.path().join("uploads"), 1, 1).await;
        std::fs::remove_dir(orchestrator.staging().dir()).unwrap();

        let err = orchestrator
            .process_batch(vec![file("a.txt", "ok:a")])
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Staging(_)));
    }

    #[tokio::test]
    async fn test_detached_batch_completes() {
        let root = tempfile::tempdir().unwrap();
        let (orchestrator, _) = orchestrator(root.path(), 2, 2).await;

        let results = orchestrator
            .process_batch_detached(vec![file("a.txt", "ok:a"), file("b.png", "ok:b")])
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(staged_count(root.path()), 0);
    }
}
