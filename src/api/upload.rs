//! File upload API handler.
//!
//! Accepts a multipart body whose `files` parts are checked against the
//! type gate, then extracted as one batch.

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::Json,
};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::pipeline::{BatchResult, Rejection, UploadedFile, type_gate};

/// Multipart field that carries the documents.
pub const FILES_FIELD: &str = "files";

/// Reported in place of the name of a part that carried none.
pub const UNNAMED_PART: &str = "(unnamed)";

/// A part that was kept out of the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedFile {
    pub file_name: String,
    pub reason: String,
}

/// Response for the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// One entry per accepted file, in upload order.
    pub results: BatchResult,
    /// Parts dropped before extraction. Omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedFile>,
}

/// Upload documents and extract their text.
///
/// POST /upload
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    // A body that is not multipart at all carries no files.
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Upload without a multipart body");
        ApiError::NoAcceptedFiles
    })?;

    let limits = &state.config.upload;
    let mut accepted: Vec<UploadedFile> = Vec::new();
    let mut rejected: Vec<RejectedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            tracing::debug!(field = ?field.name(), "Ignoring non-file field");
            continue;
        }

        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
        else {
            reject(
                &mut rejected,
                UNNAMED_PART.to_string(),
                &Rejection::MissingFileName,
            );
            continue;
        };

        let extension = match type_gate::check(&file_name) {
            Ok(ext) => ext,
            Err(reason) => {
                reject(&mut rejected, file_name, &reason);
                continue;
            }
        };

        if accepted.len() >= limits.max_files {
            reject(
                &mut rejected,
                file_name,
                &Rejection::TooManyFiles {
                    limit: limits.max_files,
                },
            );
            continue;
        }

        let content = field.bytes().await?;
        if content.len() > limits.max_file_size_bytes {
            reject(
                &mut rejected,
                file_name,
                &Rejection::TooLarge {
                    size: content.len(),
                    limit: limits.max_file_size_bytes,
                },
            );
            continue;
        }

        tracing::debug!(file_name = %file_name, size = content.len(), "Accepted upload");
        accepted.push(UploadedFile::new(file_name, extension, content));
    }

    if accepted.is_empty() {
        return Err(ApiError::NoAcceptedFiles);
    }

    tracing::info!(
        accepted = accepted.len(),
        rejected = rejected.len(),
        "Processing upload batch"
    );

    let results = state
        .orchestrator
        .process_batch_detached(accepted)
        .await?;

    Ok(Json(UploadResponse { results, rejected }))
}

fn reject(rejected: &mut Vec<RejectedFile>, file_name: String, reason: &Rejection) {
    tracing::info!(file_name = %file_name, reason = %reason, "Rejected upload");
    rejected.push(RejectedFile {
        file_name,
        reason: reason.to_string(),
    });
}
