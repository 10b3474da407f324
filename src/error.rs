//! HTTP-facing errors.
//!
//! Every variant renders as `{ "error": "<message>" }` with the matching
//! status code, so each request ends in exactly one JSON response.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::pipeline::BatchError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Nothing survived the type gate, or the body carried no files at all.
    #[error("No files uploaded or invalid file type")]
    NoAcceptedFiles,

    /// The multipart stream broke off or exceeded the body limit.
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// The batch could not be carried out.
    #[error("An error occurred while processing the file")]
    Processing(#[source] BatchError),

    #[error("Request timed out")]
    Timeout,
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Empty => Self::NoAcceptedFiles,
            other => Self::Processing(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoAcceptedFiles => StatusCode::BAD_REQUEST,
            Self::Multipart(err) => err.status(),
            Self::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Processing(source) => {
                tracing::error!(error = %source, "Batch failed");
            }
            Self::Multipart(source) => {
                tracing::warn!(error = %source, "Rejected malformed upload");
            }
            _ => {}
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StagingError;

    #[test]
    fn test_empty_batch_maps_to_bad_request() {
        let err = ApiError::from(BatchError::Empty);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No files uploaded or invalid file type");
    }

    #[test]
    fn test_staging_failure_maps_to_server_error() {
        let err = ApiError::from(BatchError::Staging(StagingError::Write {
            path: "/tmp/files-1.pdf".into(),
            source: std::io::Error::other("disk full"),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Internal detail never reaches the client.
        assert_eq!(err.to_string(), "An error occurred while processing the file");
    }
}
