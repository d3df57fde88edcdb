//! Error types for the pdfbridge server.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfbridge_core::PdfOpError;
use serde::Serialize;
use thiserror::Error;

use crate::convert::ConvertError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{0}")]
    MissingUpload(String),

    #[error("At most {limit} files are accepted for {operation}")]
    TooManyUploads {
        limit: usize,
        operation: &'static str,
    },

    #[error("File type '{declared}' is not allowed for {operation}")]
    UnsupportedType {
        declared: String,
        operation: &'static str,
    },

    #[error("File '{name}' exceeds the {limit_mb} MB per-file limit")]
    TooLarge { name: String, limit_mb: u64 },

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Pdf(#[from] PdfOpError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body: `{error, details?}`.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownOperation(_) => StatusCode::NOT_FOUND,
            ServerError::MissingUpload(_)
            | ServerError::TooManyUploads { .. }
            | ServerError::Multipart(_) => StatusCode::BAD_REQUEST,
            ServerError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            // Bad inputs to the assembly adapter are caller errors.
            ServerError::Pdf(PdfOpError::NotEnoughInputs { .. }) => StatusCode::BAD_REQUEST,
            ServerError::Pdf(PdfOpError::Parse(_)) | ServerError::Pdf(PdfOpError::Image(_)) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Pdf(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Convert(ConvertError::Timeout(_)) => StatusCode::REQUEST_TIMEOUT,
            ServerError::Convert(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            // Adapter and engine failures keep a stable top-level message
            // with the underlying cause in `details`.
            ServerError::Pdf(inner) => ErrorResponse {
                error: "PDF operation failed".to_string(),
                details: Some(inner.to_string()),
            },
            ServerError::Convert(inner) => ErrorResponse {
                error: "Conversion failed".to_string(),
                details: Some(inner.to_string()),
            },
            ServerError::Io(inner) => ErrorResponse {
                error: "Internal error".to_string(),
                details: Some(inner.to_string()),
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
