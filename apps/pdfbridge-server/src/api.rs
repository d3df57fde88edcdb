//! Request handlers.
//!
//! Every conversion route resolves through the operation table and runs the
//! same lifecycle: admit and stage the uploads, invoke an adapter, respond
//! with the operation's content type and attachment name, and delete every
//! staged file exactly once whether the operation succeeded or failed.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::ops::{self, OpKind, OpSpec};
use crate::staging::StagedFile;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfbridge-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/pdf/{op}
///
/// Single parameterized handler for the whole conversion surface; the path
/// segment selects a row of the operation table.
pub async fn handle_operation(
    State(state): State<AppState>,
    Path(op_name): Path<String>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let spec = ops::lookup(&op_name).ok_or(ServerError::UnknownOperation(op_name))?;
    info!(operation = spec.name, "handling conversion request");

    let mut staged = Vec::new();
    let result = run_operation(&state, spec, multipart, &mut staged).await;

    // Exactly one cleanup pass on every exit path.
    state.staging.cleanup(&staged).await;

    let bytes = result?;
    debug!(operation = spec.name, size = bytes.len(), "operation succeeded");

    Ok((
        [
            (header::CONTENT_TYPE, spec.response_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", spec.download_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Stage the uploads, then dispatch to the adapter the operation needs.
/// Anything staged before a failure is left in `staged` for the caller to
/// clean up.
async fn run_operation(
    state: &AppState,
    spec: &'static OpSpec,
    multipart: Multipart,
    staged: &mut Vec<StagedFile>,
) -> Result<Vec<u8>, ServerError> {
    stage_uploads(state, spec, multipart, staged).await?;

    if staged.len() < spec.min_uploads() {
        return Err(ServerError::MissingUpload(missing_upload_message(spec)));
    }

    match spec.kind {
        OpKind::Merge => {
            let inputs = read_staged(staged).await?;
            Ok(pdfbridge_core::merge_documents(&inputs)?)
        }
        OpKind::Compress => {
            let inputs = read_staged(staged).await?;
            Ok(pdfbridge_core::recompress(&inputs[0])?)
        }
        OpKind::ImagesToPdf => {
            let inputs = read_staged(staged).await?;
            Ok(pdfbridge_core::images_to_pdf(&inputs)?)
        }
        OpKind::Engine { target_ext } => {
            Ok(state.converter.convert(&staged[0].path, target_ext).await?)
        }
    }
}

/// Read multipart fields named `file` or `files`, admission-check each
/// upload, and stage the ones that pass.
///
/// The MIME allow-list and the size cap are checked before anything touches
/// disk, so disallowed uploads are rejected without a conversion attempt.
async fn stage_uploads(
    state: &AppState,
    spec: &'static OpSpec,
    mut multipart: Multipart,
    staged: &mut Vec<StagedFile>,
) -> Result<(), ServerError> {
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" && field_name != "files" {
            debug!(field = field_name, "skipping non-upload field");
            continue;
        }

        if staged.len() == spec.max_uploads() {
            return Err(ServerError::TooManyUploads {
                limit: spec.max_uploads(),
                operation: spec.name,
            });
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload".to_string());
        let declared_type = field.content_type().unwrap_or("").to_string();

        if !spec.accepts(&declared_type) {
            return Err(ServerError::UnsupportedType {
                declared: declared_type,
                operation: spec.name,
            });
        }

        let bytes = field.bytes().await?;
        if bytes.len() as u64 > state.max_file_size {
            return Err(ServerError::TooLarge {
                name: original_name,
                limit_mb: state.max_file_size / (1024 * 1024),
            });
        }

        let file = state
            .staging
            .stage(&original_name, &declared_type, &bytes)
            .await?;
        debug!(
            name = %file.original_name,
            mime = %file.content_type,
            size = file.size,
            "upload staged"
        );
        staged.push(file);
    }

    Ok(())
}

async fn read_staged(staged: &[StagedFile]) -> Result<Vec<Vec<u8>>, ServerError> {
    let mut inputs = Vec::with_capacity(staged.len());
    for file in staged {
        inputs.push(tokio::fs::read(&file.path).await?);
    }
    Ok(inputs)
}

fn missing_upload_message(spec: &OpSpec) -> String {
    match spec.kind {
        OpKind::Merge => "At least 2 PDF files are required for merging".to_string(),
        OpKind::ImagesToPdf => "At least one image file is required for conversion".to_string(),
        OpKind::Compress => "A PDF file is required for compression".to_string(),
        OpKind::Engine { .. } => format!("A file is required for {}", spec.name),
    }
}
