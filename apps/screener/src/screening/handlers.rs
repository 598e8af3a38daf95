//! Axum route handlers for the Screening API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extractor::PdfSource;
use crate::screening::{PipelineOutcome, ScreeningReport};
use crate::state::AppState;

/// POST /api/v1/evaluations
///
/// Multipart form: `file` (PDF bytes) and `job_spec` (free text).
/// Runs the full screening pipeline for one candidate.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningReport>, AppError> {
    let mut document: Option<Bytes> = None;
    let mut job_spec: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => document = Some(field.bytes().await?),
            Some("job_spec") => job_spec = Some(field.text().await?),
            _ => {}
        }
    }

    let document = document
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let job_spec = job_spec
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("job_spec cannot be empty".to_string()))?;

    info!("Received CV upload ({} bytes)", document.len());
    match state
        .pipeline
        .run(PdfSource::Memory(document), &job_spec)
        .await
    {
        PipelineOutcome::Completed(report) => Ok(Json(report)),
        PipelineOutcome::Aborted { run_id, reason } => {
            warn!(%run_id, "Rejecting upload: {reason}");
            Err(AppError::UnprocessableEntity(format!("{reason} (run {run_id})")))
        }
    }
}
