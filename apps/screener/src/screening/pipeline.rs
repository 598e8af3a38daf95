//! Screening pipeline: one candidate, one job spec, one stored row.
//!
//! Flow: extract → structure → evaluate → persist → report.
//!
//! Runs strictly in sequence. The only branch is the abort on empty extraction,
//! which happens before any LLM or store call. Nothing is retried.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::extractor::{PdfSource, TextExtractor};
use crate::llm_client::LlmGateway;
use crate::models::evaluation::NewEvaluation;
use crate::screening::evaluator::evaluate_candidate;
use crate::screening::models::{CandidateRecord, EvaluationRecord};
use crate::screening::structurer::structure_cv;
use crate::store::EvaluationStore;

/// Shown to the user when a document yields no text.
pub const NO_TEXT_WARNING: &str =
    "No text could be extracted from the document. It may be a scanned image without a text layer, or unreadable.";

/// What a completed run hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningReport {
    pub run_id: Uuid,
    pub candidate: CandidateRecord,
    pub evaluation: EvaluationRecord,
    pub persisted: bool,
    /// Set when the insert failed. Earlier results are still returned.
    pub persist_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Extraction produced no text; nothing else ran.
    Aborted { run_id: Uuid, reason: String },
    Completed(ScreeningReport),
}

/// Sequences the extractor, both LLM stages and the store.
/// Holds its collaborators explicitly so tests can swap any of them.
pub struct ScreeningPipeline {
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn LlmGateway>,
    store: Arc<dyn EvaluationStore>,
}

impl ScreeningPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LlmGateway>,
        store: Arc<dyn EvaluationStore>,
    ) -> Self {
        Self {
            extractor,
            llm,
            store,
        }
    }

    pub async fn run(&self, source: PdfSource, job_spec: &str) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("screening", %run_id);
        self.run_stages(run_id, source, job_spec)
            .instrument(span)
            .await
    }

    async fn run_stages(&self, run_id: Uuid, source: PdfSource, job_spec: &str) -> PipelineOutcome {
        // 1. Extracting (CPU-bound, off the async workers)
        info!("Extracting text from {}", source.describe());
        let extractor = self.extractor.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&source))
            .await
            .unwrap_or_else(|e| {
                error!("Extraction task failed: {e}");
                String::new()
            });

        if text.is_empty() {
            warn!("Aborting run: {NO_TEXT_WARNING}");
            return PipelineOutcome::Aborted {
                run_id,
                reason: NO_TEXT_WARNING.to_string(),
            };
        }

        // 2. Structuring
        let candidate = structure_cv(&text, self.llm.as_ref()).await;
        info!("Structured CV for '{}'", candidate.name);

        // 3. Evaluating
        let evaluation = evaluate_candidate(&candidate, job_spec, self.llm.as_ref()).await;
        info!(
            "Score {} - {}; rationale: {}",
            evaluation.score, evaluation.decision, evaluation.rationale
        );

        // 4. Persisting. A failed write keeps the computed results.
        let row = NewEvaluation::from_records(&candidate, &evaluation);
        let (persisted, persist_error) = match self.store.insert(&row).await {
            Ok(()) => (true, None),
            Err(e) => {
                error!("Failed to save evaluation: {e}");
                (false, Some(e.to_string()))
            }
        };

        // 5. Done
        info!("Screening run complete");
        PipelineOutcome::Completed(ScreeningReport {
            run_id,
            candidate,
            evaluation,
            persisted,
            persist_error,
        })
    }
}
