//! CV Structurer: asks the LLM to turn raw résumé text into a `CandidateRecord`.

use tracing::{info, warn};

use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmGateway;
use crate::screening::models::CandidateRecord;
use crate::screening::prompts::{structure_cv_prompt, STRUCTURE_CV_PERSONA};

/// Always returns a complete record. If the model omits any required key the
/// whole response is discarded in favour of `CandidateRecord::fallback()`.
pub async fn structure_cv(resume_text: &str, llm: &dyn LlmGateway) -> CandidateRecord {
    info!("Structuring CV ({} chars)", resume_text.len());
    let output = llm
        .call_json(
            &structure_cv_prompt(resume_text),
            &system_prompt(STRUCTURE_CV_PERSONA),
        )
        .await;

    match CandidateRecord::from_model_output(&output) {
        Some(record) => record,
        None => {
            warn!(
                "CV structuring response is missing required fields (got {:?}), using fallback record",
                output.keys().collect::<Vec<_>>()
            );
            CandidateRecord::fallback()
        }
    }
}
