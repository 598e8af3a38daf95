//! Candidate Evaluator: scores a `CandidateRecord` against a free-text job spec.

use tracing::{info, warn};

use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmGateway;
use crate::screening::models::{CandidateRecord, EvaluationRecord, APPROVAL_THRESHOLD};
use crate::screening::prompts::{evaluate_prompt, EVALUATE_PERSONA};

/// Always returns a complete record; falls back to `EvaluationRecord::fallback()`
/// when any of score, decision or rationale is missing.
///
/// The model's decision is stored as stated. The prompt asks for "Apto" at
/// score >= 75 but nothing here recomputes it.
pub async fn evaluate_candidate(
    candidate: &CandidateRecord,
    job_spec: &str,
    llm: &dyn LlmGateway,
) -> EvaluationRecord {
    info!("Evaluating '{}' against the job spec", candidate.name);
    let candidate_json = serde_json::to_string(candidate).unwrap_or_else(|_| "{}".to_string());
    let output = llm
        .call_json(
            &evaluate_prompt(&candidate_json, job_spec),
            &system_prompt(EVALUATE_PERSONA),
        )
        .await;

    let Some(record) = EvaluationRecord::from_model_output(&output) else {
        warn!("Evaluation response is missing required fields, using fallback record");
        return EvaluationRecord::fallback();
    };

    if !record.agrees_with_threshold() {
        warn!(
            "Model decision '{}' disagrees with score {} (threshold {APPROVAL_THRESHOLD}); keeping the model's decision",
            record.decision, record.score
        );
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fake::ScriptedLlm;
    use serde_json::json;

    fn jane() -> CandidateRecord {
        CandidateRecord {
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            skills: vec!["Python".into(), "SQL".into()],
            years_of_experience: 4,
        }
    }

    #[tokio::test]
    async fn test_complete_response_is_kept() {
        let llm = ScriptedLlm::new(vec![json!({
            "score": 85,
            "decision": "Apto",
            "rationale": "Four years of Python exceeds the two required."
        })]);
        let record = evaluate_candidate(&jane(), "needs 2+ years Python", &llm).await;
        assert_eq!(
            record,
            EvaluationRecord {
                score: 85,
                decision: "Apto".into(),
                rationale: "Four years of Python exceeds the two required.".into(),
            }
        );

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].0.contains("needs 2+ years Python"));
        assert!(prompts[0].0.contains("\"name\":\"Jane Doe\""));
    }

    #[tokio::test]
    async fn test_missing_key_yields_fallback() {
        let llm = ScriptedLlm::new(vec![json!({"score": 85, "rationale": "ok"})]);
        let record = evaluate_candidate(&jane(), "spec", &llm).await;
        assert_eq!(record, EvaluationRecord::fallback());
        assert_eq!(record.decision, "Error");
    }

    #[tokio::test]
    async fn test_inconsistent_decision_is_trusted_verbatim() {
        let llm = ScriptedLlm::new(vec![json!({
            "score": 40,
            "decision": "Apto",
            "rationale": "Generous call."
        })]);
        let record = evaluate_candidate(&jane(), "spec", &llm).await;
        assert_eq!(record.score, 40);
        assert_eq!(record.decision, "Apto");
    }
}
