use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::screening::models::{whole_number, CandidateRecord, EvaluationRecord};

/// One evaluation row as written by the pipeline. Rows are insert-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluation {
    pub candidate_name: String,
    pub candidate_data: Value,
    pub score: i64,
    pub decision: String,
    pub rationale: String,
}

impl NewEvaluation {
    pub fn from_records(candidate: &CandidateRecord, evaluation: &EvaluationRecord) -> Self {
        Self {
            candidate_name: candidate.name.clone(),
            // Serializing a plain struct of strings and integers cannot fail
            candidate_data: serde_json::to_value(candidate).unwrap_or_default(),
            score: evaluation.score,
            decision: evaluation.decision.clone(),
            rationale: evaluation.rationale.clone(),
        }
    }
}

/// One evaluation row as read back from the store.
///
/// Every column is optional so rows written by other tools, or with NULLs,
/// still render. Use the accessors for display values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StoredEvaluation {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub candidate_data: Option<Value>,
    /// Older rows may hold `72.5` or `"85"`; read the same way model output is.
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<i64>,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(whole_number))
}

impl StoredEvaluation {
    pub fn name(&self) -> &str {
        self.candidate_name.as_deref().unwrap_or("Unnamed")
    }

    pub fn score(&self) -> i64 {
        self.score.unwrap_or(0)
    }

    pub fn decision(&self) -> &str {
        self.decision.as_deref().unwrap_or("Unknown")
    }

    pub fn rationale(&self) -> &str {
        self.rationale.as_deref().unwrap_or("No rationale provided.")
    }

    pub fn candidate_data(&self) -> Value {
        self.candidate_data
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}
