use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::JsonMap;

/// Keys the structurer requires from the model, in schema order.
pub const CANDIDATE_KEYS: [&str; 4] = ["name", "email", "skills", "years_of_experience"];

/// Keys the evaluator requires from the model.
pub const EVALUATION_KEYS: [&str; 3] = ["score", "decision", "rationale"];

/// Decision text the model uses for a passing candidate.
pub const APPROVED_DECISION: &str = "Apto";
pub const REJECTED_DECISION: &str = "No Apto";

/// Score at or above which the prompt asks the model to answer "Apto".
/// Advisory only: the model's own decision is what gets stored.
pub const APPROVAL_THRESHOLD: i64 = 75;

/// Structured résumé fields produced by the CV structurer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub years_of_experience: u32,
}

impl CandidateRecord {
    /// Substituted whole when the model response lacks any required key.
    pub fn fallback() -> Self {
        Self {
            name: "Unknown".to_string(),
            email: String::new(),
            skills: Vec::new(),
            years_of_experience: 0,
        }
    }

    /// Accepts the model output only if every required key is present.
    /// Values are carried over leniently; their types are not validated.
    pub fn from_model_output(map: &JsonMap) -> Option<Self> {
        if !has_all_keys(map, &CANDIDATE_KEYS) {
            return None;
        }
        Some(Self {
            name: text_of(&map["name"]),
            email: text_of(&map["email"]),
            skills: text_list(&map["skills"]),
            years_of_experience: whole_number(&map["years_of_experience"])
                .map(|n| n.clamp(0, u32::MAX as i64) as u32)
                .unwrap_or(0),
        })
    }
}

/// Score, decision and rationale produced by the candidate evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Intended range 0–100, not clamped.
    pub score: i64,
    /// Model-asserted, normally "Apto" or "No Apto". Not enum-enforced.
    pub decision: String,
    pub rationale: String,
}

impl EvaluationRecord {
    pub fn fallback() -> Self {
        Self {
            score: 0,
            decision: "Error".to_string(),
            rationale: "Could not obtain a valid evaluation.".to_string(),
        }
    }

    pub fn from_model_output(map: &JsonMap) -> Option<Self> {
        if !has_all_keys(map, &EVALUATION_KEYS) {
            return None;
        }
        Some(Self {
            score: whole_number(&map["score"]).unwrap_or(0),
            decision: text_of(&map["decision"]),
            rationale: text_of(&map["rationale"]),
        })
    }

    /// Whether the stated decision agrees with the advisory score threshold.
    /// Decisions other than "Apto"/"No Apto" are not judged.
    pub fn agrees_with_threshold(&self) -> bool {
        let passes = self.score >= APPROVAL_THRESHOLD;
        if self.decision.eq_ignore_ascii_case(APPROVED_DECISION) {
            passes
        } else if self.decision.eq_ignore_ascii_case(REJECTED_DECISION) {
            !passes
        } else {
            true
        }
    }
}

fn has_all_keys(map: &JsonMap, keys: &[&str]) -> bool {
    keys.iter().all(|k| map.contains_key(*k))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let single = text_of(other);
            if single.is_empty() {
                Vec::new()
            } else {
                vec![single]
            }
        }
    }
}

/// Integer view of a loosely typed number: floats are rounded, numeric strings parsed.
pub(crate) fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}
