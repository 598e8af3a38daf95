// Screening LLM prompt templates.
// Placeholders are substituted with `str::replace` before sending.

/// Persona for CV structuring. Combined with the JSON-only instruction at call time.
pub const STRUCTURE_CV_PERSONA: &str = "\
You are an HR data extraction assistant. \
You read raw résumé text and extract the candidate's details exactly as written. \
Never invent information that is not present in the résumé.";

/// CV structuring template. Replace `{resume_text}` before sending.
pub const STRUCTURE_CV_PROMPT: &str = r#"Extract the following information from the résumé below and return it STRICTLY as a JSON object.

Required fields:
- "name": the candidate's full name (string)
- "email": the candidate's email address, or "" if none is given (string)
- "skills": the candidate's skills (list of strings)
- "years_of_experience": total years of professional experience (integer)

RÉSUMÉ:
{resume_text}"#;

/// Persona for candidate evaluation.
pub const EVALUATE_PERSONA: &str = "\
You are an impartial technical evaluator. \
You compare a candidate profile against job requirements and explain your reasoning. \
Avoid any discriminatory bias.";

/// Evaluation template. Replace `{candidate_json}` and `{job_spec}` before sending.
pub const EVALUATE_PROMPT: &str = r#"Compare the candidate profile with the job requirements.

CANDIDATE (JSON):
{candidate_json}

JOB REQUIREMENTS:
{job_spec}

Evaluate and respond STRICTLY as a JSON object with this structure:
- "score": an integer from 0 to 100 indicating compatibility.
- "decision": "Apto" or "No Apto" ("Apto" if the score is >= 75).
- "rationale": a brief technical explanation of why this score was assigned, highlighting what matches and what is missing."#;

/// Fills the structuring template.
pub fn structure_cv_prompt(resume_text: &str) -> String {
    STRUCTURE_CV_PROMPT.replace("{resume_text}", resume_text)
}

/// Fills the evaluation template.
pub fn evaluate_prompt(candidate_json: &str, job_spec: &str) -> String {
    EVALUATE_PROMPT
        .replace("{candidate_json}", candidate_json)
        .replace("{job_spec}", job_spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::models::{CANDIDATE_KEYS, EVALUATION_KEYS};

    #[test]
    fn test_structure_prompt_names_every_required_key() {
        let prompt = structure_cv_prompt("Jane Doe");
        for key in CANDIDATE_KEYS {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing {key}");
        }
        assert!(prompt.ends_with("Jane Doe"));
    }

    #[test]
    fn test_evaluate_prompt_names_every_required_key() {
        let prompt = evaluate_prompt("{}", "needs 2+ years Python");
        for key in EVALUATION_KEYS {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing {key}");
        }
        assert!(prompt.contains(">= 75"));
        assert!(prompt.contains("needs 2+ years Python"));
    }

    #[test]
    fn test_no_placeholders_left_after_filling() {
        let prompt = evaluate_prompt("{\"name\": \"Jane Doe\"}", "Rust");
        assert!(!prompt.contains("{candidate_json}"));
        assert!(!prompt.contains("{job_spec}"));
        assert!(!structure_cv_prompt("text").contains("{resume_text}"));
    }
}
