// Shared prompt fragments.
// Each feature that calls the LLM defines its own prompts.rs alongside it.

/// Appended to every system prompt. The endpoint is also asked for JSON mode,
/// but not every model honours the flag.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Joins a persona with the JSON-only instruction.
pub fn system_prompt(persona: &str) -> String {
    format!("{persona} {JSON_ONLY_INSTRUCTION}")
}
