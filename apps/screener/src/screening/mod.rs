// Candidate screening: CV structuring, evaluation against a job spec, and the
// pipeline that sequences them with extraction and persistence.
// All LLM calls go through llm_client.

pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod structurer;

pub use pipeline::{PipelineOutcome, ScreeningPipeline, ScreeningReport};
