use std::sync::Arc;

use crate::screening::ScreeningPipeline;
use crate::store::EvaluationStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Both handles are built once at startup and live until the process exits.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScreeningPipeline>,
    /// Read side for the dashboard. The pipeline holds the same store for writes.
    pub store: Arc<dyn EvaluationStore>,
}
