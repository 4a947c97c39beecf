use std::sync::Arc;

use crate::llm_client::LlmBackend;
use crate::screening::batch::BatchScreener;
use crate::store::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The store and LLM are explicit handles owned here, not process globals:
/// tests swap in fakes without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AnalysisStore>,
    pub llm: Arc<dyn LlmBackend>,
    pub screener: Arc<BatchScreener>,
}
