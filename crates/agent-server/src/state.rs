//! Application State

use std::sync::Arc;

use agent_core::LlmProvider;
use retention_advisor::RetentionAdvisor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (Ollama, etc.)
    pub provider: Arc<dyn LlmProvider>,

    /// Retention agent with its tools registered
    pub advisor: Arc<RetentionAdvisor>,
}
