//! Error Types for the Retention Advisor

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

impl AdvisorError {
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Lets tools use `?` on advisor errors; they surface as execution failures
impl From<AdvisorError> for AgentError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::Agent(inner) => inner,
            invalid @ AdvisorError::InvalidArgument { .. } => Self::ToolValidation(invalid.to_string()),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_is_validation() {
        let err: AgentError = AdvisorError::invalid_argument("num_event", "expected a non-negative integer").into();
        assert_eq!(err.kind(), "ToolValidation");
        assert!(err.to_string().contains("num_event"));
    }

    #[test]
    fn test_source_failure_is_execution() {
        let err: AgentError = AdvisorError::DataSource("connection refused".into()).into();
        assert_eq!(err.kind(), "ToolExecution");
    }

    #[test]
    fn test_wrapped_agent_error_unwraps() {
        let err: AgentError = AdvisorError::Agent(AgentError::Parse("no json".into())).into();
        assert_eq!(err.kind(), "Parse");
    }
}
