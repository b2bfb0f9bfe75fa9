//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool arguments did not match the declared parameters
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Two tools registered under the same name
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// Model output did not match the action contract
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Stable variant name, surfaced to the model in tool observations
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Provider(_) => "Provider",
            Self::ProviderUnavailable(_) => "ProviderUnavailable",
            Self::ToolValidation(_) => "ToolValidation",
            Self::ToolExecution(_) => "ToolExecution",
            Self::DuplicateTool(_) => "DuplicateTool",
            Self::Parse(_) => "Parse",
            Self::Config(_) => "Config",
            Self::Json(_) => "Json",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::Parse(_) => "The AI service returned a reply the agent could not understand.".into(),
            Self::Config(msg) => format!("The agent is misconfigured: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(AgentError::ToolExecution("boom".into()).kind(), "ToolExecution");
        assert_eq!(AgentError::Parse("bad".into()).kind(), "Parse");
    }

    #[test]
    fn test_json_error_converts() {
        fn decode(text: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(text)?)
        }

        let err = decode("{not json").unwrap_err();
        assert_eq!(err.kind(), "Json");
        assert_eq!(err.user_message(), "An unexpected error occurred.");
    }
}
