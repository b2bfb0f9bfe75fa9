//! Tool System
//!
//! Tools are registered once when the agent is built and looked up by name on
//! every non-terminal step. [`ToolRegistry::invoke`] is total: lookup misses,
//! argument mismatches, tool errors and tool panics all come back as
//! observation text the model can react to.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AgentError, Result};

/// Observation returned when the model names a tool that is not registered
pub const TOOL_NOT_FOUND: &str = "Tool not found";

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error)
    pub output: String,

    /// Structured data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            output: error.into(),
            data: None,
        }
    }

    /// Successful result whose output is the JSON rendering of `data`
    pub fn json(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            success: true,
            output: data.to_string(),
            data: Some(data),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON type (string, integer, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self.param_type.as_str() {
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => true,
        }
    }
}

/// Tool definition schema (rendered into the prompt catalogue)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping
    #[serde(default)]
    pub category: Option<String>,
}

impl ToolSchema {
    /// Check `args` against the declared parameters.
    ///
    /// Keys the schema does not declare are ignored.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<()> {
        for param in &self.parameters {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(AgentError::ToolValidation(format!(
                        "missing required parameter: {}",
                        param.name
                    )));
                }
                Some(value) if !value.is_null() && !param.accepts(value) => {
                    return Err(AgentError::ToolValidation(format!(
                        "parameter '{}' expects {}, got {}",
                        param.name, param.param_type, value
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// One catalogue entry: `name: description` plus an argument line
    pub fn describe(&self) -> String {
        let mut entry = format!("{}: {}", self.name, self.description);
        if !self.parameters.is_empty() {
            let params: Vec<String> = self
                .parameters
                .iter()
                .map(|p| {
                    let required = if p.required { ", required" } else { "" };
                    format!("{} ({}{})", p.name, p.param_type, required)
                })
                .collect();
            entry.push_str(&format!("\n  args: {}", params.join(", ")));
        }
        entry
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with validated arguments
    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolResult>;
}

struct RegisteredTool {
    schema: ToolSchema,
    tool: Arc<dyn Tool>,
}

/// Registry for available tools, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool; names must be unique
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_shared(Arc::new(tool))
    }

    /// Register a shared tool; names must be unique
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let schema = tool.schema();
        if self.index.contains_key(&schema.name) {
            return Err(AgentError::DuplicateTool(schema.name));
        }
        self.index.insert(schema.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { schema, tool });
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].tool.clone())
    }

    /// Invoke a tool by name and return the observation text.
    ///
    /// Never fails: every failure mode is described in the returned string.
    pub async fn invoke(&self, name: &str, args: &Map<String, Value>) -> String {
        let Some(entry) = self.index.get(name).map(|&i| &self.tools[i]) else {
            tracing::warn!(tool = %name, "Tool not registered");
            return TOOL_NOT_FOUND.to_string();
        };
        let args_text = Value::Object(args.clone()).to_string();

        if let Err(e) = entry.schema.validate(args) {
            tracing::warn!(tool = %name, error = %e, "Tool arguments rejected");
            return format!("Validation Error in args: {e}, args: {args_text}");
        }

        match AssertUnwindSafe(entry.tool.execute(args)).catch_unwind().await {
            Ok(Ok(result)) if result.success => result.output,
            Ok(Ok(result)) => {
                tracing::warn!(tool = %name, "Tool reported failure");
                format!("Error: {}, ToolFailure, args: {args_text}", result.output)
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = %name, error = %e, "Tool execution failed");
                format!("Error: {e}, {}, args: {args_text}", e.kind())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(tool = %name, panic = %message, "Tool panicked");
                format!("Error: {message}, Panic, args: {args_text}")
            }
        }
    }

    /// Get all tool schemas in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema.clone()).collect()
    }

    /// Get tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.schema.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Text catalogue of every tool, one entry per tool
    pub fn catalogue(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.schema.describe())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo the given text".into(),
                parameters: vec![
                    ParameterSchema::required("text", "string", "Text to echo"),
                    ParameterSchema::optional("times", "integer", "Repeat count"),
                ],
                category: None,
            }
        }

        async fn execute(&self, args: &Map<String, Value>) -> Result<ToolResult> {
            let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
            Ok(ToolResult::success("echo", text))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "fail".into(),
                description: "Always fails".into(),
                parameters: vec![ParameterSchema::required("user_id", "string", "User")],
                category: None,
            }
        }

        async fn execute(&self, _args: &Map<String, Value>) -> Result<ToolResult> {
            Err(AgentError::ToolExecution("database unreachable".into()))
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "panic".into(),
                description: "Panics".into(),
                parameters: Vec::new(),
                category: None,
            }
        }

        async fn execute(&self, _args: &Map<String, Value>) -> Result<ToolResult> {
            panic!("index out of range");
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        registry.register(FailingTool).unwrap();
        registry.register(PanickingTool).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        let err = registry.register(EchoTool).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_catalogue_in_registration_order() {
        let catalogue = registry().catalogue();
        assert!(catalogue.starts_with("echo: Echo the given text"));
        assert!(catalogue.contains("args: text (string, required), times (integer)"));
        assert!(catalogue.find("fail:").unwrap() < catalogue.find("panic:").unwrap());
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let out = registry().invoke("echo", &args(json!({"text": "hi"}))).await;
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let out = registry().invoke("nope", &Map::new()).await;
        assert_eq!(out, TOOL_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invoke_validation_failure_includes_args() {
        let out = registry().invoke("echo", &args(json!({"times": "x"}))).await;
        assert!(out.starts_with("Validation Error in args:"));
        assert!(out.contains("missing required parameter: text"));
        assert!(out.contains(r#"args: {"times":"x"}"#));

        let out = registry().invoke("echo", &args(json!({"text": 5}))).await;
        assert!(out.contains("parameter 'text' expects string"));
    }

    #[tokio::test]
    async fn test_invoke_execution_error_includes_kind_and_args() {
        let out = registry().invoke("fail", &args(json!({"user_id": "u7"}))).await;
        assert!(out.contains("database unreachable"));
        assert!(out.contains("ToolExecution"));
        assert!(out.contains(r#"{"user_id":"u7"}"#));
    }

    #[tokio::test]
    async fn test_invoke_panic_is_contained() {
        let out = registry().invoke("panic", &Map::new()).await;
        assert!(out.contains("index out of range"));
        assert!(out.contains("Panic"));
    }
}
