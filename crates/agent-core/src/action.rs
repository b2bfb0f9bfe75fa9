//! Action Schema
//!
//! The structured decision the model emits on every step: either a tool name
//! with arguments, or the [`FINISH`] sentinel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{AgentError, Result};

/// Reserved action name that ends the think/act loop
pub const FINISH: &str = "FINISH";

/// A single decision parsed from a model response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Tool to invoke, or [`FINISH`]
    pub name: String,

    /// Arguments keyed by parameter name
    pub args: Map<String, Value>,
}

impl Action {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The terminal action
    pub fn finish() -> Self {
        Self::new(FINISH, Map::new())
    }

    pub fn is_finish(&self) -> bool {
        self.name == FINISH
    }

    /// Arguments rendered as compact JSON, used in observations
    pub fn args_json(&self) -> String {
        Value::Object(self.args.clone()).to_string()
    }

    /// JSON schema for the action object
    pub fn json_schema() -> Value {
        json!({
            "properties": {
                "name": {"title": "Name", "description": "Name of the tool to call, or FINISH when the task is complete", "type": "string"},
                "args": {"title": "Args", "description": "Arguments for the tool, keyed by parameter name", "type": "object"}
            },
            "required": ["name", "args"]
        })
    }

    /// Output-format instructions embedded in the step prompt.
    ///
    /// The schema sits on its own line so the prompt renderer can re-encode it.
    pub fn format_instructions() -> String {
        format!(
            "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
             \n\
             As an example, for the schema {{\"properties\": {{\"foo\": {{\"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
             the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. \
             The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\
             \n\
             Here is the output schema:\n\
             ```\n\
             {}\n\
             ```",
            Self::json_schema()
        )
    }

    /// Parse a full model response into an action.
    ///
    /// Accepts a bare JSON object, a fenced code block, or an object embedded
    /// in surrounding prose.
    pub fn parse(response: &str) -> Result<Self> {
        let value = extract_json(response).ok_or_else(|| {
            AgentError::Parse(format!("no JSON object found in model output: {}", preview(response)))
        })?;

        serde_json::from_value::<Self>(value).map_err(|e| {
            AgentError::Parse(format!(
                "model output does not match the action schema ({e}): {}",
                preview(response)
            ))
        })
    }
}

fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    // ```json ... ``` anywhere in the text
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map_or(0, |i| i + 1);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(body[..end].trim()) {
                return Some(value);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(200).collect();
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head
    }
}
