//! Prompt Rendering
//!
//! Templates use `{name}` placeholders, with `{{` and `}}` for literal braces.
//! Substitution is a single pass over the template text, so braces inside
//! substituted values (JSON schemas, tool output) are never re-interpreted.

use std::collections::HashMap;

use serde_json::Value;

/// A template plus any values already bound to its placeholders
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            partials: HashMap::new(),
        }
    }

    /// Bind a placeholder ahead of time
    #[must_use]
    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    /// Fill the remaining placeholders.
    ///
    /// `vars` take precedence over partials. Placeholders with no value are
    /// left in the output as written.
    pub fn format(&self, vars: &[(&str, &str)]) -> String {
        let lookup = |key: &str| -> Option<&str> {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .or_else(|| self.partials.get(key).map(String::as_str))
        };

        let text = self.template.as_str();
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if tail.starts_with('{') {
                match tail[1..].find('}').map(|end| &tail[1..=end]) {
                    Some(key) if is_placeholder(key) && lookup(key).is_some() => {
                        out.push_str(lookup(key).unwrap_or_default());
                        rest = &tail[key.len() + 2..];
                    }
                    _ => {
                        out.push('{');
                        rest = &tail[1..];
                    }
                }
            } else {
                out.push('}');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

fn is_placeholder(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Bind the tool catalogue and format instructions into a step template.
///
/// Pure: identical inputs always produce an identical template.
pub fn render(template: &str, tool_catalogue: &str, format_instructions: &str) -> PromptTemplate {
    PromptTemplate::new(template)
        .partial("tools", tool_catalogue)
        .partial("format_instructions", unescape_json_lines(format_instructions))
}

/// Re-serialize every line that is a standalone JSON object so non-ASCII text
/// appears literally instead of as `\uXXXX` escapes. Lines that fail to parse
/// are kept verbatim.
pub fn unescape_json_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.starts_with('{') && line.ends_with('}') {
                serde_json::from_str::<Value>(line)
                    .ok()
                    .and_then(|value| serde_json::to_string(&value).ok())
                    .unwrap_or_else(|| line.to_string())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
