//! Service Kit - Agent Tools
//!
//! Domain tools implementing `agent_core::Tool` for the retention agent.

mod behavior_analyzer;
mod churn_predictor;
mod strategy_generator;

pub use behavior_analyzer::BehaviorAnalyzerTool;
pub use churn_predictor::ChurnPredictorTool;
pub use strategy_generator::StrategyGeneratorTool;

use serde_json::{Map, Value};

use crate::error::{AdvisorError, Result};

fn str_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| AdvisorError::invalid_argument(name, "expected a string"))
}

fn u32_arg(args: &Map<String, Value>, name: &str) -> Result<u32> {
    let value = args
        .get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| AdvisorError::invalid_argument(name, "expected a non-negative integer"))?;
    u32::try_from(value).map_err(|_| AdvisorError::invalid_argument(name, "value out of range"))
}

/// String list argument; missing means empty, non-string items are rendered as JSON
fn list_arg(args: &Map<String, Value>, name: &str) -> Vec<String> {
    args.get(name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
