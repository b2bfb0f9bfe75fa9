//! Strategy Generator Tool
//!
//! Maps a risk tier to a canned intervention playbook.

use async_trait::async_trait;
use serde_json::{Map, Value};

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolResult, ToolSchema};

use super::str_arg;
use crate::model::{InterventionStrategy, RiskLevel};

pub const NAME: &str = "generate_intervention_strategy";

const URGENT_ACTIONS: &[&str] = &[
    "Send a limited-time gift pack",
    "Push new event notifications",
    "Offer dedicated customer support",
    "Grant a VIP trial card",
];

const REGULAR_ACTIONS: &[&str] = &[
    "Push new event notifications",
    "Send daily login rewards",
    "Provide gameplay guides",
];

const MAINTENANCE_ACTIONS: &[&str] = &["Send daily login rewards", "Push new version update notice"];

const NO_ACTIONS: &[&str] = &[];

/// Tool for producing retention interventions
#[derive(Clone, Copy, Debug, Default)]
pub struct StrategyGeneratorTool;

impl StrategyGeneratorTool {
    pub const fn new() -> Self {
        Self
    }

    pub fn strategy_for(risk: RiskLevel) -> InterventionStrategy {
        let (strategy_type, actions, priority) = match risk {
            RiskLevel::High => ("urgent_retention", URGENT_ACTIONS, "high"),
            RiskLevel::Medium => ("regular_retention", REGULAR_ACTIONS, "medium"),
            RiskLevel::Low => ("maintenance", MAINTENANCE_ACTIONS, "low"),
            RiskLevel::Unknown => ("unknown", NO_ACTIONS, "unknown"),
        };

        InterventionStrategy {
            strategy_type: strategy_type.into(),
            recommended_actions: actions.iter().map(|a| (*a).to_string()).collect(),
            priority: priority.into(),
        }
    }
}

#[async_trait]
impl Tool for StrategyGeneratorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Generate a retention intervention strategy for a player from their churn risk level.".into(),
            parameters: vec![
                ParameterSchema::required("user_id", "string", "Player id"),
                ParameterSchema::required("risk_level", "string", "Churn risk level: high, medium or low"),
            ],
            category: Some("strategy".into()),
        }
    }

    async fn execute(&self, args: &Map<String, Value>) -> CoreResult<ToolResult> {
        let user_id = str_arg(args, "user_id")?;
        let risk = RiskLevel::parse(str_arg(args, "risk_level")?);

        let strategy = Self::strategy_for(risk);
        tracing::debug!(user_id, %risk, strategy = %strategy.strategy_type, "Strategy generated");

        Ok(ToolResult::json(NAME, serde_json::to_value(strategy)?))
    }
}
