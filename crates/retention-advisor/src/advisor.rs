//! Retention Advisor
//!
//! Wires the domain tools and prompts into an [`Agent`] and exposes the two
//! entry points callers use.

use std::sync::Arc;

use agent_core::{Agent, LlmProvider, RunResult, StepObserver, ToolRegistry};

use crate::config::AdvisorConfig;
use crate::datasource::UserDataSource;
use crate::error::Result;
use crate::model::{RiskLevel, UserProfile};
use crate::svckit::{BehaviorAnalyzerTool, ChurnPredictorTool, StrategyGeneratorTool};
use crate::{GAME_USER_ANALYSIS_PROMPT, RETENTION_PLAN_PROMPT};

/// Registry holding the three retention tools, in catalogue order
pub fn retention_tools(source: &Arc<dyn UserDataSource>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(ChurnPredictorTool::new(source.clone()))?;
    registry.register(BehaviorAnalyzerTool::new(source.clone()))?;
    registry.register(StrategyGeneratorTool::new())?;
    Ok(registry)
}

/// Task text for a risk analysis
pub fn risk_task(user_id: &str, profile: &UserProfile) -> String {
    format!(
        "Analyze the churn risk of player {user_id}:\n\
         - Level: {}\n\
         - VIP level: {}\n\
         - Event count: {}\n\
         - Behavior sequence: {}\n\n\
         Assess the player's risk and produce a suitable intervention strategy.",
        profile.max_level,
        profile.max_viplevel,
        profile.num_event,
        profile.event_list.join(", "),
    )
}

/// Task text for a retention plan
pub fn retention_task(user_id: &str, risk_level: RiskLevel) -> String {
    format!(
        "Generate a retention plan for player {user_id}:\n\
         - Risk level: {risk_level}\n\n\
         Produce a detailed retention intervention plan."
    )
}

pub struct RetentionAdvisor {
    agent: Agent,
}

impl RetentionAdvisor {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        source: Arc<dyn UserDataSource>,
        config: &AdvisorConfig,
    ) -> Result<Self> {
        let tools = retention_tools(&source)?;
        let agent = Agent::new(
            provider,
            Arc::new(tools),
            GAME_USER_ANALYSIS_PROMPT,
            RETENTION_PLAN_PROMPT,
            config.agent_config(),
        )?;

        tracing::info!(model = %config.model, max_steps = config.max_steps, source = source.name(), "Retention advisor ready");
        Ok(Self { agent })
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.agent = self.agent.with_observer(observer);
        self
    }

    /// Assess a player's churn risk and propose interventions
    pub async fn analyze_user_risk(&self, user_id: &str, profile: &UserProfile) -> Result<RunResult> {
        tracing::info!(user_id, "Risk analysis requested");
        Ok(self.agent.run(&risk_task(user_id, profile)).await?)
    }

    /// Build a retention plan for a known risk tier
    pub async fn generate_retention_plan(&self, user_id: &str, risk_level: RiskLevel) -> Result<RunResult> {
        tracing::info!(user_id, %risk_level, "Retention plan requested");
        Ok(self.agent.run(&retention_task(user_id, risk_level)).await?)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}
