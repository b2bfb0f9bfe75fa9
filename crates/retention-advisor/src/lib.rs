//! # retention-advisor
//!
//! Game player retention agent: predicts churn risk, analyzes play behavior
//! and proposes interventions by letting an LLM drive three domain tools.
//!
//! ## Flow
//!
//! ```text
//! analyze_user_risk(user_id, profile)
//!   │
//!   ├─ predict_user_churn              churn probability, risk tier, key factors
//!   ├─ analyze_user_behavior           pattern, active hours, top activities
//!   ├─ generate_intervention_strategy  playbook for the risk tier
//!   │
//!   └─ FINISH → retention plan synthesized from the work log
//! ```

pub mod advisor;
pub mod config;
pub mod datasource;
pub mod error;
pub mod model;
pub mod svckit;

pub use advisor::RetentionAdvisor;
pub use config::AdvisorConfig;
pub use datasource::{MemoryDataSource, UserDataSource};
#[cfg(feature = "mysql")]
pub use datasource::MySqlDataSource;
pub use error::{AdvisorError, Result};
pub use model::{RiskLevel, UserEvent, UserProfile};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{BehaviorAnalyzerTool, ChurnPredictorTool, StrategyGeneratorTool};
}

/// Step prompt for the retention agent
pub const GAME_USER_ANALYSIS_PROMPT: &str = r"You are a professional game player behavior analyst. Your job is to analyze player behavior data, predict churn risk and produce intervention strategies.

Available tools:
{tools}

Task:
{task_description}

Work so far:
{memory}

Follow these steps:
1. Use the churn prediction tool to assess the player's churn risk
2. Use the behavior analysis tool to understand the player's behavior pattern
3. Based on the results, use the intervention strategy tool to build a plan

Call one tool per step. When the analysis is complete, respond with the action name FINISH.

{format_instructions}
";

/// Final synthesis prompt for the retention agent
pub const RETENTION_PLAN_PROMPT: &str = r"You are a professional game player retention expert. Based on the work log below, write an effective retention plan.

Task:
{task_description}

Work log:
{memory}

The plan should include:
1. Short-term interventions
2. Long-term retention strategy
3. Concrete execution advice
";
