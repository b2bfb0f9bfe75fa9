//! Behavior Analyzer Tool
//!
//! Summarizes a player's recent activity: how much they play, when, and
//! which activities they favor.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolResult, ToolSchema};

use super::str_arg;
use crate::datasource::UserDataSource;
use crate::model::{BehaviorReport, TimeRange};

pub const NAME: &str = "analyze_user_behavior";

/// Tool for analyzing player behavior over a look-back window
pub struct BehaviorAnalyzerTool {
    source: Arc<dyn UserDataSource>,
}

impl BehaviorAnalyzerTool {
    pub fn new(source: Arc<dyn UserDataSource>) -> Self {
        Self { source }
    }

    /// Report for the window ending at `now`
    pub async fn analyze(&self, user_id: &str, range: TimeRange, now: DateTime<Utc>) -> BehaviorReport {
        let since = now - range.duration();
        match self.source.events(user_id, since, now).await {
            Ok(events) => BehaviorReport::from_events(&events),
            Err(e) => {
                tracing::warn!(user_id, source = self.source.name(), error = %e, "Event lookup failed");
                BehaviorReport::unavailable(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Tool for BehaviorAnalyzerTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Analyze a player's behavior pattern, active hours and preferred activities over a time range.".into(),
            parameters: vec![
                ParameterSchema::required("user_id", "string", "Player id"),
                ParameterSchema::required("time_range", "string", "Look-back window: day, week or month"),
            ],
            category: Some("analysis".into()),
        }
    }

    async fn execute(&self, args: &Map<String, Value>) -> CoreResult<ToolResult> {
        let user_id = str_arg(args, "user_id")?;
        let range = TimeRange::parse(str_arg(args, "time_range")?);

        let report = self.analyze(user_id, range, Utc::now()).await;
        tracing::debug!(user_id, ?range, pattern = ?report.behavior_pattern, "Behavior analyzed");

        Ok(ToolResult::json(NAME, serde_json::to_value(report)?))
    }
}
