//! Churn Predictor Tool
//!
//! Looks up the trained churn model's probability for a player and turns it
//! into a risk tier plus the features that drove it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolResult, ToolSchema};

use super::{list_arg, str_arg, u32_arg};
use crate::datasource::UserDataSource;
use crate::model::{ChurnPrediction, DEFAULT_CHURN_PROBABILITY, RiskLevel, UserProfile};

pub const NAME: &str = "predict_user_churn";

/// Events per window below which logins count as declining
const LOW_ACTIVITY_EVENTS: u32 = 50;

/// VIP tier below which spending counts as declining
const LOW_SPEND_VIP: u32 = 2;

/// Tool for predicting churn probability
pub struct ChurnPredictorTool {
    source: Arc<dyn UserDataSource>,
}

impl ChurnPredictorTool {
    pub fn new(source: Arc<dyn UserDataSource>) -> Self {
        Self { source }
    }

    /// Prediction for one player; a source failure degrades to a payload
    /// carrying the error instead of failing the call
    pub async fn predict(&self, user_id: &str, profile: &UserProfile) -> ChurnPrediction {
        match self.source.churn_probability(user_id).await {
            Ok(score) => {
                let probability = score.unwrap_or(DEFAULT_CHURN_PROBABILITY);
                ChurnPrediction {
                    error: None,
                    churn_probability: probability,
                    risk_level: RiskLevel::from_probability(probability),
                    key_factors: key_factors(profile),
                }
            }
            Err(e) => {
                tracing::warn!(user_id, source = self.source.name(), error = %e, "Churn score lookup failed");
                ChurnPrediction {
                    error: Some(e.to_string()),
                    churn_probability: DEFAULT_CHURN_PROBABILITY,
                    risk_level: RiskLevel::Unknown,
                    key_factors: Vec::new(),
                }
            }
        }
    }
}

fn key_factors(profile: &UserProfile) -> Vec<String> {
    vec![
        if profile.num_event < LOW_ACTIVITY_EVENTS {
            "login frequency declining".into()
        } else {
            "login frequency normal".into()
        },
        if profile.max_viplevel < LOW_SPEND_VIP {
            "spending declining".into()
        } else {
            "spending normal".into()
        },
    ]
}

#[async_trait]
impl Tool for ChurnPredictorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Predict the probability that a player churns, with a risk level (high/medium/low) and key factors.".into(),
            parameters: vec![
                ParameterSchema::required("user_id", "string", "Player id"),
                ParameterSchema::required("event_list", "array", "Behavior sequence (event names)"),
                ParameterSchema::required("max_level", "integer", "Highest character level"),
                ParameterSchema::required("max_viplevel", "integer", "Highest VIP tier"),
                ParameterSchema::required("num_event", "integer", "Number of events in the window"),
                ParameterSchema::optional("stats_item_list", "array", "Item usage statistics"),
                ParameterSchema::optional("stats_event_list", "array", "Event frequency statistics"),
            ],
            category: Some("prediction".into()),
        }
    }

    async fn execute(&self, args: &Map<String, Value>) -> CoreResult<ToolResult> {
        let user_id = str_arg(args, "user_id")?;
        let profile = UserProfile {
            max_level: u32_arg(args, "max_level")?,
            max_viplevel: u32_arg(args, "max_viplevel")?,
            num_event: u32_arg(args, "num_event")?,
            event_list: list_arg(args, "event_list"),
            stats_item_list: list_arg(args, "stats_item_list"),
            stats_event_list: list_arg(args, "stats_event_list"),
        };

        let prediction = self.predict(user_id, &profile).await;
        tracing::debug!(user_id, risk = %prediction.risk_level, "Churn predicted");

        Ok(ToolResult::json(NAME, serde_json::to_value(prediction)?))
    }
}
