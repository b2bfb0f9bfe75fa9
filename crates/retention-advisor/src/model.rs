//! Domain Models
//!
//! Player profiles, raw events and the payloads the retention tools return.

use std::fmt;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Churn probability above which a player is high risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Churn probability above which a player is medium risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// Probability reported when the model has no score for a player
pub const DEFAULT_CHURN_PROBABILITY: f64 = 0.5;

/// Aggregated features for one player, as produced by the feature pipeline
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Highest character level reached
    #[serde(default)]
    pub max_level: u32,

    /// Highest VIP tier reached
    #[serde(default)]
    pub max_viplevel: u32,

    /// Number of logged events in the observation window
    #[serde(default)]
    pub num_event: u32,

    /// Ordered event names (behavior sequence)
    #[serde(default)]
    pub event_list: Vec<String>,

    /// Item usage statistics
    #[serde(default)]
    pub stats_item_list: Vec<String>,

    /// Event frequency statistics
    #[serde(default)]
    pub stats_event_list: Vec<String>,
}

/// Churn risk tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl RiskLevel {
    /// Tier for a churn probability; thresholds are exclusive
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_THRESHOLD {
            Self::High
        } else if probability > MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Lenient parse of a label coming from the model or a caller
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logged player event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserEvent {
    pub user_id: String,
    pub event_name: String,
    pub event_time: DateTime<Utc>,
    /// `activity_type` from the event payload, when present
    #[serde(default)]
    pub activity_type: Option<String>,
}

impl UserEvent {
    pub fn new(
        user_id: impl Into<String>,
        event_name: impl Into<String>,
        event_time: DateTime<Utc>,
        activity_type: Option<&str>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            event_name: event_name.into(),
            event_time,
            activity_type: activity_type.map(str::to_string),
        }
    }

    /// Hour bucket label, e.g. `20:00-21:00`
    pub fn hour_bucket(&self) -> String {
        let hour = self.event_time.hour();
        format!("{:02}:00-{:02}:00", hour, hour + 1)
    }
}

/// Look-back window for behavior analysis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
}

impl TimeRange {
    /// `week` and `month` are recognised; anything else means one day
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "week" => Self::Week,
            "month" => Self::Month,
            _ => Self::Day,
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
        }
    }
}

/// Engagement style derived from event volume
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorPattern {
    Hardcore,
    Regular,
    Casual,
    Unknown,
}

impl BehaviorPattern {
    pub const fn from_event_count(count: usize) -> Self {
        if count > 100 {
            Self::Hardcore
        } else if count > 50 {
            Self::Regular
        } else {
            Self::Casual
        }
    }
}

/// Output of the churn predictor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChurnPrediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub churn_probability: f64,
    pub risk_level: RiskLevel,
    pub key_factors: Vec<String>,
}

/// Activity label with its event count
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCount {
    pub activity: String,
    pub count: usize,
}

/// Output of the behavior analyzer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub behavior_pattern: BehaviorPattern,
    pub active_hours: Vec<String>,
    pub preferred_activities: Vec<ActivityCount>,
}

impl BehaviorReport {
    /// Summarize events: distinct sorted hour buckets and the three most
    /// frequent activities (ties keep first-seen order).
    pub fn from_events(events: &[UserEvent]) -> Self {
        let mut active_hours: Vec<String> = events.iter().map(UserEvent::hour_bucket).collect();
        active_hours.sort();
        active_hours.dedup();

        let mut activities: Vec<ActivityCount> = Vec::new();
        for event in events {
            let label = event.activity_type.as_deref().unwrap_or("unknown");
            match activities.iter_mut().find(|a| a.activity == label) {
                Some(entry) => entry.count += 1,
                None => activities.push(ActivityCount {
                    activity: label.to_string(),
                    count: 1,
                }),
            }
        }
        activities.sort_by(|a, b| b.count.cmp(&a.count));
        activities.truncate(3);

        Self {
            error: None,
            behavior_pattern: BehaviorPattern::from_event_count(events.len()),
            active_hours,
            preferred_activities: activities,
        }
    }

    /// Report used when the event source cannot be read
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            behavior_pattern: BehaviorPattern::Unknown,
            active_hours: Vec::new(),
            preferred_activities: Vec::new(),
        }
    }
}

/// Output of the strategy generator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionStrategy {
    pub strategy_type: String,
    pub recommended_actions: Vec<String>,
    pub priority: String,
}
