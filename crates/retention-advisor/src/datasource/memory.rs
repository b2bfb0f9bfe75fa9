//! In-memory data source

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::UserDataSource;
use crate::error::{AdvisorError, Result};
use crate::model::UserEvent;

/// Fixed scores and events held in memory
#[derive(Default)]
pub struct MemoryDataSource {
    scores: HashMap<String, f64>,
    events: HashMap<String, Vec<UserEvent>>,
    offline: bool,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every read fails, for exercising degraded paths
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Record a model score, clamped to `[0, 1]`
    #[must_use]
    pub fn with_churn_score(mut self, user_id: impl Into<String>, probability: f64) -> Self {
        self.scores.insert(user_id.into(), probability.clamp(0.0, 1.0));
        self
    }

    /// Add events; each is filed under its own `user_id`
    #[must_use]
    pub fn with_events(mut self, events: impl IntoIterator<Item = UserEvent>) -> Self {
        for event in events {
            self.events.entry(event.user_id.clone()).or_default().push(event);
        }
        for list in self.events.values_mut() {
            list.sort_by_key(|e| e.event_time);
        }
        self
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(AdvisorError::DataSource("memory source is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDataSource for MemoryDataSource {
    async fn churn_probability(&self, user_id: &str) -> Result<Option<f64>> {
        self.check_online()?;
        Ok(self.scores.get(user_id).copied())
    }

    async fn events(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>> {
        self.check_online()?;
        Ok(self
            .events
            .get(user_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.event_time >= since && e.event_time <= until)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
