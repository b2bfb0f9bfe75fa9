//! User Data Sources
//!
//! Abstraction over where churn scores and event logs come from. The
//! production deployment reads them from the analytics warehouse through
//! `MySqlDataSource` (feature `mysql`); the in-memory source serves tests
//! and demos.

mod memory;
#[cfg(feature = "mysql")]
mod mysql;

pub use memory::MemoryDataSource;
#[cfg(feature = "mysql")]
pub use mysql::{MySqlDataSource, event_from_columns};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::UserEvent;

/// Read access to model scores and event logs
#[async_trait]
pub trait UserDataSource: Send + Sync {
    /// Churn probability from the trained model, if the user has been scored
    async fn churn_probability(&self, user_id: &str) -> Result<Option<f64>>;

    /// Events for a user with `since <= event_time <= until`, oldest first
    async fn events(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>>;

    /// Source name, for logs
    fn name(&self) -> &str;
}
