//! Demo data served when no warehouse source is configured

use chrono::{Duration, Utc};
use retention_advisor::{MemoryDataSource, UserEvent};

/// Three players spanning the risk tiers
pub fn seeded_source() -> MemoryDataSource {
    let now = Utc::now();
    let mut events = Vec::new();

    // lapsing: a handful of logins in the last week
    for day in 1..=4 {
        events.push(UserEvent::new("player-1001", "login", now - Duration::days(day), Some("login")));
    }

    // steady evening player
    for i in 0..60 {
        let activity = if i % 3 == 0 { "dungeon" } else { "pvp" };
        events.push(UserEvent::new("player-1002", "battle", now - Duration::hours(i * 2), Some(activity)));
    }

    // heavy player
    for i in 0..150 {
        let activity = match i % 4 {
            0 => "guild",
            1 => "dungeon",
            _ => "pvp",
        };
        events.push(UserEvent::new("player-1003", "battle", now - Duration::minutes(i * 30), Some(activity)));
    }

    MemoryDataSource::new()
        .with_churn_score("player-1001", 0.86)
        .with_churn_score("player-1002", 0.55)
        .with_churn_score("player-1003", 0.12)
        .with_events(events)
}
