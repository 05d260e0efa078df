use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerPresence {
    pub username: String,
    pub last_seen: DateTime<Utc>,
    pub is_available: bool,
}

impl PlayerPresence {
    pub fn online(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            last_seen: now,
            is_available: true,
        }
    }
}
