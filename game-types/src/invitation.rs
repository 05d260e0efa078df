use crate::InvitationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            "expired" => Ok(InvitationStatus::Expired),
            other => Err(format!("unknown invitation status: {}", other)),
        }
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The answer a player gives to a pending invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvitationResponse {
    Accepted,
    Declined,
}

impl From<InvitationResponse> for InvitationStatus {
    fn from(response: InvitationResponse) -> Self {
        match response {
            InvitationResponse::Accepted => InvitationStatus::Accepted,
            InvitationResponse::Declined => InvitationStatus::Declined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invitation {
    pub id: InvitationId,
    pub from_username: String,
    pub to_username: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Still answerable: pending and not past its expiry.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(status: InvitationStatus, expires_in: Duration) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: 1,
            from_username: "alice".to_string(),
            to_username: "bob".to_string(),
            status,
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[test]
    fn test_open_invitation() {
        let now = Utc::now();
        assert!(invitation(InvitationStatus::Pending, Duration::minutes(5)).is_open_at(now));
        assert!(!invitation(InvitationStatus::Pending, Duration::minutes(-1)).is_open_at(now));
        assert!(!invitation(InvitationStatus::Declined, Duration::minutes(5)).is_open_at(now));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            InvitationStatus::Pending,
            InvitationStatus::Accepted,
            InvitationStatus::Declined,
            InvitationStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<InvitationStatus>(), Ok(status));
        }
        assert!("maybe".parse::<InvitationStatus>().is_err());
        assert!(!InvitationStatus::Pending.is_terminal());
        assert!(InvitationStatus::Expired.is_terminal());
    }
}
