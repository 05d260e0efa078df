use chrono::{DateTime, Duration, Utc};

/// Time windows for invitations and presence rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub invitation_ttl: Duration, // 5 minutes to answer
    pub presence_window: Duration, // 30 minutes since last heartbeat
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            invitation_ttl: Duration::minutes(5),
            presence_window: Duration::minutes(30),
        }
    }
}

impl ExpiryPolicy {
    pub fn new(invitation_ttl: Duration, presence_window: Duration) -> Self {
        Self {
            invitation_ttl,
            presence_window,
        }
    }

    pub fn invitation_expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.invitation_ttl
    }

    /// Oldest `last_seen` still listed as online.
    pub fn presence_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.presence_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = ExpiryPolicy::default();
        let now = Utc::now();
        assert_eq!(policy.invitation_expires_at(now) - now, Duration::minutes(5));
        assert_eq!(now - policy.presence_cutoff(now), Duration::minutes(30));
    }
}
