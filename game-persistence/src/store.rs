use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_types::{
    GameId, GameRecord, GameState, Invitation, InvitationId, InvitationStatus, PlayerPresence, Room,
};

#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Insert or refresh the row, marking the player available.
    async fn upsert(&self, username: &str, now: DateTime<Utc>) -> Result<PlayerPresence>;

    /// Refresh `last_seen`. Returns false when there is no row.
    async fn touch(&self, username: &str, now: DateTime<Utc>) -> Result<bool>;

    async fn set_available(&self, username: &str, available: bool) -> Result<bool>;

    async fn remove(&self, username: &str) -> Result<bool>;

    /// Players other than `exclude` seen at or after `since`, newest first.
    async fn list_active(&self, exclude: &str, since: DateTime<Utc>) -> Result<Vec<PlayerPresence>>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn create(
        &self,
        from: &str,
        to: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Invitation>;

    async fn find(&self, id: InvitationId) -> Result<Option<Invitation>>;

    async fn set_status(
        &self,
        id: InvitationId,
        status: InvitationStatus,
    ) -> Result<Option<Invitation>>;

    /// Flip every pending invitation past its deadline to `expired`,
    /// returning the rows that changed.
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<Invitation>>;

    /// Open invitations addressed to `to`, newest first. Sweeps first.
    async fn list_pending_for(&self, to: &str, now: DateTime<Utc>) -> Result<Vec<Invitation>>;
}

/// Result of a version-checked game write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Applied(GameRecord),
    /// Someone else wrote first; carries the stored record.
    Conflict(GameRecord),
    Missing,
}

#[async_trait]
pub trait GameRecordStore: Send + Sync {
    async fn create(
        &self,
        player1: &str,
        player2: &str,
        state: &GameState,
        now: DateTime<Utc>,
    ) -> Result<GameRecord>;

    async fn find(&self, id: GameId) -> Result<Option<GameRecord>>;

    /// Take the open seat for `username`. `None` if the seat was already taken.
    async fn claim_open_seat(&self, id: GameId, username: &str) -> Result<Option<GameRecord>>;

    /// Write `state` if the stored version still equals `expected_version`.
    async fn update_state(
        &self,
        id: GameId,
        state: &GameState,
        expected_version: u64,
    ) -> Result<WriteOutcome>;

    /// Like `update_state`, also incrementing `current_round`.
    async fn advance_round(
        &self,
        id: GameId,
        state: &GameState,
        expected_version: u64,
    ) -> Result<WriteOutcome>;
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Room>>;

    async fn set_status(&self, name: &str, status: &str) -> Result<Room>;
}
