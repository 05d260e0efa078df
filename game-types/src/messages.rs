use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameRecord, GameState, Invitation};

/// Payload of the `state` event on a game's broadcast topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncMessage {
    pub game_state: GameState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-level change published by a store after a successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum RowChange {
    OnlinePlayers { kind: ChangeKind, username: String },
    GameInvitations { kind: ChangeKind, invitation: Invitation },
    MultiplayerGames { kind: ChangeKind, game: GameRecord },
}

impl RowChange {
    pub fn table(&self) -> &'static str {
        match self {
            RowChange::OnlinePlayers { .. } => "online_players",
            RowChange::GameInvitations { .. } => "game_invitations",
            RowChange::MultiplayerGames { .. } => "multiplayer_games",
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            RowChange::OnlinePlayers { kind, .. } => *kind,
            RowChange::GameInvitations { kind, .. } => *kind,
            RowChange::MultiplayerGames { kind, .. } => *kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Toast-style message for the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}
