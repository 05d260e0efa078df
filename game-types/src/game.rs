use crate::GameId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Placeholder opponent name on a game created from a shareable link.
pub const OPEN_SEAT: &str = "TBD";

pub const GAME_STATUS_ACTIVE: &str = "active";

/// Number of categories each side fills before a round can resolve.
pub const CATEGORIES_PER_ROUND: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Player1 => "player1",
            Side::Player2 => "player2",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RoundState {
    #[default]
    Waiting,
    Rolling,
    Playing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RoundWinner {
    Player1,
    Player2,
    Tie,
}

impl From<Side> for RoundWinner {
    fn from(side: Side) -> Self {
        match side {
            Side::Player1 => RoundWinner::Player1,
            Side::Player2 => RoundWinner::Player2,
        }
    }
}

/// One side's progress through the current round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoundState {
    pub current_state: Option<String>,
    pub score: u32,
    pub used_categories: Vec<String>,
    pub is_ready: bool,
    pub pre_ready: bool,
}

impl PlayerRoundState {
    pub fn has_used(&self, category: &str) -> bool {
        self.used_categories.iter().any(|c| c == category)
    }

    pub fn is_complete(&self) -> bool {
        self.used_categories.len() >= CATEGORIES_PER_ROUND
    }
}

/// The document stored in `multiplayer_games.game_state` and carried on the
/// sync channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player1: PlayerRoundState,
    pub player2: PlayerRoundState,
    pub round_state: RoundState,
    pub round_winner: Option<RoundWinner>,
    #[serde(rename = "player1_wins")]
    pub player1_wins: u32,
    #[serde(rename = "player2_wins")]
    pub player2_wins: u32,
    /// Bumped on every persisted mutation; lower versions are stale.
    pub version: u64,
}

impl GameState {
    pub fn side(&self, side: Side) -> &PlayerRoundState {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut PlayerRoundState {
        match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameRecord {
    pub id: GameId,
    pub player1: String,
    pub player2: String,
    pub current_round: u32,
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub game_state: GameState,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trimmed, lower-cased form used for every username comparison.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl GameRecord {
    /// Resolve which side `username` plays. Identity is the name alone, so two
    /// people sharing a name are indistinguishable; a name matching both seats
    /// resolves to player1.
    pub fn side_of(&self, username: &str) -> Option<Side> {
        let me = normalize_name(username);
        if me.is_empty() {
            return None;
        }
        if me == normalize_name(&self.player1) {
            Some(Side::Player1)
        } else if me == normalize_name(&self.player2) {
            Some(Side::Player2)
        } else {
            None
        }
    }

    pub fn involves(&self, username: &str) -> bool {
        self.side_of(username).is_some()
    }

    pub fn has_open_seat(&self) -> bool {
        self.player2 == OPEN_SEAT
    }

    pub fn player_name(&self, side: Side) -> &str {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    pub fn channel_topic(&self) -> String {
        channel_topic(self.id)
    }
}

/// Broadcast topic for a game's sync channel.
pub fn channel_topic(game_id: GameId) -> String {
    format!("game:{}", game_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(player1: &str, player2: &str) -> GameRecord {
        GameRecord {
            id: 7,
            player1: player1.to_string(),
            player2: player2.to_string(),
            current_round: 1,
            player1_wins: 0,
            player2_wins: 0,
            game_state: GameState::default(),
            status: GAME_STATUS_ACTIVE.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_side_resolution_is_case_insensitive() {
        let game = record("Alice", "bob ");
        assert_eq!(game.side_of("alice"), Some(Side::Player1));
        assert_eq!(game.side_of("  BOB"), Some(Side::Player2));
        assert_eq!(game.side_of("carol"), None);
        assert_eq!(game.side_of(""), None);
    }

    #[test]
    fn test_shared_name_resolves_to_player1() {
        let game = record("Sam", "sam");
        assert_eq!(game.side_of("SAM"), Some(Side::Player1));
    }

    #[test]
    fn test_game_state_document_shape() {
        let mut state = GameState::default();
        state.player1.used_categories.push("tornados".to_string());
        state.round_winner = Some(RoundWinner::Tie);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["roundState"], "waiting");
        assert_eq!(json["roundWinner"], "tie");
        assert_eq!(json["player1"]["usedCategories"][0], "tornados");
        assert_eq!(json["player1"]["currentState"], serde_json::Value::Null);
        assert_eq!(json["player2_wins"], 0);
    }

    #[test]
    fn test_channel_topic() {
        assert_eq!(record("a", OPEN_SEAT).channel_topic(), "game:7");
        assert!(record("a", OPEN_SEAT).has_open_seat());
    }
}
