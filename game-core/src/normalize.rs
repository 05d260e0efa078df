use game_types::{CATEGORIES_PER_ROUND, GameState, PlayerRoundState, RoundState, RoundWinner};
use serde_json::Value;
use std::collections::HashSet;

/// Coerce a stored or received `game_state` document into a well-formed
/// [`GameState`].
///
/// Missing or ill-typed fields fall back to their defaults, duplicate
/// categories are dropped and a side never keeps more than eight. Anything
/// that had to be repaired is logged at `warn`.
pub fn normalize_game_state(raw: &Value) -> GameState {
    let Some(doc) = raw.as_object() else {
        if !raw.is_null() {
            tracing::warn!("game_state is not an object, starting from a fresh state");
        }
        return GameState::default();
    };

    GameState {
        player1: normalize_side(doc.get("player1"), "player1"),
        player2: normalize_side(doc.get("player2"), "player2"),
        round_state: parse_enum::<RoundState>(doc.get("roundState"), "roundState")
            .unwrap_or_default(),
        round_winner: parse_enum::<RoundWinner>(doc.get("roundWinner"), "roundWinner"),
        player1_wins: count(doc.get("player1_wins"), "player1_wins"),
        player2_wins: count(doc.get("player2_wins"), "player2_wins"),
        version: doc.get("version").and_then(Value::as_u64).unwrap_or(0),
    }
}

fn normalize_side(raw: Option<&Value>, side: &str) -> PlayerRoundState {
    let Some(doc) = raw.and_then(Value::as_object) else {
        if raw.is_some_and(|v| !v.is_null()) {
            tracing::warn!("{} round state is not an object, resetting it", side);
        }
        return PlayerRoundState::default();
    };

    let current_state = match doc.get("currentState") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    let mut seen = HashSet::new();
    let mut used_categories: Vec<String> = doc
        .get("usedCategories")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .filter(|category| seen.insert(category.to_string()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if used_categories.len() > CATEGORIES_PER_ROUND {
        tracing::warn!(
            "{} has {} used categories, keeping the first {}",
            side,
            used_categories.len(),
            CATEGORIES_PER_ROUND
        );
        used_categories.truncate(CATEGORIES_PER_ROUND);
    }

    PlayerRoundState {
        current_state,
        score: count(doc.get("score"), side),
        used_categories,
        is_ready: truthy(doc.get("isReady")),
        pre_ready: truthy(doc.get("preReady")),
    }
}

/// Non-negative whole count; fractional values are truncated.
fn count(raw: Option<&Value>, field: &str) -> u32 {
    match raw {
        None | Some(Value::Null) => 0,
        Some(value) => match value.as_f64() {
            Some(n) if n.is_finite() && n >= 0.0 => n.min(u32::MAX as f64) as u32,
            _ => {
                tracing::warn!("Ignoring invalid {} value {}", field, value);
                0
            }
        },
    }
}

fn truthy(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        None | Some(Value::Null) => false,
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(raw: Option<&Value>, field: &str) -> Option<T> {
    let value = raw.filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring unknown {} value {}", field, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_document_is_kept() {
        let mut state = GameState::default();
        state.player1.current_state = Some("Texas".to_string());
        state.player1.score = 12;
        state.player1.used_categories = vec!["wind".to_string()];
        state.player2.is_ready = true;
        state.round_state = RoundState::Playing;
        state.player2_wins = 4;
        state.version = 9;

        let raw = serde_json::to_value(&state).unwrap();
        assert_eq!(normalize_game_state(&raw), state);
    }

    #[test]
    fn test_missing_fields_default() {
        let state = normalize_game_state(&json!({}));
        assert_eq!(state, GameState::default());
        assert_eq!(normalize_game_state(&Value::Null), GameState::default());
        assert_eq!(normalize_game_state(&json!("broken")), GameState::default());
    }

    #[test]
    fn test_ill_typed_fields_are_coerced() {
        let raw = json!({
            "player1": {
                "currentState": 17,
                "score": -5,
                "usedCategories": ["wind", "wind", 3, "rainfall"],
                "isReady": 1,
                "preReady": ""
            },
            "player2": "nope",
            "roundState": "sideways",
            "roundWinner": "player2",
            "player1_wins": "two",
            "player2_wins": 3.7
        });

        let state = normalize_game_state(&raw);
        assert_eq!(state.player1.current_state, None);
        assert_eq!(state.player1.score, 0);
        assert_eq!(state.player1.used_categories, vec!["wind", "rainfall"]);
        assert!(state.player1.is_ready);
        assert!(!state.player1.pre_ready);
        assert_eq!(state.player2, PlayerRoundState::default());
        assert_eq!(state.round_state, RoundState::Waiting);
        assert_eq!(state.round_winner, Some(RoundWinner::Player2));
        assert_eq!(state.player1_wins, 0);
        assert_eq!(state.player2_wins, 3);
        assert_eq!(state.version, 0);
    }

    #[test]
    fn test_used_categories_are_truncated() {
        let raw = json!({
            "player2": {
                "usedCategories": ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]
            }
        });
        let state = normalize_game_state(&raw);
        assert_eq!(state.player2.used_categories.len(), CATEGORIES_PER_ROUND);
        assert_eq!(state.player2.used_categories.last().unwrap(), "h");
    }
}
