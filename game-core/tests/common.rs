#![allow(dead_code)]

use game_core::{CATEGORIES, RankingTable, RoundEngine, SessionEvent, SessionEventHandler};
use game_types::{GameState, Side};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};

/// Rankings where every category ranks the states in the same order, so a
/// state's total is simply eight times its rank.
pub fn create_uniform_rankings(states: &[(&str, u32)]) -> RankingTable {
    let flags: serde_json::Map<String, serde_json::Value> = states
        .iter()
        .map(|(name, _)| (name.to_string(), serde_json::Value::from(&name[..2])))
        .collect();
    let per_category: serde_json::Map<String, serde_json::Value> = states
        .iter()
        .map(|(name, rank)| (name.to_string(), serde_json::Value::from(*rank)))
        .collect();
    let rankings: serde_json::Map<String, serde_json::Value> = CATEGORIES
        .iter()
        .map(|c| (c.name.to_string(), serde_json::Value::Object(per_category.clone())))
        .collect();

    let doc = serde_json::json!({ "states": flags, "rankings": rankings });
    RankingTable::from_json(&doc.to_string()).unwrap()
}

/// Creates the standard four-state test table
pub fn create_test_rankings() -> RankingTable {
    create_uniform_rankings(&[("Arizona", 5), ("Florida", 7), ("Nevada", 2), ("Vermont", 120)])
}

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

/// Roll for both sides, then have each side fill every category with the
/// state it rolled.
pub fn play_full_round(engine: &RoundEngine, state: &mut GameState, rng: &mut StdRng) {
    engine.roll(state, Side::Player1, rng).unwrap();
    engine.roll(state, Side::Player2, rng).unwrap();
    for category in CATEGORIES.iter() {
        engine.select(state, Side::Player1, category.name).unwrap();
        engine.select(state, Side::Player2, category.name).unwrap();
    }
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl SessionEventHandler for EventCollector {
    fn handle_event(&mut self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
