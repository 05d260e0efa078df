mod common;

use common::*;
use game_core::{
    ExpiryPolicy, RoundEngine, SessionEvent, SessionEventBus, normalize_game_state,
};
use game_types::{RoundState, RoundWinner, Side};

#[test]
fn test_full_round_resolves() {
    let rankings = create_test_rankings();
    let engine = RoundEngine::new(&rankings);
    let mut rng = seeded_rng();
    let mut state = RoundEngine::initial_state();

    play_full_round(&engine, &mut state, &mut rng);

    assert_eq!(state.round_state, RoundState::Complete);
    assert_eq!(state.player1.used_categories.len(), 8);
    assert_eq!(state.player2.used_categories.len(), 8);

    let expected = match state.player1.score.cmp(&state.player2.score) {
        std::cmp::Ordering::Less => RoundWinner::Player1,
        std::cmp::Ordering::Greater => RoundWinner::Player2,
        std::cmp::Ordering::Equal => RoundWinner::Tie,
    };
    assert_eq!(state.round_winner, Some(expected));
    assert_eq!(state.player1_wins + state.player2_wins, u32::from(expected != RoundWinner::Tie));
}

#[test]
fn test_scores_are_capped_per_category() {
    let rankings = create_uniform_rankings(&[("Vermont", 120)]);
    let engine = RoundEngine::new(&rankings);
    let mut rng = seeded_rng();
    let mut state = RoundEngine::initial_state();

    play_full_round(&engine, &mut state, &mut rng);

    assert_eq!(state.player1.score, 800);
    assert_eq!(state.player2.score, 800);
    assert_eq!(state.round_winner, Some(RoundWinner::Tie));
}

#[test]
fn test_wins_accumulate_across_rounds() {
    let rankings = create_test_rankings();
    let engine = RoundEngine::new(&rankings);
    let mut rng = seeded_rng();
    let mut state = RoundEngine::initial_state();
    let mut previous = (0, 0);

    for _ in 0..5 {
        play_full_round(&engine, &mut state, &mut rng);
        let wins = (state.player1_wins, state.player2_wins);
        assert!(wins.0 >= previous.0 && wins.1 >= previous.1);
        previous = wins;

        state = RoundEngine::next_round(&state);
        assert_eq!(state.round_state, RoundState::Waiting);
        assert!(state.player1.used_categories.is_empty());
        assert_eq!((state.player1_wins, state.player2_wins), previous);
    }
}

#[test]
fn test_state_survives_document_round_trip() {
    let rankings = create_test_rankings();
    let engine = RoundEngine::new(&rankings);
    let mut rng = seeded_rng();
    let mut state = RoundEngine::initial_state();

    engine.roll(&mut state, Side::Player2, &mut rng).unwrap();
    engine.select(&mut state, Side::Player2, "sunshine").unwrap();
    state.version = 3;

    let stored = serde_json::to_value(&state).unwrap();
    assert_eq!(normalize_game_state(&stored), state);
}

#[test]
fn test_event_bus_with_collector() {
    let collector = EventCollector::new();
    let mut bus = SessionEventBus::default();
    bus.add_handler(Box::new(collector.clone()));

    bus.publish(SessionEvent::RoundCompleted {
        game_id: 1,
        winner: RoundWinner::Player1,
    });
    bus.publish(SessionEvent::Alert {
        message: "No more states available!".to_string(),
    });

    assert_eq!(collector.event_count(), 2);
    assert!(collector.has_event_type(|e| matches!(e, SessionEvent::Alert { .. })));
    assert_eq!(collector.get_events()[0].game_id(), Some(1));
}

#[test]
fn test_expiry_policy_defaults() {
    let policy = ExpiryPolicy::default();
    assert_eq!(policy.invitation_ttl, chrono::Duration::minutes(5));
    assert_eq!(policy.presence_window, chrono::Duration::minutes(30));
}
