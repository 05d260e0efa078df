use crate::{RankingTable, ScoringEngine, find_category};
use game_types::{ActionRejection, GameState, RoundState, RoundWinner, Side};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// What a category pick did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Scored { score: u32 },
    RoundResolved { score: u32, winner: RoundWinner },
}

impl SelectionOutcome {
    pub fn score(&self) -> u32 {
        match self {
            SelectionOutcome::Scored { score } => *score,
            SelectionOutcome::RoundResolved { score, .. } => *score,
        }
    }
}

/// Applies player actions to a round's state document.
///
/// Every method either mutates the state and returns `Ok`, or leaves it
/// untouched and reports why. Versioning is left to the caller that persists.
pub struct RoundEngine<'a> {
    rankings: &'a RankingTable,
}

impl<'a> RoundEngine<'a> {
    pub fn new(rankings: &'a RankingTable) -> Self {
        Self { rankings }
    }

    /// State of a brand new game.
    pub fn initial_state() -> GameState {
        GameState::default()
    }

    /// Deal `side` a random state that no side has used as a category.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        state: &mut GameState,
        side: Side,
        rng: &mut R,
    ) -> Result<String, ActionRejection> {
        if state.round_state == RoundState::Complete {
            return Err(ActionRejection::RoundComplete);
        }
        if state.side(side).is_complete() {
            return Err(ActionRejection::SideComplete);
        }

        // Entries are compared against used category names as stored, so
        // this only excludes anything when the two sets overlap.
        let used: HashSet<&str> = state
            .player1
            .used_categories
            .iter()
            .chain(state.player2.used_categories.iter())
            .map(String::as_str)
            .collect();
        let available: Vec<&str> = self
            .rankings
            .states()
            .filter(|candidate| !used.contains(candidate))
            .collect();

        let picked = available
            .choose(rng)
            .map(|s| s.to_string())
            .ok_or(ActionRejection::NoStatesAvailable)?;

        let mine = state.side_mut(side);
        mine.current_state = Some(picked.clone());
        mine.is_ready = true;

        if state.player1.is_ready && state.player2.is_ready {
            state.round_state = RoundState::Playing;
        }

        Ok(picked)
    }

    /// Assign the side's rolled state to `category`.
    pub fn select(
        &self,
        state: &mut GameState,
        side: Side,
        category: &str,
    ) -> Result<SelectionOutcome, ActionRejection> {
        if find_category(category).is_none() {
            return Err(ActionRejection::UnknownCategory {
                category: category.to_string(),
            });
        }

        let mine = state.side(side);
        let rolled = mine
            .current_state
            .clone()
            .ok_or(ActionRejection::NoStateRolled)?;
        if mine.has_used(category) {
            return Err(ActionRejection::CategoryAlreadyUsed {
                category: category.to_string(),
            });
        }

        let score = self
            .rankings
            .category_score(category, &rolled)
            .ok_or_else(|| ActionRejection::NoRanking {
                category: category.to_string(),
                state: rolled.clone(),
            })?;

        let mine = state.side_mut(side);
        mine.score = mine.score.saturating_add(score);
        mine.used_categories.push(category.to_string());

        if state.player1.is_complete() && state.player2.is_complete() {
            let winner =
                ScoringEngine::determine_round_winner(state.player1.score, state.player2.score);
            match winner {
                RoundWinner::Player1 => state.player1_wins = state.player1_wins.saturating_add(1),
                RoundWinner::Player2 => state.player2_wins = state.player2_wins.saturating_add(1),
                RoundWinner::Tie => {}
            }
            state.round_winner = Some(winner);
            state.round_state = RoundState::Complete;
            return Ok(SelectionOutcome::RoundResolved { score, winner });
        }

        Ok(SelectionOutcome::Scored { score })
    }

    /// Flip the side's pre-ready flag, returning the new value.
    pub fn toggle_pre_ready(state: &mut GameState, side: Side) -> bool {
        let mine = state.side_mut(side);
        mine.pre_ready = !mine.pre_ready;
        mine.pre_ready
    }

    /// Fresh round state carrying over the cumulative wins and version.
    pub fn next_round(state: &GameState) -> GameState {
        GameState {
            player1_wins: state.player1_wins,
            player2_wins: state.player2_wins,
            version: state.version,
            ..Self::initial_state()
        }
    }
}
