use game_types::RoundWinner;

/// Highest score a single category assignment can contribute.
pub const MAX_CATEGORY_SCORE: u32 = 100;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Score for assigning a state to a category: its national rank, capped.
    pub fn category_score(rank: u32) -> u32 {
        rank.min(MAX_CATEGORY_SCORE)
    }

    /// Golf scoring: the strictly lower total takes the round.
    pub fn determine_round_winner(player1_score: u32, player2_score: u32) -> RoundWinner {
        match player1_score.cmp(&player2_score) {
            std::cmp::Ordering::Less => RoundWinner::Player1,
            std::cmp::Ordering::Greater => RoundWinner::Player2,
            std::cmp::Ordering::Equal => RoundWinner::Tie,
        }
    }
}
