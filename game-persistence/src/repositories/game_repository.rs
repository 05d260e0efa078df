use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::Expr,
};

use crate::change_feed::ChangeFeed;
use crate::entities::{multiplayer_games, prelude::*};
use crate::store::{GameRecordStore, WriteOutcome};
use game_core::normalize_game_state;
use game_types::{ChangeKind, GAME_STATUS_ACTIVE, GameId, GameRecord, GameState, OPEN_SEAT, RowChange};

pub struct GameRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

/// Counters are unsigned in the document but signed in their columns.
fn to_column<T, U>(value: T, column: &str) -> Result<U>
where
    T: Copy + std::fmt::Display,
    U: TryFrom<T>,
{
    U::try_from(value)
        .ok()
        .with_context(|| format!("{} {} does not fit its column", column, value))
}

impl GameRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    fn model_to_record(model: multiplayer_games::Model) -> GameRecord {
        let mut game_state = normalize_game_state(&model.game_state);
        game_state.version = model.state_version.max(0) as u64;

        GameRecord {
            id: model.id,
            player1: model.player1,
            player2: model.player2,
            current_round: model.current_round.max(0) as u32,
            player1_wins: model.player1_wins.max(0) as u32,
            player2_wins: model.player2_wins.max(0) as u32,
            game_state,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    fn publish(&self, kind: ChangeKind, game: &GameRecord) {
        self.feed.publish(RowChange::MultiplayerGames {
            kind,
            game: game.clone(),
        });
    }

    /// Conditional write keyed on the stored version. The caller has already
    /// set `state.version` to the version being written.
    async fn write_state(
        &self,
        id: GameId,
        state: &GameState,
        expected_version: u64,
        advance_round: bool,
    ) -> Result<WriteOutcome> {
        let document = serde_json::to_value(state)?;
        let version: i64 = to_column(state.version, "state_version")?;
        let player1_wins: i32 = to_column(state.player1_wins, "player1_wins")?;
        let player2_wins: i32 = to_column(state.player2_wins, "player2_wins")?;
        let expected: i64 = to_column(expected_version, "expected version")?;

        let mut update = MultiplayerGames::update_many()
            .col_expr(multiplayer_games::Column::GameState, Expr::value(document))
            .col_expr(
                multiplayer_games::Column::StateVersion,
                Expr::value(version),
            )
            .col_expr(
                multiplayer_games::Column::Player1Wins,
                Expr::value(player1_wins),
            )
            .col_expr(
                multiplayer_games::Column::Player2Wins,
                Expr::value(player2_wins),
            )
            .col_expr(multiplayer_games::Column::UpdatedAt, Expr::value(Utc::now()));
        if advance_round {
            update = update.col_expr(
                multiplayer_games::Column::CurrentRound,
                Expr::col(multiplayer_games::Column::CurrentRound).add(1),
            );
        }

        let result = update
            .filter(multiplayer_games::Column::Id.eq(id))
            .filter(multiplayer_games::Column::StateVersion.eq(expected))
            .exec(&self.db)
            .await?;

        let stored = self.find(id).await?;
        let outcome = match (result.rows_affected, stored) {
            (_, None) => WriteOutcome::Missing,
            (0, Some(current)) => {
                tracing::debug!(
                    "Game {} write at version {} lost to version {}",
                    id,
                    expected_version,
                    current.game_state.version
                );
                WriteOutcome::Conflict(current)
            }
            (_, Some(updated)) => {
                self.publish(ChangeKind::Update, &updated);
                WriteOutcome::Applied(updated)
            }
        };
        Ok(outcome)
    }
}

#[async_trait]
impl GameRecordStore for GameRepository {
    async fn create(
        &self,
        player1: &str,
        player2: &str,
        state: &GameState,
        now: DateTime<Utc>,
    ) -> Result<GameRecord> {
        let row = multiplayer_games::ActiveModel {
            id: ActiveValue::NotSet,
            player1: ActiveValue::Set(player1.to_string()),
            player2: ActiveValue::Set(player2.to_string()),
            current_round: ActiveValue::Set(1),
            player1_wins: ActiveValue::Set(to_column(state.player1_wins, "player1_wins")?),
            player2_wins: ActiveValue::Set(to_column(state.player2_wins, "player2_wins")?),
            game_state: ActiveValue::Set(serde_json::to_value(state)?),
            state_version: ActiveValue::Set(to_column(state.version, "state_version")?),
            status: ActiveValue::Set(GAME_STATUS_ACTIVE.to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let saved = row.insert(&self.db).await?;
        let game = Self::model_to_record(saved);
        tracing::info!("Game {} created: {} vs {}", game.id, game.player1, game.player2);

        self.publish(ChangeKind::Insert, &game);
        Ok(game)
    }

    async fn find(&self, id: GameId) -> Result<Option<GameRecord>> {
        let model = MultiplayerGames::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Self::model_to_record))
    }

    async fn claim_open_seat(&self, id: GameId, username: &str) -> Result<Option<GameRecord>> {
        let result = MultiplayerGames::update_many()
            .col_expr(multiplayer_games::Column::Player2, Expr::value(username))
            .col_expr(multiplayer_games::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(multiplayer_games::Column::Id.eq(id))
            .filter(multiplayer_games::Column::Player2.eq(OPEN_SEAT))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let claimed = self.find(id).await?;
        if let Some(game) = &claimed {
            tracing::info!("{} claimed the open seat in game {}", username, id);
            self.publish(ChangeKind::Update, game);
        }
        Ok(claimed)
    }

    async fn update_state(
        &self,
        id: GameId,
        state: &GameState,
        expected_version: u64,
    ) -> Result<WriteOutcome> {
        self.write_state(id, state, expected_version, false).await
    }

    async fn advance_round(
        &self,
        id: GameId,
        state: &GameState,
        expected_version: u64,
    ) -> Result<WriteOutcome> {
        self.write_state(id, state, expected_version, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use game_types::RoundState;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> (GameRepository, ChangeFeed) {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let feed = ChangeFeed::default();
        (GameRepository::new(db, feed.clone()), feed)
    }

    fn bumped(state: &GameState) -> GameState {
        let mut next = state.clone();
        next.version += 1;
        next
    }

    #[tokio::test]
    async fn test_create_game() {
        let (repo, feed) = setup_test_db().await;
        let mut changes = feed.subscribe();

        let game = repo
            .create("alice", "bob", &GameState::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(game.current_round, 1);
        assert_eq!(game.status, GAME_STATUS_ACTIVE);
        assert_eq!(game.game_state, GameState::default());

        let found = repo.find(game.id).await.unwrap().unwrap();
        assert_eq!(found.player2, "bob");
        assert_eq!(changes.recv().await.unwrap().kind(), ChangeKind::Insert);
    }

    #[tokio::test]
    async fn test_update_is_version_checked() {
        let (repo, _feed) = setup_test_db().await;
        let game = repo
            .create("alice", "bob", &GameState::default(), Utc::now())
            .await
            .unwrap();

        let mut first = bumped(&game.game_state);
        first.player1.is_ready = true;
        let applied = repo.update_state(game.id, &first, 0).await.unwrap();
        let WriteOutcome::Applied(stored) = applied else {
            panic!("expected the first write to apply");
        };
        assert_eq!(stored.game_state, first);

        // A second writer still on version 0 loses and sees the winner's state
        let mut second = bumped(&game.game_state);
        second.player2.is_ready = true;
        match repo.update_state(game.id, &second, 0).await.unwrap() {
            WriteOutcome::Conflict(current) => {
                assert_eq!(current.game_state.version, 1);
                assert!(current.game_state.player1.is_ready);
                assert!(!current.game_state.player2.is_ready);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        assert_eq!(
            repo.update_state(game.id + 50, &second, 0).await.unwrap(),
            WriteOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_advance_round_keeps_wins() {
        let (repo, _feed) = setup_test_db().await;
        let game = repo
            .create("alice", "bob", &GameState::default(), Utc::now())
            .await
            .unwrap();

        let mut finished = bumped(&game.game_state);
        finished.round_state = RoundState::Complete;
        finished.player2_wins = 1;
        repo.update_state(game.id, &finished, 0).await.unwrap();

        let next = GameState {
            player2_wins: 1,
            version: 2,
            ..GameState::default()
        };
        let WriteOutcome::Applied(advanced) = repo.advance_round(game.id, &next, 1).await.unwrap()
        else {
            panic!("expected the round to advance");
        };
        assert_eq!(advanced.current_round, 2);
        assert_eq!(advanced.player2_wins, 1);
        assert_eq!(advanced.game_state.round_state, RoundState::Waiting);
    }

    #[tokio::test]
    async fn test_oversized_counters_are_refused() {
        let (repo, _feed) = setup_test_db().await;
        let game = repo
            .create("alice", "bob", &GameState::default(), Utc::now())
            .await
            .unwrap();

        let mut huge = bumped(&game.game_state);
        huge.player1_wins = u32::MAX;
        assert!(repo.update_state(game.id, &huge, 0).await.is_err());

        let stored = repo.find(game.id).await.unwrap().unwrap();
        assert_eq!(stored.player1_wins, 0);
        assert_eq!(stored.game_state.version, 0);

        let huge = GameState {
            version: u64::MAX,
            ..GameState::default()
        };
        assert!(repo.create("alice", "bob", &huge, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_claim_open_seat_once() {
        let (repo, _feed) = setup_test_db().await;
        let game = repo
            .create("alice", OPEN_SEAT, &GameState::default(), Utc::now())
            .await
            .unwrap();
        assert!(game.has_open_seat());

        let claimed = repo.claim_open_seat(game.id, "bob").await.unwrap().unwrap();
        assert_eq!(claimed.player2, "bob");
        assert!(repo.claim_open_seat(game.id, "carol").await.unwrap().is_none());
    }
}
