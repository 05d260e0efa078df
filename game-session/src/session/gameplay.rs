use game_core::{RoundEngine, SelectionOutcome, SessionEvent, normalize_game_state};
use game_persistence::WriteOutcome;
use game_types::{ActionRejection, GameId, GameRecord, GameState, Side};
use tracing::{debug, info, warn};

use super::{MultiplayerSession, lock};
use crate::deep_link::GAME_PARAM;
use crate::error::SessionError;
use crate::sync::state_payload;

const NO_STATES_LEFT: &str = "No more states available!";

/// A player action is tried against the latest stored state at most this often.
const MAX_WRITE_ATTEMPTS: usize = 2;

impl MultiplayerSession {
    /// Make `game` the current game and join its sync channel.
    pub async fn enter_game(&self, game: GameRecord) -> Result<Side, SessionError> {
        let me = self.require_username().await?;
        let side = game
            .side_of(&me)
            .ok_or(ActionRejection::NotAParticipant { game_id: game.id })?;

        let already_in = {
            let mut state = self.state.write().await;
            match state.current_game.as_ref() {
                Some(current) if current.id == game.id => true,
                _ => {
                    state.current_game = Some(game.clone());
                    false
                }
            }
        };
        if already_in {
            self.apply_store_record(game).await;
            return Ok(side);
        }

        if let Err(e) = self.stores.presence.set_available(&me, false).await {
            warn!("Failed to mark {} unavailable: {:#}", me, e);
        }

        let location = self
            .location()
            .await
            .with_param(GAME_PARAM, &game.id.to_string());
        self.set_location(location).await;

        info!("{} entered game {} as {}", me, game.id, side);
        self.emit(SessionEvent::GameEntered {
            game: game.clone(),
            side,
        });
        self.join_channel(&game).await;
        Ok(side)
    }

    async fn join_channel(&self, game: &GameRecord) {
        self.leave_channel();

        let (sender, mut receiver) = self.hub.join(&game.channel_topic()).await.split();
        let session = self.me.clone();
        let game_id = game.id;
        let listener = tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let Some(session) = session.upgrade() else {
                    break;
                };
                match state_payload(&envelope) {
                    Some(payload) => {
                        let state = normalize_game_state(payload);
                        session.apply_remote_state(game_id, state).await;
                    }
                    None => debug!("Ignoring {} message on game {}", envelope.event, game_id),
                }
            }
        });
        *lock(&self.listener) = Some(listener);

        if let Err(e) = sender.send_state(&game.game_state) {
            warn!("Failed to publish state on joining game {}: {}", game_id, e);
        }
        *lock(&self.channel) = Some(sender);
    }

    pub(crate) fn leave_channel(&self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
        if let Some(sender) = lock(&self.channel).take() {
            debug!("Left sync topic {}", sender.topic());
        }
    }

    /// Publish `state` to the other members of the current game's channel.
    pub fn broadcast(&self, state: &GameState) {
        let sender = lock(&self.channel).clone();
        let Some(sender) = sender else {
            return;
        };
        match sender.send_state(state) {
            Ok(delivered) => debug!("Broadcast v{} to {} peers", state.version, delivered),
            Err(e) => warn!("Broadcast on {} failed: {}", sender.topic(), e),
        }
    }

    pub async fn roll_state(&self, side: Side) -> Result<String, SessionError> {
        let engine = RoundEngine::new(&self.rankings);
        let result = self
            .mutate_game(side, |state, side| {
                engine.roll(state, side, &mut rand::thread_rng())
            })
            .await;

        if let Err(SessionError::Rejected(ActionRejection::NoStatesAvailable)) = &result {
            self.alert(NO_STATES_LEFT);
        }
        let (game, picked) = result?;
        debug!("Game {}: {} rolled {}", game.id, side, picked);
        Ok(picked)
    }

    pub async fn select_category(
        &self,
        side: Side,
        category: &str,
    ) -> Result<SelectionOutcome, SessionError> {
        let engine = RoundEngine::new(&self.rankings);
        let (game, outcome) = self
            .mutate_game(side, |state, side| engine.select(state, side, category))
            .await?;
        debug!(
            "Game {}: {} scored {} in {}",
            game.id,
            side,
            outcome.score(),
            category
        );
        Ok(outcome)
    }

    pub async fn toggle_pre_ready(&self, side: Side) -> Result<bool, SessionError> {
        let (_, ready) = self
            .mutate_game(side, |state, side| {
                Ok(RoundEngine::toggle_pre_ready(state, side))
            })
            .await?;
        Ok(ready)
    }

    /// Persist a whole state document for the current game and broadcast it.
    ///
    /// There is no re-apply here: on a version conflict the stored state is
    /// adopted and the write is reported as lost.
    pub async fn update_game_state(&self, state: GameState) -> Result<GameRecord, SessionError> {
        let (game, _) = self.current_participation(None).await?;
        let expected = game.game_state.version;
        let mut state = state;
        state.version = expected + 1;

        match self.write_state(game.id, &state, expected, false).await? {
            WriteOutcome::Applied(record) => Ok(self.commit(record).await),
            WriteOutcome::Conflict(stored) => {
                self.apply_store_record(stored).await;
                Err(SessionError::Conflict(game.id))
            }
            WriteOutcome::Missing => Err(ActionRejection::GameNotFound { game_id: game.id }.into()),
        }
    }

    /// Start the next round, keeping the win counts.
    pub async fn next_round(&self) -> Result<GameRecord, SessionError> {
        let (game, _) = self.current_participation(None).await?;
        let expected = game.game_state.version;
        let mut state = RoundEngine::next_round(&game.game_state);
        state.version = expected + 1;

        match self.write_state(game.id, &state, expected, true).await? {
            WriteOutcome::Applied(record) => {
                info!("Game {} moved to round {}", record.id, record.current_round);
                Ok(self.commit(record).await)
            }
            // Both players pressing "next" race; the loser sees the round already advanced
            WriteOutcome::Conflict(stored) if stored.current_round > game.current_round => {
                self.apply_store_record(stored.clone()).await;
                Ok(stored)
            }
            WriteOutcome::Conflict(stored) => {
                self.apply_store_record(stored).await;
                Err(SessionError::Conflict(game.id))
            }
            WriteOutcome::Missing => Err(ActionRejection::GameNotFound { game_id: game.id }.into()),
        }
    }

    /// Run `action` against the latest known state for `side`, persist the
    /// result and broadcast it. A version conflict reloads the stored state
    /// and runs `action` once more.
    async fn mutate_game<T, F>(
        &self,
        side: Side,
        mut action: F,
    ) -> Result<(GameRecord, T), SessionError>
    where
        F: FnMut(&mut GameState, Side) -> Result<T, ActionRejection>,
    {
        let mut game_id: Option<GameId> = None;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (game, _) = self.current_participation(Some(side)).await?;
            game_id = Some(game.id);

            let mut state = game.game_state.clone();
            let expected = state.version;
            let value = action(&mut state, side)?;
            state.version = expected + 1;

            match self.write_state(game.id, &state, expected, false).await? {
                WriteOutcome::Applied(record) => {
                    let record = self.commit(record).await;
                    return Ok((record, value));
                }
                WriteOutcome::Conflict(stored) => {
                    warn!(
                        "Game {} moved to v{} under our v{} write (attempt {})",
                        game.id, stored.game_state.version, expected, attempt
                    );
                    self.apply_store_record(stored).await;
                }
                WriteOutcome::Missing => {
                    return Err(ActionRejection::GameNotFound { game_id: game.id }.into());
                }
            }
        }

        Err(match game_id {
            Some(id) => SessionError::Conflict(id),
            None => ActionRejection::NoActiveGame.into(),
        })
    }

    /// The current game and the caller's side in it, optionally insisting on
    /// a particular side.
    async fn current_participation(
        &self,
        requested: Option<Side>,
    ) -> Result<(GameRecord, Side), SessionError> {
        let me = self.require_username().await?;
        let game = self
            .current_game()
            .await
            .ok_or(ActionRejection::NoActiveGame)?;
        let side = game
            .side_of(&me)
            .ok_or(ActionRejection::NotAParticipant { game_id: game.id })?;
        if requested.is_some_and(|requested| requested != side) {
            return Err(ActionRejection::NotYourSide.into());
        }
        Ok((game, side))
    }

    async fn write_state(
        &self,
        id: GameId,
        state: &GameState,
        expected: u64,
        advance_round: bool,
    ) -> Result<WriteOutcome, SessionError> {
        let games = &self.stores.games;
        let outcome = if advance_round {
            games.advance_round(id, state, expected).await
        } else {
            games.update_state(id, state, expected).await
        };
        outcome.map_err(|e| self.store_failure("save the game", e))
    }

    /// Adopt a record we just wrote and tell the other side about it.
    async fn commit(&self, record: GameRecord) -> GameRecord {
        self.apply_store_record(record.clone()).await;
        self.broadcast(&record.game_state);
        debug!("Game {} saved at v{}", record.id, record.game_state.version);
        record
    }
}
