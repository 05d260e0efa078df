use game_core::SessionEvent;
use game_types::{
    ChangeKind, GameId, GameRecord, GameState, Invitation, InvitationStatus, Notification,
    RoundState, RoundWinner, RowChange, normalize_name,
};
use tracing::debug;

use super::{MultiplayerSession, RefreshTrigger};
use crate::error::SessionError;

impl MultiplayerSession {
    /// React to a row written by any session sharing the stores.
    pub async fn handle_row_change(&self, change: RowChange) -> Result<(), SessionError> {
        let me = {
            let state = self.state.read().await;
            match (&state.username, state.online) {
                (Some(me), true) => me.clone(),
                _ => return Ok(()),
            }
        };

        match &change {
            RowChange::GameInvitations { kind, invitation } => {
                if let Some(notification) = invitation_notice(*kind, invitation, &me) {
                    self.notify(notification);
                }
            }
            RowChange::MultiplayerGames {
                kind: ChangeKind::Insert,
                game,
            } if game.involves(&me) => {
                self.enter_game(game.clone()).await?;
            }
            RowChange::MultiplayerGames {
                kind: ChangeKind::Update,
                game,
            } => {
                self.apply_store_record(game.clone()).await;
            }
            _ => {}
        }

        // Game rows are already applied above; lobby rows need a reload
        match change {
            RowChange::OnlinePlayers { .. } | RowChange::GameInvitations { .. } => {
                self.refresh(RefreshTrigger::Subscription).await
            }
            RowChange::MultiplayerGames { .. } => Ok(()),
        }
    }

    /// Apply a state received on the sync channel. Returns whether it was taken.
    pub async fn apply_remote_state(&self, game_id: GameId, remote: GameState) -> bool {
        let events = {
            let mut state = self.state.write().await;
            let Some(current) = state.current_game.as_mut() else {
                return false;
            };
            if current.id != game_id {
                debug!("Dropping state for game {}, current is {}", game_id, current.id);
                return false;
            }
            if remote.version <= current.game_state.version {
                debug!(
                    "Ignoring stale state v{} for game {} (have v{})",
                    remote.version, game_id, current.game_state.version
                );
                return false;
            }

            let completed = round_completed(&current.game_state, &remote);
            current.player1_wins = remote.player1_wins;
            current.player2_wins = remote.player2_wins;
            current.game_state = remote;
            game_events(current.clone(), completed)
        };

        self.emit_all(events);
        true
    }

    /// Adopt a stored record of the current game unless it is older than what
    /// the session already holds.
    pub(crate) async fn apply_store_record(&self, record: GameRecord) {
        let events = {
            let mut state = self.state.write().await;
            let Some(current) = state.current_game.as_ref() else {
                return;
            };
            if current.id != record.id
                || record.game_state.version < current.game_state.version
                || *current == record
            {
                return;
            }

            let completed = round_completed(&current.game_state, &record.game_state);
            state.current_game = Some(record.clone());
            game_events(record, completed)
        };

        self.emit_all(events);
    }
}

fn invitation_notice(kind: ChangeKind, invitation: &Invitation, me: &str) -> Option<Notification> {
    let me = normalize_name(me);
    let to_me = normalize_name(&invitation.to_username) == me;
    let from_me = normalize_name(&invitation.from_username) == me;

    match (kind, invitation.status) {
        (ChangeKind::Insert, InvitationStatus::Pending) if to_me => Some(Notification::info(
            format!("{} has challenged you!", invitation.from_username),
        )),
        (ChangeKind::Update, InvitationStatus::Accepted) if from_me => Some(
            Notification::success(format!("{} accepted your challenge!", invitation.to_username)),
        ),
        (ChangeKind::Update, InvitationStatus::Declined) if from_me => Some(Notification::info(
            format!("{} declined your challenge", invitation.to_username),
        )),
        (ChangeKind::Update, InvitationStatus::Expired) if from_me => Some(Notification::info(
            format!("Your invite to {} expired", invitation.to_username),
        )),
        _ => None,
    }
}

/// The winner, when `after` is the first state to show the round complete.
fn round_completed(before: &GameState, after: &GameState) -> Option<RoundWinner> {
    if before.round_state == RoundState::Complete || after.round_state != RoundState::Complete {
        return None;
    }
    after.round_winner
}

fn game_events(game: GameRecord, completed: Option<RoundWinner>) -> Vec<SessionEvent> {
    let game_id = game.id;
    let mut events = vec![SessionEvent::GameUpdated { game }];
    if let Some(winner) = completed {
        events.push(SessionEvent::RoundCompleted { game_id, winner });
    }
    events
}
