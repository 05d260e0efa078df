use chrono::Utc;
use game_core::{RoundEngine, SessionEvent};
use game_types::{
    GameId, GameRecord, Invitation, InvitationId, Notification, OPEN_SEAT,
    normalize_name,
};
use tracing::{debug, info};

use super::MultiplayerSession;
use crate::deep_link::{GAME_PARAM, INVITE_PARAM};
use crate::error::SessionError;

impl MultiplayerSession {
    /// Surface the invitation named by the `inviteId` link parameter.
    pub async fn process_invite_link(&self) -> Result<Option<Invitation>, SessionError> {
        let Some(raw) = self.location().await.param(INVITE_PARAM) else {
            return Ok(None);
        };
        let me = self.require_username().await?;

        let Ok(invitation_id) = raw.parse::<InvitationId>() else {
            self.notify(Notification::error("Invite link is expired or invalid"));
            return Ok(None);
        };
        let Some(invitation) = self
            .stores
            .invitations
            .find(invitation_id)
            .await
            .map_err(|e| self.store_failure("load the invite link", e))?
        else {
            debug!("Invite link points at missing invitation {}", invitation_id);
            return Ok(None);
        };

        if !invitation.is_open_at(Utc::now()) {
            self.notify(Notification::error("Invite link is expired or invalid"));
            return Ok(None);
        }
        if normalize_name(&invitation.to_username) != normalize_name(&me) {
            self.notify(Notification::info(format!(
                "This invite is for {}.",
                invitation.to_username
            )));
            return Ok(None);
        }

        self.emit(SessionEvent::InvitationHighlighted { invitation_id });
        Ok(Some(invitation))
    }

    /// Enter the game named by the `gameId` link parameter, taking its open
    /// seat when the player is not yet part of it.
    pub async fn process_game_link(&self) -> Result<Option<GameRecord>, SessionError> {
        let Some(game_id) = self.location().await.game_id() else {
            return Ok(None);
        };
        let me = self.require_username().await?;

        let Some(game) = self.load_game(game_id).await? else {
            debug!("Game link points at missing game {}", game_id);
            return Ok(None);
        };

        let game = if game.involves(&me) {
            game
        } else if game.has_open_seat() {
            let claimed = self
                .stores
                .games
                .claim_open_seat(game_id, &me)
                .await
                .map_err(|e| self.store_failure("join the game", e))?;
            match claimed {
                Some(game) => {
                    info!("{} took the open seat in game {}", me, game_id);
                    game
                }
                None => return Ok(self.reject_game_link()),
            }
        } else {
            return Ok(self.reject_game_link());
        };

        self.enter_game(game.clone()).await?;
        Ok(Some(game))
    }

    /// Create a game with an open seat, enter it and return a link to share.
    pub async fn create_game_link(&self) -> Result<String, SessionError> {
        let me = self.require_username().await?;
        let game = self
            .stores
            .games
            .create(&me, OPEN_SEAT, &RoundEngine::initial_state(), Utc::now())
            .await
            .map_err(|e| self.store_failure("create a game link", e))?;

        self.enter_game(game.clone()).await?;
        let link = self.location().await.share(GAME_PARAM, &game.id.to_string());
        self.notify(Notification::success("Game link created"));
        Ok(link)
    }

    async fn load_game(&self, game_id: GameId) -> Result<Option<GameRecord>, SessionError> {
        self.stores
            .games
            .find(game_id)
            .await
            .map_err(|e| self.store_failure("load the game link", e))
    }

    fn reject_game_link(&self) -> Option<GameRecord> {
        self.notify(Notification::error("You are not part of this game link."));
        None
    }
}
