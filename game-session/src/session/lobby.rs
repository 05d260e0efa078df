use chrono::Utc;
use game_core::{RoundEngine, SessionEvent};
use game_types::{
    ActionRejection, GameRecord, Invitation, InvitationId, InvitationResponse, InvitationStatus,
    Notification, ROOM_NAMES, Room, normalize_name,
};
use tracing::{debug, info};

use super::{MultiplayerSession, RefreshTrigger};
use crate::deep_link::{INVITE_PARAM, ROOM_PARAM};
use crate::error::SessionError;

const SELF_CHALLENGE: &str = "You cannot challenge yourself!";

impl MultiplayerSession {
    /// Publish presence for `username`, load the lobby, then follow any
    /// invite or game link in the session's address.
    pub async fn go_online(&self, username: &str) -> Result<(), SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::NotOnline);
        }

        self.stores
            .presence
            .upsert(username, Utc::now())
            .await
            .map_err(|e| self.store_failure("go online", e))?;

        {
            let mut state = self.state.write().await;
            state.username = Some(username.to_string());
            state.online = true;
        }
        info!("{} is online", username);

        self.refresh(RefreshTrigger::Manual).await?;
        self.process_invite_link().await?;
        self.process_game_link().await?;
        Ok(())
    }

    pub async fn go_offline(&self) -> Result<(), SessionError> {
        let Some(username) = self.username().await else {
            return Ok(());
        };

        self.stores
            .presence
            .remove(&username)
            .await
            .map_err(|e| self.store_failure("go offline", e))?;
        self.state.write().await.online = false;
        info!("{} went offline", username);
        Ok(())
    }

    pub async fn heartbeat(&self) -> Result<(), SessionError> {
        let username = {
            let state = self.state.read().await;
            match (&state.username, state.online) {
                (Some(username), true) => username.clone(),
                _ => return Ok(()),
            }
        };

        let touched = self.stores.presence.touch(&username, Utc::now()).await?;
        if !touched {
            debug!("No presence row for {} to refresh", username);
        }
        Ok(())
    }

    async fn check_challenge(&self, to: &str) -> Result<String, SessionError> {
        let me = self.require_username().await?;
        if normalize_name(to) == normalize_name(&me) {
            self.alert(SELF_CHALLENGE);
            return Err(ActionRejection::InviteSelf.into());
        }
        Ok(me)
    }

    async fn create_invitation(&self, me: &str, to: &str) -> Result<Invitation, SessionError> {
        let now = Utc::now();
        self.stores
            .invitations
            .create(me, to, self.expiry.invitation_expires_at(now), now)
            .await
            .map_err(|e| self.store_failure(&format!("send challenge to {}", to), e))
    }

    pub async fn send_invitation(&self, to: &str) -> Result<Invitation, SessionError> {
        let to = to.trim();
        let me = self.check_challenge(to).await?;
        let invitation = self.create_invitation(&me, to).await?;

        let minutes = self.expiry.invitation_ttl.num_minutes().max(1);
        self.notify(Notification::success(format!(
            "Challenge sent to {}! (expires in {} min)",
            to, minutes
        )));
        Ok(invitation)
    }

    /// Create an invitation and return a shareable link to it.
    pub async fn copy_invite_link(&self, to: &str) -> Result<String, SessionError> {
        let to = to.trim();
        let me = self.check_challenge(to).await?;
        let invitation = self.create_invitation(&me, to).await?;

        let link = self
            .location()
            .await
            .share(INVITE_PARAM, &invitation.id.to_string());
        self.notify(Notification::success("Invite link created"));
        Ok(link)
    }

    /// Answer an invitation addressed to this player. Accepting starts the
    /// game and enters it.
    pub async fn respond_to_invitation(
        &self,
        invitation_id: InvitationId,
        response: InvitationResponse,
    ) -> Result<Option<GameRecord>, SessionError> {
        let me = self.require_username().await?;
        let now = Utc::now();

        let invitation = self
            .stores
            .invitations
            .find(invitation_id)
            .await
            .map_err(|e| self.store_failure("load invitation", e))?
            .ok_or(ActionRejection::InvitationNotFound { invitation_id })?;

        if normalize_name(&invitation.to_username) != normalize_name(&me) {
            return Err(ActionRejection::NotInvited { invitation_id }.into());
        }
        if invitation.status != InvitationStatus::Pending {
            return Err(ActionRejection::InvitationNotPending { invitation_id }.into());
        }
        if invitation.is_expired_at(now) {
            self.stores
                .invitations
                .set_status(invitation_id, InvitationStatus::Expired)
                .await
                .map_err(|e| self.store_failure("expire invitation", e))?;
            self.notify(Notification::error("This challenge has expired"));
            return Err(ActionRejection::InvitationExpired { invitation_id }.into());
        }

        self.stores
            .invitations
            .set_status(invitation_id, response.into())
            .await
            .map_err(|e| self.store_failure("respond to invitation", e))?;
        info!(
            "{} {:?} invitation {} from {}",
            me, response, invitation_id, invitation.from_username
        );

        match response {
            InvitationResponse::Declined => {
                self.refresh(RefreshTrigger::Manual).await?;
                Ok(None)
            }
            InvitationResponse::Accepted => {
                let game = self
                    .start_game(&invitation.from_username, &invitation.to_username)
                    .await?;
                Ok(Some(game))
            }
        }
    }

    async fn start_game(&self, player1: &str, player2: &str) -> Result<GameRecord, SessionError> {
        let game = self
            .stores
            .games
            .create(player1, player2, &RoundEngine::initial_state(), Utc::now())
            .await
            .map_err(|e| self.store_failure("start game", e))?;
        self.enter_game(game.clone()).await?;
        Ok(game)
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, SessionError> {
        let stored = self
            .stores
            .rooms
            .list()
            .await
            .map_err(|e| self.store_failure("load rooms", e))?;
        let rooms = Room::merge_with_defaults(&stored);

        let changed = {
            let mut state = self.state.write().await;
            let changed = state.rooms != rooms;
            state.rooms = rooms.clone();
            changed
        };
        if changed {
            self.emit(SessionEvent::RoomsUpdated {
                rooms: rooms.clone(),
            });
        }
        Ok(rooms)
    }

    pub async fn join_room(&self, name: &str) -> Result<(), SessionError> {
        let Some(room) = ROOM_NAMES.iter().find(|room| **room == name.trim()) else {
            return Err(ActionRejection::UnknownRoom {
                name: name.to_string(),
            }
            .into());
        };

        let location = self.location().await.with_param(ROOM_PARAM, room);
        self.set_location(location).await;
        self.notify(Notification::info(format!("Joined {}", room)));
        Ok(())
    }

    pub async fn leave_room(&self, name: &str) -> Result<(), SessionError> {
        let location = self.location().await;
        if location.room().as_deref() != Some(name.trim()) {
            return Ok(());
        }

        self.set_location(location.without_param(ROOM_PARAM)).await;
        self.notify(Notification::info(format!("Left {}", name.trim())));
        self.list_rooms().await?;
        Ok(())
    }
}
