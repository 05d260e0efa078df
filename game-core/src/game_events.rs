use game_types::{
    GameId, GameRecord, Invitation, InvitationId, Notification, PlayerPresence, Room, RoundWinner,
    Side,
};

/// Everything a front-end needs to redraw after the session changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    OnlinePlayersUpdated {
        players: Vec<PlayerPresence>,
    },
    InvitationsUpdated {
        invitations: Vec<Invitation>,
    },
    /// An invitation opened through an invite link.
    InvitationHighlighted {
        invitation_id: InvitationId,
    },
    RoomsUpdated {
        rooms: Vec<Room>,
    },
    GameEntered {
        game: GameRecord,
        side: Side,
    },
    GameUpdated {
        game: GameRecord,
    },
    RoundCompleted {
        game_id: GameId,
        winner: RoundWinner,
    },
    LocationChanged {
        url: String,
    },
    Notification(Notification),
    /// Blocking message the player must acknowledge.
    Alert {
        message: String,
    },
}

impl SessionEvent {
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            SessionEvent::GameEntered { game, .. } => Some(game.id),
            SessionEvent::GameUpdated { game } => Some(game.id),
            SessionEvent::RoundCompleted { game_id, .. } => Some(*game_id),
            _ => None,
        }
    }
}

/// Event handler trait for rendering session events
pub trait SessionEventHandler: Send {
    fn handle_event(&mut self, event: SessionEvent);
}

/// Fans each session event out to every registered handler
pub struct SessionEventBus {
    handlers: Vec<Box<dyn SessionEventHandler>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn publish(&mut self, event: SessionEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new()
    }
}
