use game_core::{SessionEvent, SessionEventHandler, find_category};
use game_types::{GameRecord, InvitationId, NotificationLevel, RoundState, Side};
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

/// A line typed at the console prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Players,
    Invites,
    Invite(String),
    InviteLink(String),
    GameLink,
    Accept(InvitationId),
    Decline(InvitationId),
    Roll,
    Pick(String),
    Ready,
    Next,
    Game,
    Rooms,
    Join(String),
    Leave(String),
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("not an invitation id: {0}")]
    BadInvitationId(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

pub const HELP: &str = "\
players              list online players
invites              list challenges waiting for you
invite <name>        challenge a player
link <name>          challenge a player and print a shareable link
gamelink             start a game anyone with the link can join
accept <id>          accept a challenge
decline <id>         decline a challenge
roll                 roll a state
pick <category>      place the rolled state in a category
ready                toggle ready for the next round
next                 start the next round
game                 show the current game
rooms                list rooms
join <room>          join a room
leave <room>         leave a room
refresh              reload everything
quit                 go offline and exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let argument = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };
        let invitation_id = |name: &'static str| {
            let raw = argument(name)?;
            raw.parse::<InvitationId>()
                .map_err(|_| CommandError::BadInvitationId(raw))
        };

        match word.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "players" => Ok(Command::Players),
            "invites" => Ok(Command::Invites),
            "invite" => Ok(Command::Invite(argument("invite")?)),
            "link" => Ok(Command::InviteLink(argument("link")?)),
            "gamelink" => Ok(Command::GameLink),
            "accept" => Ok(Command::Accept(invitation_id("accept")?)),
            "decline" => Ok(Command::Decline(invitation_id("decline")?)),
            "roll" => Ok(Command::Roll),
            "pick" => {
                let category = argument("pick")?;
                if find_category(&category).is_none() {
                    return Err(CommandError::UnknownCategory(category));
                }
                Ok(Command::Pick(category))
            }
            "ready" => Ok(Command::Ready),
            "next" => Ok(Command::Next),
            "game" => Ok(Command::Game),
            "rooms" => Ok(Command::Rooms),
            "join" => Ok(Command::Join(argument("join")?)),
            "leave" => Ok(Command::Leave(argument("leave")?)),
            "refresh" => Ok(Command::Refresh),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Prints session events as plain text lines.
pub struct ConsoleRenderer<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!("Failed to write to console: {}", e);
        }
    }
}

impl ConsoleRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> SessionEventHandler for ConsoleRenderer<W> {
    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::OnlinePlayersUpdated { players } => {
                if players.is_empty() {
                    self.line("No other players online");
                    return;
                }
                self.line("Online players:");
                for player in players {
                    let status = if player.is_available { "available" } else { "in a game" };
                    self.line(&format!("  {} ({})", player.username, status));
                }
            }
            SessionEvent::InvitationsUpdated { invitations } => {
                if invitations.is_empty() {
                    self.line("No pending challenges");
                    return;
                }
                self.line("Pending challenges:");
                for invitation in invitations {
                    self.line(&format!(
                        "  #{} from {} (expires {})",
                        invitation.id,
                        invitation.from_username,
                        invitation.expires_at.format("%H:%M:%S")
                    ));
                }
            }
            SessionEvent::InvitationHighlighted { invitation_id } => {
                self.line(&format!(
                    ">> Challenge #{} is waiting: accept {} / decline {}",
                    invitation_id, invitation_id, invitation_id
                ));
            }
            SessionEvent::RoomsUpdated { rooms } => {
                let names: Vec<String> = rooms
                    .iter()
                    .map(|room| format!("{} [{}]", room.name, room.status))
                    .collect();
                self.line(&format!("Rooms: {}", names.join(", ")));
            }
            SessionEvent::GameEntered { game, side } => {
                self.line(&format!(
                    "Game #{}: {} vs {}, you are {}",
                    game.id, game.player1, game.player2, side
                ));
                self.line(&describe_game(&game));
            }
            SessionEvent::GameUpdated { game } => self.line(&describe_game(&game)),
            SessionEvent::RoundCompleted { game_id, winner } => {
                self.line(&format!("Round over in game #{}: {:?}", game_id, winner));
            }
            SessionEvent::LocationChanged { url } => self.line(&format!("Link: {}", url)),
            SessionEvent::Notification(notification) => {
                let marker = match notification.level {
                    NotificationLevel::Info => "i",
                    NotificationLevel::Success => "+",
                    NotificationLevel::Error => "!",
                };
                self.line(&format!("[{}] {}", marker, notification.message));
            }
            SessionEvent::Alert { message } => self.line(&format!("*** {} ***", message)),
        }
    }
}

/// One-line-per-side summary of a game.
pub fn describe_game(game: &GameRecord) -> String {
    let state = &game.game_state;
    let phase = match state.round_state {
        RoundState::Waiting => "waiting",
        RoundState::Rolling => "rolling",
        RoundState::Playing => "playing",
        RoundState::Complete => "complete",
    };

    let mut lines = vec![format!(
        "Round {} ({}), wins {}-{}",
        game.current_round, phase, state.player1_wins, state.player2_wins
    )];
    for side in [Side::Player1, Side::Player2] {
        let mine = state.side(side);
        lines.push(format!(
            "  {}: {} pts, {}/8 used, rolled {}",
            game.player_name(side),
            mine.score,
            mine.used_categories.len(),
            mine.current_state.as_deref().unwrap_or("-")
        ));
    }
    lines.join("\n")
}
