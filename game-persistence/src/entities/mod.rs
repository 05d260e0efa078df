pub mod prelude;

pub mod game_invitations;
pub mod multiplayer_games;
pub mod online_players;
pub mod rooms;
