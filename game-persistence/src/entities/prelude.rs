pub use super::game_invitations::Entity as GameInvitations;
pub use super::multiplayer_games::Entity as MultiplayerGames;
pub use super::online_players::Entity as OnlinePlayers;
pub use super::rooms::Entity as Rooms;
