pub mod errors;
pub mod game;
pub mod invitation;
pub mod messages;
pub mod presence;
pub mod room;

pub type GameId = i32;
pub type InvitationId = i32;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use invitation::*;
pub use messages::*;
pub use presence::*;
pub use room::*;
