pub mod game_repository;
pub mod invitation_repository;
pub mod presence_repository;
pub mod room_repository;

pub use game_repository::GameRepository;
pub use invitation_repository::InvitationRepository;
pub use presence_repository::PresenceRepository;
pub use room_repository::RoomRepository;
