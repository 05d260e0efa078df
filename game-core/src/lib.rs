pub mod expiry;
pub mod game_events;
pub mod game_state;
pub mod normalize;
pub mod rankings;
pub mod scoring;

// Re-export main components
pub use expiry::*;
pub use game_events::*;
pub use game_state::*;
pub use normalize::*;
pub use rankings::*;
pub use scoring::*;
