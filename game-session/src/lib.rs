pub mod config;
pub mod console;
pub mod deep_link;
pub mod error;
pub mod session;
pub mod sync;

pub use config::{Config, ConfigError};
pub use deep_link::DeepLink;
pub use error::SessionError;
pub use session::{MultiplayerSession, RefreshTrigger, SessionState};
pub use sync::SyncHub;
