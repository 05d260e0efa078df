use game_types::{ActionRejection, GameId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The action was refused and nothing changed.
    #[error("{0}")]
    Rejected(#[from] ActionRejection),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    #[error("no player is online in this session")]
    NotOnline,
    /// The stored game kept moving under a retried write.
    #[error("game {0} changed while saving; the latest state was loaded")]
    Conflict(GameId),
    #[error("sync channel error: {0}")]
    Channel(String),
}

impl SessionError {
    pub fn rejection(&self) -> Option<&ActionRejection> {
        match self {
            SessionError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
