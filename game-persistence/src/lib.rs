pub mod change_feed;
pub mod connection;
pub mod entities;
pub mod repositories;
pub mod store;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use change_feed::ChangeFeed;
pub use store::*;

use repositories::{GameRepository, InvitationRepository, PresenceRepository, RoomRepository};

/// The four stores a session works against, sharing one change feed.
#[derive(Clone)]
pub struct Stores {
    pub presence: Arc<dyn PresenceStore>,
    pub invitations: Arc<dyn InvitationStore>,
    pub games: Arc<dyn GameRecordStore>,
    pub rooms: Arc<dyn RoomStore>,
    pub feed: ChangeFeed,
}

impl Stores {
    pub fn sea_orm(db: DatabaseConnection) -> Self {
        Self::sea_orm_with_feed(db, ChangeFeed::default())
    }

    pub fn sea_orm_with_feed(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self {
            presence: Arc::new(PresenceRepository::new(db.clone(), feed.clone())),
            invitations: Arc::new(InvitationRepository::new(db.clone(), feed.clone())),
            games: Arc::new(GameRepository::new(db.clone(), feed.clone())),
            rooms: Arc::new(RoomRepository::new(db)),
            feed,
        }
    }
}
