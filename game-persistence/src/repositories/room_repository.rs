use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, QueryOrder};

use crate::entities::{prelude::*, rooms};
use crate::store::RoomStore;
use game_types::Room;

pub struct RoomRepository {
    db: DatabaseConnection,
}

impl RoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_room(model: rooms::Model) -> Room {
        Room {
            name: model.name,
            status: model.status,
        }
    }
}

#[async_trait]
impl RoomStore for RoomRepository {
    async fn list(&self) -> Result<Vec<Room>> {
        let rows = Rooms::find()
            .order_by_asc(rooms::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Self::model_to_room).collect())
    }

    async fn set_status(&self, name: &str, status: &str) -> Result<Room> {
        let row = rooms::ActiveModel {
            name: ActiveValue::Set(name.to_string()),
            status: ActiveValue::Set(status.to_string()),
        };
        Rooms::insert(row)
            .on_conflict(
                OnConflict::column(rooms::Column::Name)
                    .update_column(rooms::Column::Status)
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(Room {
            name: name.to_string(),
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    #[tokio::test]
    async fn test_set_status_overrides_existing_row() {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let repo = RoomRepository::new(db);

        assert!(repo.list().await.unwrap().is_empty());

        repo.set_status("Room 3", "full").await.unwrap();
        repo.set_status("Room 1", "full").await.unwrap();
        repo.set_status("Room 3", "open").await.unwrap();

        let rooms = repo.list().await.unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].name, "Room 1");
        assert_eq!(rooms[1], Room::open("Room 3"));
    }
}
