use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

use crate::change_feed::ChangeFeed;
use crate::entities::{online_players, prelude::*};
use crate::store::PresenceStore;
use game_types::{ChangeKind, PlayerPresence, RowChange, normalize_name};

pub struct PresenceRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PresenceRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    fn model_to_presence(model: online_players::Model) -> PlayerPresence {
        PlayerPresence {
            username: model.username,
            last_seen: model.last_seen,
            is_available: model.is_available,
        }
    }

    fn publish(&self, kind: ChangeKind, username: &str) {
        self.feed.publish(RowChange::OnlinePlayers {
            kind,
            username: username.to_string(),
        });
    }
}

#[async_trait]
impl PresenceStore for PresenceRepository {
    async fn upsert(&self, username: &str, now: DateTime<Utc>) -> Result<PlayerPresence> {
        let existed = OnlinePlayers::find_by_id(username.to_string())
            .one(&self.db)
            .await?
            .is_some();

        let row = online_players::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            last_seen: ActiveValue::Set(now),
            is_available: ActiveValue::Set(true),
        };
        OnlinePlayers::insert(row)
            .on_conflict(
                OnConflict::column(online_players::Column::Username)
                    .update_columns([
                        online_players::Column::LastSeen,
                        online_players::Column::IsAvailable,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        let kind = if existed {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.publish(kind, username);

        Ok(PlayerPresence::online(username, now))
    }

    async fn touch(&self, username: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = OnlinePlayers::update_many()
            .col_expr(online_players::Column::LastSeen, Expr::value(now))
            .filter(online_players::Column::Username.eq(username))
            .exec(&self.db)
            .await?;

        // Heartbeats are not broadcast; listings pick them up on the next poll.
        Ok(result.rows_affected > 0)
    }

    async fn set_available(&self, username: &str, available: bool) -> Result<bool> {
        let result = OnlinePlayers::update_many()
            .col_expr(online_players::Column::IsAvailable, Expr::value(available))
            .filter(online_players::Column::Username.eq(username))
            .exec(&self.db)
            .await?;

        let changed = result.rows_affected > 0;
        if changed {
            self.publish(ChangeKind::Update, username);
        }
        Ok(changed)
    }

    async fn remove(&self, username: &str) -> Result<bool> {
        let result = OnlinePlayers::delete_by_id(username.to_string())
            .exec(&self.db)
            .await?;

        let removed = result.rows_affected > 0;
        if removed {
            self.publish(ChangeKind::Delete, username);
        }
        Ok(removed)
    }

    async fn list_active(&self, exclude: &str, since: DateTime<Utc>) -> Result<Vec<PlayerPresence>> {
        let me = normalize_name(exclude);
        let rows = OnlinePlayers::find()
            .filter(online_players::Column::LastSeen.gte(since))
            .order_by_desc(online_players::Column::LastSeen)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter(|row| normalize_name(&row.username) != me)
            .map(Self::model_to_presence)
            .collect())
    }
}
