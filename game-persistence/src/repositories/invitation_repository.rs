use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};

use crate::change_feed::ChangeFeed;
use crate::entities::{game_invitations, prelude::*};
use crate::store::InvitationStore;
use game_types::{ChangeKind, Invitation, InvitationId, InvitationStatus, RowChange};

pub struct InvitationRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl InvitationRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    fn model_to_invitation(model: game_invitations::Model) -> Result<Invitation> {
        let status = model
            .status
            .parse::<InvitationStatus>()
            .map_err(|e| anyhow!("Invitation {}: {}", model.id, e))?;

        Ok(Invitation {
            id: model.id,
            from_username: model.from_username,
            to_username: model.to_username,
            status,
            expires_at: model.expires_at,
            created_at: model.created_at,
        })
    }

    fn publish(&self, kind: ChangeKind, invitation: &Invitation) {
        self.feed.publish(RowChange::GameInvitations {
            kind,
            invitation: invitation.clone(),
        });
    }
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    async fn create(
        &self,
        from: &str,
        to: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Invitation> {
        let row = game_invitations::ActiveModel {
            id: ActiveValue::NotSet,
            from_username: ActiveValue::Set(from.to_string()),
            to_username: ActiveValue::Set(to.to_string()),
            status: ActiveValue::Set(InvitationStatus::Pending.as_str().to_string()),
            expires_at: ActiveValue::Set(expires_at),
            created_at: ActiveValue::Set(now),
        };

        let saved = row.insert(&self.db).await?;
        let invitation = Self::model_to_invitation(saved)?;
        tracing::info!(
            "Invitation {} created: {} -> {}",
            invitation.id,
            invitation.from_username,
            invitation.to_username
        );

        self.publish(ChangeKind::Insert, &invitation);
        Ok(invitation)
    }

    async fn find(&self, id: InvitationId) -> Result<Option<Invitation>> {
        GameInvitations::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_invitation)
            .transpose()
    }

    async fn set_status(
        &self,
        id: InvitationId,
        status: InvitationStatus,
    ) -> Result<Option<Invitation>> {
        let result = GameInvitations::update_many()
            .col_expr(
                game_invitations::Column::Status,
                Expr::value(status.as_str()),
            )
            .filter(game_invitations::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let updated = self.find(id).await?;
        if let Some(invitation) = &updated {
            self.publish(ChangeKind::Update, invitation);
        }
        Ok(updated)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<Invitation>> {
        let stale = GameInvitations::find()
            .filter(game_invitations::Column::Status.eq(InvitationStatus::Pending.as_str()))
            .filter(game_invitations::Column::ExpiresAt.lte(now))
            .all(&self.db)
            .await?;

        if stale.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<InvitationId> = stale.iter().map(|row| row.id).collect();
        GameInvitations::update_many()
            .col_expr(
                game_invitations::Column::Status,
                Expr::value(InvitationStatus::Expired.as_str()),
            )
            .filter(game_invitations::Column::Id.is_in(ids))
            .filter(game_invitations::Column::Status.eq(InvitationStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;

        let mut expired = Vec::with_capacity(stale.len());
        for row in stale {
            let mut invitation = Self::model_to_invitation(row)?;
            invitation.status = InvitationStatus::Expired;
            self.publish(ChangeKind::Update, &invitation);
            expired.push(invitation);
        }

        tracing::debug!("Expired {} stale invitations", expired.len());
        Ok(expired)
    }

    async fn list_pending_for(&self, to: &str, now: DateTime<Utc>) -> Result<Vec<Invitation>> {
        self.expire_stale(now).await?;

        let rows = GameInvitations::find()
            .filter(game_invitations::Column::ToUsername.eq(to))
            .filter(game_invitations::Column::Status.eq(InvitationStatus::Pending.as_str()))
            .filter(game_invitations::Column::ExpiresAt.gt(now))
            .order_by_desc(game_invitations::Column::CreatedAt)
            .all(&self.db)
            .await?;

        rows.into_iter().map(Self::model_to_invitation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use chrono::Duration;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> (InvitationRepository, ChangeFeed) {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let feed = ChangeFeed::default();
        (InvitationRepository::new(db, feed.clone()), feed)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (repo, feed) = setup_test_db().await;
        let mut changes = feed.subscribe();
        let now = Utc::now();

        let created = repo
            .create("alice", "bob", now + Duration::minutes(5), now)
            .await
            .unwrap();
        assert_eq!(created.status, InvitationStatus::Pending);

        let found = repo.find(created.id).await.unwrap().unwrap();
        assert_eq!(found.from_username, "alice");
        assert_eq!(found.to_username, "bob");
        assert!(repo.find(created.id + 100).await.unwrap().is_none());

        match changes.recv().await.unwrap() {
            RowChange::GameInvitations { kind, invitation } => {
                assert_eq!(kind, ChangeKind::Insert);
                assert_eq!(invitation.id, created.id);
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pending_listing_sweeps_expired() {
        let (repo, _feed) = setup_test_db().await;
        let now = Utc::now();

        let stale = repo
            .create("carol", "bob", now - Duration::seconds(30), now - Duration::minutes(6))
            .await
            .unwrap();
        let older = repo
            .create("alice", "bob", now + Duration::minutes(3), now - Duration::minutes(2))
            .await
            .unwrap();
        let newer = repo
            .create("dave", "bob", now + Duration::minutes(5), now)
            .await
            .unwrap();
        repo.create("alice", "erin", now + Duration::minutes(5), now)
            .await
            .unwrap();

        let pending = repo.list_pending_for("bob", now).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let swept = repo.find(stale.id).await.unwrap().unwrap();
        assert_eq!(swept.status, InvitationStatus::Expired);
    }

    #[tokio::test]
    async fn test_expire_stale_reports_each_row_once() {
        let (repo, feed) = setup_test_db().await;
        let now = Utc::now();
        repo.create("a", "b", now - Duration::minutes(1), now - Duration::minutes(6))
            .await
            .unwrap();

        let mut changes = feed.subscribe();
        let expired = repo.expire_stale(now).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].status, InvitationStatus::Expired);
        assert_eq!(changes.recv().await.unwrap().kind(), ChangeKind::Update);

        assert!(repo.expire_stale(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invitation_expires_at_its_deadline() {
        let (repo, _feed) = setup_test_db().await;
        let now = Utc::now();
        let due = repo
            .create("alice", "bob", now, now - Duration::minutes(5))
            .await
            .unwrap();
        assert!(due.is_expired_at(now));

        assert!(repo.list_pending_for("bob", now).await.unwrap().is_empty());
        let swept = repo.find(due.id).await.unwrap().unwrap();
        assert_eq!(swept.status, InvitationStatus::Expired);
    }

    #[tokio::test]
    async fn test_set_status() {
        let (repo, _feed) = setup_test_db().await;
        let now = Utc::now();
        let created = repo
            .create("alice", "bob", now + Duration::minutes(5), now)
            .await
            .unwrap();

        let declined = repo
            .set_status(created.id, InvitationStatus::Declined)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(declined.status, InvitationStatus::Declined);
        assert!(repo.list_pending_for("bob", now).await.unwrap().is_empty());

        assert!(
            repo.set_status(999, InvitationStatus::Accepted)
                .await
                .unwrap()
                .is_none()
        );
    }
}
