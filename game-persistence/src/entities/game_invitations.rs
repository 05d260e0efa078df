use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_invitations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub from_username: String,
    pub to_username: String,
    /// One of `pending`, `accepted`, `declined`, `expired`.
    pub status: String,
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
