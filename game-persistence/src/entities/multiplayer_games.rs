use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "multiplayer_games")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub player1: String,
    pub player2: String,
    pub current_round: i32,
    pub player1_wins: i32,
    pub player2_wins: i32,
    pub game_state: Json,
    /// Mirrors `game_state.version`; conditional updates match on it.
    pub state_version: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
