pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_online_players_table;
mod m20240101_000002_create_game_invitations_table;
mod m20240101_000003_create_multiplayer_games_table;
mod m20240101_000004_create_rooms_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_online_players_table::Migration),
            Box::new(m20240101_000002_create_game_invitations_table::Migration),
            Box::new(m20240101_000003_create_multiplayer_games_table::Migration),
            Box::new(m20240101_000004_create_rooms_table::Migration),
        ]
    }
}
