use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MultiplayerGames::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MultiplayerGames::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MultiplayerGames::Player1).string().not_null())
                    .col(ColumnDef::new(MultiplayerGames::Player2).string().not_null())
                    .col(
                        ColumnDef::new(MultiplayerGames::CurrentRound)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(MultiplayerGames::Player1Wins)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MultiplayerGames::Player2Wins)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(MultiplayerGames::GameState).json().not_null())
                    .col(
                        ColumnDef::new(MultiplayerGames::StateVersion)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MultiplayerGames::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(MultiplayerGames::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MultiplayerGames::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MultiplayerGames::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MultiplayerGames {
    Table,
    Id,
    Player1,
    Player2,
    CurrentRound,
    Player1Wins,
    Player2Wins,
    GameState,
    StateVersion,
    Status,
    CreatedAt,
    UpdatedAt,
}
