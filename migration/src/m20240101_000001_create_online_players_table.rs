use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OnlinePlayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OnlinePlayers::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OnlinePlayers::LastSeen)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OnlinePlayers::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        // Online listing filters and orders on last_seen
        manager
            .create_index(
                Index::create()
                    .name("idx_online_players_last_seen")
                    .table(OnlinePlayers::Table)
                    .col(OnlinePlayers::LastSeen)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OnlinePlayers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OnlinePlayers {
    Table,
    Username,
    LastSeen,
    IsAvailable,
}
