use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameInvitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameInvitations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GameInvitations::FromUsername)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GameInvitations::ToUsername).string().not_null())
                    .col(
                        ColumnDef::new(GameInvitations::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(GameInvitations::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameInvitations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Pending lookups are per addressee and status
        manager
            .create_index(
                Index::create()
                    .name("idx_game_invitations_to_status")
                    .table(GameInvitations::Table)
                    .col(GameInvitations::ToUsername)
                    .col(GameInvitations::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameInvitations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GameInvitations {
    Table,
    Id,
    FromUsername,
    ToUsername,
    Status,
    ExpiresAt,
    CreatedAt,
}
