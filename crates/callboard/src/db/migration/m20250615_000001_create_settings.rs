use sea_orm_migration::prelude::*;

use crate::db::settings::{DEFAULT_MANDATORY_MESSAGE, DEFAULT_VOTE_EMOJI};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::OwnerId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settings::ChannelId).big_integer())
                    .col(
                        ColumnDef::new(Settings::MandatoryMessage)
                            .string()
                            .not_null()
                            .default(DEFAULT_MANDATORY_MESSAGE),
                    )
                    .col(
                        ColumnDef::new(Settings::VoteEmoji)
                            .string()
                            .not_null()
                            .default(DEFAULT_VOTE_EMOJI),
                    )
                    .col(
                        ColumnDef::new(Settings::NotifyOnVote)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Settings::CreatedAt)
                            .date_time()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Settings::UpdatedAt)
                            .date_time()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TRIGGER settings_updated_at
            AFTER UPDATE ON settings
            FOR EACH ROW
            BEGIN
                UPDATE settings
                SET updated_at = (datetime('now','localtime'))
                WHERE owner_id = NEW.owner_id;
            END;",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    OwnerId,
    ChannelId,
    MandatoryMessage,
    VoteEmoji,
    NotifyOnVote,
    CreatedAt,
    UpdatedAt,
}
