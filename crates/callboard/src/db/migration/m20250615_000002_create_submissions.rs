use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::OwnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::Text).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::ChannelId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::MessageId).integer().not_null())
                    .col(
                        ColumnDef::new(Submissions::VoteCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .date_time()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UpdatedAt)
                            .date_time()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Taps resolve a submission through the identity of its published
        // copy; message ids are only unique within a chat.
        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_channel_message")
                    .table(Submissions::Table)
                    .col(Submissions::ChannelId)
                    .col(Submissions::MessageId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TRIGGER submissions_updated_at
            AFTER UPDATE ON submissions
            FOR EACH ROW
            BEGIN
                UPDATE submissions
                SET updated_at = (datetime('now','localtime'))
                WHERE id = NEW.id;
            END;",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    OwnerId,
    Text,
    ChannelId,
    MessageId,
    VoteCount,
    CreatedAt,
    UpdatedAt,
}
