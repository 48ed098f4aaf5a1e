use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Votes::VoterId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::SubmissionId).integer().not_null())
                    .col(
                        ColumnDef::new(Votes::CreatedAt)
                            .date_time()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    // The uniqueness backstop for concurrent identical taps.
                    .primary_key(Index::create().col(Votes::VoterId).col(Votes::SubmissionId))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    VoterId,
    SubmissionId,
    CreatedAt,
}
