use sea_orm::DatabaseConnection;
pub use sea_orm_migration::prelude::*;

use callboard_common::error::Result;

mod m20250615_000001_create_settings;
mod m20250615_000002_create_submissions;
mod m20250615_000003_create_votes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250615_000001_create_settings::Migration),
            Box::new(m20250615_000002_create_submissions::Migration),
            Box::new(m20250615_000003_create_votes::Migration),
        ]
    }
}

pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None).await?;
    Ok(())
}
