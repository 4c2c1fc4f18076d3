//! Enforces at most one active collector per event.
//!
//! Partial indexes are not expressible through the schema builder, but the
//! statement below is accepted by both Postgres and SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ACTIVE_COLLECTOR_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_collectors_one_active;")
            .await?;
        Ok(())
    }
}

const ACTIVE_COLLECTOR_SQL: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_collectors_one_active
    ON collectors (event_id)
    WHERE is_active;
";
