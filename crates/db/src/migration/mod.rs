//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. The schema is written with
//! the portable builder so it runs on Postgres and SQLite alike.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_ledger_schema;
mod m20260301_000002_active_collector_index;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_ledger_schema::Migration),
            Box::new(m20260301_000002_active_collector_index::Migration),
        ]
    }
}
