//! Ledger schema migration runner.
//!
//! Reads `DATABASE_URL` (from the environment or `.env`).
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI installs its own subscriber.
    cli::run_cli(Migrator).await;
}
