//! Database migrations.
//!
//! Migrations are written with the portable schema DSL so they run against
//! both Postgres (production) and in-memory SQLite (test suites).

use sea_orm_migration::prelude::*;

mod m20260601_000001_initial;
mod m20260601_000002_seed_access_control;

/// The migration runner for Vantra.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_initial::Migration),
            Box::new(m20260601_000002_seed_access_control::Migration),
        ]
    }
}
