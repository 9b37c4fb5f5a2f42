//! Shared setup for repository integration tests.
//!
//! Each test gets its own in-memory SQLite database with the full
//! migration chain applied, including the seeded permission catalog and
//! system roles.

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use vantra_db::UserRepository;
use vantra_db::entities::users;
use vantra_db::migration::Migrator;

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Creates a user with a unique email and no role.
pub async fn create_user(db: &DatabaseConnection) -> users::Model {
    let repo = UserRepository::new(db.clone());
    repo.create(
        &format!("user-{}@example.com", Uuid::new_v4()),
        "argon2-hash-placeholder",
        "Test",
        "User",
        None,
        None,
    )
    .await
    .expect("Failed to create test user")
}
