//! Database seeder for Vantra development and testing.
//!
//! Seeds a demo admin and a demo employee wired to the roles created by
//! the access-control migration. Run the migrator first.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use vantra_core::auth::hash_password;
use vantra_db::entities::{
    roles,
    users::{self, UserStatus},
};

/// Demo admin user ID (consistent for all seeds)
const ADMIN_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo employee user ID (consistent for all seeds)
const EMPLOYEE_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = vantra_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo admin...");
    seed_user(
        &db,
        ADMIN_USER_ID,
        "admin@vantra.dev",
        "Demo",
        "Admin",
        "admin",
    )
    .await;

    println!("Seeding demo employee...");
    seed_user(
        &db,
        EMPLOYEE_USER_ID,
        "employee@vantra.dev",
        "Demo",
        "Employee",
        "employee",
    )
    .await;

    println!("Seeding complete!");
}

/// Seeds one demo user assigned to a named role.
async fn seed_user(
    db: &DatabaseConnection,
    id: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    role_name: &str,
) {
    let user_id = Uuid::parse_str(id).expect("Seed IDs are valid UUIDs");

    // Check if the user already exists
    if users::Entity::find_by_id(user_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  {email} already exists, skipping...");
        return;
    }

    let role_id = roles::Entity::find()
        .filter(roles::Column::Name.eq(role_name))
        .one(db)
        .await
        .ok()
        .flatten()
        .map(|r| r.id);
    if role_id.is_none() {
        eprintln!("  Role '{role_name}' not found; run the migrator first");
    }

    let password_hash = hash_password("vantra-demo").expect("Demo password hashes");
    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(user_id),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        phone: Set(None),
        status: Set(UserStatus::Active),
        role_id: Set(role_id),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        password_changed_at: Set(None),
        last_login_at: Set(None),
        last_login_ip: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert {email}: {e}");
    } else {
        println!("  Created {email} (password: vantra-demo)");
    }
}
