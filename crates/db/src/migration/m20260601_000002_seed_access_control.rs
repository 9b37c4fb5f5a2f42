//! Seeds the permission catalog and the built-in system roles.
//!
//! Permissions are immutable reference data; the `admin` system role holds
//! the full catalog, the `employee` system role starts with none.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

use crate::entities::{permissions, role_permissions, roles};

const PERMISSIONS: &[(&str, &str, &str)] = &[
    ("users.view", "users", "view"),
    ("users.create", "users", "create"),
    ("users.update", "users", "update"),
    ("users.delete", "users", "delete"),
    ("roles.view", "roles", "view"),
    ("roles.create", "roles", "create"),
    ("roles.update", "roles", "update"),
    ("roles.delete", "roles", "delete"),
    ("activity_logs.view", "activity_logs", "view"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let now = Utc::now();

        let mut permission_ids = Vec::with_capacity(PERMISSIONS.len());
        for (name, module, action) in PERMISSIONS {
            let id = Uuid::new_v4();
            permissions::ActiveModel {
                id: Set(id),
                name: Set((*name).to_string()),
                module: Set((*module).to_string()),
                action: Set((*action).to_string()),
                description: Set(None),
                created_at: Set(now),
            }
            .insert(db)
            .await?;
            permission_ids.push(id);
        }

        let admin_role_id = Uuid::new_v4();
        roles::ActiveModel {
            id: Set(admin_role_id),
            name: Set("admin".to_string()),
            description: Set(Some("Full administrative access".to_string())),
            is_system: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        roles::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("employee".to_string()),
            description: Set(Some("Default role without administrative access".to_string())),
            is_system: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        for permission_id in permission_ids {
            role_permissions::ActiveModel {
                role_id: Set(admin_role_id),
                permission_id: Set(permission_id),
            }
            .insert(db)
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        role_permissions::Entity::delete_many().exec(db).await?;
        roles::Entity::delete_many()
            .filter(roles::Column::IsSystem.eq(true))
            .exec(db)
            .await?;
        permissions::Entity::delete_many().exec(db).await?;
        Ok(())
    }
}
