//! Role repository for database operations.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::entities::{permissions, role_permissions, roles, users};

/// Role repository for CRUD and permission-assignment operations.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    db: DatabaseConnection,
}

impl RoleRepository {
    /// Creates a new role repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a role by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<roles::Model>, DbErr> {
        roles::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a role by its unique name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<roles::Model>, DbErr> {
        roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    /// Lists all roles with their permission sets.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_permissions(
        &self,
    ) -> Result<Vec<(roles::Model, Vec<permissions::Model>)>, DbErr> {
        roles::Entity::find()
            .order_by_asc(roles::Column::Name)
            .find_with_related(permissions::Entity)
            .all(&self.db)
            .await
    }

    /// Returns the permissions granted to a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn permissions_for(&self, role_id: Uuid) -> Result<Vec<permissions::Model>, DbErr> {
        permissions::Entity::find()
            .join(
                JoinType::InnerJoin,
                permissions::Relation::RolePermissions.def(),
            )
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .all(&self.db)
            .await
    }

    /// Creates a role with an initial permission set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        permission_ids: &[Uuid],
    ) -> Result<roles::Model, DbErr> {
        let now = Utc::now();
        let role = roles::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.map(String::from)),
            is_system: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        self.set_permissions(role.id, permission_ids).await?;
        Ok(role)
    }

    /// Updates a role's name/description and optionally replaces its
    /// permission set.
    ///
    /// System-role protection is enforced by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(
        &self,
        role_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<roles::Model, DbErr> {
        let mut active = roles::ActiveModel {
            id: Set(role_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(name) = name {
            active.name = Set(name.to_string());
        }
        if let Some(description) = description {
            active.description = Set(Some(description.to_string()));
        }
        let role = active.update(&self.db).await?;

        if let Some(ids) = permission_ids {
            self.set_permissions(role_id, ids).await?;
        }
        Ok(role)
    }

    /// Replaces the permission assignment of a role.
    ///
    /// Duplicate IDs are inserted once; the join table keys on
    /// `(role_id, permission_id)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database writes fail.
    pub async fn set_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), DbErr> {
        role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .exec(&self.db)
            .await?;

        let mut seen = HashSet::new();
        for permission_id in permission_ids.iter().filter(|id| seen.insert(**id)) {
            role_permissions::ActiveModel {
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
            }
            .insert(&self.db)
            .await?;
        }
        Ok(())
    }

    /// Counts the users currently assigned to a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn assigned_user_count(&self, role_id: Uuid) -> Result<u64, DbErr> {
        users::Entity::find()
            .filter(users::Column::RoleId.eq(role_id))
            .count(&self.db)
            .await
    }

    /// Deletes a role and its permission assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, role_id: Uuid) -> Result<(), DbErr> {
        role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .exec(&self.db)
            .await?;
        roles::Entity::delete_by_id(role_id).exec(&self.db).await?;
        Ok(())
    }
}
