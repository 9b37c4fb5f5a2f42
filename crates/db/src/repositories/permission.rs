//! Permission catalog repository.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::permissions;

/// Read-only access to the seeded permission catalog.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    db: DatabaseConnection,
}

impl PermissionRepository {
    /// Creates a new permission repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the full catalog ordered by module, then action.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self) -> Result<Vec<permissions::Model>, DbErr> {
        permissions::Entity::find()
            .order_by_asc(permissions::Column::Module)
            .order_by_asc(permissions::Column::Action)
            .all(&self.db)
            .await
    }

    /// Resolves permissions by ID, for validating role assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<permissions::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        permissions::Entity::find()
            .filter(permissions::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
    }
}
