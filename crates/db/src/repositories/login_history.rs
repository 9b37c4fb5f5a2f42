//! Login history repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::login_history::{self, LoginStatus};

/// Append-only record of login attempts.
#[derive(Debug, Clone)]
pub struct LoginHistoryRepository {
    db: DatabaseConnection,
}

impl LoginHistoryRepository {
    /// Creates a new login history repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends a login attempt record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert(
        &self,
        user_id: Option<Uuid>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        status: LoginStatus,
        fail_reason: Option<&str>,
    ) -> Result<login_history::Model, DbErr> {
        login_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            ip_address: Set(ip_address.map(String::from)),
            user_agent: Set(user_agent.map(String::from)),
            status: Set(status),
            fail_reason: Set(fail_reason.map(String::from)),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
    }

    /// Returns a user's most recent login attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recent(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<login_history::Model>, DbErr> {
        login_history::Entity::find()
            .filter(login_history::Column::UserId.eq(user_id))
            .order_by_desc(login_history::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }
}
