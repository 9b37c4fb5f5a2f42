//! Session repository for database operations.
//!
//! One row per issued access token. The `touch` update is invoked from the
//! request hot path as a detached task and must stay a single narrow
//! update.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::sessions;
use crate::repositories::hash_token;

/// Session repository for open/touch/terminate operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a session for a freshly issued access token.
    ///
    /// `expires_at` derives from the configured session timeout, which is
    /// distinct from the access-token expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn open(
        &self,
        user_id: Uuid,
        access_token: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<sessions::Model, DbErr> {
        let now = Utc::now();
        sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(hash_token(access_token)),
            ip_address: Set(ip_address.map(String::from)),
            user_agent: Set(user_agent.map(String::from)),
            is_active: Set(true),
            created_at: Set(now),
            last_activity_at: Set(now),
            expires_at: Set(expires_at),
        }
        .insert(&self.db)
        .await
    }

    /// Advances `last_activity_at` for the session matching this token.
    ///
    /// Returns the number of rows updated; zero is not an error (the
    /// session may already be closed).
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn touch(&self, access_token: &str, user_id: Uuid) -> Result<u64, DbErr> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::LastActivityAt, Expr::value(Utc::now()))
            .filter(sessions::Column::TokenHash.eq(hash_token(access_token)))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Lists a user's active, unexpired sessions, most recent activity
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self, user_id: Uuid) -> Result<Vec<sessions::Model>, DbErr> {
        sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .filter(sessions::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(sessions::Column::LastActivityAt)
            .all(&self.db)
            .await
    }

    /// Terminates a session, ownership-scoped.
    ///
    /// Returns false when no matching active session exists for this user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn terminate(&self, session_id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::IsActive, Expr::value(false))
            .filter(sessions::Column::Id.eq(session_id))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Terminates every active session for a user, optionally sparing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn terminate_all(
        &self,
        user_id: Uuid,
        except_session_id: Option<Uuid>,
    ) -> Result<u64, DbErr> {
        let mut query = sessions::Entity::update_many()
            .col_expr(sessions::Column::IsActive, Expr::value(false))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true));
        if let Some(except) = except_session_id {
            query = query.filter(sessions::Column::Id.ne(except));
        }

        let result = query.exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    /// Closes the session matching a presented access token (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn close_by_token(&self, access_token: &str, user_id: Uuid) -> Result<bool, DbErr> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::IsActive, Expr::value(false))
            .filter(sessions::Column::TokenHash.eq(hash_token(access_token)))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Deletes expired rows (maintenance).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
