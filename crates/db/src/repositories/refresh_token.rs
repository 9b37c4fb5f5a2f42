//! Refresh token repository.
//!
//! Rotation is revoke-then-create within the same family; a crash between
//! the two steps costs the user one re-login.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::refresh_tokens;
use crate::repositories::hash_token;

/// Refresh token repository.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    db: DatabaseConnection,
}

impl RefreshTokenRepository {
    /// Creates a new refresh token repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists a newly issued refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        family: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<refresh_tokens::Model, DbErr> {
        refresh_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(hash_token(token)),
            family: Set(family),
            is_revoked: Set(false),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
    }

    /// Finds the stored record for a presented token, revoked or not.
    ///
    /// The caller distinguishes revoked/expired from unknown so reuse of a
    /// rotated token can be rejected explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<refresh_tokens::Model>, DbErr> {
        refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::TokenHash.eq(hash_token(token)))
            .one(&self.db)
            .await
    }

    /// Revokes a single token by row ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, id: Uuid) -> Result<(), DbErr> {
        refresh_tokens::ActiveModel {
            id: Set(id),
            is_revoked: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Revokes every non-revoked token in a rotation family.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_family(&self, family: Uuid) -> Result<u64, DbErr> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(refresh_tokens::Column::IsRevoked, Expr::value(true))
            .filter(refresh_tokens::Column::Family.eq(family))
            .filter(refresh_tokens::Column::IsRevoked.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Revokes every non-revoked token belonging to a user (logout-all,
    /// password change).
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(refresh_tokens::Column::IsRevoked, Expr::value(true))
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .filter(refresh_tokens::Column::IsRevoked.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Deletes expired rows (maintenance).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
