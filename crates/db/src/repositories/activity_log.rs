//! Activity log repository.
//!
//! Append-only writes plus the paginated, filtered query surface. Value
//! snapshots arrive as JSON values and are stored as serialized text.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use vantra_shared::pagination::PageRequest;

use crate::entities::activity_logs::{self, LogStatus};
use crate::entities::users;

/// A pending audit entry.
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    /// Acting user; unauthenticated failures log with `None`.
    pub user_id: Option<Uuid>,
    /// Free-form verb, e.g. "login", "create", "update".
    pub action: String,
    /// Module the action belongs to.
    pub module: Option<String>,
    /// Affected entity type.
    pub entity: Option<String>,
    /// Affected entity ID.
    pub entity_id: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Structured snapshot before the change.
    pub old_values: Option<serde_json::Value>,
    /// Structured snapshot after the change.
    pub new_values: Option<serde_json::Value>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Outcome of the audited operation.
    pub status: LogStatus,
    /// Error message for failed operations.
    pub error_message: Option<String>,
    /// Additional structured context.
    pub metadata: Option<serde_json::Value>,
}

impl NewActivityLog {
    /// Creates a minimal successful entry for an action.
    #[must_use]
    pub fn new(action: &str) -> Self {
        Self {
            user_id: None,
            action: action.to_string(),
            module: None,
            entity: None,
            entity_id: None,
            description: None,
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
            status: LogStatus::Success,
            error_message: None,
            metadata: None,
        }
    }
}

/// Filters for the paginated activity log query.
#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    /// Filter by acting user.
    pub user_id: Option<Uuid>,
    /// Filter by action verb.
    pub action: Option<String>,
    /// Filter by module.
    pub module: Option<String>,
    /// Entries created at or after this instant.
    pub start_date: Option<DateTime<Utc>>,
    /// Entries created at or before this instant.
    pub end_date: Option<DateTime<Utc>>,
}

/// Activity log repository.
#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    db: DatabaseConnection,
}

impl ActivityLogRepository {
    /// Creates a new activity log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if snapshot serialization or the database insert
    /// fails.
    pub async fn insert(&self, entry: NewActivityLog) -> Result<activity_logs::Model, DbErr> {
        let old_values = serialize_snapshot(entry.old_values)?;
        let new_values = serialize_snapshot(entry.new_values)?;
        let metadata = serialize_snapshot(entry.metadata)?;

        activity_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            module: Set(entry.module),
            entity: Set(entry.entity),
            entity_id: Set(entry.entity_id),
            description: Set(entry.description),
            old_values: Set(old_values),
            new_values: Set(new_values),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            status: Set(entry.status),
            error_message: Set(entry.error_message),
            metadata: Set(metadata),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
    }

    /// Queries the log with filters and pagination, most recent first.
    ///
    /// Each row carries the acting user's record (when the user still
    /// exists) so callers can render display fields. Also returns the
    /// total matching count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn query(
        &self,
        filter: &ActivityLogFilter,
        page: &PageRequest,
    ) -> Result<(Vec<(activity_logs::Model, Option<users::Model>)>, u64), DbErr> {
        let mut query = activity_logs::Entity::find();

        if let Some(user_id) = filter.user_id {
            query = query.filter(activity_logs::Column::UserId.eq(user_id));
        }
        if let Some(action) = &filter.action {
            query = query.filter(activity_logs::Column::Action.eq(action));
        }
        if let Some(module) = &filter.module {
            query = query.filter(activity_logs::Column::Module.eq(module));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(activity_logs::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(activity_logs::Column::CreatedAt.lte(end));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(activity_logs::Column::CreatedAt)
            .find_also_related(users::Entity)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Loads one entry with its acting user, for realtime enrichment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_user(
        &self,
        id: Uuid,
    ) -> Result<Option<(activity_logs::Model, Option<users::Model>)>, DbErr> {
        activity_logs::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
    }
}

fn serialize_snapshot(value: Option<serde_json::Value>) -> Result<Option<String>, DbErr> {
    value
        .map(|v| serde_json::to_string(&v).map_err(|e| DbErr::Custom(e.to_string())))
        .transpose()
}
