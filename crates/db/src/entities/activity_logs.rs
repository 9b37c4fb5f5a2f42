//! `SeaORM` Entity for the activity_logs table.
//!
//! Append-only audit trail. Value snapshots and metadata are stored as
//! serialized JSON text.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome recorded with an audit entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// The audited operation succeeded.
    #[sea_orm(string_value = "success")]
    Success,
    /// The audited operation failed.
    #[sea_orm(string_value = "failure")]
    Failure,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Nullable: unauthenticated failures still log.
    pub user_id: Option<Uuid>,
    pub action: String,
    pub module: Option<String>,
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub old_values: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub new_values: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: LogStatus,
    pub error_message: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub metadata: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
