//! Activity audit log service.
//!
//! Every write is best-effort: persistence or publish problems are logged
//! through `tracing` and never surface to the business operation being
//! audited. `record_detached` spawns the write so the caller structurally
//! cannot await its failure.

use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use vantra_db::entities::activity_logs::{self, LogStatus};
use vantra_db::entities::login_history::LoginStatus;
use vantra_db::repositories::{ActivityLogRepository, LoginHistoryRepository, NewActivityLog};

use super::events::{EventBus, RealtimeEvent};

/// Append-only audit log with realtime fan-out.
#[derive(Debug, Clone)]
pub struct AuditService {
    logs: ActivityLogRepository,
    history: LoginHistoryRepository,
    events: EventBus,
}

impl AuditService {
    /// Creates a new audit service.
    #[must_use]
    pub fn new(db: DatabaseConnection, events: EventBus) -> Self {
        Self {
            logs: ActivityLogRepository::new(db.clone()),
            history: LoginHistoryRepository::new(db),
            events,
        }
    }

    /// Appends an audit entry and publishes it to the realtime stream.
    ///
    /// Never fails: persistence errors yield `None` after being logged.
    pub async fn record(&self, entry: NewActivityLog) -> Option<activity_logs::Model> {
        let row = match self.logs.insert(entry).await {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Failed to persist audit entry");
                return None;
            }
        };

        self.publish(&row).await;
        Some(row)
    }

    /// Spawns `record` as a detached task.
    pub fn record_detached(&self, entry: NewActivityLog) {
        let service = self.clone();
        tokio::spawn(async move {
            service.record(entry).await;
        });
    }

    /// Records a login attempt in both the audit log and login history.
    pub async fn record_login(
        &self,
        user_id: Option<Uuid>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        status: LoginStatus,
        fail_reason: Option<&str>,
    ) {
        let mut entry = NewActivityLog::new("login");
        entry.user_id = user_id;
        entry.module = Some("auth".to_string());
        entry.ip_address = ip_address.map(String::from);
        entry.user_agent = user_agent.map(String::from);
        entry.status = match status {
            LoginStatus::Success => LogStatus::Success,
            LoginStatus::Failed => LogStatus::Failure,
        };
        entry.error_message = fail_reason.map(String::from);
        self.record(entry).await;

        if let Err(e) = self
            .history
            .insert(user_id, ip_address, user_agent, status, fail_reason)
            .await
        {
            warn!(error = %e, "Failed to persist login history entry");
        }
    }

    /// Records a logout.
    pub async fn record_logout(
        &self,
        user_id: Uuid,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        let mut entry = NewActivityLog::new("logout");
        entry.user_id = Some(user_id);
        entry.module = Some("auth".to_string());
        entry.ip_address = ip_address.map(String::from);
        entry.user_agent = user_agent.map(String::from);
        self.record(entry).await;
    }

    /// Records a password change.
    pub async fn record_password_change(
        &self,
        user_id: Uuid,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        let mut entry = NewActivityLog::new("password_change");
        entry.user_id = Some(user_id);
        entry.module = Some("auth".to_string());
        entry.ip_address = ip_address.map(String::from);
        entry.user_agent = user_agent.map(String::from);
        self.record(entry).await;
    }

    /// Publishes the persisted row, with resolved user display fields, to
    /// the realtime stream.
    async fn publish(&self, row: &activity_logs::Model) {
        let user = match self.logs.find_with_user(row.id).await {
            Ok(Some((_, user))) => user,
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to resolve audit entry user");
                None
            }
        };

        let data = json!({
            "id": row.id,
            "user_id": row.user_id,
            "user_name": user.as_ref().map(|u| format!("{} {}", u.first_name, u.last_name)),
            "user_email": user.as_ref().map(|u| u.email.clone()),
            "action": row.action,
            "module": row.module,
            "entity": row.entity,
            "entity_id": row.entity_id,
            "description": row.description,
            "status": row.status,
            "ip_address": row.ip_address,
            "created_at": row.created_at,
        });
        self.events.publish(RealtimeEvent::new("activity_log", data));
    }
}
