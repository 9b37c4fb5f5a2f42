//! Integration tests for the append-only activity log.

mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use vantra_db::ActivityLogRepository;
use vantra_db::entities::activity_logs::LogStatus;
use vantra_db::repositories::{ActivityLogFilter, NewActivityLog};
use vantra_shared::pagination::PageRequest;

use common::{create_user, setup_db};

#[tokio::test]
async fn snapshots_round_trip_as_json() {
    let db = setup_db().await;
    let repo = ActivityLogRepository::new(db.clone());
    let user = create_user(&db).await;

    let old = json!({"status": "active", "role_id": null});
    let new = json!({"status": "suspended", "role_id": "abc"});

    let mut entry = NewActivityLog::new("update");
    entry.user_id = Some(user.id);
    entry.module = Some("users".to_string());
    entry.entity = Some("user".to_string());
    entry.old_values = Some(old.clone());
    entry.new_values = Some(new.clone());
    let row = repo.insert(entry).await.unwrap();

    let stored_old: serde_json::Value =
        serde_json::from_str(row.old_values.as_deref().unwrap()).unwrap();
    let stored_new: serde_json::Value =
        serde_json::from_str(row.new_values.as_deref().unwrap()).unwrap();
    assert_eq!(stored_old, old);
    assert_eq!(stored_new, new);
}

#[tokio::test]
async fn unauthenticated_entries_have_no_user() {
    let db = setup_db().await;
    let repo = ActivityLogRepository::new(db.clone());

    let mut entry = NewActivityLog::new("login");
    entry.status = LogStatus::Failure;
    entry.error_message = Some("unknown_email".to_string());
    let row = repo.insert(entry).await.unwrap();

    assert!(row.user_id.is_none());
    assert_eq!(row.status, LogStatus::Failure);

    let (rows, _) = repo
        .query(&ActivityLogFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    let (stored, joined_user) = &rows[0];
    assert_eq!(stored.id, row.id);
    assert!(joined_user.is_none());
}

#[tokio::test]
async fn query_filters_compose() {
    let db = setup_db().await;
    let repo = ActivityLogRepository::new(db.clone());
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;

    for (user_id, action, module) in [
        (alice.id, "login", "auth"),
        (alice.id, "update", "users"),
        (bob.id, "login", "auth"),
    ] {
        let mut entry = NewActivityLog::new(action);
        entry.user_id = Some(user_id);
        entry.module = Some(module.to_string());
        repo.insert(entry).await.unwrap();
    }

    let filter = ActivityLogFilter {
        user_id: Some(alice.id),
        action: Some("login".to_string()),
        ..Default::default()
    };
    let (rows, total) = repo.query(&filter, &PageRequest::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].0.user_id, Some(alice.id));
    assert_eq!(rows[0].0.action, "login");

    let module_filter = ActivityLogFilter {
        module: Some("auth".to_string()),
        ..Default::default()
    };
    let (_, total) = repo
        .query(&module_filter, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn date_range_bounds_are_inclusive() {
    let db = setup_db().await;
    let repo = ActivityLogRepository::new(db.clone());

    let row = repo.insert(NewActivityLog::new("login")).await.unwrap();

    let covering = ActivityLogFilter {
        start_date: Some(row.created_at - Duration::seconds(1)),
        end_date: Some(row.created_at + Duration::seconds(1)),
        ..Default::default()
    };
    let (_, total) = repo.query(&covering, &PageRequest::default()).await.unwrap();
    assert_eq!(total, 1);

    let past = ActivityLogFilter {
        end_date: Some(Utc::now() - Duration::hours(1)),
        ..Default::default()
    };
    let (_, total) = repo.query(&past, &PageRequest::default()).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn pagination_pages_most_recent_first() {
    let db = setup_db().await;
    let repo = ActivityLogRepository::new(db.clone());
    let user = create_user(&db).await;

    for i in 0..5 {
        let mut entry = NewActivityLog::new("login");
        entry.user_id = Some(user.id);
        entry.description = Some(format!("attempt {i}"));
        repo.insert(entry).await.unwrap();
    }

    let page = PageRequest { page: 1, per_page: 2 };
    let (rows, total) = repo
        .query(&ActivityLogFilter::default(), &page)
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(rows.len(), 2);

    let last_page = PageRequest { page: 3, per_page: 2 };
    let (rows, _) = repo
        .query(&ActivityLogFilter::default(), &last_page)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn query_joins_acting_user_display_fields() {
    let db = setup_db().await;
    let repo = ActivityLogRepository::new(db.clone());
    let user = create_user(&db).await;

    let mut entry = NewActivityLog::new("login");
    entry.user_id = Some(user.id);
    let row = repo.insert(entry).await.unwrap();

    let (_, joined) = repo.find_with_user(row.id).await.unwrap().unwrap();
    let joined = joined.expect("acting user should resolve");
    assert_eq!(joined.id, user.id);
    assert_eq!(joined.email, user.email);
}
