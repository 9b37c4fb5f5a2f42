//! Integration tests for session tracking.

mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use vantra_db::SessionRepository;

use common::{create_user, setup_db};

fn expires() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::hours(24)
}

#[tokio::test]
async fn open_and_touch_session() {
    let db = setup_db().await;
    let repo = SessionRepository::new(db.clone());
    let user = create_user(&db).await;

    let session = repo
        .open(user.id, "access-token", Some("203.0.113.9"), Some("cli"), expires())
        .await
        .unwrap();
    assert!(session.is_active);

    let touched = repo.touch("access-token", user.id).await.unwrap();
    assert_eq!(touched, 1);

    // Touching with the wrong user or token updates nothing.
    assert_eq!(repo.touch("access-token", Uuid::new_v4()).await.unwrap(), 0);
    assert_eq!(repo.touch("other-token", user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn list_active_excludes_terminated_and_expired() {
    let db = setup_db().await;
    let repo = SessionRepository::new(db.clone());
    let user = create_user(&db).await;

    let live = repo
        .open(user.id, "tok-live", None, None, expires())
        .await
        .unwrap();
    let closed = repo
        .open(user.id, "tok-closed", None, None, expires())
        .await
        .unwrap();
    repo.open(user.id, "tok-expired", None, None, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    assert!(repo.terminate(closed.id, user.id).await.unwrap());

    let active = repo.list_active(user.id).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, live.id);
}

#[tokio::test]
async fn terminate_is_ownership_scoped() {
    let db = setup_db().await;
    let repo = SessionRepository::new(db.clone());
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;

    let session = repo
        .open(alice.id, "alice-token", None, None, expires())
        .await
        .unwrap();

    // Bob cannot terminate Alice's session; the repo reports not-found.
    assert!(!repo.terminate(session.id, bob.id).await.unwrap());
    assert!(repo.terminate(session.id, alice.id).await.unwrap());

    // Terminating an already-closed session also reports not-found.
    assert!(!repo.terminate(session.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn terminate_all_can_spare_the_current_session() {
    let db = setup_db().await;
    let repo = SessionRepository::new(db.clone());
    let user = create_user(&db).await;

    let current = repo
        .open(user.id, "current", None, None, expires())
        .await
        .unwrap();
    repo.open(user.id, "other-1", None, None, expires()).await.unwrap();
    repo.open(user.id, "other-2", None, None, expires()).await.unwrap();

    let closed = repo.terminate_all(user.id, Some(current.id)).await.unwrap();
    assert_eq!(closed, 2);

    let active = repo.list_active(user.id).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, current.id);
}

#[tokio::test]
async fn cleanup_removes_only_expired_rows() {
    let db = setup_db().await;
    let repo = SessionRepository::new(db.clone());
    let user = create_user(&db).await;

    let live = repo
        .open(user.id, "tok-live", None, None, expires())
        .await
        .unwrap();
    repo.open(user.id, "tok-stale", None, None, Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    repo.open(user.id, "tok-staler", None, None, Utc::now() - Duration::days(2))
        .await
        .unwrap();

    let removed = repo.cleanup_expired().await.unwrap();
    assert_eq!(removed, 2);

    let active = repo.list_active(user.id).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, live.id);
}

#[tokio::test]
async fn close_by_token_matches_the_presenting_session() {
    let db = setup_db().await;
    let repo = SessionRepository::new(db.clone());
    let user = create_user(&db).await;

    repo.open(user.id, "presented", None, None, expires()).await.unwrap();
    repo.open(user.id, "kept", None, None, expires()).await.unwrap();

    assert!(repo.close_by_token("presented", user.id).await.unwrap());

    let active = repo.list_active(user.id).await.unwrap();
    assert_eq!(active.len(), 1);
}
