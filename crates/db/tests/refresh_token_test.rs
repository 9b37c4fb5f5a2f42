//! Integration tests for refresh token storage and rotation.

mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use vantra_db::RefreshTokenRepository;
use vantra_db::repositories::hash_token;

use common::{create_user, setup_db};

#[tokio::test]
async fn stores_digest_not_raw_token() {
    let db = setup_db().await;
    let repo = RefreshTokenRepository::new(db.clone());
    let user = create_user(&db).await;

    let raw = "header.payload.signature";
    let row = repo
        .create(user.id, raw, Uuid::new_v4(), Utc::now() + Duration::days(1))
        .await
        .unwrap();

    assert_eq!(row.token_hash, hash_token(raw));
    assert_ne!(row.token_hash, raw);
}

#[tokio::test]
async fn find_by_token_returns_revoked_rows() {
    // Reuse of a rotated token must be distinguishable from an unknown
    // token, so the lookup does not filter on is_revoked.
    let db = setup_db().await;
    let repo = RefreshTokenRepository::new(db.clone());
    let user = create_user(&db).await;

    let row = repo
        .create(user.id, "tok-1", Uuid::new_v4(), Utc::now() + Duration::days(1))
        .await
        .unwrap();
    repo.revoke(row.id).await.unwrap();

    let found = repo.find_by_token("tok-1").await.unwrap().unwrap();
    assert!(found.is_revoked);

    assert!(repo.find_by_token("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn revoke_family_invalidates_whole_lineage() {
    let db = setup_db().await;
    let repo = RefreshTokenRepository::new(db.clone());
    let user = create_user(&db).await;

    let family = Uuid::new_v4();
    let other_family = Uuid::new_v4();
    for token in ["gen-1", "gen-2", "gen-3"] {
        repo.create(user.id, token, family, Utc::now() + Duration::days(1))
            .await
            .unwrap();
    }
    repo.create(user.id, "other", other_family, Utc::now() + Duration::days(1))
        .await
        .unwrap();

    let revoked = repo.revoke_family(family).await.unwrap();
    assert_eq!(revoked, 3);

    for token in ["gen-1", "gen-2", "gen-3"] {
        assert!(repo.find_by_token(token).await.unwrap().unwrap().is_revoked);
    }
    assert!(!repo.find_by_token("other").await.unwrap().unwrap().is_revoked);
}

#[tokio::test]
async fn revoke_all_for_user_spares_other_users() {
    let db = setup_db().await;
    let repo = RefreshTokenRepository::new(db.clone());
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;

    repo.create(alice.id, "alice-1", Uuid::new_v4(), Utc::now() + Duration::days(1))
        .await
        .unwrap();
    repo.create(alice.id, "alice-2", Uuid::new_v4(), Utc::now() + Duration::days(1))
        .await
        .unwrap();
    repo.create(bob.id, "bob-1", Uuid::new_v4(), Utc::now() + Duration::days(1))
        .await
        .unwrap();

    let revoked = repo.revoke_all_for_user(alice.id).await.unwrap();
    assert_eq!(revoked, 2);
    assert!(!repo.find_by_token("bob-1").await.unwrap().unwrap().is_revoked);
}

#[tokio::test]
async fn cleanup_deletes_only_expired_rows() {
    let db = setup_db().await;
    let repo = RefreshTokenRepository::new(db.clone());
    let user = create_user(&db).await;

    repo.create(user.id, "stale", Uuid::new_v4(), Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    repo.create(user.id, "live", Uuid::new_v4(), Utc::now() + Duration::days(1))
        .await
        .unwrap();

    let deleted = repo.cleanup_expired().await.unwrap();
    assert_eq!(deleted, 1);
    assert!(repo.find_by_token("stale").await.unwrap().is_none());
    assert!(repo.find_by_token("live").await.unwrap().is_some());
}
