//! End-to-end account lockout tests.

mod common;

use axum::http::StatusCode;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

use vantra_db::UserRepository;
use vantra_db::entities::users::{self, UserStatus};
use vantra_db::repositories::UserChanges;

use common::{TEST_PASSWORD, login, register_user, send, test_app};

async fn fail_login(app: &axum::Router, email: &str) -> (StatusCode, serde_json::Value) {
    send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "wrong-password" })),
    )
    .await
}

#[tokio::test]
async fn fifth_failure_locks_the_account() {
    let (app, state) = test_app().await;
    let email = register_user(&app, &state, None).await;

    for _ in 0..4 {
        let (status, body) = fail_login(&app, &email).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_credentials");
    }

    let (status, body) = fail_login(&app, &email).await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"], "account_locked");
    assert!(body["locked_until"].is_string());

    // The correct password makes no difference while locked.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"], "account_locked");
}

#[tokio::test]
async fn elapsed_lockout_heals_on_next_attempt() {
    let (app, state) = test_app().await;
    let email = register_user(&app, &state, None).await;

    for _ in 0..5 {
        fail_login(&app, &email).await;
    }

    // Backdate the lockout so it has elapsed.
    let repo = UserRepository::new((*state.db).clone());
    let user = repo.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(user.status, UserStatus::Suspended);
    users::ActiveModel {
        id: Set(user.id),
        locked_until: Set(Some(chrono::Utc::now() - chrono::Duration::minutes(1))),
        ..Default::default()
    }
    .update(&*state.db)
    .await
    .unwrap();

    // The next attempt heals the lock and evaluates credentials normally.
    let (access, _) = login(&app, &email, TEST_PASSWORD).await;
    let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);

    let healed = repo.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(healed.status, UserStatus::Active);
    assert_eq!(healed.failed_login_attempts, 0);
}

#[tokio::test]
async fn successful_login_resets_the_failure_counter() {
    let (app, state) = test_app().await;
    let email = register_user(&app, &state, None).await;

    for _ in 0..4 {
        fail_login(&app, &email).await;
    }
    login(&app, &email, TEST_PASSWORD).await;

    // Four more failures fit before the threshold trips again.
    for _ in 0..4 {
        let (status, _) = fail_login(&app, &email).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, _) = fail_login(&app, &email).await;
    assert_eq!(status, StatusCode::LOCKED);
}

#[tokio::test]
async fn admin_suspension_blocks_login_without_healing() {
    let (app, state) = test_app().await;
    let email = register_user(&app, &state, None).await;

    let repo = UserRepository::new((*state.db).clone());
    let user = repo.find_by_email(&email).await.unwrap().unwrap();
    repo.update(
        user.id,
        UserChanges {
            status: Some(UserStatus::Suspended),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // No locked_until, so the attempt reaches the status check and is
    // rejected as inactive rather than locked.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_inactive");
}

#[tokio::test]
async fn inactive_account_is_rejected_at_the_gate() {
    let (app, state) = test_app().await;
    let email = register_user(&app, &state, None).await;
    let (access, _) = login(&app, &email, TEST_PASSWORD).await;

    let repo = UserRepository::new((*state.db).clone());
    let user = repo.find_by_email(&email).await.unwrap().unwrap();
    repo.update(
        user.id,
        UserChanges {
            status: Some(UserStatus::Inactive),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // A live token stops working the moment the account is deactivated.
    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_inactive");
}
