//! Authorization gate and session visibility tests.

mod common;

use axum::http::StatusCode;
use uuid::Uuid;

use vantra_shared::{JwtConfig, JwtService};

use common::{TEST_PASSWORD, login, register_user, send, test_app, test_jwt_config};

#[tokio::test]
async fn missing_invalid_and_expired_tokens_are_distinguished() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    // Mint an already-expired token with the same secrets and issuer.
    let expired_issuer = JwtService::new(JwtConfig {
        access_token_expires_minutes: -5,
        ..test_jwt_config()
    });
    let expired = expired_issuer
        .issue_pair(Uuid::new_v4(), "a@example.com", None, None)
        .unwrap();
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/auth/me",
        Some(&expired.access_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn token_for_unknown_user_is_invalid() {
    let (app, _) = test_app().await;

    let issuer = JwtService::new(test_jwt_config());
    let issued = issuer
        .issue_pair(Uuid::new_v4(), "ghost@example.com", None, None)
        .unwrap();

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/auth/me",
        Some(&issued.access_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn health_check_needs_no_token() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn role_permissions_gate_admin_surfaces() {
    let (app, state) = test_app().await;

    // The seeded employee role has no permissions.
    let employee = register_user(&app, &state, Some("employee")).await;
    let (employee_token, _) = login(&app, &employee, TEST_PASSWORD).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/auth/users",
        Some(&employee_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // A user with no role at all is denied too.
    let roleless = register_user(&app, &state, None).await;
    let (roleless_token, _) = login(&app, &roleless, TEST_PASSWORD).await;
    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/auth/users",
        Some(&roleless_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The seeded admin role holds the full catalog.
    let admin = register_user(&app, &state, Some("admin")).await;
    let (admin_token, _) = login(&app, &admin, TEST_PASSWORD).await;
    let (status, body) = send(&app, "GET", "/api/v1/auth/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn login_resolves_admin_permissions() {
    let (app, state) = test_app().await;
    let admin = register_user(&app, &state, Some("admin")).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(serde_json::json!({ "email": admin, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
    let permissions = body["user"]["permissions"].as_array().unwrap();
    assert_eq!(permissions.len(), 9);
    assert!(permissions.iter().any(|p| p == "users.view"));
    assert!(permissions.iter().any(|p| p == "activity_logs.view"));
}

#[tokio::test]
async fn sessions_are_listed_and_terminated_per_owner() {
    let (app, state) = test_app().await;
    let email = register_user(&app, &state, None).await;
    let (first, _) = login(&app, &email, TEST_PASSWORD).await;
    let (second, _) = login(&app, &email, TEST_PASSWORD).await;

    let (status, body) = send(&app, "GET", "/api/v1/auth/sessions", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    let victim = sessions[0]["id"].as_str().unwrap().to_string();

    // Another user cannot terminate them.
    let other = register_user(&app, &state, None).await;
    let (other_token, _) = login(&app, &other, TEST_PASSWORD).await;
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/auth/sessions/{victim}"),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner can.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/auth/sessions/{victim}"),
        Some(&first),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/v1/auth/sessions", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Unknown session IDs 404.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/auth/sessions/{}", Uuid::new_v4()),
        Some(&second),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_session_confirms_a_live_token() {
    let (app, state) = test_app().await;
    let email = register_user(&app, &state, None).await;
    let (access, _) = login(&app, &email, TEST_PASSWORD).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/auth/check-session",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}
