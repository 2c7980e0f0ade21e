//! Authentication API Tests
//!
//! Validation and token checks run before any database access, so these
//! tests do not need PostgreSQL.

use axum::http::StatusCode;
use flower_shop::application::services::auth_service::issue_access_token;
use flower_shop::config::JwtSettings;
use flower_shop::domain::UserRole;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{assert_error, TestApp};

#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    let app = TestApp::new();
    let body = json!({
        "email": "not-an-email",
        "password": "ValidPassword123!",
        "full_name": "Ayse Yilmaz"
    });

    let response = app.post_json("/api/auth/register", &body).await;

    let body = assert_error(response, StatusCode::BAD_REQUEST, 10007).await;
    assert_eq!(body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_register_with_short_password_fails() {
    let app = TestApp::new();
    let body = json!({
        "email": "ayse@example.com",
        "password": "short",
        "full_name": "Ayse Yilmaz"
    });

    let response = app.post_json("/api/auth/register", &body).await;

    let body = assert_error(response, StatusCode::BAD_REQUEST, 10007).await;
    assert_eq!(body["errors"][0]["field"], "password");
}

#[tokio::test]
async fn test_login_requires_password() {
    let app = TestApp::new();
    let body = json!({ "email": "ayse@example.com", "password": "" });

    let response = app.post_json("/api/auth/login", &body).await;

    assert_error(response, StatusCode::BAD_REQUEST, 10007).await;
}

#[tokio::test]
async fn test_account_requires_token() {
    let app = TestApp::new();

    let response = app.get("/api/account/me").await;

    assert_error(response, StatusCode::UNAUTHORIZED, 10003).await;
}

#[tokio::test]
async fn test_account_rejects_malformed_header() {
    let app = TestApp::new();

    let response = app
        .request(
            axum::http::Request::get("/api/account/me")
                .header("Authorization", "Token abc")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_error(response, StatusCode::UNAUTHORIZED, 10003).await;
}

#[tokio::test]
async fn test_account_rejects_token_signed_with_other_secret() {
    let app = TestApp::new();
    let foreign = JwtSettings {
        secret: "some-other-secret-that-is-also-32-chars-long".into(),
        access_token_expiry_minutes: 15,
        refresh_token_expiry_days: 7,
    };
    let token = issue_access_token(42, UserRole::Customer, &foreign).unwrap();

    let response = app.get_auth("/api/account/me", &token).await;

    assert_error(response, StatusCode::UNAUTHORIZED, 10003).await;
}

#[tokio::test]
async fn test_refresh_requires_token_value() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/auth/refresh", &json!({ "refresh_token": "" }))
        .await;

    assert_error(response, StatusCode::BAD_REQUEST, 10007).await;
}
