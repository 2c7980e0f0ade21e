//! Admin Access Tests

use axum::http::StatusCode;
use flower_shop::domain::UserRole;
use serde_json::json;
use test_case::test_case;

use crate::common::{assert_error, TestApp};

#[test_case("/api/admin/dashboard" ; "dashboard")]
#[test_case("/api/admin/orders" ; "orders")]
#[test_case("/api/admin/products" ; "products")]
#[test_case("/api/admin/finance/summary" ; "finance summary")]
#[test_case("/api/admin/settings" ; "settings")]
#[tokio::test]
async fn test_admin_routes_require_token(uri: &str) {
    let app = TestApp::new();

    let response = app.get(uri).await;

    assert_error(response, StatusCode::UNAUTHORIZED, 10003).await;
}

#[test_case("/api/admin/dashboard" ; "dashboard")]
#[test_case("/api/admin/customers" ; "customers")]
#[test_case("/api/admin/inventory/low-stock" ; "low stock")]
#[tokio::test]
async fn test_admin_routes_forbid_customers(uri: &str) {
    let app = TestApp::new();
    let token = app.token(7, UserRole::Customer);

    let response = app.get_auth(uri, &token).await;

    assert_error(response, StatusCode::FORBIDDEN, 10004).await;
}

#[test_case("/api/admin/products/not-a-number" ; "product")]
#[test_case("/api/admin/orders/0" ; "order")]
#[test_case("/api/admin/suppliers/-5" ; "supplier")]
#[tokio::test]
async fn test_admin_rejects_invalid_ids(uri: &str) {
    let app = TestApp::new();
    let token = app.token(1, UserRole::Admin);

    let response = app.get_auth(uri, &token).await;

    assert_error(response, StatusCode::BAD_REQUEST, 10002).await;
}

#[tokio::test]
async fn test_admin_create_category_validates_body() {
    let app = TestApp::new();
    let token = app.token(1, UserRole::Admin);

    let response = app
        .post_json_auth("/api/admin/categories", &json!({ "name": "" }), &token)
        .await;

    assert_error(response, StatusCode::BAD_REQUEST, 10007).await;
}
