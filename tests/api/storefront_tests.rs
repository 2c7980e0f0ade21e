//! Storefront API Tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use crate::common::{assert_error, TestApp};

#[tokio::test]
async fn test_place_order_requires_items() {
    let app = TestApp::new();
    let body = json!({
        "items": [],
        "customer_name": "Ayse Yilmaz",
        "customer_email": "ayse@example.com",
        "customer_phone": "05551234567",
        "recipient_name": "Mehmet Yilmaz",
        "shipping_address": "Bagdat Cad. 10",
        "shipping_city": "Istanbul"
    });

    let response = app.post_json("/api/orders", &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_coupon_requires_code() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/coupons/validate",
            &json!({ "code": "", "subtotal": "100.00" }),
        )
        .await;

    assert_error(response, StatusCode::BAD_REQUEST, 10007).await;
}

#[tokio::test]
async fn test_contact_form_rejects_short_message() {
    let app = TestApp::new();
    let body = json!({
        "name": "Ayse",
        "email": "ayse@example.com",
        "subject": "Wedding bouquet",
        "message": "Hi"
    });

    let response = app.post_json("/api/contact", &body).await;

    let body = assert_error(response, StatusCode::BAD_REQUEST, 10007).await;
    assert_eq!(body["errors"][0]["field"], "message");
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let app = TestApp::new();

    let response = app
        .request(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/products")
                .header(header::ORIGIN, "https://shop.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://shop.example.com"
    );
}
