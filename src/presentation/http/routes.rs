//! Route Configuration
//!
//! Configures all HTTP routes for the API.
//!
//! ```text
//! /api/auth/*       public, auth rate limit
//! /api/account/*    logged-in customer
//! /api/...          storefront (catalog, checkout, tracking, content)
//! /api/admin/*      role `admin`
//! /health*          probes
//! /metrics          Prometheus
//! ```

use axum::{
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::compression::CompressionLayer;

use super::handlers::{
    account, auth, catalog, content, customers, finance, health, inventory, marketing, orders,
    store,
};
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    auth_middleware, cors, create_security_headers_layer, create_trace_layer,
    optional_auth_middleware, rate_limit_api, rate_limit_auth, rate_limit_contact, require_admin,
    track_http_metrics,
};
use crate::startup::AppState;

/// Create the main application router with every middleware layer applied
pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    Router::new()
        .nest("/api", api_routes(state.clone()))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_http_metrics))
        .layer(CompressionLayer::new())
        .layer(create_trace_layer())
        .layer(cors::create_cors_layer(&settings.cors))
        .layer(create_security_headers_layer(settings.is_production()))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::gather_metrics(),
    )
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/account", account_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .merge(storefront_routes(state.clone()))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_api))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_auth))
}

fn account_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(account::me).patch(account::update_me))
        .route("/password", put(account::change_password))
        .route("/orders", get(account::my_orders))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Public storefront
fn storefront_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{slug}", get(catalog::get_category_by_slug))
        .route("/products", get(catalog::list_products))
        .route("/products/{slug}", get(catalog::get_product_by_slug))
        .route(
            "/orders",
            post(orders::place_order).layer(middleware::from_fn_with_state(
                state.clone(),
                optional_auth_middleware,
            )),
        )
        .route("/orders/track/{order_number}", get(orders::track_order))
        .route("/coupons/validate", post(marketing::validate_coupon))
        .route("/home", get(content::home_page))
        .route("/faqs", get(content::faq_groups))
        .route(
            "/contact",
            post(store::submit_contact)
                .layer(middleware::from_fn_with_state(state, rate_limit_contact)),
        )
        .route("/settings", get(store::public_settings))
}

/// Back office; every route requires an admin token
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(finance::dashboard))
        .merge(admin_catalog_routes())
        .merge(admin_order_routes())
        .merge(admin_inventory_routes())
        .merge(admin_finance_routes())
        .merge(admin_marketing_routes())
        .merge(admin_content_routes())
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn admin_catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(catalog::admin_list_categories).post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route(
            "/products",
            get(catalog::admin_list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route(
            "/products/{id}/categories",
            put(catalog::set_product_categories),
        )
        .route("/products/{id}/images", post(catalog::add_image))
        .route(
            "/products/{id}/images/{image_id}",
            axum::routing::delete(catalog::delete_image),
        )
        .route(
            "/products/{id}/images/{image_id}/primary",
            put(catalog::set_primary_image),
        )
        .route("/products/{id}/variations", post(catalog::create_variation))
        .route(
            "/products/{id}/variations/{variation_id}",
            put(catalog::update_variation).delete(catalog::delete_variation),
        )
        .route("/products/{id}/suppliers", get(inventory::product_suppliers))
}

fn admin_order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/status", patch(orders::update_status))
        .route(
            "/orders/{id}/payment-status",
            patch(orders::update_payment_status),
        )
        .route("/orders/{id}/note", patch(orders::update_note))
        .route("/customers", get(customers::list_customers))
        .route(
            "/customers/{id}",
            get(customers::get_customer).patch(customers::update_customer),
        )
}

fn admin_inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory/adjustments", post(inventory::adjust_stock))
        .route("/inventory/movements", get(inventory::list_movements))
        .route("/inventory/low-stock", get(catalog::low_stock))
        .route(
            "/suppliers",
            get(inventory::list_suppliers).post(inventory::create_supplier),
        )
        .route(
            "/suppliers/{id}",
            get(inventory::get_supplier)
                .put(inventory::update_supplier)
                .delete(inventory::delete_supplier),
        )
        .route("/suppliers/{id}/products", post(inventory::link_product))
        .route(
            "/suppliers/{id}/products/{product_id}",
            axum::routing::delete(inventory::unlink_product),
        )
}

fn admin_finance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/finance/expense-categories",
            get(finance::list_expense_categories).post(finance::create_expense_category),
        )
        .route(
            "/finance/expense-categories/{id}",
            put(finance::update_expense_category).delete(finance::delete_expense_category),
        )
        .route(
            "/finance/expenses",
            get(finance::list_expenses).post(finance::create_expense),
        )
        .route(
            "/finance/expenses/{id}",
            get(finance::get_expense)
                .put(finance::update_expense)
                .delete(finance::delete_expense),
        )
        .route("/finance/summary", get(finance::summary))
}

fn admin_marketing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/campaigns",
            get(marketing::list_campaigns).post(marketing::create_campaign),
        )
        .route(
            "/campaigns/{id}",
            get(marketing::get_campaign)
                .put(marketing::update_campaign)
                .delete(marketing::delete_campaign),
        )
        .route(
            "/coupons",
            get(marketing::list_coupons).post(marketing::create_coupon),
        )
        .route(
            "/coupons/{id}",
            get(marketing::get_coupon)
                .put(marketing::update_coupon)
                .delete(marketing::delete_coupon),
        )
        .route("/coupons/{id}/usages", get(marketing::coupon_usages))
        .route(
            "/promotions",
            get(marketing::list_promotions).post(marketing::create_promotion),
        )
        .route(
            "/promotions/{id}",
            get(marketing::get_promotion)
                .put(marketing::update_promotion)
                .delete(marketing::delete_promotion),
        )
}

fn admin_content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/content/sections",
            get(content::list_sections).post(content::create_section),
        )
        .route("/content/sections/order", put(content::reorder_sections))
        .route(
            "/content/sections/{id}",
            get(content::get_section)
                .put(content::update_section)
                .delete(content::delete_section),
        )
        .route(
            "/content/banners",
            get(content::list_banners).post(content::create_banner),
        )
        .route(
            "/content/banners/{id}",
            get(content::get_banner)
                .put(content::update_banner)
                .delete(content::delete_banner),
        )
        .route(
            "/content/faqs",
            get(content::list_faqs).post(content::create_faq),
        )
        .route(
            "/content/faqs/{id}",
            get(content::get_faq)
                .put(content::update_faq)
                .delete(content::delete_faq),
        )
        .route("/messages", get(store::list_messages))
        .route(
            "/messages/{id}",
            patch(store::mark_read).delete(store::delete_message),
        )
        .route("/settings", get(store::list_settings))
        .route(
            "/settings/{key}",
            put(store::upsert_setting).delete(store::delete_setting),
        )
}
