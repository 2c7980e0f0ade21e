//! Order Handlers
//!
//! Checkout and tracking for the storefront, order administration for the
//! back office.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::prelude::ToPrimitive;

use crate::application::dto::request::{
    OrderNoteRequest, OrderQuery, PlaceOrderRequest, TrackOrderQuery, UpdateOrderStatusRequest,
    UpdatePaymentStatusRequest,
};
use crate::application::dto::response::{OrderResponse, PagedResponse};
use crate::application::services::{OrderService, OrderServiceImpl};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{
    PgCouponRepository, PgOrderRepository, PgProductRepository, PgPromotionRepository,
    PgStoreSettingRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

type Orders = OrderServiceImpl<
    PgOrderRepository,
    PgProductRepository,
    PgCouponRepository,
    PgPromotionRepository,
    PgStoreSettingRepository,
>;

pub(crate) fn order_service(state: &AppState) -> Orders {
    OrderServiceImpl::new(
        Arc::new(PgOrderRepository::new(state.db.clone())),
        Arc::new(PgProductRepository::new(state.db.clone())),
        Arc::new(PgCouponRepository::new(state.db.clone())),
        Arc::new(PgPromotionRepository::new(state.db.clone())),
        Arc::new(PgStoreSettingRepository::new(state.db.clone())),
        state.snowflake.clone(),
        state.settings.store.clone(),
    )
}

/// Checkout. Guests may order; a logged-in customer gets the order linked.
pub async fn place_order(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    validate(&body)?;

    let user_id = auth.map(|Extension(user)| user.user_id);
    let order = order_service(&state).place_order(body, user_id).await?;

    metrics::record_order_placed(
        order.payment_method.as_str(),
        &state.settings.store.currency,
        order.total.to_f64().unwrap_or_default(),
    );

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order).public())))
}

/// Public tracking; the email must match the order
pub async fn track_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Query(query): Query<TrackOrderQuery>,
) -> Result<Json<OrderResponse>, AppError> {
    validate(&query)?;

    let order = order_service(&state)
        .track_order(&order_number, &query.email)
        .await?;
    Ok(Json(OrderResponse::from(order).public()))
}

// ============================================================================
// Admin
// ============================================================================

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<PagedResponse<OrderResponse>>, AppError> {
    let page = order_service(&state).list_orders(query).await?;
    Ok(Json(PagedResponse::from_page(page)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let id = parse_id(&id, "order")?;
    let order = order_service(&state).get_order(id).await?;
    Ok(Json(order.into()))
}

/// Move the order through its fulfilment states; cancelling restocks items
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let id = parse_id(&id, "order")?;
    let order = order_service(&state).update_status(id, &body.status).await?;
    Ok(Json(order.into()))
}

pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let id = parse_id(&id, "order")?;
    let order = order_service(&state)
        .update_payment_status(id, &body.payment_status)
        .await?;
    Ok(Json(order.into()))
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<OrderNoteRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let id = parse_id(&id, "order")?;
    validate(&body)?;
    let order = order_service(&state).update_note(id, body.note).await?;
    Ok(Json(order.into()))
}
