//! Account Handlers
//!
//! Endpoints for the logged-in customer.

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};

use super::auth::auth_service;
use super::orders::order_service;
use crate::application::dto::request::{ChangePasswordRequest, PageQuery, UpdateProfileRequest};
use crate::application::dto::response::{OrderResponse, PagedResponse, UserResponse};
use crate::application::services::{AuthService, OrderService};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validate;
use crate::startup::AppState;

/// Current account
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = auth_service(&state).me(auth.user_id).await?;
    Ok(Json(user.into()))
}

/// Update name and phone
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate(&body)?;

    let user = auth_service(&state)
        .update_profile(auth.user_id, body)
        .await?;
    Ok(Json(user.into()))
}

/// Change password; every session is revoked
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate(&body)?;

    auth_service(&state)
        .change_password(auth.user_id, &body.current_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Orders placed while logged in
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResponse<OrderResponse>>, AppError> {
    let page = order_service(&state).my_orders(auth.user_id, query).await?;

    let mut response = PagedResponse::<OrderResponse>::from_page(page);
    response.items = response.items.into_iter().map(OrderResponse::public).collect();
    Ok(Json(response))
}
