//! Customer Handlers (admin)

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::application::dto::request::{CustomerQuery, UpdateCustomerRequest};
use crate::application::dto::response::{CustomerDetailResponse, CustomerResponse, PagedResponse};
use crate::application::services::{CustomerService, CustomerServiceImpl};
use crate::domain::services::SegmentationService;
use crate::infrastructure::repositories::{PgCustomerRepository, PgOrderRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

fn customer_service(state: &AppState) -> CustomerServiceImpl<PgCustomerRepository, PgOrderRepository> {
    let store = &state.settings.store;
    CustomerServiceImpl::new(
        Arc::new(PgCustomerRepository::new(state.db.clone())),
        Arc::new(PgOrderRepository::new(state.db.clone())),
        SegmentationService::new(store.vip_spend_threshold, store.inactive_after_days),
    )
}

/// Customers with search and segment filter
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<PagedResponse<CustomerResponse>>, AppError> {
    let page = customer_service(&state).list_customers(query).await?;
    Ok(Json(PagedResponse::from_page(page)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetailResponse>, AppError> {
    let id = parse_id(&id, "customer")?;
    let detail = customer_service(&state).get_customer(id).await?;
    Ok(Json(detail.into()))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    let id = parse_id(&id, "customer")?;
    validate(&body)?;
    let customer = customer_service(&state).update_customer(id, body).await?;
    Ok(Json(customer.into()))
}
