//! Inventory & Supplier Handlers (admin)

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    MovementQuery, ProductSupplierRequest, StockAdjustmentRequest, SupplierQuery, SupplierRequest,
};
use crate::application::dto::response::{
    PagedResponse, ProductSupplierResponse, StockMovementResponse, SupplierDetailResponse,
    SupplierResponse,
};
use crate::application::services::{InventoryService, InventoryServiceImpl};
use crate::infrastructure::repositories::{
    PgInventoryRepository, PgProductRepository, PgSupplierRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

type Inventory =
    InventoryServiceImpl<PgInventoryRepository, PgSupplierRepository, PgProductRepository>;

fn inventory_service(state: &AppState) -> Inventory {
    InventoryServiceImpl::new(
        Arc::new(PgInventoryRepository::new(state.db.clone())),
        Arc::new(PgSupplierRepository::new(state.db.clone())),
        Arc::new(PgProductRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

/// Adjust stock by a signed quantity or to an absolute level
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<StockAdjustmentRequest>,
) -> Result<(StatusCode, Json<StockMovementResponse>), AppError> {
    validate(&body)?;
    let movement = inventory_service(&state)
        .adjust_stock(body, auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(movement.into())))
}

pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> Result<Json<PagedResponse<StockMovementResponse>>, AppError> {
    let page = inventory_service(&state).list_movements(query).await?;
    Ok(Json(PagedResponse::from_page(page)))
}

// ============================================================================
// Suppliers
// ============================================================================

pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<SupplierQuery>,
) -> Result<Json<Vec<SupplierResponse>>, AppError> {
    let suppliers = inventory_service(&state)
        .list_suppliers(query.include_inactive)
        .await?;
    Ok(Json(suppliers.into_iter().map(Into::into).collect()))
}

/// Supplier with the products it delivers
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SupplierDetailResponse>, AppError> {
    let id = parse_id(&id, "supplier")?;
    let detail = inventory_service(&state).get_supplier(id).await?;
    Ok(Json(detail.into()))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Json(body): Json<SupplierRequest>,
) -> Result<(StatusCode, Json<SupplierResponse>), AppError> {
    validate(&body)?;
    let supplier = inventory_service(&state).create_supplier(body).await?;
    Ok((StatusCode::CREATED, Json(supplier.into())))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SupplierRequest>,
) -> Result<Json<SupplierResponse>, AppError> {
    let id = parse_id(&id, "supplier")?;
    validate(&body)?;
    let supplier = inventory_service(&state).update_supplier(id, body).await?;
    Ok(Json(supplier.into()))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "supplier")?;
    inventory_service(&state).delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Link (or re-link) a product to a supplier
pub async fn link_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ProductSupplierRequest>,
) -> Result<Json<ProductSupplierResponse>, AppError> {
    let id = parse_id(&id, "supplier")?;
    validate(&body)?;
    let link = inventory_service(&state).link_product(id, body).await?;
    Ok(Json(link.into()))
}

pub async fn unlink_product(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "supplier")?;
    let product_id = parse_id(&product_id, "product")?;
    inventory_service(&state)
        .unlink_product(id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn product_suppliers(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<ProductSupplierResponse>>, AppError> {
    let product_id = parse_id(&product_id, "product")?;
    let links = inventory_service(&state)
        .suppliers_for_product(product_id)
        .await?;
    Ok(Json(links.into_iter().map(Into::into).collect()))
}
