//! Catalog Handlers
//!
//! Storefront browsing plus admin management of categories, products,
//! images and variations.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    CategoryRequest, LowStockQuery, ProductImageRequest, ProductQuery, ProductRequest,
    SetCategoriesRequest, VariationRequest,
};
use crate::application::dto::response::{
    CategoryResponse, PagedResponse, ProductDetailResponse, ProductImageResponse, ProductResponse,
    VariationResponse,
};
use crate::application::services::{CatalogService, CatalogServiceImpl};
use crate::infrastructure::repositories::{
    PgCategoryRepository, PgProductRepository, PgPromotionRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

type Catalog = CatalogServiceImpl<PgCategoryRepository, PgProductRepository, PgPromotionRepository>;

fn catalog_service(state: &AppState) -> Catalog {
    CatalogServiceImpl::new(
        Arc::new(PgCategoryRepository::new(state.db.clone())),
        Arc::new(PgProductRepository::new(state.db.clone())),
        Arc::new(PgPromotionRepository::new(state.db.clone())),
        state.snowflake.clone(),
        state.settings.store.low_stock_threshold,
    )
}

// ============================================================================
// Storefront
// ============================================================================

/// Active categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = catalog_service(&state).list_categories(false).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = catalog_service(&state).get_category_by_slug(&slug).await?;
    Ok(Json(category.into()))
}

/// Product listing with filters, sorting and pagination
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<PagedResponse<ProductResponse>>, AppError> {
    let page = catalog_service(&state).list_products(query, false).await?;

    let mut response = PagedResponse::<ProductResponse>::from_page(page);
    response.items = response.items.into_iter().map(ProductResponse::public).collect();
    Ok(Json(response))
}

pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let detail = catalog_service(&state).get_product_by_slug(&slug).await?;
    Ok(Json(detail.into()))
}

// ============================================================================
// Admin: categories
// ============================================================================

/// Every category, inactive ones included
pub async fn admin_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = catalog_service(&state).list_categories(true).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let id = parse_id(&id, "category")?;
    let category = catalog_service(&state).get_category(id).await?;
    Ok(Json(category.into()))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    validate(&body)?;
    let category = catalog_service(&state).create_category(body).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let id = parse_id(&id, "category")?;
    validate(&body)?;
    let category = catalog_service(&state).update_category(id, body).await?;
    Ok(Json(category.into()))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "category")?;
    catalog_service(&state).delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin: products
// ============================================================================

/// Products including inactive ones, with cost prices
pub async fn admin_list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<PagedResponse<ProductResponse>>, AppError> {
    let page = catalog_service(&state).list_products(query, true).await?;
    Ok(Json(PagedResponse::from_page(page)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let id = parse_id(&id, "product")?;
    let product = catalog_service(&state).get_product(id).await?;
    Ok(Json(product.into()))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    validate(&body)?;
    let product = catalog_service(&state).create_product(body).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let id = parse_id(&id, "product")?;
    validate(&body)?;
    let product = catalog_service(&state).update_product(id, body).await?;
    Ok(Json(product.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "product")?;
    catalog_service(&state).delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the category links of a product
pub async fn set_product_categories(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetCategoriesRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let id = parse_id(&id, "product")?;
    let product = catalog_service(&state)
        .set_product_categories(id, body.category_ids)
        .await?;
    Ok(Json(product.into()))
}

pub async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ProductImageRequest>,
) -> Result<(StatusCode, Json<ProductImageResponse>), AppError> {
    let id = parse_id(&id, "product")?;
    validate(&body)?;
    let image = catalog_service(&state).add_image(id, body).await?;
    Ok((StatusCode::CREATED, Json(image.into())))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "product")?;
    let image_id = parse_id(&image_id, "image")?;
    catalog_service(&state).delete_image(id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_primary_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "product")?;
    let image_id = parse_id(&image_id, "image")?;
    catalog_service(&state).set_primary_image(id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_variation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<VariationRequest>,
) -> Result<(StatusCode, Json<VariationResponse>), AppError> {
    let id = parse_id(&id, "product")?;
    validate(&body)?;
    let variation = catalog_service(&state).create_variation(id, body).await?;
    Ok((StatusCode::CREATED, Json(variation.into())))
}

pub async fn update_variation(
    State(state): State<AppState>,
    Path((id, variation_id)): Path<(String, String)>,
    Json(body): Json<VariationRequest>,
) -> Result<Json<VariationResponse>, AppError> {
    let id = parse_id(&id, "product")?;
    let variation_id = parse_id(&variation_id, "variation")?;
    validate(&body)?;
    let variation = catalog_service(&state)
        .update_variation(id, variation_id, body)
        .await?;
    Ok(Json(variation.into()))
}

pub async fn delete_variation(
    State(state): State<AppState>,
    Path((id, variation_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "product")?;
    let variation_id = parse_id(&variation_id, "variation")?;
    catalog_service(&state)
        .delete_variation(id, variation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Products at or below their low-stock threshold
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = catalog_service(&state)
        .low_stock(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}
