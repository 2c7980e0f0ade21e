//! Marketing Handlers
//!
//! Campaigns, coupons and product promotions. Coupon validation is the only
//! public endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    CampaignRequest, CouponRequest, PromotionQuery, PromotionRequest, ValidateCouponRequest,
};
use crate::application::dto::response::{
    CampaignResponse, CouponResponse, CouponUsageResponse, CouponValidationResponse,
    PromotionResponse,
};
use crate::application::services::{MarketingService, MarketingServiceImpl};
use crate::infrastructure::repositories::{
    PgCampaignRepository, PgCouponRepository, PgProductRepository, PgPromotionRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

type Marketing = MarketingServiceImpl<
    PgCampaignRepository,
    PgCouponRepository,
    PgPromotionRepository,
    PgProductRepository,
>;

fn marketing_service(state: &AppState) -> Marketing {
    MarketingServiceImpl::new(
        Arc::new(PgCampaignRepository::new(state.db.clone())),
        Arc::new(PgCouponRepository::new(state.db.clone())),
        Arc::new(PgPromotionRepository::new(state.db.clone())),
        Arc::new(PgProductRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

/// Storefront coupon check; an unusable coupon is a normal response with
/// `is_valid = false`
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(body): Json<ValidateCouponRequest>,
) -> Result<Json<CouponValidationResponse>, AppError> {
    validate(&body)?;
    let result = marketing_service(&state).validate_coupon(body).await?;
    Ok(Json(result.into()))
}

// ============================================================================
// Campaigns
// ============================================================================

pub async fn list_campaigns(
    State(state): State<AppState>,
) -> Result<Json<Vec<CampaignResponse>>, AppError> {
    let campaigns = marketing_service(&state).list_campaigns().await?;
    Ok(Json(campaigns.into_iter().map(Into::into).collect()))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CampaignResponse>, AppError> {
    let id = parse_id(&id, "campaign")?;
    let campaign = marketing_service(&state).get_campaign(id).await?;
    Ok(Json(campaign.into()))
}

pub async fn create_campaign(
    State(state): State<AppState>,
    Json(body): Json<CampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), AppError> {
    validate(&body)?;
    let campaign = marketing_service(&state).create_campaign(body).await?;
    Ok((StatusCode::CREATED, Json(campaign.into())))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CampaignRequest>,
) -> Result<Json<CampaignResponse>, AppError> {
    let id = parse_id(&id, "campaign")?;
    validate(&body)?;
    let campaign = marketing_service(&state).update_campaign(id, body).await?;
    Ok(Json(campaign.into()))
}

pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "campaign")?;
    marketing_service(&state).delete_campaign(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Coupons
// ============================================================================

pub async fn list_coupons(
    State(state): State<AppState>,
) -> Result<Json<Vec<CouponResponse>>, AppError> {
    let coupons = marketing_service(&state).list_coupons().await?;
    Ok(Json(coupons.into_iter().map(Into::into).collect()))
}

pub async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CouponResponse>, AppError> {
    let id = parse_id(&id, "coupon")?;
    let coupon = marketing_service(&state).get_coupon(id).await?;
    Ok(Json(coupon.into()))
}

pub async fn create_coupon(
    State(state): State<AppState>,
    Json(body): Json<CouponRequest>,
) -> Result<(StatusCode, Json<CouponResponse>), AppError> {
    validate(&body)?;
    let coupon = marketing_service(&state).create_coupon(body).await?;
    Ok((StatusCode::CREATED, Json(coupon.into())))
}

pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CouponRequest>,
) -> Result<Json<CouponResponse>, AppError> {
    let id = parse_id(&id, "coupon")?;
    validate(&body)?;
    let coupon = marketing_service(&state).update_coupon(id, body).await?;
    Ok(Json(coupon.into()))
}

pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "coupon")?;
    marketing_service(&state).delete_coupon(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn coupon_usages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CouponUsageResponse>>, AppError> {
    let id = parse_id(&id, "coupon")?;
    let usages = marketing_service(&state).coupon_usages(id).await?;
    Ok(Json(usages.into_iter().map(Into::into).collect()))
}

// ============================================================================
// Promotions
// ============================================================================

pub async fn list_promotions(
    State(state): State<AppState>,
    Query(query): Query<PromotionQuery>,
) -> Result<Json<Vec<PromotionResponse>>, AppError> {
    let product_id = query
        .product_id
        .as_deref()
        .map(|raw| parse_id(raw, "product"))
        .transpose()?;
    let promotions = marketing_service(&state).list_promotions(product_id).await?;
    Ok(Json(promotions.into_iter().map(Into::into).collect()))
}

pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PromotionResponse>, AppError> {
    let id = parse_id(&id, "promotion")?;
    let promotion = marketing_service(&state).get_promotion(id).await?;
    Ok(Json(promotion.into()))
}

pub async fn create_promotion(
    State(state): State<AppState>,
    Json(body): Json<PromotionRequest>,
) -> Result<(StatusCode, Json<PromotionResponse>), AppError> {
    validate(&body)?;
    let promotion = marketing_service(&state).create_promotion(body).await?;
    Ok((StatusCode::CREATED, Json(promotion.into())))
}

pub async fn update_promotion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PromotionRequest>,
) -> Result<Json<PromotionResponse>, AppError> {
    let id = parse_id(&id, "promotion")?;
    validate(&body)?;
    let promotion = marketing_service(&state).update_promotion(id, body).await?;
    Ok(Json(promotion.into()))
}

pub async fn delete_promotion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "promotion")?;
    marketing_service(&state).delete_promotion(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
