//! Content Handlers
//!
//! Home page, banners and FAQs.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    BannerRequest, FaqRequest, ReorderSectionsRequest, SectionRequest,
};
use crate::application::dto::response::{
    BannerResponse, FaqGroupResponse, FaqResponse, HomePageResponse, SectionResponse,
};
use crate::application::services::{ContentService, ContentServiceImpl};
use crate::infrastructure::repositories::{
    PgContentRepository, PgFaqRepository, PgProductRepository, PgPromotionRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

type Content = ContentServiceImpl<
    PgContentRepository,
    PgFaqRepository,
    PgProductRepository,
    PgPromotionRepository,
>;

fn content_service(state: &AppState) -> Content {
    ContentServiceImpl::new(
        Arc::new(PgContentRepository::new(state.db.clone())),
        Arc::new(PgFaqRepository::new(state.db.clone())),
        Arc::new(PgProductRepository::new(state.db.clone())),
        Arc::new(PgPromotionRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

/// Storefront landing page
pub async fn home_page(
    State(state): State<AppState>,
) -> Result<Json<HomePageResponse>, AppError> {
    let home = content_service(&state).home_page().await?;
    Ok(Json(home.into()))
}

/// Active FAQs grouped by category
pub async fn faq_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<FaqGroupResponse>>, AppError> {
    let groups = content_service(&state).faq_groups().await?;
    Ok(Json(groups.into_iter().map(Into::into).collect()))
}

// ============================================================================
// Sections
// ============================================================================

pub async fn list_sections(
    State(state): State<AppState>,
) -> Result<Json<Vec<SectionResponse>>, AppError> {
    let sections = content_service(&state).list_sections().await?;
    Ok(Json(sections.into_iter().map(Into::into).collect()))
}

pub async fn get_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SectionResponse>, AppError> {
    let id = parse_id(&id, "section")?;
    let section = content_service(&state).get_section(id).await?;
    Ok(Json(section.into()))
}

pub async fn create_section(
    State(state): State<AppState>,
    Json(body): Json<SectionRequest>,
) -> Result<(StatusCode, Json<SectionResponse>), AppError> {
    validate(&body)?;
    let section = content_service(&state).create_section(body).await?;
    Ok((StatusCode::CREATED, Json(section.into())))
}

pub async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SectionRequest>,
) -> Result<Json<SectionResponse>, AppError> {
    let id = parse_id(&id, "section")?;
    validate(&body)?;
    let section = content_service(&state).update_section(id, body).await?;
    Ok(Json(section.into()))
}

pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "section")?;
    content_service(&state).delete_section(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set display order from the position of each id
pub async fn reorder_sections(
    State(state): State<AppState>,
    Json(body): Json<ReorderSectionsRequest>,
) -> Result<StatusCode, AppError> {
    validate(&body)?;
    content_service(&state)
        .reorder_sections(body.section_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Banners
// ============================================================================

pub async fn list_banners(
    State(state): State<AppState>,
) -> Result<Json<Vec<BannerResponse>>, AppError> {
    let banners = content_service(&state).list_banners().await?;
    Ok(Json(banners.into_iter().map(Into::into).collect()))
}

pub async fn get_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BannerResponse>, AppError> {
    let id = parse_id(&id, "banner")?;
    let banner = content_service(&state).get_banner(id).await?;
    Ok(Json(banner.into()))
}

pub async fn create_banner(
    State(state): State<AppState>,
    Json(body): Json<BannerRequest>,
) -> Result<(StatusCode, Json<BannerResponse>), AppError> {
    validate(&body)?;
    let banner = content_service(&state).create_banner(body).await?;
    Ok((StatusCode::CREATED, Json(banner.into())))
}

pub async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<BannerRequest>,
) -> Result<Json<BannerResponse>, AppError> {
    let id = parse_id(&id, "banner")?;
    validate(&body)?;
    let banner = content_service(&state).update_banner(id, body).await?;
    Ok(Json(banner.into()))
}

pub async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "banner")?;
    content_service(&state).delete_banner(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// FAQs
// ============================================================================

pub async fn list_faqs(
    State(state): State<AppState>,
) -> Result<Json<Vec<FaqResponse>>, AppError> {
    let faqs = content_service(&state).list_faqs().await?;
    Ok(Json(faqs.into_iter().map(Into::into).collect()))
}

pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FaqResponse>, AppError> {
    let id = parse_id(&id, "FAQ")?;
    let faq = content_service(&state).get_faq(id).await?;
    Ok(Json(faq.into()))
}

pub async fn create_faq(
    State(state): State<AppState>,
    Json(body): Json<FaqRequest>,
) -> Result<(StatusCode, Json<FaqResponse>), AppError> {
    validate(&body)?;
    let faq = content_service(&state).create_faq(body).await?;
    Ok((StatusCode::CREATED, Json(faq.into())))
}

pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FaqRequest>,
) -> Result<Json<FaqResponse>, AppError> {
    let id = parse_id(&id, "FAQ")?;
    validate(&body)?;
    let faq = content_service(&state).update_faq(id, body).await?;
    Ok(Json(faq.into()))
}

pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "FAQ")?;
    content_service(&state).delete_faq(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
