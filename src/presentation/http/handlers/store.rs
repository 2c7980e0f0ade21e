//! Store Handlers
//!
//! Contact form and store settings.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    ContactQuery, ContactRequest, MarkReadRequest, StoreSettingRequest,
};
use crate::application::dto::response::{
    ContactMessageResponse, MessageResponse, PagedResponse, PublicSettingsResponse,
    StoreSettingResponse,
};
use crate::application::services::{StoreService, StoreServiceImpl};
use crate::infrastructure::repositories::{PgContactMessageRepository, PgStoreSettingRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

fn store_service(
    state: &AppState,
) -> StoreServiceImpl<PgContactMessageRepository, PgStoreSettingRepository> {
    StoreServiceImpl::new(
        Arc::new(PgContactMessageRepository::new(state.db.clone())),
        Arc::new(PgStoreSettingRepository::new(state.db.clone())),
        state.settings_cache.clone(),
        state.snowflake.clone(),
        state.settings.store.clone(),
    )
}

/// Public contact form
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(body): Json<ContactRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    validate(&body)?;
    store_service(&state).submit_contact(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Thank you, we will get back to you soon")),
    ))
}

/// Public settings plus the resolved checkout figures
pub async fn public_settings(
    State(state): State<AppState>,
) -> Result<Json<PublicSettingsResponse>, AppError> {
    let service = store_service(&state);
    let settings = service.public_settings().await?;
    let config = service.config().await?;
    Ok(Json(PublicSettingsResponse::new(config, settings)))
}

// ============================================================================
// Admin: messages
// ============================================================================

pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ContactQuery>,
) -> Result<Json<PagedResponse<ContactMessageResponse>>, AppError> {
    let page = store_service(&state).list_messages(query).await?;
    Ok(Json(PagedResponse::from_page(page)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<ContactMessageResponse>, AppError> {
    let id = parse_id(&id, "message")?;
    let message = store_service(&state).mark_read(id, body.is_read).await?;
    Ok(Json(message.into()))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "message")?;
    store_service(&state).delete_message(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin: settings
// ============================================================================

pub async fn list_settings(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoreSettingResponse>>, AppError> {
    let settings = store_service(&state).list_settings().await?;
    Ok(Json(settings.into_iter().map(Into::into).collect()))
}

/// Create or replace the setting named in the path
pub async fn upsert_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<StoreSettingRequest>,
) -> Result<Json<StoreSettingResponse>, AppError> {
    validate(&body)?;
    let setting = store_service(&state).upsert_setting(&key, body).await?;
    Ok(Json(setting.into()))
}

pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    store_service(&state).delete_setting(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
