//! Finance Handlers (admin)
//!
//! Expenses, the financial summary and the dashboard counters.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    DateRangeQuery, ExpenseCategoryRequest, ExpenseQuery, ExpenseRequest,
};
use crate::application::dto::response::{
    DashboardResponse, ExpenseCategoryResponse, ExpenseResponse, FinancialSummaryResponse,
    PagedResponse,
};
use crate::application::services::{FinanceService, FinanceServiceImpl};
use crate::infrastructure::repositories::{
    PgExpenseRepository, PgOrderRepository, PgReportRepository, PgSupplierRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;
use crate::shared::validation::validate;
use crate::startup::AppState;

type Finance = FinanceServiceImpl<
    PgExpenseRepository,
    PgReportRepository,
    PgOrderRepository,
    PgSupplierRepository,
>;

fn finance_service(state: &AppState) -> Finance {
    FinanceServiceImpl::new(
        Arc::new(PgExpenseRepository::new(state.db.clone())),
        Arc::new(PgReportRepository::new(state.db.clone())),
        Arc::new(PgOrderRepository::new(state.db.clone())),
        Arc::new(PgSupplierRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

pub async fn list_expense_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExpenseCategoryResponse>>, AppError> {
    let categories = finance_service(&state).list_expense_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub async fn create_expense_category(
    State(state): State<AppState>,
    Json(body): Json<ExpenseCategoryRequest>,
) -> Result<(StatusCode, Json<ExpenseCategoryResponse>), AppError> {
    validate(&body)?;
    let category = finance_service(&state).create_expense_category(body).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn update_expense_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ExpenseCategoryRequest>,
) -> Result<Json<ExpenseCategoryResponse>, AppError> {
    let id = parse_id(&id, "expense category")?;
    validate(&body)?;
    let category = finance_service(&state)
        .update_expense_category(id, body)
        .await?;
    Ok(Json(category.into()))
}

pub async fn delete_expense_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "expense category")?;
    finance_service(&state).delete_expense_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<PagedResponse<ExpenseResponse>>, AppError> {
    let page = finance_service(&state).list_expenses(query).await?;
    Ok(Json(PagedResponse::from_page(page)))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let id = parse_id(&id, "expense")?;
    let expense = finance_service(&state).get_expense(id).await?;
    Ok(Json(expense.into()))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    validate(&body)?;
    let expense = finance_service(&state)
        .create_expense(body, auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ExpenseRequest>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let id = parse_id(&id, "expense")?;
    validate(&body)?;
    let expense = finance_service(&state).update_expense(id, body).await?;
    Ok(Json(expense.into()))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "expense")?;
    finance_service(&state).delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Revenue, expenses and profit for a date range (current month by default)
pub async fn summary(
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<FinancialSummaryResponse>, AppError> {
    let summary = finance_service(&state).summary(range).await?;
    Ok(Json(summary.into()))
}

pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = finance_service(&state).dashboard().await?;
    Ok(Json(dashboard.into()))
}
