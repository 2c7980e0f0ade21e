//! Expense bookkeeping: categories and expense entries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PageRequest;
use crate::shared::error::AppError;

/// Maps to `expense_categories` (rent, flowers, packaging, couriers ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Maps to `expenses`. `amount` is always positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub category_id: i64,
    pub supplier_id: Option<i64>,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    /// Joined for display; ignored on write
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Total spent per category within a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_id: i64,
    pub category_name: String,
    pub total: Decimal,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn find_category(&self, id: i64) -> Result<Option<ExpenseCategory>, AppError>;

    async fn list_categories(&self) -> Result<Vec<ExpenseCategory>, AppError>;

    /// Fails with `Conflict` when the name is taken.
    async fn create_category(&self, category: &ExpenseCategory) -> Result<ExpenseCategory, AppError>;

    async fn update_category(&self, category: &ExpenseCategory) -> Result<ExpenseCategory, AppError>;

    async fn delete_category(&self, id: i64) -> Result<(), AppError>;

    async fn expense_count_for_category(&self, category_id: i64) -> Result<i64, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Expense>, AppError>;

    async fn list(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Expense>, i64), AppError>;

    async fn create(&self, expense: &Expense) -> Result<Expense, AppError>;

    async fn update(&self, expense: &Expense) -> Result<Expense, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Totals grouped by category for `[from, to]`, largest first.
    async fn totals_by_category(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryTotal>, AppError>;
}
