//! Frequently asked questions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Maps to the `faqs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    /// Grouping label such as "Delivery" or "Payment"
    pub category: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaqRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Faq>, AppError>;

    /// Ordered by category, display_order.
    async fn list(&self, active_only: bool) -> Result<Vec<Faq>, AppError>;

    async fn create(&self, faq: &Faq) -> Result<Faq, AppError>;

    async fn update(&self, faq: &Faq) -> Result<Faq, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
