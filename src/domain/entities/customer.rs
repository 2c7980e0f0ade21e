//! Customer entity and repository trait.
//!
//! Maps to the `customers` table. A customer row is created or updated by
//! order placement (keyed by email), whether or not the buyer has an account.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PageRequest;
use crate::shared::error::AppError;

/// Marketing segment, derived from order history rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerSegment {
    New,
    Regular,
    Vip,
    Inactive,
}

impl CustomerSegment {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(Self::New),
            "regular" => Some(Self::Regular),
            "vip" => Some(Self::Vip),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Regular => "regular",
            Self::Vip => "vip",
            Self::Inactive => "inactive",
        }
    }
}

/// Maps to the `customers` table:
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - user_id: BIGINT NULL REFERENCES users(id) ON DELETE SET NULL
/// - total_orders / total_spent / last_order_at: maintained by order placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub total_orders: i32,
    pub total_spent: Decimal,
    pub last_order_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin customer listing filter.
///
/// Segment filtering is translated to SQL with the same thresholds the
/// segmentation rule uses.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub search: Option<String>,
    pub segment: Option<CustomerSegment>,
    pub vip_spend_threshold: Decimal,
    pub vip_order_count: i32,
    pub inactive_before: Option<DateTime<Utc>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, AppError>;

    async fn list(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<(Vec<Customer>, i64), AppError>;

    /// Update contact details and notes.
    async fn update(&self, customer: &Customer) -> Result<Customer, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}
