//! Read-only aggregates for the finance summary and the admin dashboard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Sales figures over a period. Only paid, non-cancelled orders count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesTotals {
    pub order_count: i64,
    pub revenue: Decimal,
    pub discounts: Decimal,
    pub shipping: Decimal,
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardCounts {
    /// Orders created today, any status except cancelled
    pub orders_today: i64,
    pub revenue_today: Decimal,
    pub pending_orders: i64,
    pub low_stock_products: i64,
    pub unread_messages: i64,
    pub customers: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn sales_totals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesTotals, AppError>;

    /// `day_start` is the start of "today" in UTC.
    async fn dashboard_counts(&self, day_start: DateTime<Utc>)
        -> Result<DashboardCounts, AppError>;
}
