//! Report Repository Implementation
//!
//! Aggregate queries for the finance summary and admin dashboard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{DashboardCounts, ReportRepository, SalesTotals};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct SalesRow {
    order_count: i64,
    revenue: Decimal,
    discounts: Decimal,
    shipping: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct DashboardRow {
    orders_today: i64,
    revenue_today: Decimal,
    pending_orders: i64,
    low_stock_products: i64,
    unread_messages: i64,
    customers: i64,
}

/// PostgreSQL report repository implementation.
#[derive(Clone)]
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn sales_totals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesTotals, AppError> {
        let row = sqlx::query_as::<_, SalesRow>(
            r#"
            SELECT COUNT(*) AS order_count,
                   COALESCE(SUM(total), 0) AS revenue,
                   COALESCE(SUM(discount_amount), 0) AS discounts,
                   COALESCE(SUM(shipping_fee), 0) AS shipping
            FROM orders
            WHERE status <> 'cancelled' AND payment_status = 'paid'
              AND created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesTotals {
            order_count: row.order_count,
            revenue: row.revenue,
            discounts: row.discounts,
            shipping: row.shipping,
        })
    }

    async fn dashboard_counts(
        &self,
        day_start: DateTime<Utc>,
    ) -> Result<DashboardCounts, AppError> {
        let row = sqlx::query_as::<_, DashboardRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM orders
                  WHERE created_at >= $1 AND status <> 'cancelled') AS orders_today,
                (SELECT COALESCE(SUM(total), 0) FROM orders
                  WHERE created_at >= $1 AND status <> 'cancelled') AS revenue_today,
                (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
                (SELECT COUNT(*) FROM products
                  WHERE is_active AND stock_quantity <= low_stock_threshold) AS low_stock_products,
                (SELECT COUNT(*) FROM contact_messages WHERE NOT is_read) AS unread_messages,
                (SELECT COUNT(*) FROM customers) AS customers
            "#,
        )
        .bind(day_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardCounts {
            orders_today: row.orders_today,
            revenue_today: row.revenue_today,
            pending_orders: row.pending_orders,
            low_stock_products: row.low_stock_products,
            unread_messages: row.unread_messages,
            customers: row.customers,
        })
    }
}
