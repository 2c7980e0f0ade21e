//! Customer Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{Customer, CustomerFilter, CustomerRepository, CustomerSegment, PageRequest};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    user_id: Option<i64>,
    email: String,
    full_name: String,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    total_orders: i32,
    total_spent: Decimal,
    last_order_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Customer {
            id: r.id,
            user_id: r.user_id,
            email: r.email,
            full_name: r.full_name,
            phone: r.phone,
            address: r.address,
            city: r.city,
            total_orders: r.total_orders,
            total_spent: r.total_spent,
            last_order_at: r.last_order_at,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const CUSTOMER_COLUMNS: &str = "id, user_id, email, full_name, phone, address, city, \
     total_orders, total_spent, last_order_at, notes, created_at, updated_at";

/// Segment predicates mirror `SegmentationService::classify`, evaluated in
/// the same order. Parameters: $2 vip spend, $3 vip order count, $4 inactive cutoff.
fn segment_predicate(segment: Option<CustomerSegment>) -> String {
    const NOT_NEW: &str = "total_orders > 1";
    const VIP: &str = "(total_spent >= $2 OR total_orders >= $3)";
    const INACTIVE: &str = "(last_order_at IS NOT NULL AND last_order_at < $4)";
    match segment {
        None => "TRUE".to_string(),
        Some(CustomerSegment::New) => "total_orders <= 1".to_string(),
        Some(CustomerSegment::Vip) => format!("{NOT_NEW} AND {VIP}"),
        Some(CustomerSegment::Inactive) => format!("{NOT_NEW} AND NOT {VIP} AND {INACTIVE}"),
        Some(CustomerSegment::Regular) => format!("{NOT_NEW} AND NOT {VIP} AND NOT {INACTIVE}"),
    }
}

/// PostgreSQL customer repository implementation.
#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let cutoff = filter.inactive_before.unwrap_or_else(Utc::now);
        let where_clause = format!(
            "($1::TEXT IS NULL OR full_name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%' \
             OR phone ILIKE '%' || $1 || '%') AND {}",
            segment_predicate(filter.segment)
        );

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM customers WHERE {where_clause}"
        ))
        .bind(search)
        .bind(filter.vip_spend_threshold)
        .bind(filter.vip_order_count)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {where_clause} \
             ORDER BY last_order_at DESC NULLS LAST, id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(search)
        .bind(filter.vip_spend_threshold)
        .bind(filter.vip_order_count)
        .bind(cutoff)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn update(&self, customer: &Customer) -> Result<Customer, AppError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET full_name = $2, phone = $3, address = $4, city = $5, notes = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer.id)
        .bind(&customer.full_name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", customer.id)))?;

        Ok(row.into())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
