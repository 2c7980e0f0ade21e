//! Coupon Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{Coupon, CouponRepository, CouponUsage, DiscountType};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i64,
    code: String,
    description: Option<String>,
    discount_type: String,
    discount_value: Decimal,
    min_order_amount: Option<Decimal>,
    max_discount_amount: Option<Decimal>,
    max_uses: Option<i32>,
    max_uses_per_customer: Option<i32>,
    current_uses: i32,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    is_active: bool,
    campaign_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(r: CouponRow) -> Self {
        Coupon {
            id: r.id,
            code: r.code,
            description: r.description,
            discount_type: DiscountType::from_str(&r.discount_type),
            discount_value: r.discount_value,
            min_order_amount: r.min_order_amount,
            max_discount_amount: r.max_discount_amount,
            max_uses: r.max_uses,
            max_uses_per_customer: r.max_uses_per_customer,
            current_uses: r.current_uses,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            is_active: r.is_active,
            campaign_id: r.campaign_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UsageRow {
    id: i64,
    coupon_id: i64,
    order_id: i64,
    customer_email: String,
    discount_amount: Decimal,
    used_at: DateTime<Utc>,
}

impl From<UsageRow> for CouponUsage {
    fn from(r: UsageRow) -> Self {
        CouponUsage {
            id: r.id,
            coupon_id: r.coupon_id,
            order_id: r.order_id,
            customer_email: r.customer_email,
            discount_amount: r.discount_amount,
            used_at: r.used_at,
        }
    }
}

const COUPON_COLUMNS: &str = "id, code, description, discount_type, discount_value, \
     min_order_amount, max_discount_amount, max_uses, max_uses_per_customer, current_uses, \
     starts_at, ends_at, is_active, campaign_id, created_at, updated_at";

/// PostgreSQL coupon repository implementation.
#[derive(Clone)]
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Coupon>, AppError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, AppError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = UPPER($1)"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Coupon>, AppError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM coupons WHERE code = UPPER($1) AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, coupon: &Coupon) -> Result<Coupon, AppError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r#"
            INSERT INTO coupons (id, code, description, discount_type, discount_value,
                                 min_order_amount, max_discount_amount, max_uses,
                                 max_uses_per_customer, starts_at, ends_at, is_active, campaign_id)
            VALUES ($1, UPPER($2), $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(coupon.id)
        .bind(&coupon.code)
        .bind(&coupon.description)
        .bind(coupon.discount_type.as_str())
        .bind(coupon.discount_value)
        .bind(coupon.min_order_amount)
        .bind(coupon.max_discount_amount)
        .bind(coupon.max_uses)
        .bind(coupon.max_uses_per_customer)
        .bind(coupon.starts_at)
        .bind(coupon.ends_at)
        .bind(coupon.is_active)
        .bind(coupon.campaign_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Coupon code already exists"))?;
        Ok(row.into())
    }

    async fn update(&self, coupon: &Coupon) -> Result<Coupon, AppError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r#"
            UPDATE coupons
            SET code = UPPER($2), description = $3, discount_type = $4, discount_value = $5,
                min_order_amount = $6, max_discount_amount = $7, max_uses = $8,
                max_uses_per_customer = $9, starts_at = $10, ends_at = $11, is_active = $12,
                campaign_id = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(coupon.id)
        .bind(&coupon.code)
        .bind(&coupon.description)
        .bind(coupon.discount_type.as_str())
        .bind(coupon.discount_value)
        .bind(coupon.min_order_amount)
        .bind(coupon.max_discount_amount)
        .bind(coupon.max_uses)
        .bind(coupon.max_uses_per_customer)
        .bind(coupon.starts_at)
        .bind(coupon.ends_at)
        .bind(coupon.is_active)
        .bind(coupon.campaign_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_check_violation() => {
                AppError::BadRequest("max_uses cannot be below current usage".into())
            }
            _ => AppError::conflict_on_unique(e, "Coupon code already exists"),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Coupon with id {} not found", coupon.id)))?;
        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Coupon with id {} not found", id)));
        }
        Ok(())
    }

    async fn usage_count_for_email(&self, coupon_id: i64, email: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = $1 AND LOWER(customer_email) = LOWER($2)",
        )
        .bind(coupon_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_usages(&self, coupon_id: i64) -> Result<Vec<CouponUsage>, AppError> {
        let rows = sqlx::query_as::<_, UsageRow>(
            r#"
            SELECT id, coupon_id, order_id, customer_email, discount_amount, used_at
            FROM coupon_usages WHERE coupon_id = $1
            ORDER BY used_at DESC
            "#,
        )
        .bind(coupon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
