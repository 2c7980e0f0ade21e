//! Product Promotion Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{DiscountType, ProductPromotion, PromotionRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct PromotionRow {
    id: i64,
    product_id: i64,
    campaign_id: Option<i64>,
    name: Option<String>,
    discount_type: String,
    discount_value: Decimal,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PromotionRow> for ProductPromotion {
    fn from(r: PromotionRow) -> Self {
        ProductPromotion {
            id: r.id,
            product_id: r.product_id,
            campaign_id: r.campaign_id,
            name: r.name,
            discount_type: DiscountType::from_str(&r.discount_type),
            discount_value: r.discount_value,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const PROMOTION_COLUMNS: &str = "id, product_id, campaign_id, name, discount_type, \
     discount_value, starts_at, ends_at, is_active, created_at, updated_at";

/// PostgreSQL promotion repository implementation.
#[derive(Clone)]
pub struct PgPromotionRepository {
    pool: PgPool,
}

impl PgPromotionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromotionRepository for PgPromotionRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<ProductPromotion>, AppError> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM product_promotions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, product_id: Option<i64>) -> Result<Vec<ProductPromotion>, AppError> {
        let rows = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM product_promotions \
             WHERE ($1::BIGINT IS NULL OR product_id = $1) ORDER BY starts_at DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn active_for_products(
        &self,
        product_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductPromotion>, AppError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM product_promotions \
             WHERE product_id = ANY($1) AND is_active AND starts_at <= $2 AND ends_at >= $2"
        ))
        .bind(product_ids)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, promotion: &ProductPromotion) -> Result<ProductPromotion, AppError> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            r#"
            INSERT INTO product_promotions (id, product_id, campaign_id, name, discount_type,
                                            discount_value, starts_at, ends_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PROMOTION_COLUMNS}
            "#
        ))
        .bind(promotion.id)
        .bind(promotion.product_id)
        .bind(promotion.campaign_id)
        .bind(&promotion.name)
        .bind(promotion.discount_type.as_str())
        .bind(promotion.discount_value)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Promotion already exists"))?;
        Ok(row.into())
    }

    async fn update(&self, promotion: &ProductPromotion) -> Result<ProductPromotion, AppError> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            r#"
            UPDATE product_promotions
            SET campaign_id = $2, name = $3, discount_type = $4, discount_value = $5,
                starts_at = $6, ends_at = $7, is_active = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROMOTION_COLUMNS}
            "#
        ))
        .bind(promotion.id)
        .bind(promotion.campaign_id)
        .bind(&promotion.name)
        .bind(promotion.discount_type.as_str())
        .bind(promotion.discount_value)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Promotion already exists"))?
        .ok_or_else(|| {
            AppError::NotFound(format!("Promotion with id {} not found", promotion.id))
        })?;
        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM product_promotions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Promotion with id {} not found", id)));
        }
        Ok(())
    }
}
