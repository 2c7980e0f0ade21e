//! Inventory Repository Implementation
//!
//! Manual stock adjustments lock the stock row with `SELECT ... FOR UPDATE`,
//! apply the change and append a movement, all in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::order_repository::insert_movement;
use crate::domain::{
    InventoryRepository, MovementType, PageRequest, StockAdjustment, StockMovement,
    StockMovementFilter,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: i64,
    product_id: i64,
    variation_id: Option<i64>,
    movement_type: String,
    quantity: i32,
    stock_after: i32,
    reason: Option<String>,
    reference: Option<String>,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for StockMovement {
    fn from(r: MovementRow) -> Self {
        StockMovement {
            id: r.id,
            product_id: r.product_id,
            variation_id: r.variation_id,
            movement_type: MovementType::from_str(&r.movement_type),
            quantity: r.quantity,
            stock_after: r.stock_after,
            reason: r.reason,
            reference: r.reference,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

const MOVEMENT_COLUMNS: &str = "id, product_id, variation_id, movement_type, quantity, \
     stock_after, reason, reference, created_by, created_at";

/// PostgreSQL inventory repository implementation.
#[derive(Clone)]
pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn adjust(&self, adjustment: &StockAdjustment) -> Result<StockMovement, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = match adjustment.variation_id {
            Some(variation_id) => sqlx::query_scalar::<_, i32>(
                "SELECT stock_quantity FROM product_variations \
                 WHERE id = $1 AND product_id = $2 FOR UPDATE",
            )
            .bind(variation_id)
            .bind(adjustment.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Variation with id {} not found", variation_id))
            })?,
            None => sqlx::query_scalar::<_, i32>(
                "SELECT stock_quantity FROM products WHERE id = $1 FOR UPDATE",
            )
            .bind(adjustment.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Product with id {} not found", adjustment.product_id))
            })?,
        };

        let next = adjustment
            .mode
            .apply(current)
            .ok_or_else(|| AppError::BadRequest("Stock cannot go below zero".into()))?;

        match adjustment.variation_id {
            Some(variation_id) => {
                sqlx::query(
                    "UPDATE product_variations SET stock_quantity = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(variation_id)
                .bind(next)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "UPDATE products SET stock_quantity = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(adjustment.product_id)
                .bind(next)
                .execute(&mut *tx)
                .await?;
            }
        }

        let movement = StockMovement {
            id: adjustment.movement_id,
            product_id: adjustment.product_id,
            variation_id: adjustment.variation_id,
            movement_type: adjustment.movement_type,
            quantity: next - current,
            stock_after: next,
            reason: adjustment.reason.clone(),
            reference: adjustment.reference.clone(),
            created_by: adjustment.created_by,
            created_at: Utc::now(),
        };
        insert_movement(&mut tx, &movement, next).await?;

        tx.commit().await?;
        Ok(movement)
    }

    async fn list_movements(
        &self,
        filter: &StockMovementFilter,
        page: PageRequest,
    ) -> Result<(Vec<StockMovement>, i64), AppError> {
        let movement_type = filter.movement_type.map(|t| t.as_str());
        const WHERE: &str =
            "($1::BIGINT IS NULL OR product_id = $1) AND ($2::TEXT IS NULL OR movement_type = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM stock_movements WHERE {WHERE}"
        ))
        .bind(filter.product_id)
        .bind(movement_type)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE {WHERE} \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.product_id)
        .bind(movement_type)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}
