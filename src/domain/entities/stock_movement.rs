//! Stock movement ledger.
//!
//! Maps to the `stock_movements` table. Every change to a product's or
//! variation's stock writes one row here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PageRequest;
use crate::shared::error::AppError;

/// Direction of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Goods received or returned
    In,
    /// Goods sold
    Out,
    /// Manual correction (count, wastage, wilted stems)
    Adjustment,
}

impl MovementType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Adjustment)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Adjustment => "adjustment",
        }
    }
}

/// Maps to the `stock_movements` table. `quantity` is a signed delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub variation_id: Option<i64>,
    pub movement_type: MovementType,
    pub quantity: i32,
    /// Stock level after the movement; filled in by the repository
    pub stock_after: i32,
    pub reason: Option<String>,
    /// Order number or supplier invoice
    pub reference: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        id: i64,
        product_id: i64,
        variation_id: Option<i64>,
        movement_type: MovementType,
        quantity: i32,
    ) -> Self {
        Self {
            id,
            product_id,
            variation_id,
            movement_type,
            quantity,
            stock_after: 0,
            reason: None,
            reference: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }
}

/// How a manual adjustment changes stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentMode {
    /// Add (positive) or remove (negative) units
    Delta(i32),
    /// Set an absolute level after a stock count
    SetTo(i32),
}

impl AdjustmentMode {
    /// Resulting stock level, or `None` if it would go negative or overflow.
    pub fn apply(&self, current: i32) -> Option<i32> {
        let next = match self {
            Self::Delta(delta) => current.checked_add(*delta)?,
            Self::SetTo(level) => *level,
        };
        (next >= 0).then_some(next)
    }
}

/// A manual stock adjustment request.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub movement_id: i64,
    pub product_id: i64,
    pub variation_id: Option<i64>,
    pub mode: AdjustmentMode,
    pub movement_type: MovementType,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct StockMovementFilter {
    pub product_id: Option<i64>,
    pub movement_type: Option<MovementType>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Lock the stock row, apply the adjustment and log the movement.
    ///
    /// Fails with `BadRequest` if the result would be negative.
    async fn adjust(&self, adjustment: &StockAdjustment) -> Result<StockMovement, AppError>;

    async fn list_movements(
        &self,
        filter: &StockMovementFilter,
        page: PageRequest,
    ) -> Result<(Vec<StockMovement>, i64), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_apply() {
        assert_eq!(AdjustmentMode::Delta(5).apply(10), Some(15));
        assert_eq!(AdjustmentMode::Delta(-10).apply(10), Some(0));
        assert_eq!(AdjustmentMode::Delta(-11).apply(10), None);
        assert_eq!(AdjustmentMode::Delta(i32::MAX).apply(1), None);
    }

    #[test]
    fn test_set_to_apply() {
        assert_eq!(AdjustmentMode::SetTo(3).apply(10), Some(3));
        assert_eq!(AdjustmentMode::SetTo(0).apply(10), Some(0));
        assert_eq!(AdjustmentMode::SetTo(-1).apply(10), None);
    }

    #[test]
    fn test_movement_type_roundtrip() {
        for t in [MovementType::In, MovementType::Out, MovementType::Adjustment] {
            assert_eq!(MovementType::from_str(t.as_str()), t);
        }
        assert_eq!(MovementType::parse("sideways"), None);
    }
}
