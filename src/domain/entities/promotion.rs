//! Time-boxed product price reductions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coupon::DiscountType;
use crate::shared::error::AppError;

/// Maps to `product_promotions`. Only percentage and fixed-amount
/// discounts apply to products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPromotion {
    pub id: i64,
    pub product_id: i64,
    pub campaign_id: Option<i64>,
    pub name: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductPromotion {
    /// Active flag set and `now` within `[starts_at, ends_at]`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<ProductPromotion>, AppError>;

    async fn list(&self, product_id: Option<i64>) -> Result<Vec<ProductPromotion>, AppError>;

    /// Promotions active at `now` for any of the given products.
    async fn active_for_products(
        &self,
        product_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductPromotion>, AppError>;

    async fn create(&self, promotion: &ProductPromotion) -> Result<ProductPromotion, AppError>;

    async fn update(&self, promotion: &ProductPromotion) -> Result<ProductPromotion, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_active_window_is_inclusive() {
        let now = Utc::now();
        let promo = ProductPromotion {
            id: 1,
            product_id: 2,
            campaign_id: None,
            name: None,
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::new(10, 0),
            starts_at: now,
            ends_at: now + Duration::days(1),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(promo.is_active_at(now));
        assert!(promo.is_active_at(now + Duration::days(1)));
        assert!(!promo.is_active_at(now - Duration::seconds(1)));
        assert!(!ProductPromotion { is_active: false, ..promo }.is_active_at(now));
    }
}
