//! Coupon entity, usage records and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Length of generated coupon codes.
pub const GENERATED_CODE_LENGTH: usize = 8;

/// How a coupon or promotion reduces the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[default]
    Percentage,
    FixedAmount,
    /// Coupons only
    FreeShipping,
}

impl DiscountType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "percentage" => Some(Self::Percentage),
            "fixed_amount" => Some(Self::FixedAmount),
            "free_shipping" => Some(Self::FreeShipping),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
            Self::FreeShipping => "free_shipping",
        }
    }
}

/// Maps to the `coupons` table:
/// - code: VARCHAR(50) NOT NULL UNIQUE, stored upper-case
/// - current_uses: INT NOT NULL, CHECK (max_uses IS NULL OR current_uses <= max_uses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub max_uses_per_customer: Option<i32>,
    pub current_uses: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub campaign_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Coupon {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            code: String::new(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::ZERO,
            min_order_amount: None,
            max_discount_amount: None,
            max_uses: None,
            max_uses_per_customer: None,
            current_uses: 0,
            starts_at: None,
            ends_at: None,
            is_active: true,
            campaign_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Maps to `coupon_usages`; one row per order that redeemed a coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponUsage {
    pub id: i64,
    pub coupon_id: i64,
    pub order_id: i64,
    pub customer_email: String,
    pub discount_amount: Decimal,
    pub used_at: DateTime<Utc>,
}

/// Normalize a user-supplied code for lookup and storage.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Random upper-case alphanumeric code.
pub fn generate_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_CODE_LENGTH)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Coupon>, AppError>;

    /// Lookup by normalized code.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, AppError>;

    async fn list(&self) -> Result<Vec<Coupon>, AppError>;

    async fn code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn create(&self, coupon: &Coupon) -> Result<Coupon, AppError>;

    async fn update(&self, coupon: &Coupon) -> Result<Coupon, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Times `email` (case-insensitive) has redeemed the coupon.
    async fn usage_count_for_email(&self, coupon_id: i64, email: &str) -> Result<i64, AppError>;

    async fn list_usages(&self, coupon_id: i64) -> Result<Vec<CouponUsage>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  spring10 "), "SPRING10");
    }

    #[test]
    fn test_generated_code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), GENERATED_CODE_LENGTH);
        assert_eq!(code, normalize_code(&code));
    }

    #[test]
    fn test_discount_type_parse() {
        assert_eq!(DiscountType::parse("FIXED_AMOUNT"), Some(DiscountType::FixedAmount));
        assert_eq!(DiscountType::parse("bogo"), None);
        assert_eq!(DiscountType::from_str("free_shipping").as_str(), "free_shipping");
    }
}
