//! Price, discount and shipping calculations.
//!
//! Everything here is pure: callers load coupons, promotions and settings,
//! then ask this service for the numbers.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::entities::{Coupon, DiscountType, ProductPromotion};

/// Why a coupon cannot be redeemed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    NotFound,
    Inactive,
    NotStarted,
    Expired,
    UsageLimitReached,
    MinimumNotMet(Decimal),
    CustomerLimitReached,
}

impl CouponRejection {
    /// Message shown to the shopper.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound => "Coupon not found".into(),
            Self::Inactive => "Coupon is not active".into(),
            Self::NotStarted => "Coupon is not valid yet".into(),
            Self::Expired => "Coupon has expired".into(),
            Self::UsageLimitReached => "Coupon usage limit reached".into(),
            Self::MinimumNotMet(min) => format!("Minimum order amount is {}", min),
            Self::CustomerLimitReached => "You have already used this coupon".into(),
        }
    }
}

/// Accepted coupon outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CouponDiscount {
    pub discount_amount: Decimal,
    pub free_shipping: bool,
}

/// Order money breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

/// Domain service for pricing rules.
pub struct PricingService;

impl PricingService {
    /// Check a coupon against the order and compute its discount.
    ///
    /// `customer_uses` is how many times the shopper already redeemed it.
    pub fn evaluate_coupon(
        coupon: &Coupon,
        subtotal: Decimal,
        customer_uses: i64,
        now: DateTime<Utc>,
    ) -> Result<CouponDiscount, CouponRejection> {
        if !coupon.is_active {
            return Err(CouponRejection::Inactive);
        }
        if coupon.starts_at.is_some_and(|s| now < s) {
            return Err(CouponRejection::NotStarted);
        }
        if coupon.ends_at.is_some_and(|e| now > e) {
            return Err(CouponRejection::Expired);
        }
        if coupon.max_uses.is_some_and(|max| coupon.current_uses >= max) {
            return Err(CouponRejection::UsageLimitReached);
        }
        if let Some(min) = coupon.min_order_amount {
            if subtotal < min {
                return Err(CouponRejection::MinimumNotMet(min));
            }
        }
        if coupon
            .max_uses_per_customer
            .is_some_and(|max| customer_uses >= i64::from(max))
        {
            return Err(CouponRejection::CustomerLimitReached);
        }

        let discount = match coupon.discount_type {
            DiscountType::Percentage => {
                let raw = round_money(subtotal * coupon.discount_value / Decimal::ONE_HUNDRED);
                match coupon.max_discount_amount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountType::FixedAmount => coupon.discount_value.min(subtotal),
            DiscountType::FreeShipping => Decimal::ZERO,
        };

        Ok(CouponDiscount {
            discount_amount: discount.max(Decimal::ZERO),
            free_shipping: coupon.discount_type == DiscountType::FreeShipping,
        })
    }

    /// Amount a single promotion takes off `price`, never more than the price.
    pub fn promotion_discount(price: Decimal, promotion: &ProductPromotion) -> Decimal {
        let discount = match promotion.discount_type {
            DiscountType::Percentage => {
                round_money(price * promotion.discount_value / Decimal::ONE_HUNDRED)
            }
            DiscountType::FixedAmount => promotion.discount_value,
            DiscountType::FreeShipping => Decimal::ZERO,
        };
        discount.clamp(Decimal::ZERO, price)
    }

    /// Price after the best promotion active at `now`.
    ///
    /// Promotions for other products are ignored.
    pub fn effective_price(
        product_id: i64,
        price: Decimal,
        promotions: &[ProductPromotion],
        now: DateTime<Utc>,
    ) -> Decimal {
        let best = promotions
            .iter()
            .filter(|p| p.product_id == product_id && p.is_active_at(now))
            .map(|p| Self::promotion_discount(price, p))
            .max()
            .unwrap_or(Decimal::ZERO);
        price - best
    }

    /// Flat fee unless the subtotal reaches the threshold or a coupon waives it.
    pub fn shipping_fee(
        subtotal: Decimal,
        flat_fee: Decimal,
        free_threshold: Decimal,
        free_shipping_coupon: bool,
    ) -> Decimal {
        if free_shipping_coupon || subtotal >= free_threshold {
            Decimal::ZERO
        } else {
            flat_fee
        }
    }

    /// Combine the parts; the discount never pushes the total below zero.
    pub fn totals(subtotal: Decimal, discount: Decimal, shipping_fee: Decimal) -> OrderTotals {
        let discount_amount = discount.clamp(Decimal::ZERO, subtotal);
        let total = (subtotal - discount_amount + shipping_fee).max(Decimal::ZERO);
        OrderTotals {
            subtotal,
            discount_amount,
            shipping_fee,
            total,
        }
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn coupon(discount_type: DiscountType, value: &str) -> Coupon {
        Coupon {
            id: 1,
            code: "SPRING".into(),
            discount_type,
            discount_value: dec(value),
            ..Coupon::default()
        }
    }

    fn promotion(product_id: i64, discount_type: DiscountType, value: &str) -> ProductPromotion {
        let now = Utc::now();
        ProductPromotion {
            id: 1,
            product_id,
            campaign_id: None,
            name: None,
            discount_type,
            discount_value: dec(value),
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_capped_by_max_discount() {
        let mut c = coupon(DiscountType::Percentage, "20");
        c.max_discount_amount = Some(dec("50"));
        let result = PricingService::evaluate_coupon(&c, dec("400"), 0, Utc::now()).unwrap();
        assert_eq!(result.discount_amount, dec("50"));

        let result = PricingService::evaluate_coupon(&c, dec("100"), 0, Utc::now()).unwrap();
        assert_eq!(result.discount_amount, dec("20.00"));
    }

    #[test]
    fn test_percentage_rounds_to_cents() {
        let c = coupon(DiscountType::Percentage, "15");
        let result = PricingService::evaluate_coupon(&c, dec("99.99"), 0, Utc::now()).unwrap();
        assert_eq!(result.discount_amount, dec("15.00"));
    }

    #[test]
    fn test_fixed_capped_at_subtotal() {
        let c = coupon(DiscountType::FixedAmount, "100");
        let result = PricingService::evaluate_coupon(&c, dec("60"), 0, Utc::now()).unwrap();
        assert_eq!(result.discount_amount, dec("60"));
    }

    #[test]
    fn test_free_shipping_flag() {
        let c = coupon(DiscountType::FreeShipping, "0");
        let result = PricingService::evaluate_coupon(&c, dec("60"), 0, Utc::now()).unwrap();
        assert_eq!(
            result,
            CouponDiscount {
                discount_amount: Decimal::ZERO,
                free_shipping: true
            }
        );
    }

    #[test]
    fn test_usage_limit_reached() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.max_uses = Some(5);
        c.current_uses = 4;
        assert!(PricingService::evaluate_coupon(&c, dec("100"), 0, Utc::now()).is_ok());
        c.current_uses = 5;
        assert_eq!(
            PricingService::evaluate_coupon(&c, dec("100"), 0, Utc::now()),
            Err(CouponRejection::UsageLimitReached)
        );
    }

    #[test]
    fn test_rejections() {
        let now = Utc::now();
        let base = coupon(DiscountType::Percentage, "10");

        let inactive = Coupon { is_active: false, ..base.clone() };
        assert_eq!(
            PricingService::evaluate_coupon(&inactive, dec("100"), 0, now),
            Err(CouponRejection::Inactive)
        );

        let future = Coupon { starts_at: Some(now + Duration::hours(1)), ..base.clone() };
        assert_eq!(
            PricingService::evaluate_coupon(&future, dec("100"), 0, now),
            Err(CouponRejection::NotStarted)
        );

        let expired = Coupon { ends_at: Some(now - Duration::hours(1)), ..base.clone() };
        assert_eq!(
            PricingService::evaluate_coupon(&expired, dec("100"), 0, now),
            Err(CouponRejection::Expired)
        );

        let minimum = Coupon { min_order_amount: Some(dec("200")), ..base.clone() };
        assert_eq!(
            PricingService::evaluate_coupon(&minimum, dec("199.99"), 0, now),
            Err(CouponRejection::MinimumNotMet(dec("200")))
        );
        assert!(PricingService::evaluate_coupon(&minimum, dec("200"), 0, now).is_ok());

        let per_customer = Coupon { max_uses_per_customer: Some(1), ..base };
        assert!(PricingService::evaluate_coupon(&per_customer, dec("100"), 0, now).is_ok());
        assert_eq!(
            PricingService::evaluate_coupon(&per_customer, dec("100"), 1, now),
            Err(CouponRejection::CustomerLimitReached)
        );
    }

    #[test]
    fn test_effective_price_picks_best_promotion() {
        let promos = vec![
            promotion(7, DiscountType::Percentage, "10"),
            promotion(7, DiscountType::FixedAmount, "25"),
            promotion(8, DiscountType::FixedAmount, "90"),
        ];
        assert_eq!(
            PricingService::effective_price(7, dec("200"), &promos, Utc::now()),
            dec("175")
        );
        assert_eq!(
            PricingService::effective_price(7, dec("500"), &promos, Utc::now()),
            dec("450.00")
        );
    }

    #[test]
    fn test_effective_price_ignores_inactive_and_floors_at_zero() {
        let mut stale = promotion(7, DiscountType::FixedAmount, "50");
        stale.ends_at = Utc::now() - Duration::hours(1);
        assert_eq!(
            PricingService::effective_price(7, dec("100"), &[stale], Utc::now()),
            dec("100")
        );

        let huge = promotion(7, DiscountType::FixedAmount, "1000");
        assert_eq!(
            PricingService::effective_price(7, dec("100"), &[huge], Utc::now()),
            Decimal::ZERO
        );
    }

    #[test_case("749.99", false, "49.90" ; "below threshold pays")]
    #[test_case("750.00", false, "0" ; "threshold reached ships free")]
    #[test_case("100.00", true, "0" ; "coupon waives fee")]
    fn test_shipping_fee(subtotal: &str, coupon: bool, expected: &str) {
        assert_eq!(
            PricingService::shipping_fee(dec(subtotal), dec("49.90"), dec("750"), coupon),
            dec(expected)
        );
    }

    #[test]
    fn test_totals_never_negative() {
        let totals = PricingService::totals(dec("40"), dec("100"), Decimal::ZERO);
        assert_eq!(totals.discount_amount, dec("40"));
        assert_eq!(totals.total, Decimal::ZERO);

        let totals = PricingService::totals(dec("100"), dec("10"), dec("49.90"));
        assert_eq!(totals.total, dec("139.90"));
    }
}
