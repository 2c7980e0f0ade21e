//! Customer segmentation.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::entities::{Customer, CustomerSegment};

/// Order count that makes a customer VIP regardless of spend.
pub const VIP_ORDER_COUNT: i32 = 10;

/// Thresholds used to classify customers.
#[derive(Debug, Clone, Copy)]
pub struct SegmentationService {
    pub vip_spend_threshold: Decimal,
    pub inactive_after_days: i64,
}

impl SegmentationService {
    pub fn new(vip_spend_threshold: Decimal, inactive_after_days: i64) -> Self {
        Self {
            vip_spend_threshold,
            inactive_after_days,
        }
    }

    /// Rules apply in order: new, vip, inactive, regular.
    pub fn classify(&self, customer: &Customer, now: DateTime<Utc>) -> CustomerSegment {
        if customer.total_orders <= 1 {
            return CustomerSegment::New;
        }
        if customer.total_spent >= self.vip_spend_threshold
            || customer.total_orders >= VIP_ORDER_COUNT
        {
            return CustomerSegment::Vip;
        }
        if customer
            .last_order_at
            .is_some_and(|last| last < self.inactive_cutoff(now))
        {
            return CustomerSegment::Inactive;
        }
        CustomerSegment::Regular
    }

    /// Customers whose last order is before this instant are inactive.
    pub fn inactive_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.inactive_after_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn customer(orders: i32, spent: i64, days_since_last: i64) -> Customer {
        let now = Utc::now();
        Customer {
            id: 1,
            user_id: None,
            email: "ayse@example.com".into(),
            full_name: "Ayse".into(),
            phone: None,
            address: None,
            city: None,
            total_orders: orders,
            total_spent: Decimal::new(spent, 0),
            last_order_at: Some(now - Duration::days(days_since_last)),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test_case(0, 0, 1, CustomerSegment::New ; "no orders")]
    #[test_case(1, 9000, 400, CustomerSegment::New ; "single order is new even if big")]
    #[test_case(2, 5000, 1, CustomerSegment::Vip ; "spend threshold inclusive")]
    #[test_case(10, 100, 1, CustomerSegment::Vip ; "ten orders")]
    #[test_case(9, 4999, 1, CustomerSegment::Regular ; "just below vip")]
    #[test_case(3, 300, 181, CustomerSegment::Inactive ; "past inactivity window")]
    #[test_case(3, 300, 179, CustomerSegment::Regular ; "inside inactivity window")]
    #[test_case(12, 300, 400, CustomerSegment::Vip ; "vip wins over inactive")]
    fn test_classify(orders: i32, spent: i64, days: i64, expected: CustomerSegment) {
        let svc = SegmentationService::new(Decimal::new(5000, 0), 180);
        assert_eq!(svc.classify(&customer(orders, spent, days), Utc::now()), expected);
    }
}
