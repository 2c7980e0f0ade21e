//! Order aggregate and repository trait.
//!
//! Maps to `orders` and `order_items`. Order items snapshot the product name
//! and unit price at the time of purchase.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::{distr::Alphanumeric, Rng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coupon::CouponUsage;
use super::stock_movement::StockMovement;
use crate::domain::value_objects::PageRequest;
use crate::shared::error::AppError;

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "preparing" => Some(Self::Preparing),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Allowed transitions:
    /// pending -> confirmed -> preparing -> shipped -> delivered,
    /// and cancellation from anything not yet shipped.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Preparing)
                | (Preparing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state, tracked independently from fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    BankTransfer,
    CreditCard,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash_on_delivery" => Some(Self::CashOnDelivery),
            "bank_transfer" => Some(Self::BankTransfer),
            "credit_card" => Some(Self::CreditCard),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::BankTransfer => "bank_transfer",
            Self::CreditCard => "credit_card",
        }
    }
}

/// Maps to the `orders` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human-facing reference, `FS-YYYYMMDD-XXXXXX`
    pub order_number: String,
    pub user_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,

    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,

    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_district: Option<String>,
    pub shipping_postal_code: Option<String>,

    pub delivery_date: Option<NaiveDate>,
    pub delivery_time_slot: Option<String>,
    /// Card message delivered with the flowers
    pub gift_message: Option<String>,
    pub notes: Option<String>,
    /// Back-office note, never shown to customers
    pub admin_note: Option<String>,

    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub coupon_code: Option<String>,

    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Maps to the `order_items` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub variation_id: Option<i64>,
    pub product_name: String,
    pub variation_name: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Everything the repository needs to persist a new order atomically.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pub order: Order,
    /// One `out` movement per item, ids pre-generated
    pub stock_movements: Vec<StockMovement>,
    pub coupon_usage: Option<CouponUsage>,
    /// Id to use if the customer record does not exist yet
    pub new_customer_id: i64,
}

/// Admin order listing filter.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Matches order number, customer name or email
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// Generate a new order number for the given instant.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("FS-{}-{}", now.format("%Y%m%d"), suffix)
}

/// Repository trait for orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the order, its items, stock deductions, movements, coupon usage
    /// and customer statistics in a single transaction.
    ///
    /// Fails with `Conflict` when stock or coupon capacity ran out concurrently.
    async fn place(&self, placement: &OrderPlacement) -> Result<Order, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>, AppError>;

    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, AppError>;

    /// Paginated listing; items are not loaded.
    async fn list(&self, filter: &OrderFilter, page: PageRequest)
        -> Result<(Vec<Order>, i64), AppError>;

    /// Move from `from` to `to`; fails with `Conflict` if the status changed meanwhile.
    async fn update_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, AppError>;

    /// Cancel and put the items back on the shelf in one transaction.
    async fn cancel(
        &self,
        id: i64,
        from: OrderStatus,
        restock: &[StockMovement],
    ) -> Result<Order, AppError>;

    async fn update_payment_status(
        &self,
        id: i64,
        status: PaymentStatus,
    ) -> Result<Order, AppError>;

    async fn update_admin_note(&self, id: i64, note: Option<String>) -> Result<Order, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case(OrderStatus::Pending, OrderStatus::Confirmed, true)]
    #[test_case(OrderStatus::Confirmed, OrderStatus::Preparing, true)]
    #[test_case(OrderStatus::Preparing, OrderStatus::Shipped, true)]
    #[test_case(OrderStatus::Shipped, OrderStatus::Delivered, true)]
    #[test_case(OrderStatus::Pending, OrderStatus::Cancelled, true)]
    #[test_case(OrderStatus::Preparing, OrderStatus::Cancelled, true)]
    #[test_case(OrderStatus::Shipped, OrderStatus::Cancelled, false)]
    #[test_case(OrderStatus::Delivered, OrderStatus::Cancelled, false)]
    #[test_case(OrderStatus::Pending, OrderStatus::Shipped, false)]
    #[test_case(OrderStatus::Cancelled, OrderStatus::Pending, false)]
    #[test_case(OrderStatus::Delivered, OrderStatus::Pending, false)]
    #[test_case(OrderStatus::Confirmed, OrderStatus::Confirmed, false)]
    fn test_status_transitions(from: OrderStatus, to: OrderStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(OrderStatus::parse("SHIPPED"), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::parse("lost"), None);
        assert_eq!(OrderStatus::from_str("lost"), OrderStatus::Pending);
        assert_eq!(PaymentStatus::parse("paid"), Some(PaymentStatus::Paid));
        assert_eq!(
            PaymentMethod::parse("bank_transfer"),
            Some(PaymentMethod::BankTransfer)
        );
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2024, 2, 14, 9, 30, 0).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("FS-20240214-"));
        assert_eq!(number.len(), "FS-20240214-".len() + 6);
        let suffix = &number["FS-20240214-".len()..];
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
