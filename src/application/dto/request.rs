//! Request DTOs
//!
//! Data structures for API request bodies and query strings. Snowflake ids
//! travel as strings and are parsed by the services.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn default_true() -> bool {
    true
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative").with_message("Must not be negative".into()));
    }
    Ok(())
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive").with_message("Must be greater than zero".into()));
    }
    Ok(())
}

// ============================================================================
// Auth & account
// ============================================================================

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request, also used for logout
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Profile update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,
}

/// Password change
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

/// Plain pagination query
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// ============================================================================
// Catalog
// ============================================================================

/// Create or replace a category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Derived from the name when absent
    #[validate(length(min = 1, max = 200, message = "Slug must be 1-200 characters"))]
    pub slug: Option<String>,

    pub description: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    pub parent_id: Option<String>,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Create or replace a product. Stock given here only applies on creation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Slug must be 1-200 characters"))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: Option<String>,

    #[validate(length(max = 500, message = "Short description must be at most 500 characters"))]
    pub short_description: Option<String>,

    pub description: Option<String>,

    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,

    #[validate(custom(function = "non_negative"))]
    pub compare_at_price: Option<Decimal>,

    #[validate(custom(function = "non_negative"))]
    pub cost_price: Option<Decimal>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock_quantity: i32,

    #[validate(range(min = 0, message = "Threshold must not be negative"))]
    pub low_stock_threshold: Option<i32>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default)]
    pub category_ids: Vec<String>,
}

/// Replace the category links of a product
#[derive(Debug, Deserialize)]
pub struct SetCategoriesRequest {
    pub category_ids: Vec<String>,
}

/// Attach an image URL to a product
#[derive(Debug, Deserialize, Validate)]
pub struct ProductImageRequest {
    #[validate(url(message = "Invalid image URL"))]
    pub url: String,

    #[validate(length(max = 200, message = "Alt text must be at most 200 characters"))]
    pub alt_text: Option<String>,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default)]
    pub is_primary: bool,
}

/// Create or replace a variation. Stock given here only applies on creation.
#[derive(Debug, Deserialize, Validate)]
pub struct VariationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: Option<String>,

    #[validate(custom(function = "non_negative"))]
    pub price: Option<Decimal>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock_quantity: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Product listing query (storefront and admin)
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    /// Category id or slug
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Low-stock report query
#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    pub limit: Option<i64>,
}

// ============================================================================
// Orders
// ============================================================================

/// One line of a new order. `Serialize` is needed by the `length` rule on
/// `PlaceOrderRequest::items`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub variation_id: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Quantity must be 1-100"))]
    pub quantity: i32,
}

/// Checkout request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, max = 50, message = "Order must contain 1-50 items"), nested)]
    pub items: Vec<OrderItemRequest>,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub customer_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub customer_email: String,

    #[validate(length(min = 5, max = 30, message = "Phone must be 5-30 characters"))]
    pub customer_phone: String,

    #[validate(length(min = 1, max = 100, message = "Recipient name must be 1-100 characters"))]
    pub recipient_name: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub recipient_phone: Option<String>,

    #[validate(length(min = 5, max = 500, message = "Address must be 5-500 characters"))]
    pub shipping_address: String,

    #[validate(length(min = 1, max = 100, message = "City must be 1-100 characters"))]
    pub shipping_city: String,

    #[validate(length(max = 100, message = "District must be at most 100 characters"))]
    pub shipping_district: Option<String>,

    #[validate(length(max = 20, message = "Postal code must be at most 20 characters"))]
    pub shipping_postal_code: Option<String>,

    pub delivery_date: Option<NaiveDate>,

    #[validate(length(max = 50, message = "Time slot must be at most 50 characters"))]
    pub delivery_time_slot: Option<String>,

    #[validate(length(max = 500, message = "Gift message must be at most 500 characters"))]
    pub gift_message: Option<String>,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,

    pub coupon_code: Option<String>,

    /// `cash_on_delivery` (default), `bank_transfer`, `credit_card`
    pub payment_method: Option<String>,
}

/// Public order tracking query
#[derive(Debug, Deserialize, Validate)]
pub struct TrackOrderQuery {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Admin order listing query
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Fulfilment status change
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// Payment status change
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

/// Internal order note; `null` clears it
#[derive(Debug, Deserialize, Validate)]
pub struct OrderNoteRequest {
    #[validate(length(max = 2000, message = "Note must be at most 2000 characters"))]
    pub note: Option<String>,
}

// ============================================================================
// Customers
// ============================================================================

/// Admin customer listing query
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub segment: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Back-office edits; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,

    #[validate(length(max = 100, message = "City must be at most 100 characters"))]
    pub city: Option<String>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

// ============================================================================
// Inventory & suppliers
// ============================================================================

/// Stock adjustment: exactly one of `quantity` (signed delta) or `set_to`
#[derive(Debug, Deserialize, Validate)]
pub struct StockAdjustmentRequest {
    pub product_id: String,
    pub variation_id: Option<String>,
    pub quantity: Option<i32>,

    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub set_to: Option<i32>,

    /// `in`, `out` or `adjustment`; derived from the change when absent
    pub movement_type: Option<String>,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,

    #[validate(length(max = 100, message = "Reference must be at most 100 characters"))]
    pub reference: Option<String>,
}

/// Stock movement listing query
#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub product_id: Option<String>,
    pub movement_type: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Create or replace a supplier
#[derive(Debug, Deserialize, Validate)]
pub struct SupplierRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Contact name must be at most 100 characters"))]
    pub contact_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    pub address: Option<String>,
    pub notes: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Link a product to a supplier
#[derive(Debug, Deserialize, Validate)]
pub struct ProductSupplierRequest {
    pub product_id: String,

    #[validate(length(max = 64, message = "Supplier SKU must be at most 64 characters"))]
    pub supplier_sku: Option<String>,

    #[validate(custom(function = "non_negative"))]
    pub cost_price: Option<Decimal>,

    #[validate(range(min = 0, max = 365, message = "Lead time must be 0-365 days"))]
    pub lead_time_days: Option<i32>,

    #[serde(default)]
    pub is_preferred: bool,
}

/// Supplier listing query
#[derive(Debug, Default, Deserialize)]
pub struct SupplierQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

// ============================================================================
// Finance
// ============================================================================

/// Create or rename an expense category
#[derive(Debug, Deserialize, Validate)]
pub struct ExpenseCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub description: Option<String>,
}

/// Create or replace an expense
#[derive(Debug, Deserialize, Validate)]
pub struct ExpenseRequest {
    pub category_id: String,
    pub supplier_id: Option<String>,

    #[validate(length(min = 1, max = 500, message = "Description must be 1-500 characters"))]
    pub description: String,

    #[validate(custom(function = "positive"))]
    pub amount: Decimal,

    pub expense_date: NaiveDate,

    #[validate(length(max = 50, message = "Payment method must be at most 50 characters"))]
    pub payment_method: Option<String>,

    #[validate(length(max = 100, message = "Reference must be at most 100 characters"))]
    pub reference: Option<String>,

    pub notes: Option<String>,
}

/// Expense listing query
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Inclusive calendar range; defaults to the current month
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// ============================================================================
// Marketing
// ============================================================================

/// Create or replace a campaign
#[derive(Debug, Deserialize, Validate)]
pub struct CampaignRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Create or replace a coupon
#[derive(Debug, Deserialize, Validate)]
pub struct CouponRequest {
    /// Generated when absent
    #[validate(length(min = 3, max = 50, message = "Code must be 3-50 characters"))]
    pub code: Option<String>,

    pub description: Option<String>,

    /// `percentage`, `fixed_amount` or `free_shipping`
    pub discount_type: String,

    #[serde(default)]
    #[validate(custom(function = "non_negative"))]
    pub discount_value: Decimal,

    #[validate(custom(function = "non_negative"))]
    pub min_order_amount: Option<Decimal>,

    #[validate(custom(function = "positive"))]
    pub max_discount_amount: Option<Decimal>,

    #[validate(range(min = 1, message = "Max uses must be at least 1"))]
    pub max_uses: Option<i32>,

    #[validate(range(min = 1, message = "Max uses per customer must be at least 1"))]
    pub max_uses_per_customer: Option<i32>,

    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub campaign_id: Option<String>,
}

/// Storefront coupon check
#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, max = 50, message = "Code is required"))]
    pub code: String,

    #[validate(custom(function = "non_negative"))]
    pub subtotal: Decimal,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Create or replace a product promotion
#[derive(Debug, Deserialize, Validate)]
pub struct PromotionRequest {
    pub product_id: String,
    pub campaign_id: Option<String>,

    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: Option<String>,

    /// `percentage` or `fixed_amount`
    pub discount_type: String,

    #[validate(custom(function = "positive"))]
    pub discount_value: Decimal,

    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Promotion listing query
#[derive(Debug, Default, Deserialize)]
pub struct PromotionQuery {
    pub product_id: Option<String>,
}

// ============================================================================
// Content
// ============================================================================

/// Create or replace a home page section
#[derive(Debug, Deserialize, Validate)]
pub struct SectionRequest {
    pub section_type: String,

    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Subtitle must be at most 500 characters"))]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub content: serde_json::Value,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// New section order, first id is shown first
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderSectionsRequest {
    #[validate(length(min = 1, message = "At least one section id is required"))]
    pub section_ids: Vec<String>,
}

/// Create or replace a banner
#[derive(Debug, Deserialize, Validate)]
pub struct BannerRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub subtitle: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: String,

    pub link_url: Option<String>,

    #[validate(length(max = 50, message = "Button text must be at most 50 characters"))]
    pub button_text: Option<String>,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Create or replace a FAQ entry
#[derive(Debug, Deserialize, Validate)]
pub struct FaqRequest {
    #[validate(length(min = 1, max = 500, message = "Question must be 1-500 characters"))]
    pub question: String,

    #[validate(length(min = 1, message = "Answer is required"))]
    pub answer: String,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Public contact form
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Subject must be 1-200 characters"))]
    pub subject: String,

    #[validate(length(min = 10, max = 5000, message = "Message must be 10-5000 characters"))]
    pub message: String,
}

/// Contact message listing query
#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Mark a message read or unread
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default = "default_true")]
    pub is_read: bool,
}

/// Upsert a store setting; the key comes from the path
#[derive(Debug, Deserialize, Validate)]
pub struct StoreSettingRequest {
    #[validate(length(max = 2000, message = "Value must be at most 2000 characters"))]
    pub value: String,

    pub description: Option<String>,

    #[serde(default)]
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::validation::validate;

    fn order_json() -> serde_json::Value {
        serde_json::json!({
            "items": [{ "product_id": "42", "quantity": 2 }],
            "customer_name": "Ayşe Yılmaz",
            "customer_email": "ayse@example.com",
            "customer_phone": "+90 555 000 0000",
            "recipient_name": "Fatma Yılmaz",
            "shipping_address": "Bağdat Cad. 12/3",
            "shipping_city": "İstanbul"
        })
    }

    #[test]
    fn test_place_order_request_valid() {
        let request: PlaceOrderRequest = serde_json::from_value(order_json()).unwrap();
        assert!(validate(&request).is_ok());
        assert!(request.coupon_code.is_none());
    }

    #[test]
    fn test_place_order_rejects_empty_items() {
        let mut json = order_json();
        json["items"] = serde_json::json!([]);
        let request: PlaceOrderRequest = serde_json::from_value(json).unwrap();
        assert!(validate(&request).is_err());
    }

    #[test]
    fn test_place_order_rejects_zero_quantity() {
        let mut json = order_json();
        json["items"][0]["quantity"] = serde_json::json!(0);
        let request: PlaceOrderRequest = serde_json::from_value(json).unwrap();
        assert!(validate(&request).is_err());
    }

    #[test]
    fn test_category_defaults() {
        let request: CategoryRequest =
            serde_json::from_value(serde_json::json!({ "name": "Roses" })).unwrap();
        assert!(request.is_active);
        assert_eq!(request.display_order, 0);
        assert!(request.slug.is_none());
    }

    #[test]
    fn test_negative_price_rejected() {
        let request: ProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Tulips",
            "price": "-1.00"
        }))
        .unwrap();
        assert!(validate(&request).is_err());
    }

    #[test]
    fn test_expense_amount_must_be_positive() {
        let request: ExpenseRequest = serde_json::from_value(serde_json::json!({
            "category_id": "1",
            "description": "Vase delivery",
            "amount": "0",
            "expense_date": "2024-03-01"
        }))
        .unwrap();
        assert!(validate(&request).is_err());
    }
}
