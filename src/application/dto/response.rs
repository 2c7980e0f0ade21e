//! Response DTOs
//!
//! Data structures for API response bodies. Snowflake ids are rendered as
//! strings so JavaScript clients do not lose precision.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::application::services::{
    AuthTokens, CouponValidation, CustomerDetail, CustomerView, Dashboard, FaqGroup,
    FinancialSummary, HomePage, PricedProduct, ProductDetail, StoreConfig, SupplierDetail,
};
use crate::domain::{
    Banner, Campaign, Category, CategoryTotal, ContactMessage, Coupon, CouponUsage, Expense,
    ExpenseCategory, Faq, HomePageSection, Order, OrderItem, Page, ProductImage, ProductPromotion,
    Product, ProductSupplier, ProductVariation, StockMovement, StoreSetting, Supplier, User,
};

fn id_opt(id: Option<i64>) -> Option<String> {
    id.map(|v| v.to_string())
}

/// Paginated list envelope
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl<T> PagedResponse<T> {
    pub fn from_page<S>(page: Page<S>) -> Self
    where
        T: From<S>,
    {
        let page = page.map(T::from);
        Self {
            items: page.items,
            page: page.page,
            page_size: page.page_size,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}

/// Empty acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// Registration / login response (user and tokens)
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

impl AuthResponse {
    pub fn new(user: User, tokens: AuthTokens) -> Self {
        Self {
            user: user.into(),
            tokens: tokens.into(),
        }
    }
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Category response
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            slug: c.slug,
            description: c.description,
            image_url: c.image_url,
            parent_id: id_opt(c.parent_id),
            display_order: c.display_order,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Product image response
#[derive(Debug, Serialize)]
pub struct ProductImageResponse {
    pub id: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_primary: bool,
}

impl From<ProductImage> for ProductImageResponse {
    fn from(i: ProductImage) -> Self {
        Self {
            id: i.id.to_string(),
            url: i.url,
            alt_text: i.alt_text,
            display_order: i.display_order,
            is_primary: i.is_primary,
        }
    }
}

/// Product variation response
#[derive(Debug, Serialize)]
pub struct VariationResponse {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: i32,
    pub is_active: bool,
}

impl From<ProductVariation> for VariationResponse {
    fn from(v: ProductVariation) -> Self {
        Self {
            id: v.id.to_string(),
            product_id: v.product_id.to_string(),
            name: v.name,
            sku: v.sku,
            price: v.price,
            stock_quantity: v.stock_quantity,
            is_active: v.is_active,
        }
    }
}

/// Product response used by listings and the admin panel
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    /// Price after the best active promotion
    pub effective_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    pub in_stock: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub primary_image: Option<String>,
    pub category_ids: Vec<String>,
    pub images: Vec<ProductImageResponse>,
    pub variations: Vec<VariationResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    /// Drop purchase cost for storefront responses.
    pub fn public(mut self) -> Self {
        self.cost_price = None;
        self.variations.retain(|v| v.is_active);
        self
    }
}

impl From<PricedProduct> for ProductResponse {
    fn from(priced: PricedProduct) -> Self {
        let p = priced.product;
        let primary_image = p.primary_image().map(|i| i.url.clone());
        let in_stock = p.available_stock() > 0;
        Self {
            id: p.id.to_string(),
            name: p.name,
            slug: p.slug,
            sku: p.sku,
            short_description: p.short_description,
            description: p.description,
            price: p.price,
            effective_price: priced.effective_price,
            compare_at_price: p.compare_at_price,
            cost_price: p.cost_price,
            stock_quantity: p.stock_quantity,
            low_stock_threshold: p.low_stock_threshold,
            in_stock,
            is_active: p.is_active,
            is_featured: p.is_featured,
            primary_image,
            category_ids: p.category_ids.iter().map(|id| id.to_string()).collect(),
            images: p.images.into_iter().map(Into::into).collect(),
            variations: p.variations.into_iter().map(Into::into).collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Admin reports list products without promotion pricing.
impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let effective_price = product.price;
        PricedProduct {
            product,
            effective_price,
        }
        .into()
    }
}

/// Storefront product page
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub categories: Vec<CategoryResponse>,
}

impl From<ProductDetail> for ProductDetailResponse {
    fn from(detail: ProductDetail) -> Self {
        Self {
            product: ProductResponse::from(detail.product).public(),
            categories: detail.categories.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Order line response
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub variation_id: Option<String>,
    pub product_name: String,
    pub variation_name: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            id: i.id.to_string(),
            product_id: i.product_id.to_string(),
            variation_id: id_opt(i.variation_id),
            product_name: i.product_name,
            variation_name: i.variation_name,
            unit_price: i.unit_price,
            quantity: i.quantity,
            line_total: i.line_total,
        }
    }
}

/// Order response
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub user_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
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
    pub gift_message: Option<String>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub coupon_code: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    /// Hide back-office fields from customers.
    pub fn public(mut self) -> Self {
        self.admin_note = None;
        self
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id.to_string(),
            order_number: o.order_number,
            user_id: id_opt(o.user_id),
            customer_id: id_opt(o.customer_id),
            status: o.status.as_str().to_string(),
            payment_status: o.payment_status.as_str().to_string(),
            payment_method: o.payment_method.as_str().to_string(),
            customer_name: o.customer_name,
            customer_email: o.customer_email,
            customer_phone: o.customer_phone,
            recipient_name: o.recipient_name,
            recipient_phone: o.recipient_phone,
            shipping_address: o.shipping_address,
            shipping_city: o.shipping_city,
            shipping_district: o.shipping_district,
            shipping_postal_code: o.shipping_postal_code,
            delivery_date: o.delivery_date,
            delivery_time_slot: o.delivery_time_slot,
            gift_message: o.gift_message,
            notes: o.notes,
            admin_note: o.admin_note,
            subtotal: o.subtotal,
            discount_amount: o.discount_amount,
            shipping_fee: o.shipping_fee,
            total: o.total,
            coupon_code: o.coupon_code,
            items: o.items.into_iter().map(Into::into).collect(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

// ============================================================================
// Customers
// ============================================================================

/// Customer response with computed segment
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub total_orders: i32,
    pub total_spent: Decimal,
    pub last_order_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub segment: String,
    pub created_at: DateTime<Utc>,
}

impl From<CustomerView> for CustomerResponse {
    fn from(view: CustomerView) -> Self {
        let c = view.customer;
        Self {
            id: c.id.to_string(),
            user_id: id_opt(c.user_id),
            email: c.email,
            full_name: c.full_name,
            phone: c.phone,
            address: c.address,
            city: c.city,
            total_orders: c.total_orders,
            total_spent: c.total_spent,
            last_order_at: c.last_order_at,
            notes: c.notes,
            segment: view.segment.as_str().to_string(),
            created_at: c.created_at,
        }
    }
}

/// Customer page with recent orders
#[derive(Debug, Serialize)]
pub struct CustomerDetailResponse {
    #[serde(flatten)]
    pub customer: CustomerResponse,
    pub recent_orders: Vec<OrderResponse>,
}

impl From<CustomerDetail> for CustomerDetailResponse {
    fn from(detail: CustomerDetail) -> Self {
        Self {
            customer: detail.view.into(),
            recent_orders: detail.recent_orders.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Stock movement response
#[derive(Debug, Serialize)]
pub struct StockMovementResponse {
    pub id: String,
    pub product_id: String,
    pub variation_id: Option<String>,
    pub movement_type: String,
    pub quantity: i32,
    pub stock_after: i32,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StockMovement> for StockMovementResponse {
    fn from(m: StockMovement) -> Self {
        Self {
            id: m.id.to_string(),
            product_id: m.product_id.to_string(),
            variation_id: id_opt(m.variation_id),
            movement_type: m.movement_type.as_str().to_string(),
            quantity: m.quantity,
            stock_after: m.stock_after,
            reason: m.reason,
            reference: m.reference,
            created_by: id_opt(m.created_by),
            created_at: m.created_at,
        }
    }
}

/// Supplier response
#[derive(Debug, Serialize)]
pub struct SupplierResponse {
    pub id: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Supplier> for SupplierResponse {
    fn from(s: Supplier) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name,
            contact_name: s.contact_name,
            email: s.email,
            phone: s.phone,
            address: s.address,
            notes: s.notes,
            is_active: s.is_active,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Product/supplier link response
#[derive(Debug, Serialize)]
pub struct ProductSupplierResponse {
    pub product_id: String,
    pub supplier_id: String,
    pub supplier_sku: Option<String>,
    pub cost_price: Option<Decimal>,
    pub lead_time_days: Option<i32>,
    pub is_preferred: bool,
    pub supplier_name: Option<String>,
    pub product_name: Option<String>,
}

impl From<ProductSupplier> for ProductSupplierResponse {
    fn from(l: ProductSupplier) -> Self {
        Self {
            product_id: l.product_id.to_string(),
            supplier_id: l.supplier_id.to_string(),
            supplier_sku: l.supplier_sku,
            cost_price: l.cost_price,
            lead_time_days: l.lead_time_days,
            is_preferred: l.is_preferred,
            supplier_name: l.supplier_name,
            product_name: l.product_name,
        }
    }
}

/// Supplier with linked products
#[derive(Debug, Serialize)]
pub struct SupplierDetailResponse {
    #[serde(flatten)]
    pub supplier: SupplierResponse,
    pub products: Vec<ProductSupplierResponse>,
}

impl From<SupplierDetail> for SupplierDetailResponse {
    fn from(detail: SupplierDetail) -> Self {
        Self {
            supplier: detail.supplier.into(),
            products: detail.products.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Finance
// ============================================================================

/// Expense category response
#[derive(Debug, Serialize)]
pub struct ExpenseCategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ExpenseCategory> for ExpenseCategoryResponse {
    fn from(c: ExpenseCategory) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            description: c.description,
            created_at: c.created_at,
        }
    }
}

/// Expense response
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: String,
    pub category_id: String,
    pub category_name: Option<String>,
    pub supplier_id: Option<String>,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id.to_string(),
            category_id: e.category_id.to_string(),
            category_name: e.category_name,
            supplier_id: id_opt(e.supplier_id),
            description: e.description,
            amount: e.amount,
            expense_date: e.expense_date,
            payment_method: e.payment_method,
            reference: e.reference,
            notes: e.notes,
            created_by: id_opt(e.created_by),
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Expense total for one category
#[derive(Debug, Serialize)]
pub struct CategoryTotalResponse {
    pub category_id: String,
    pub category_name: String,
    pub total: Decimal,
}

impl From<CategoryTotal> for CategoryTotalResponse {
    fn from(t: CategoryTotal) -> Self {
        Self {
            category_id: t.category_id.to_string(),
            category_name: t.category_name,
            total: t.total,
        }
    }
}

/// Profit and loss for a date range
#[derive(Debug, Serialize)]
pub struct FinancialSummaryResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub order_count: i64,
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    pub discounts: Decimal,
    pub shipping: Decimal,
    pub total_expenses: Decimal,
    pub expenses_by_category: Vec<CategoryTotalResponse>,
    pub net_profit: Decimal,
}

impl From<FinancialSummary> for FinancialSummaryResponse {
    fn from(s: FinancialSummary) -> Self {
        Self {
            from: s.from,
            to: s.to,
            order_count: s.sales.order_count,
            revenue: s.sales.revenue,
            average_order_value: s.average_order_value,
            discounts: s.sales.discounts,
            shipping: s.sales.shipping,
            total_expenses: s.total_expenses,
            expenses_by_category: s.expenses_by_category.into_iter().map(Into::into).collect(),
            net_profit: s.net_profit,
        }
    }
}

/// Admin landing page numbers
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub orders_today: i64,
    pub revenue_today: Decimal,
    pub pending_orders: i64,
    pub low_stock_products: i64,
    pub unread_messages: i64,
    pub customers: i64,
    pub recent_orders: Vec<OrderResponse>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            orders_today: d.counts.orders_today,
            revenue_today: d.counts.revenue_today,
            pending_orders: d.counts.pending_orders,
            low_stock_products: d.counts.low_stock_products,
            unread_messages: d.counts.unread_messages,
            customers: d.counts.customers,
            recent_orders: d.recent_orders.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Marketing
// ============================================================================

/// Campaign response
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_running: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        let is_running = c.is_running(Utc::now());
        Self {
            id: c.id.to_string(),
            name: c.name,
            description: c.description,
            starts_at: c.starts_at,
            ends_at: c.ends_at,
            is_active: c.is_active,
            is_running,
            created_at: c.created_at,
        }
    }
}

/// Coupon response
#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub max_uses_per_customer: Option<i32>,
    pub current_uses: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub campaign_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Coupon> for CouponResponse {
    fn from(c: Coupon) -> Self {
        Self {
            id: c.id.to_string(),
            code: c.code,
            description: c.description,
            discount_type: c.discount_type.as_str().to_string(),
            discount_value: c.discount_value,
            min_order_amount: c.min_order_amount,
            max_discount_amount: c.max_discount_amount,
            max_uses: c.max_uses,
            max_uses_per_customer: c.max_uses_per_customer,
            current_uses: c.current_uses,
            starts_at: c.starts_at,
            ends_at: c.ends_at,
            is_active: c.is_active,
            campaign_id: id_opt(c.campaign_id),
            created_at: c.created_at,
        }
    }
}

/// Coupon redemption record
#[derive(Debug, Serialize)]
pub struct CouponUsageResponse {
    pub id: String,
    pub coupon_id: String,
    pub order_id: String,
    pub customer_email: String,
    pub discount_amount: Decimal,
    pub used_at: DateTime<Utc>,
}

impl From<CouponUsage> for CouponUsageResponse {
    fn from(u: CouponUsage) -> Self {
        Self {
            id: u.id.to_string(),
            coupon_id: u.coupon_id.to_string(),
            order_id: u.order_id.to_string(),
            customer_email: u.customer_email,
            discount_amount: u.discount_amount,
            used_at: u.used_at,
        }
    }
}

/// Storefront coupon check result
#[derive(Debug, Serialize)]
pub struct CouponValidationResponse {
    pub is_valid: bool,
    pub discount_amount: Decimal,
    pub free_shipping: bool,
    pub message: String,
}

impl From<CouponValidation> for CouponValidationResponse {
    fn from(v: CouponValidation) -> Self {
        Self {
            is_valid: v.is_valid,
            discount_amount: v.discount_amount,
            free_shipping: v.free_shipping,
            message: v.message,
        }
    }
}

/// Product promotion response
#[derive(Debug, Serialize)]
pub struct PromotionResponse {
    pub id: String,
    pub product_id: String,
    pub campaign_id: Option<String>,
    pub name: Option<String>,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProductPromotion> for PromotionResponse {
    fn from(p: ProductPromotion) -> Self {
        Self {
            id: p.id.to_string(),
            product_id: p.product_id.to_string(),
            campaign_id: id_opt(p.campaign_id),
            name: p.name,
            discount_type: p.discount_type.as_str().to_string(),
            discount_value: p.discount_value,
            starts_at: p.starts_at,
            ends_at: p.ends_at,
            is_active: p.is_active,
            created_at: p.created_at,
        }
    }
}

// ============================================================================
// Content
// ============================================================================

/// Home page section response
#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub id: String,
    pub section_type: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: serde_json::Value,
    pub display_order: i32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<HomePageSection> for SectionResponse {
    fn from(s: HomePageSection) -> Self {
        Self {
            id: s.id.to_string(),
            section_type: s.section_type.as_str().to_string(),
            title: s.title,
            subtitle: s.subtitle,
            content: s.content,
            display_order: s.display_order,
            is_active: s.is_active,
            updated_at: s.updated_at,
        }
    }
}

/// Banner response
#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub button_text: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl From<Banner> for BannerResponse {
    fn from(b: Banner) -> Self {
        Self {
            id: b.id.to_string(),
            title: b.title,
            subtitle: b.subtitle,
            image_url: b.image_url,
            link_url: b.link_url,
            button_text: b.button_text,
            display_order: b.display_order,
            is_active: b.is_active,
            starts_at: b.starts_at,
            ends_at: b.ends_at,
        }
    }
}

/// Storefront home page payload
#[derive(Debug, Serialize)]
pub struct HomePageResponse {
    pub sections: Vec<SectionResponse>,
    pub banners: Vec<BannerResponse>,
    pub featured_products: Vec<ProductResponse>,
}

impl From<HomePage> for HomePageResponse {
    fn from(home: HomePage) -> Self {
        Self {
            sections: home.sections.into_iter().map(Into::into).collect(),
            banners: home.banners.into_iter().map(Into::into).collect(),
            featured_products: home
                .featured_products
                .into_iter()
                .map(|p| ProductResponse::from(p).public())
                .collect(),
        }
    }
}

/// FAQ response
#[derive(Debug, Serialize)]
pub struct FaqResponse {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

impl From<Faq> for FaqResponse {
    fn from(f: Faq) -> Self {
        Self {
            id: f.id.to_string(),
            question: f.question,
            answer: f.answer,
            category: f.category,
            display_order: f.display_order,
            is_active: f.is_active,
        }
    }
}

/// FAQs sharing a category
#[derive(Debug, Serialize)]
pub struct FaqGroupResponse {
    pub category: Option<String>,
    pub faqs: Vec<FaqResponse>,
}

impl From<FaqGroup> for FaqGroupResponse {
    fn from(g: FaqGroup) -> Self {
        Self {
            category: g.category,
            faqs: g.faqs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Contact message response
#[derive(Debug, Serialize)]
pub struct ContactMessageResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ContactMessage> for ContactMessageResponse {
    fn from(m: ContactMessage) -> Self {
        Self {
            id: m.id.to_string(),
            name: m.name,
            email: m.email,
            phone: m.phone,
            subject: m.subject,
            message: m.message,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

/// Store setting response (admin)
#[derive(Debug, Serialize)]
pub struct StoreSettingResponse {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<StoreSetting> for StoreSettingResponse {
    fn from(s: StoreSetting) -> Self {
        Self {
            key: s.key,
            value: s.value,
            description: s.description,
            is_public: s.is_public,
            updated_at: s.updated_at,
        }
    }
}

/// Storefront settings: checkout figures plus every public key/value pair
#[derive(Debug, Serialize)]
pub struct PublicSettingsResponse {
    pub currency: String,
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Decimal,
    pub settings: BTreeMap<String, String>,
}

impl PublicSettingsResponse {
    pub fn new(config: StoreConfig, settings: Vec<StoreSetting>) -> Self {
        Self {
            currency: config.currency,
            shipping_fee: config.shipping_fee,
            free_shipping_threshold: config.free_shipping_threshold,
            settings: public_settings_map(settings),
        }
    }
}

/// Public settings as a flat key/value map
pub fn public_settings_map(settings: Vec<StoreSetting>) -> BTreeMap<String, String> {
    settings.into_iter().map(|s| (s.key, s.value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PageRequest, Product};

    #[test]
    fn test_paged_response_keeps_metadata() {
        let page = Page::new(vec![1_i64, 2, 3], PageRequest::new(Some(2), Some(3)), 8);
        let response: PagedResponse<i64> = PagedResponse::from_page(page);
        assert_eq!(response.items, vec![1, 2, 3]);
        assert_eq!(response.page, 2);
        assert_eq!(response.total_items, 8);
        assert_eq!(response.total_pages, 3);
    }

    #[test]
    fn test_product_ids_are_strings() {
        let priced = PricedProduct {
            product: Product {
                id: 1234567890123456789,
                name: "Red Roses".into(),
                slug: "red-roses".into(),
                price: Decimal::new(49900, 2),
                cost_price: Some(Decimal::new(20000, 2)),
                stock_quantity: 3,
                category_ids: vec![7],
                ..Default::default()
            },
            effective_price: Decimal::new(44910, 2),
        };
        let response = ProductResponse::from(priced).public();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], "1234567890123456789");
        assert_eq!(json["category_ids"][0], "7");
        assert_eq!(json["effective_price"], "449.10");
        assert!(json.get("cost_price").is_none());
        assert_eq!(json["in_stock"], true);
    }

    #[test]
    fn test_public_settings_map() {
        let now = Utc::now();
        let map = public_settings_map(vec![StoreSetting {
            key: "currency".into(),
            value: "TRY".into(),
            description: None,
            is_public: true,
            updated_at: now,
        }]);
        assert_eq!(map.get("currency").map(String::as_str), Some("TRY"));
    }
}
