//! # Domain Entities
//!
//! Core business objects of the flower shop. All entities map directly to
//! their corresponding database tables.
//!
//! ## Catalog
//!
//! - **Category**, **Product** (with images and variations)
//!
//! ## Sales
//!
//! - **Order** with items, **Customer**, **Coupon**, **ProductPromotion**, **Campaign**
//!
//! ## Back office
//!
//! - **StockMovement**, **Supplier**, **Expense**, report aggregates
//!
//! ## Content
//!
//! - **HomePageSection**, **Banner**, **Faq**, **ContactMessage**, **StoreSetting**
//!
//! ## Repository Traits
//!
//! Each aggregate has a repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod campaign;
mod category;
mod contact_message;
mod content;
mod coupon;
mod customer;
mod expense;
mod faq;
mod order;
mod product;
mod promotion;
mod report;
mod session;
mod stock_movement;
mod store_setting;
mod supplier;
mod user;

pub use user::{User, UserRepository, UserRole};

pub use session::{Session, SessionRepository};

pub use category::{Category, CategoryRepository};

pub use product::{
    Product, ProductFilter, ProductImage, ProductRepository, ProductSort, ProductVariation,
};

pub use order::{
    generate_order_number, Order, OrderFilter, OrderItem, OrderPlacement, OrderRepository,
    OrderStatus, PaymentMethod, PaymentStatus,
};

pub use customer::{Customer, CustomerFilter, CustomerRepository, CustomerSegment};

pub use stock_movement::{
    AdjustmentMode, InventoryRepository, MovementType, StockAdjustment, StockMovement,
    StockMovementFilter,
};

pub use supplier::{ProductSupplier, Supplier, SupplierRepository};

pub use expense::{CategoryTotal, Expense, ExpenseCategory, ExpenseFilter, ExpenseRepository};

pub use report::{DashboardCounts, ReportRepository, SalesTotals};

pub use campaign::{Campaign, CampaignRepository};

pub use coupon::{
    generate_code, normalize_code, Coupon, CouponRepository, CouponUsage, DiscountType,
};

pub use promotion::{ProductPromotion, PromotionRepository};

pub use content::{Banner, ContentRepository, HomePageSection, SectionType};

pub use faq::{Faq, FaqRepository};

pub use contact_message::{ContactMessage, ContactMessageRepository};

pub use store_setting::{decimal_setting, keys as setting_keys, StoreSetting, StoreSettingRepository};

#[cfg(test)]
pub use mocks::*;

#[cfg(test)]
mod mocks {
    pub use super::campaign::MockCampaignRepository;
    pub use super::category::MockCategoryRepository;
    pub use super::contact_message::MockContactMessageRepository;
    pub use super::content::MockContentRepository;
    pub use super::coupon::MockCouponRepository;
    pub use super::customer::MockCustomerRepository;
    pub use super::expense::MockExpenseRepository;
    pub use super::faq::MockFaqRepository;
    pub use super::order::MockOrderRepository;
    pub use super::product::MockProductRepository;
    pub use super::promotion::MockPromotionRepository;
    pub use super::report::MockReportRepository;
    pub use super::session::MockSessionRepository;
    pub use super::stock_movement::MockInventoryRepository;
    pub use super::store_setting::MockStoreSettingRepository;
    pub use super::supplier::MockSupplierRepository;
    pub use super::user::MockUserRepository;
}
