//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! Each repository owns a clone of the `PgPool` and maps between table rows
//! and domain entities. Multi-statement writes open their own transaction.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use flower_shop::infrastructure::repositories::{PgOrderRepository, PgProductRepository};
//!
//! fn setup_repositories(pool: PgPool) {
//!     let products = PgProductRepository::new(pool.clone());
//!     let orders = PgOrderRepository::new(pool);
//! }
//! ```

pub mod campaign_repository;
pub mod category_repository;
pub mod contact_message_repository;
pub mod content_repository;
pub mod coupon_repository;
pub mod customer_repository;
pub mod expense_repository;
pub mod faq_repository;
pub mod inventory_repository;
pub mod order_repository;
pub mod product_repository;
pub mod promotion_repository;
pub mod report_repository;
pub mod session_repository;
pub mod store_setting_repository;
pub mod supplier_repository;
pub mod user_repository;

pub use campaign_repository::PgCampaignRepository;
pub use category_repository::PgCategoryRepository;
pub use contact_message_repository::PgContactMessageRepository;
pub use content_repository::PgContentRepository;
pub use coupon_repository::PgCouponRepository;
pub use customer_repository::PgCustomerRepository;
pub use expense_repository::PgExpenseRepository;
pub use faq_repository::PgFaqRepository;
pub use inventory_repository::PgInventoryRepository;
pub use order_repository::PgOrderRepository;
pub use product_repository::PgProductRepository;
pub use promotion_repository::PgPromotionRepository;
pub use report_repository::PgReportRepository;
pub use session_repository::PgSessionRepository;
pub use store_setting_repository::PgStoreSettingRepository;
pub use supplier_repository::PgSupplierRepository;
pub use user_repository::PgUserRepository;
