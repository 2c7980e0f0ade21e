//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, JWT tokens, refresh sessions
//! - **CatalogService**: Categories, products, images and variations
//! - **OrderService**: Checkout, tracking and order administration
//! - **CustomerService**: Customer records and segments
//! - **InventoryService**: Stock adjustments and suppliers
//! - **FinanceService**: Expenses, financial summary and dashboard
//! - **MarketingService**: Campaigns, coupons and product promotions
//! - **ContentService**: Home page sections, banners and FAQs
//! - **StoreService**: Contact messages and store settings

pub mod auth_service;
pub mod catalog_service;
pub mod content_service;
pub mod customer_service;
pub mod finance_service;
pub mod inventory_service;
pub mod marketing_service;
pub mod order_service;
pub mod store_service;

// Re-export auth service types
pub use auth_service::{
    decode_access_token, AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims,
};

// Re-export catalog service types
pub use catalog_service::{
    CatalogError, CatalogService, CatalogServiceImpl, PricedProduct, ProductDetail,
};

// Re-export content service types
pub use content_service::{ContentError, ContentService, ContentServiceImpl, FaqGroup, HomePage};

// Re-export customer service types
pub use customer_service::{
    CustomerDetail, CustomerError, CustomerService, CustomerServiceImpl, CustomerView,
};

// Re-export finance service types
pub use finance_service::{
    Dashboard, FinanceError, FinanceService, FinanceServiceImpl, FinancialSummary,
};

// Re-export inventory service types
pub use inventory_service::{
    InventoryError, InventoryService, InventoryServiceImpl, SupplierDetail,
};

// Re-export marketing service types
pub use marketing_service::{
    CouponValidation, MarketingError, MarketingService, MarketingServiceImpl,
};

// Re-export order service types
pub use order_service::{OrderError, OrderService, OrderServiceImpl};

// Re-export store service types
pub use store_service::{StoreConfig, StoreError, StoreService, StoreServiceImpl};
