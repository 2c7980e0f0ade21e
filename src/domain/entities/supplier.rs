//! Supplier entity, product-supplier links and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Maps to the `suppliers` table (growers, wholesalers, packaging vendors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
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

/// Maps to `product_suppliers`, keyed by (product_id, supplier_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSupplier {
    pub product_id: i64,
    pub supplier_id: i64,
    pub supplier_sku: Option<String>,
    pub cost_price: Option<Decimal>,
    pub lead_time_days: Option<i32>,
    pub is_preferred: bool,
    /// Joined for display; ignored on write
    pub supplier_name: Option<String>,
    pub product_name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Supplier>, AppError>;

    async fn list(&self, include_inactive: bool) -> Result<Vec<Supplier>, AppError>;

    async fn create(&self, supplier: &Supplier) -> Result<Supplier, AppError>;

    async fn update(&self, supplier: &Supplier) -> Result<Supplier, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Insert or update a link; a preferred link clears other preferred links of the product.
    async fn link_product(&self, link: &ProductSupplier) -> Result<ProductSupplier, AppError>;

    async fn unlink_product(&self, product_id: i64, supplier_id: i64) -> Result<(), AppError>;

    async fn list_for_product(&self, product_id: i64) -> Result<Vec<ProductSupplier>, AppError>;

    async fn list_for_supplier(&self, supplier_id: i64) -> Result<Vec<ProductSupplier>, AppError>;
}
