//! Product aggregate: product, images, variations and category links.
//!
//! Maps to `products`, `product_images`, `product_variations` and
//! `product_categories`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PageRequest;
use crate::shared::error::AppError;

/// Maps to the `products` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: VARCHAR(200) NOT NULL
/// - slug: VARCHAR(200) NOT NULL UNIQUE
/// - sku: VARCHAR(64) NULL UNIQUE
/// - price / compare_at_price / cost_price: NUMERIC(12,2)
/// - stock_quantity: INT NOT NULL CHECK (stock_quantity >= 0)
/// - low_stock_threshold: INT NOT NULL
/// - is_active / is_featured: BOOLEAN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    /// "Was" price shown struck through
    pub compare_at_price: Option<Decimal>,
    /// Purchase cost, admin only
    pub cost_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub category_ids: Vec<i64>,
    pub images: Vec<ProductImage>,
    pub variations: Vec<ProductVariation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }

    /// Primary image, falling back to the first by display order.
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|i| i.is_primary)
            .or_else(|| self.images.iter().min_by_key(|i| i.display_order))
    }

    pub fn variation(&self, variation_id: i64) -> Option<&ProductVariation> {
        self.variations.iter().find(|v| v.id == variation_id)
    }

    /// Total sellable units across the product and its active variations.
    pub fn available_stock(&self) -> i32 {
        let active: Vec<_> = self.variations.iter().filter(|v| v.is_active).collect();
        if active.is_empty() {
            self.stock_quantity
        } else {
            active.iter().map(|v| v.stock_quantity).sum()
        }
    }
}

impl Default for Product {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: String::new(),
            slug: String::new(),
            sku: None,
            short_description: None,
            description: None,
            price: Decimal::ZERO,
            compare_at_price: None,
            cost_price: None,
            stock_quantity: 0,
            low_stock_threshold: 5,
            is_active: true,
            is_featured: false,
            category_ids: Vec::new(),
            images: Vec::new(),
            variations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Maps to `product_images`. Images are stored as URLs; at most one per
/// product has `is_primary` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// Maps to `product_variations` (e.g. "12 stems", "24 stems").
///
/// `price` overrides the product price when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariation {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "name" => Self::Name,
            _ => Self::Newest,
        }
    }

    /// ORDER BY clause; values are fixed strings, never user input.
    pub fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id DESC",
            Self::Name => "p.name ASC, p.id ASC",
        }
    }
}

/// Listing filter shared by the storefront and admin product lists.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub include_inactive: bool,
    pub sort: ProductSort,
}

/// Repository trait for the product aggregate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Load a product with images, variations and category ids.
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, AppError>;

    /// Load several products (with variations) in one round trip.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, AppError>;

    /// Filtered, paginated listing. Returns the page and the total match count.
    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), AppError>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn sku_exists(&self, sku: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    /// Insert the product row and its category links.
    async fn create(&self, product: &Product) -> Result<Product, AppError>;

    /// Update the product row (not images/variations).
    async fn update(&self, product: &Product) -> Result<Product, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Replace the category links of a product in one transaction.
    async fn set_categories(&self, product_id: i64, category_ids: &[i64]) -> Result<(), AppError>;

    /// Add an image; when `is_primary` the previous primary is cleared.
    async fn add_image(&self, image: &ProductImage) -> Result<ProductImage, AppError>;

    async fn delete_image(&self, product_id: i64, image_id: i64) -> Result<(), AppError>;

    async fn set_primary_image(&self, product_id: i64, image_id: i64) -> Result<(), AppError>;

    async fn create_variation(
        &self,
        variation: &ProductVariation,
    ) -> Result<ProductVariation, AppError>;

    async fn update_variation(
        &self,
        variation: &ProductVariation,
    ) -> Result<ProductVariation, AppError>;

    async fn delete_variation(&self, product_id: i64, variation_id: i64) -> Result<(), AppError>;

    /// Active products at or below their low-stock threshold.
    async fn low_stock(&self, limit: i64) -> Result<Vec<Product>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: i64, order: i32, primary: bool) -> ProductImage {
        ProductImage {
            id,
            product_id: 1,
            url: format!("https://cdn.example.com/{}.jpg", id),
            alt_text: None,
            display_order: order,
            is_primary: primary,
            created_at: Utc::now(),
        }
    }

    fn variation(id: i64, stock: i32, active: bool) -> ProductVariation {
        ProductVariation {
            id,
            product_id: 1,
            name: format!("Size {}", id),
            sku: None,
            price: None,
            stock_quantity: stock,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_primary_image_prefers_flag() {
        let product = Product {
            images: vec![image(1, 0, false), image(2, 1, true)],
            ..Default::default()
        };
        assert_eq!(product.primary_image().unwrap().id, 2);
    }

    #[test]
    fn test_primary_image_falls_back_to_order() {
        let product = Product {
            images: vec![image(1, 3, false), image(2, 1, false)],
            ..Default::default()
        };
        assert_eq!(product.primary_image().unwrap().id, 2);
    }

    #[test]
    fn test_low_stock_boundary() {
        let mut product = Product {
            stock_quantity: 5,
            low_stock_threshold: 5,
            ..Default::default()
        };
        assert!(product.is_low_stock());
        product.stock_quantity = 6;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_available_stock_sums_active_variations() {
        let product = Product {
            stock_quantity: 100,
            variations: vec![variation(1, 3, true), variation(2, 4, true), variation(3, 50, false)],
            ..Default::default()
        };
        assert_eq!(product.available_stock(), 7);
    }

    #[test]
    fn test_available_stock_without_variations() {
        let product = Product {
            stock_quantity: 9,
            ..Default::default()
        };
        assert_eq!(product.available_stock(), 9);
    }

    #[test]
    fn test_sort_from_str() {
        assert_eq!(ProductSort::from_str("price_asc"), ProductSort::PriceAsc);
        assert_eq!(ProductSort::from_str("PRICE_DESC"), ProductSort::PriceDesc);
        assert_eq!(ProductSort::from_str("name"), ProductSort::Name);
        assert_eq!(ProductSort::from_str("whatever"), ProductSort::Newest);
    }
}
