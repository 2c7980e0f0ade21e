//! Catalog Service
//!
//! Categories, products, images and variations, plus the slug rules shared
//! by both: an explicit slug must be free, a derived slug is deduplicated.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::application::dto::request::{
    CategoryRequest, ProductImageRequest, ProductQuery, ProductRequest, VariationRequest,
};
use crate::domain::services::PricingService;
use crate::domain::{
    Category, CategoryRepository, Page, PageRequest, Product, ProductFilter, ProductImage,
    ProductRepository, ProductSort, ProductVariation, PromotionRepository, Slug,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};

/// Storefront default page size for product grids.
pub const PRODUCT_PAGE_SIZE: u32 = 12;

/// Give up deduplicating a derived slug after this many candidates.
const MAX_SLUG_ATTEMPTS: u32 = 50;

/// Catalog service trait
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Categories ordered by display_order then name
    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>, CatalogError>;

    async fn get_category(&self, id: i64) -> Result<Category, CatalogError>;

    /// Active category by slug (storefront)
    async fn get_category_by_slug(&self, slug: &str) -> Result<Category, CatalogError>;

    async fn create_category(&self, request: CategoryRequest) -> Result<Category, CatalogError>;

    async fn update_category(
        &self,
        id: i64,
        request: CategoryRequest,
    ) -> Result<Category, CatalogError>;

    /// Rejected while products are assigned
    async fn delete_category(&self, id: i64) -> Result<(), CatalogError>;

    /// Filtered product listing; `admin` includes inactive products
    async fn list_products(
        &self,
        query: ProductQuery,
        admin: bool,
    ) -> Result<Page<PricedProduct>, CatalogError>;

    /// Active product page by slug (storefront)
    async fn get_product_by_slug(&self, slug: &str) -> Result<ProductDetail, CatalogError>;

    async fn get_product(&self, id: i64) -> Result<PricedProduct, CatalogError>;

    async fn create_product(&self, request: ProductRequest) -> Result<PricedProduct, CatalogError>;

    async fn update_product(
        &self,
        id: i64,
        request: ProductRequest,
    ) -> Result<PricedProduct, CatalogError>;

    async fn delete_product(&self, id: i64) -> Result<(), CatalogError>;

    async fn set_product_categories(
        &self,
        product_id: i64,
        category_ids: Vec<String>,
    ) -> Result<PricedProduct, CatalogError>;

    async fn add_image(
        &self,
        product_id: i64,
        request: ProductImageRequest,
    ) -> Result<ProductImage, CatalogError>;

    async fn delete_image(&self, product_id: i64, image_id: i64) -> Result<(), CatalogError>;

    async fn set_primary_image(&self, product_id: i64, image_id: i64) -> Result<(), CatalogError>;

    async fn create_variation(
        &self,
        product_id: i64,
        request: VariationRequest,
    ) -> Result<ProductVariation, CatalogError>;

    async fn update_variation(
        &self,
        product_id: i64,
        variation_id: i64,
        request: VariationRequest,
    ) -> Result<ProductVariation, CatalogError>;

    async fn delete_variation(&self, product_id: i64, variation_id: i64)
        -> Result<(), CatalogError>;

    /// Active products at or below their low-stock threshold
    async fn low_stock(&self, limit: i64) -> Result<Vec<Product>, CatalogError>;
}

/// Product with its price after promotions
#[derive(Debug, Clone)]
pub struct PricedProduct {
    pub product: Product,
    pub effective_price: Decimal,
}

/// Storefront product page
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: PricedProduct,
    pub categories: Vec<Category>,
}

/// Catalog service errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Category not found")]
    CategoryNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Slug '{0}' is already in use")]
    SlugTaken(String),

    #[error("SKU '{0}' is already in use")]
    SkuTaken(String),

    #[error("Category still has products assigned")]
    CategoryInUse,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CategoryNotFound | CatalogError::ProductNotFound => {
                AppError::NotFound(err.to_string())
            }
            CatalogError::SlugTaken(_) | CatalogError::SkuTaken(_) | CatalogError::CategoryInUse => {
                AppError::Conflict(err.to_string())
            }
            CatalogError::Invalid(msg) => AppError::BadRequest(msg),
            CatalogError::Repository(e) => e,
        }
    }
}

/// Pick a slug for a new or renamed record.
///
/// An explicit slug must be canonical and free. A derived slug gets `-2`,
/// `-3`, ... appended until `exists` reports it free.
pub async fn resolve_slug<F, Fut>(
    requested: Option<&str>,
    name: &str,
    mut exists: F,
) -> Result<String, CatalogError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, AppError>>,
{
    if let Some(raw) = requested {
        let slug = Slug::parse(raw.trim()).ok_or_else(|| {
            CatalogError::Invalid(
                "Slug may only contain lowercase letters, digits and single hyphens".into(),
            )
        })?;
        if exists(slug.as_str().to_string()).await? {
            return Err(CatalogError::SlugTaken(slug.into_inner()));
        }
        return Ok(slug.into_inner());
    }

    let base = Slug::from_text(name)
        .ok_or_else(|| CatalogError::Invalid("Name must contain letters or digits".into()))?;
    for n in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = base.with_suffix(n);
        if !exists(candidate.as_str().to_string()).await? {
            return Ok(candidate.into_inner());
        }
    }
    Err(CatalogError::SlugTaken(base.into_inner()))
}

/// Attach effective prices using the promotions active at `now`.
pub async fn price_products<P>(
    promotion_repo: &P,
    products: Vec<Product>,
    now: DateTime<Utc>,
) -> Result<Vec<PricedProduct>, AppError>
where
    P: PromotionRepository + ?Sized,
{
    if products.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let promotions = promotion_repo.active_for_products(&ids, now).await?;

    Ok(products
        .into_iter()
        .map(|product| {
            let effective_price =
                PricingService::effective_price(product.id, product.price, &promotions, now);
            PricedProduct {
                product,
                effective_price,
            }
        })
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// CatalogService implementation
pub struct CatalogServiceImpl<C, P, R>
where
    C: CategoryRepository,
    P: ProductRepository,
    R: PromotionRepository,
{
    category_repo: Arc<C>,
    product_repo: Arc<P>,
    promotion_repo: Arc<R>,
    id_generator: Arc<SnowflakeGenerator>,
    default_low_stock_threshold: i32,
}

impl<C, P, R> CatalogServiceImpl<C, P, R>
where
    C: CategoryRepository + 'static,
    P: ProductRepository + 'static,
    R: PromotionRepository + 'static,
{
    pub fn new(
        category_repo: Arc<C>,
        product_repo: Arc<P>,
        promotion_repo: Arc<R>,
        id_generator: Arc<SnowflakeGenerator>,
        default_low_stock_threshold: i32,
    ) -> Self {
        Self {
            category_repo,
            product_repo,
            promotion_repo,
            id_generator,
            default_low_stock_threshold,
        }
    }

    async fn category_slug(
        &self,
        requested: Option<&str>,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, CatalogError> {
        let repo = self.category_repo.clone();
        resolve_slug(requested, name, move |slug| {
            let repo = repo.clone();
            async move { repo.slug_exists(&slug, exclude_id).await }
        })
        .await
    }

    async fn product_slug(
        &self,
        requested: Option<&str>,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, CatalogError> {
        let repo = self.product_repo.clone();
        resolve_slug(requested, name, move |slug| {
            let repo = repo.clone();
            async move { repo.slug_exists(&slug, exclude_id).await }
        })
        .await
    }

    /// Parent must exist and must not be the category itself.
    async fn check_parent(
        &self,
        raw_parent: Option<&str>,
        self_id: Option<i64>,
    ) -> Result<Option<i64>, CatalogError> {
        let Some(raw) = raw_parent.filter(|r| !r.trim().is_empty()) else {
            return Ok(None);
        };
        let parent_id = parse_id(raw, "parent category")?;
        if Some(parent_id) == self_id {
            return Err(CatalogError::Invalid("A category cannot be its own parent".into()));
        }
        if self.category_repo.find_by_id(parent_id).await?.is_none() {
            return Err(CatalogError::Invalid("Parent category does not exist".into()));
        }
        Ok(Some(parent_id))
    }

    async fn check_sku(&self, sku: Option<&str>, exclude_id: Option<i64>) -> Result<(), CatalogError> {
        if let Some(sku) = sku {
            if self.product_repo.sku_exists(sku, exclude_id).await? {
                return Err(CatalogError::SkuTaken(sku.to_string()));
            }
        }
        Ok(())
    }

    async fn parse_category_ids(&self, raw: &[String]) -> Result<Vec<i64>, CatalogError> {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(raw.len());
        for r in raw {
            let id = parse_id(r, "category")?;
            if !seen.insert(id) {
                continue;
            }
            if self.category_repo.find_by_id(id).await?.is_none() {
                return Err(CatalogError::Invalid(format!("Category {} does not exist", id)));
            }
            ids.push(id);
        }
        Ok(ids)
    }

    async fn load_product(&self, id: i64) -> Result<Product, CatalogError> {
        self.product_repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    async fn priced(&self, product: Product) -> Result<PricedProduct, CatalogError> {
        let mut priced =
            price_products(self.promotion_repo.as_ref(), vec![product], Utc::now()).await?;
        priced.pop().ok_or(CatalogError::ProductNotFound)
    }

    /// Category filter accepts an id or a slug.
    async fn resolve_category_filter(&self, raw: &str) -> Result<Option<i64>, CatalogError> {
        if let Ok(id) = raw.parse::<i64>() {
            return Ok(Some(id));
        }
        match self.category_repo.find_by_slug(raw).await? {
            Some(category) => Ok(Some(category.id)),
            None => Err(CatalogError::CategoryNotFound),
        }
    }
}

#[async_trait]
impl<C, P, R> CatalogService for CatalogServiceImpl<C, P, R>
where
    C: CategoryRepository + 'static,
    P: ProductRepository + 'static,
    R: PromotionRepository + 'static,
{
    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>, CatalogError> {
        Ok(self.category_repo.list(include_inactive).await?)
    }

    async fn get_category(&self, id: i64) -> Result<Category, CatalogError> {
        self.category_repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound)
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Category, CatalogError> {
        self.category_repo
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_active)
            .ok_or(CatalogError::CategoryNotFound)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_category(&self, request: CategoryRequest) -> Result<Category, CatalogError> {
        let slug = self
            .category_slug(request.slug.as_deref(), &request.name, None)
            .await?;
        let parent_id = self.check_parent(request.parent_id.as_deref(), None).await?;

        let now = Utc::now();
        let category = Category {
            id: self.id_generator.generate(),
            name: request.name.trim().to_string(),
            slug,
            description: non_empty(request.description),
            image_url: non_empty(request.image_url),
            parent_id,
            display_order: request.display_order,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };

        let created = self.category_repo.create(&category).await?;
        info!(category_id = created.id, slug = %created.slug, "Category created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    async fn update_category(
        &self,
        id: i64,
        request: CategoryRequest,
    ) -> Result<Category, CatalogError> {
        let mut category = self.get_category(id).await?;

        // Keep the published slug unless a new one is requested.
        if let Some(requested) = request.slug.as_deref() {
            if requested != category.slug {
                category.slug = self.category_slug(Some(requested), &request.name, Some(id)).await?;
            }
        }
        category.parent_id = self.check_parent(request.parent_id.as_deref(), Some(id)).await?;
        category.name = request.name.trim().to_string();
        category.description = non_empty(request.description);
        category.image_url = non_empty(request.image_url);
        category.display_order = request.display_order;
        category.is_active = request.is_active;

        Ok(self.category_repo.update(&category).await?)
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: i64) -> Result<(), CatalogError> {
        self.get_category(id).await?;
        if self.category_repo.product_count(id).await? > 0 {
            return Err(CatalogError::CategoryInUse);
        }
        self.category_repo.delete(id).await?;
        Ok(())
    }

    async fn list_products(
        &self,
        query: ProductQuery,
        admin: bool,
    ) -> Result<Page<PricedProduct>, CatalogError> {
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(CatalogError::Invalid("min_price must not exceed max_price".into()));
            }
        }

        let category_id = match non_empty(query.category) {
            Some(raw) => self.resolve_category_filter(&raw).await?,
            None => None,
        };

        let filter = ProductFilter {
            search: non_empty(query.search),
            category_id,
            min_price: query.min_price,
            max_price: query.max_price,
            featured: query.featured,
            in_stock: query.in_stock,
            include_inactive: admin,
            sort: query
                .sort
                .as_deref()
                .map(ProductSort::from_str)
                .unwrap_or_default(),
        };
        let page = PageRequest::with_default_size(query.page, query.page_size, PRODUCT_PAGE_SIZE);

        let (products, total) = self.product_repo.list(&filter, page).await?;
        let priced = price_products(self.promotion_repo.as_ref(), products, Utc::now()).await?;
        Ok(Page::new(priced, page, total))
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<ProductDetail, CatalogError> {
        let product = self
            .product_repo
            .find_by_slug(slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CatalogError::ProductNotFound)?;

        let mut categories = Vec::with_capacity(product.category_ids.len());
        for id in &product.category_ids {
            if let Some(category) = self.category_repo.find_by_id(*id).await? {
                if category.is_active {
                    categories.push(category);
                }
            }
        }

        Ok(ProductDetail {
            product: self.priced(product).await?,
            categories,
        })
    }

    async fn get_product(&self, id: i64) -> Result<PricedProduct, CatalogError> {
        let product = self.load_product(id).await?;
        self.priced(product).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_product(&self, request: ProductRequest) -> Result<PricedProduct, CatalogError> {
        let slug = self
            .product_slug(request.slug.as_deref(), &request.name, None)
            .await?;
        let sku = non_empty(request.sku);
        self.check_sku(sku.as_deref(), None).await?;
        let category_ids = self.parse_category_ids(&request.category_ids).await?;

        let now = Utc::now();
        let product = Product {
            id: self.id_generator.generate(),
            name: request.name.trim().to_string(),
            slug,
            sku,
            short_description: non_empty(request.short_description),
            description: non_empty(request.description),
            price: request.price,
            compare_at_price: request.compare_at_price,
            cost_price: request.cost_price,
            stock_quantity: request.stock_quantity,
            low_stock_threshold: request
                .low_stock_threshold
                .unwrap_or(self.default_low_stock_threshold),
            is_active: request.is_active,
            is_featured: request.is_featured,
            category_ids,
            images: Vec::new(),
            variations: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let created = self.product_repo.create(&product).await?;
        info!(product_id = created.id, slug = %created.slug, "Product created");
        self.priced(created).await
    }

    #[instrument(skip(self, request))]
    async fn update_product(
        &self,
        id: i64,
        request: ProductRequest,
    ) -> Result<PricedProduct, CatalogError> {
        let mut product = self.load_product(id).await?;

        if let Some(requested) = request.slug.as_deref() {
            if requested != product.slug {
                product.slug = self.product_slug(Some(requested), &request.name, Some(id)).await?;
            }
        }
        let sku = non_empty(request.sku);
        self.check_sku(sku.as_deref(), Some(id)).await?;
        let category_ids = self.parse_category_ids(&request.category_ids).await?;

        product.name = request.name.trim().to_string();
        product.sku = sku;
        product.short_description = non_empty(request.short_description);
        product.description = non_empty(request.description);
        product.price = request.price;
        product.compare_at_price = request.compare_at_price;
        product.cost_price = request.cost_price;
        if let Some(threshold) = request.low_stock_threshold {
            product.low_stock_threshold = threshold;
        }
        product.is_active = request.is_active;
        product.is_featured = request.is_featured;

        self.product_repo.update(&product).await?;
        if category_ids != product.category_ids {
            self.product_repo.set_categories(id, &category_ids).await?;
        }

        self.get_product(id).await
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: i64) -> Result<(), CatalogError> {
        self.load_product(id).await?;
        self.product_repo.delete(id).await?;
        Ok(())
    }

    async fn set_product_categories(
        &self,
        product_id: i64,
        category_ids: Vec<String>,
    ) -> Result<PricedProduct, CatalogError> {
        self.load_product(product_id).await?;
        let ids = self.parse_category_ids(&category_ids).await?;
        self.product_repo.set_categories(product_id, &ids).await?;
        self.get_product(product_id).await
    }

    async fn add_image(
        &self,
        product_id: i64,
        request: ProductImageRequest,
    ) -> Result<ProductImage, CatalogError> {
        let product = self.load_product(product_id).await?;

        let image = ProductImage {
            id: self.id_generator.generate(),
            product_id,
            url: request.url.trim().to_string(),
            alt_text: non_empty(request.alt_text),
            display_order: request.display_order,
            // First image becomes primary automatically.
            is_primary: request.is_primary || product.images.is_empty(),
            created_at: Utc::now(),
        };

        Ok(self.product_repo.add_image(&image).await?)
    }

    async fn delete_image(&self, product_id: i64, image_id: i64) -> Result<(), CatalogError> {
        self.product_repo.delete_image(product_id, image_id).await?;
        Ok(())
    }

    async fn set_primary_image(&self, product_id: i64, image_id: i64) -> Result<(), CatalogError> {
        self.product_repo
            .set_primary_image(product_id, image_id)
            .await?;
        Ok(())
    }

    async fn create_variation(
        &self,
        product_id: i64,
        request: VariationRequest,
    ) -> Result<ProductVariation, CatalogError> {
        self.load_product(product_id).await?;

        let now = Utc::now();
        let variation = ProductVariation {
            id: self.id_generator.generate(),
            product_id,
            name: request.name.trim().to_string(),
            sku: non_empty(request.sku),
            price: request.price,
            stock_quantity: request.stock_quantity,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };

        Ok(self.product_repo.create_variation(&variation).await?)
    }

    async fn update_variation(
        &self,
        product_id: i64,
        variation_id: i64,
        request: VariationRequest,
    ) -> Result<ProductVariation, CatalogError> {
        let product = self.load_product(product_id).await?;
        let mut variation = product
            .variation(variation_id)
            .cloned()
            .ok_or_else(|| CatalogError::Invalid("Variation does not belong to this product".into()))?;

        variation.name = request.name.trim().to_string();
        variation.sku = non_empty(request.sku);
        variation.price = request.price;
        variation.is_active = request.is_active;

        Ok(self.product_repo.update_variation(&variation).await?)
    }

    async fn delete_variation(
        &self,
        product_id: i64,
        variation_id: i64,
    ) -> Result<(), CatalogError> {
        self.product_repo
            .delete_variation(product_id, variation_id)
            .await?;
        Ok(())
    }

    async fn low_stock(&self, limit: i64) -> Result<Vec<Product>, CatalogError> {
        Ok(self.product_repo.low_stock(limit.clamp(1, 500)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DiscountType, MockCategoryRepository, MockProductRepository, MockPromotionRepository,
        ProductPromotion,
    };
    use chrono::Duration;
    use mockall::predicate::*;
    use pretty_assertions::assert_eq;

    type Svc = CatalogServiceImpl<
        MockCategoryRepository,
        MockProductRepository,
        MockPromotionRepository,
    >;

    fn service(
        categories: MockCategoryRepository,
        products: MockProductRepository,
        promotions: MockPromotionRepository,
    ) -> Svc {
        CatalogServiceImpl::new(
            Arc::new(categories),
            Arc::new(products),
            Arc::new(promotions),
            Arc::new(SnowflakeGenerator::new(1, 1)),
            5,
        )
    }

    fn category_request(name: &str, slug: Option<&str>) -> CategoryRequest {
        CategoryRequest {
            name: name.into(),
            slug: slug.map(Into::into),
            description: None,
            image_url: None,
            parent_id: None,
            display_order: 0,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_duplicate_explicit_slug_conflicts() {
        let mut categories = MockCategoryRepository::new();
        categories
            .expect_slug_exists()
            .with(eq("roses"), eq(None))
            .returning(|_, _| Ok(true));
        categories.expect_create().never();

        let err = service(categories, MockProductRepository::new(), MockPromotionRepository::new())
            .create_category(category_request("Roses", Some("roses")))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::SlugTaken(ref s) if s == "roses"));
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_derived_slug_is_deduplicated() {
        let mut categories = MockCategoryRepository::new();
        categories
            .expect_slug_exists()
            .returning(|slug, _| Ok(slug == "roses" || slug == "roses-2"));
        categories
            .expect_create()
            .withf(|c| c.slug == "roses-3")
            .returning(|c| Ok(c.clone()));

        let created = service(categories, MockProductRepository::new(), MockPromotionRepository::new())
            .create_category(category_request("Roses", None))
            .await
            .unwrap();
        assert_eq!(created.slug, "roses-3");
    }

    #[tokio::test]
    async fn test_non_canonical_explicit_slug_rejected() {
        let err = resolve_slug(Some("Red Roses"), "Red Roses", |_| async { Ok(false) })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_slug_from_turkish_name() {
        let slug = resolve_slug(None, "Kırmızı Güller", |_| async { Ok(false) })
            .await
            .unwrap();
        assert_eq!(slug, "kirmizi-guller");
    }

    #[tokio::test]
    async fn test_derived_slug_for_long_name_fits_column() {
        let name = "a".repeat(200);
        let taken = name.clone();
        let slug = resolve_slug(None, &name, move |candidate| {
            let hit = candidate == taken;
            async move { Ok(hit) }
        })
        .await
        .unwrap();
        assert!(slug.len() <= crate::domain::MAX_SLUG_LENGTH);
        assert!(slug.ends_with("-2"));
    }

    #[tokio::test]
    async fn test_category_cannot_parent_itself() {
        let mut categories = MockCategoryRepository::new();
        categories.expect_find_by_id().with(eq(9)).returning(|id| {
            Ok(Some(Category {
                id,
                name: "Tulips".into(),
                slug: "tulips".into(),
                ..Default::default()
            }))
        });

        let mut request = category_request("Tulips", None);
        request.parent_id = Some("9".into());
        let err = service(categories, MockProductRepository::new(), MockPromotionRepository::new())
            .update_category(9, request)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_delete_category_with_products_conflicts() {
        let mut categories = MockCategoryRepository::new();
        categories
            .expect_find_by_id()
            .returning(|id| Ok(Some(Category { id, ..Default::default() })));
        categories.expect_product_count().returning(|_| Ok(3));
        categories.expect_delete().never();

        let err = service(categories, MockProductRepository::new(), MockPromotionRepository::new())
            .delete_category(1)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CategoryInUse));
    }

    #[tokio::test]
    async fn test_product_detail_applies_promotion() {
        let mut products = MockProductRepository::new();
        products.expect_find_by_slug().returning(|_| {
            Ok(Some(Product {
                id: 11,
                name: "Peonies".into(),
                slug: "peonies".into(),
                price: Decimal::new(20000, 2),
                ..Default::default()
            }))
        });
        let mut promotions = MockPromotionRepository::new();
        promotions.expect_active_for_products().returning(|_, now| {
            Ok(vec![ProductPromotion {
                id: 1,
                product_id: 11,
                campaign_id: None,
                name: None,
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::new(25, 0),
                starts_at: now - Duration::hours(1),
                ends_at: now + Duration::hours(1),
                is_active: true,
                created_at: now,
                updated_at: now,
            }])
        });

        let detail = service(MockCategoryRepository::new(), products, promotions)
            .get_product_by_slug("peonies")
            .await
            .unwrap();
        assert_eq!(detail.product.effective_price, Decimal::new(15000, 2));
    }

    #[tokio::test]
    async fn test_inactive_product_hidden_from_storefront() {
        let mut products = MockProductRepository::new();
        products.expect_find_by_slug().returning(|_| {
            Ok(Some(Product {
                is_active: false,
                ..Default::default()
            }))
        });

        let err = service(MockCategoryRepository::new(), products, MockPromotionRepository::new())
            .get_product_by_slug("hidden")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound));
    }

    #[tokio::test]
    async fn test_duplicate_sku_conflicts() {
        let mut products = MockProductRepository::new();
        products.expect_slug_exists().returning(|_, _| Ok(false));
        products
            .expect_sku_exists()
            .with(eq("ROSE-12"), eq(None))
            .returning(|_, _| Ok(true));
        products.expect_create().never();

        let request: ProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Rose dozen",
            "sku": "ROSE-12",
            "price": "10.00"
        }))
        .unwrap();
        let err = service(MockCategoryRepository::new(), products, MockPromotionRepository::new())
            .create_product(request)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::SkuTaken(_)));
    }

    #[tokio::test]
    async fn test_list_rejects_inverted_price_range() {
        let query = ProductQuery {
            min_price: Some(Decimal::new(100, 0)),
            max_price: Some(Decimal::new(50, 0)),
            ..Default::default()
        };
        let err = service(
            MockCategoryRepository::new(),
            MockProductRepository::new(),
            MockPromotionRepository::new(),
        )
        .list_products(query, false)
        .await
        .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }
}
