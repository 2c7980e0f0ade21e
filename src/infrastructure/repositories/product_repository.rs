//! Product Repository Implementation
//!
//! Products are loaded as aggregates: the product row plus its images,
//! variations and category ids, fetched with one query per child table.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{
    PageRequest, Product, ProductFilter, ProductImage, ProductRepository, ProductVariation,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    slug: String,
    sku: Option<String>,
    short_description: Option<String>,
    description: Option<String>,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    cost_price: Option<Decimal>,
    stock_quantity: i32,
    low_stock_threshold: i32,
    is_active: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            slug: self.slug,
            sku: self.sku,
            short_description: self.short_description,
            description: self.description,
            price: self.price,
            compare_at_price: self.compare_at_price,
            cost_price: self.cost_price,
            stock_quantity: self.stock_quantity,
            low_stock_threshold: self.low_stock_threshold,
            is_active: self.is_active,
            is_featured: self.is_featured,
            category_ids: Vec::new(),
            images: Vec::new(),
            variations: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i64,
    product_id: i64,
    url: String,
    alt_text: Option<String>,
    display_order: i32,
    is_primary: bool,
    created_at: DateTime<Utc>,
}

impl From<ImageRow> for ProductImage {
    fn from(r: ImageRow) -> Self {
        ProductImage {
            id: r.id,
            product_id: r.product_id,
            url: r.url,
            alt_text: r.alt_text,
            display_order: r.display_order,
            is_primary: r.is_primary,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariationRow {
    id: i64,
    product_id: i64,
    name: String,
    sku: Option<String>,
    price: Option<Decimal>,
    stock_quantity: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VariationRow> for ProductVariation {
    fn from(r: VariationRow) -> Self {
        ProductVariation {
            id: r.id,
            product_id: r.product_id,
            name: r.name,
            sku: r.sku,
            price: r.price,
            stock_quantity: r.stock_quantity,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.sku, p.short_description, p.description, \
     p.price, p.compare_at_price, p.cost_price, p.stock_quantity, p.low_stock_threshold, \
     p.is_active, p.is_featured, p.created_at, p.updated_at";

const IMAGE_COLUMNS: &str = "id, product_id, url, alt_text, display_order, is_primary, created_at";

const VARIATION_COLUMNS: &str =
    "id, product_id, name, sku, price, stock_quantity, is_active, created_at, updated_at";

/// Shared WHERE clause for listings; parameters $1..$7.
const LIST_FILTER: &str = r#"
    ($1 OR p.is_active)
    AND ($2::TEXT IS NULL OR p.name ILIKE '%' || $2 || '%' OR p.description ILIKE '%' || $2 || '%')
    AND ($3::BIGINT IS NULL OR EXISTS (
        SELECT 1 FROM product_categories pc WHERE pc.product_id = p.id AND pc.category_id = $3))
    AND ($4::NUMERIC IS NULL OR p.price >= $4)
    AND ($5::NUMERIC IS NULL OR p.price <= $5)
    AND ($6::BOOLEAN IS NULL OR p.is_featured = $6)
    AND ($7::BOOLEAN IS NULL OR (p.stock_quantity > 0) = $7)
"#;

/// PostgreSQL product repository implementation.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fill images, variations and category ids for the given products.
    async fn load_children(&self, products: &mut [Product]) -> Result<(), AppError> {
        if products.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();

        let images = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM product_images WHERE product_id = ANY($1) \
             ORDER BY display_order, id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let variations = sqlx::query_as::<_, VariationRow>(&format!(
            "SELECT {VARIATION_COLUMNS} FROM product_variations WHERE product_id = ANY($1) \
             ORDER BY created_at, id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT product_id, category_id FROM product_categories WHERE product_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: HashMap<i64, &mut Product> =
            products.iter_mut().map(|p| (p.id, p)).collect();
        for image in images {
            if let Some(p) = by_id.get_mut(&image.product_id) {
                p.images.push(image.into());
            }
        }
        for variation in variations {
            if let Some(p) = by_id.get_mut(&variation.product_id) {
                p.variations.push(variation.into());
            }
        }
        for (product_id, category_id) in links {
            if let Some(p) = by_id.get_mut(&product_id) {
                p.category_ids.push(category_id);
            }
        }
        Ok(())
    }

    async fn find_one(&self, column: &str, value: FindKey<'_>) -> Result<Option<Product>, AppError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.{column} = $1");
        let query = sqlx::query_as::<_, ProductRow>(&sql);
        let row = match value {
            FindKey::Id(id) => query.bind(id).fetch_optional(&self.pool).await?,
            FindKey::Slug(slug) => query.bind(slug).fetch_optional(&self.pool).await?,
        };
        let Some(row) = row else {
            return Ok(None);
        };
        let mut products = vec![row.into_product()];
        self.load_children(&mut products).await?;
        Ok(products.pop())
    }
}

enum FindKey<'a> {
    Id(i64),
    Slug(&'a str),
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, AppError> {
        self.find_one("id", FindKey::Id(id)).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, AppError> {
        self.find_one("slug", FindKey::Slug(slug)).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut products: Vec<Product> = rows.into_iter().map(ProductRow::into_product).collect();
        self.load_children(&mut products).await?;
        Ok(products)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM products p WHERE {LIST_FILTER}"
        ))
        .bind(filter.include_inactive)
        .bind(search)
        .bind(filter.category_id)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.featured)
        .bind(filter.in_stock)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE {LIST_FILTER} \
             ORDER BY {} LIMIT $8 OFFSET $9",
            filter.sort.order_by()
        ))
        .bind(filter.include_inactive)
        .bind(search)
        .bind(filter.category_id)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.featured)
        .bind(filter.in_stock)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let mut products: Vec<Product> = rows.into_iter().map(ProductRow::into_product).collect();
        self.load_children(&mut products).await?;
        Ok((products, total))
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn sku_exists(&self, sku: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(sku)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, product: &Product) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, sku, short_description, description, price,
                                  compare_at_price, cost_price, stock_quantity,
                                  low_stock_threshold, is_active, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.sku)
        .bind(&product.short_description)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.compare_at_price)
        .bind(product.cost_price)
        .bind(product.stock_quantity)
        .bind(product.low_stock_threshold)
        .bind(product.is_active)
        .bind(product.is_featured)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Product slug or SKU already exists"))?;

        for category_id in &product.category_ids {
            sqlx::query(
                "INSERT INTO product_categories (product_id, category_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(product.id)
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Category assignment conflict"))?;
        }

        tx.commit().await?;

        self.find_by_id(product.id)
            .await?
            .ok_or_else(|| AppError::Internal("Created product vanished".into()))
    }

    async fn update(&self, product: &Product) -> Result<Product, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, slug = $3, sku = $4, short_description = $5, description = $6,
                price = $7, compare_at_price = $8, cost_price = $9,
                low_stock_threshold = $10, is_active = $11, is_featured = $12,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.sku)
        .bind(&product.short_description)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.compare_at_price)
        .bind(product.cost_price)
        .bind(product.low_stock_threshold)
        .bind(product.is_active)
        .bind(product.is_featured)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Product slug or SKU already exists"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Product with id {} not found", product.id)));
        }

        self.find_by_id(product.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", product.id)))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::Conflict(
                    "Product has orders; deactivate it instead of deleting".into(),
                ),
                _ => AppError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Product with id {} not found", id)));
        }
        Ok(())
    }

    async fn set_categories(&self, product_id: i64, category_ids: &[i64]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        for category_id in category_ids {
            sqlx::query(
                "INSERT INTO product_categories (product_id, category_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(product_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Category assignment conflict"))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn add_image(&self, image: &ProductImage) -> Result<ProductImage, AppError> {
        let mut tx = self.pool.begin().await?;

        if image.is_primary {
            sqlx::query("UPDATE product_images SET is_primary = FALSE WHERE product_id = $1")
                .bind(image.product_id)
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, ImageRow>(&format!(
            r#"
            INSERT INTO product_images (id, product_id, url, alt_text, display_order, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(image.id)
        .bind(image.product_id)
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(image.display_order)
        .bind(image.is_primary)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Product already has a primary image"))?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_image(&self, product_id: i64, image_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let was_primary: Option<bool> = sqlx::query_scalar(
            "DELETE FROM product_images WHERE id = $1 AND product_id = $2 RETURNING is_primary",
        )
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        match was_primary {
            None => {
                return Err(AppError::NotFound(format!("Image with id {} not found", image_id)))
            }
            Some(true) => {
                // Next image in display order takes over
                sqlx::query(
                    r#"
                    UPDATE product_images SET is_primary = TRUE
                    WHERE id = (
                        SELECT id FROM product_images WHERE product_id = $1
                        ORDER BY display_order, id LIMIT 1
                    )
                    "#,
                )
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            }
            Some(false) => {}
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_primary_image(&self, product_id: i64, image_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE product_images SET is_primary = FALSE WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE product_images SET is_primary = TRUE WHERE id = $1 AND product_id = $2",
        )
        .bind(image_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Image with id {} not found", image_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_variation(
        &self,
        variation: &ProductVariation,
    ) -> Result<ProductVariation, AppError> {
        let row = sqlx::query_as::<_, VariationRow>(&format!(
            r#"
            INSERT INTO product_variations (id, product_id, name, sku, price, stock_quantity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VARIATION_COLUMNS}
            "#
        ))
        .bind(variation.id)
        .bind(variation.product_id)
        .bind(&variation.name)
        .bind(&variation.sku)
        .bind(variation.price)
        .bind(variation.stock_quantity)
        .bind(variation.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Variation SKU already exists"))?;

        Ok(row.into())
    }

    async fn update_variation(
        &self,
        variation: &ProductVariation,
    ) -> Result<ProductVariation, AppError> {
        // Stock is changed through inventory adjustments only.
        let row = sqlx::query_as::<_, VariationRow>(&format!(
            r#"
            UPDATE product_variations
            SET name = $3, sku = $4, price = $5, is_active = $6, updated_at = NOW()
            WHERE id = $1 AND product_id = $2
            RETURNING {VARIATION_COLUMNS}
            "#
        ))
        .bind(variation.id)
        .bind(variation.product_id)
        .bind(&variation.name)
        .bind(&variation.sku)
        .bind(variation.price)
        .bind(variation.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Variation SKU already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("Variation with id {} not found", variation.id)))?;

        Ok(row.into())
    }

    async fn delete_variation(&self, product_id: i64, variation_id: i64) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM product_variations WHERE id = $1 AND product_id = $2")
                .bind(variation_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Variation with id {} not found",
                variation_id
            )));
        }
        Ok(())
    }

    async fn low_stock(&self, limit: i64) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products p
            WHERE p.is_active AND p.stock_quantity <= p.low_stock_threshold
            ORDER BY p.stock_quantity ASC, p.name ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut products: Vec<Product> = rows.into_iter().map(ProductRow::into_product).collect();
        self.load_children(&mut products).await?;
        Ok(products)
    }
}
