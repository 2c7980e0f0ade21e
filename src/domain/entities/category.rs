//! Category entity and repository trait.
//!
//! Maps to the `categories` table. Categories form a shallow tree through
//! `parent_id` and are attached to products via `product_categories`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Maps to the `categories` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: VARCHAR(100) NOT NULL
/// - slug: VARCHAR(200) NOT NULL UNIQUE
/// - description: TEXT NULL
/// - image_url: TEXT NULL
/// - parent_id: BIGINT NULL REFERENCES categories(id) ON DELETE SET NULL
/// - display_order: INT NOT NULL DEFAULT 0
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<i64>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Category {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: String::new(),
            slug: String::new(),
            description: None,
            image_url: None,
            parent_id: None,
            display_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository trait for Category data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError>;

    /// All categories ordered by display_order, then name.
    async fn list(&self, include_inactive: bool) -> Result<Vec<Category>, AppError>;

    /// Whether `slug` is taken by a category other than `exclude_id`.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn create(&self, category: &Category) -> Result<Category, AppError>;

    async fn update(&self, category: &Category) -> Result<Category, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Number of products assigned to the category.
    async fn product_count(&self, id: i64) -> Result<i64, AppError>;
}
