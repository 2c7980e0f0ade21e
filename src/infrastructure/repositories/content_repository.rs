//! Content Repository Implementation
//!
//! Home page sections and banners.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Banner, ContentRepository, HomePageSection, SectionType};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct SectionRow {
    id: i64,
    section_type: String,
    title: Option<String>,
    subtitle: Option<String>,
    content: serde_json::Value,
    display_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SectionRow> for HomePageSection {
    fn from(r: SectionRow) -> Self {
        HomePageSection {
            id: r.id,
            section_type: SectionType::from_str(&r.section_type),
            title: r.title,
            subtitle: r.subtitle,
            content: r.content,
            display_order: r.display_order,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: i64,
    title: String,
    subtitle: Option<String>,
    image_url: String,
    link_url: Option<String>,
    button_text: Option<String>,
    display_order: i32,
    is_active: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BannerRow> for Banner {
    fn from(r: BannerRow) -> Self {
        Banner {
            id: r.id,
            title: r.title,
            subtitle: r.subtitle,
            image_url: r.image_url,
            link_url: r.link_url,
            button_text: r.button_text,
            display_order: r.display_order,
            is_active: r.is_active,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SECTION_COLUMNS: &str = "id, section_type, title, subtitle, content, display_order, \
     is_active, created_at, updated_at";

const BANNER_COLUMNS: &str = "id, title, subtitle, image_url, link_url, button_text, \
     display_order, is_active, starts_at, ends_at, created_at, updated_at";

/// PostgreSQL content repository implementation.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn find_section(&self, id: i64) -> Result<Option<HomePageSection>, AppError> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {SECTION_COLUMNS} FROM home_page_sections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_sections(&self, active_only: bool) -> Result<Vec<HomePageSection>, AppError> {
        let rows = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {SECTION_COLUMNS} FROM home_page_sections \
             WHERE (NOT $1 OR is_active) ORDER BY display_order, id"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_section(&self, section: &HomePageSection) -> Result<HomePageSection, AppError> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            r#"
            INSERT INTO home_page_sections (id, section_type, title, subtitle, content,
                                            display_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SECTION_COLUMNS}
            "#
        ))
        .bind(section.id)
        .bind(section.section_type.as_str())
        .bind(&section.title)
        .bind(&section.subtitle)
        .bind(&section.content)
        .bind(section.display_order)
        .bind(section.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_section(&self, section: &HomePageSection) -> Result<HomePageSection, AppError> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            r#"
            UPDATE home_page_sections
            SET section_type = $2, title = $3, subtitle = $4, content = $5,
                display_order = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {SECTION_COLUMNS}
            "#
        ))
        .bind(section.id)
        .bind(section.section_type.as_str())
        .bind(&section.title)
        .bind(&section.subtitle)
        .bind(&section.content)
        .bind(section.display_order)
        .bind(section.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Section with id {} not found", section.id)))?;
        Ok(row.into())
    }

    async fn delete_section(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM home_page_sections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Section with id {} not found", id)));
        }
        Ok(())
    }

    async fn reorder_sections(&self, ordered_ids: &[i64]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for (position, id) in ordered_ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE home_page_sections SET display_order = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Section with id {} not found", id)));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_banner(&self, id: i64) -> Result<Option<Banner>, AppError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM banners WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_banners(&self) -> Result<Vec<Banner>, AppError> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM banners ORDER BY display_order, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn visible_banners(&self, now: DateTime<Utc>) -> Result<Vec<Banner>, AppError> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!(
            r#"
            SELECT {BANNER_COLUMNS} FROM banners
            WHERE is_active
              AND (starts_at IS NULL OR starts_at <= $1)
              AND (ends_at IS NULL OR ends_at >= $1)
            ORDER BY display_order, id
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_banner(&self, banner: &Banner) -> Result<Banner, AppError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            r#"
            INSERT INTO banners (id, title, subtitle, image_url, link_url, button_text,
                                 display_order, is_active, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {BANNER_COLUMNS}
            "#
        ))
        .bind(banner.id)
        .bind(&banner.title)
        .bind(&banner.subtitle)
        .bind(&banner.image_url)
        .bind(&banner.link_url)
        .bind(&banner.button_text)
        .bind(banner.display_order)
        .bind(banner.is_active)
        .bind(banner.starts_at)
        .bind(banner.ends_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_banner(&self, banner: &Banner) -> Result<Banner, AppError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            r#"
            UPDATE banners
            SET title = $2, subtitle = $3, image_url = $4, link_url = $5, button_text = $6,
                display_order = $7, is_active = $8, starts_at = $9, ends_at = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BANNER_COLUMNS}
            "#
        ))
        .bind(banner.id)
        .bind(&banner.title)
        .bind(&banner.subtitle)
        .bind(&banner.image_url)
        .bind(&banner.link_url)
        .bind(&banner.button_text)
        .bind(banner.display_order)
        .bind(banner.is_active)
        .bind(banner.starts_at)
        .bind(banner.ends_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Banner with id {} not found", banner.id)))?;
        Ok(row.into())
    }

    async fn delete_banner(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Banner with id {} not found", id)));
        }
        Ok(())
    }
}
