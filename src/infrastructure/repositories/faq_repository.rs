//! FAQ Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Faq, FaqRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct FaqRow {
    id: i64,
    question: String,
    answer: String,
    category: Option<String>,
    display_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FaqRow> for Faq {
    fn from(r: FaqRow) -> Self {
        Faq {
            id: r.id,
            question: r.question,
            answer: r.answer,
            category: r.category,
            display_order: r.display_order,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const FAQ_COLUMNS: &str =
    "id, question, answer, category, display_order, is_active, created_at, updated_at";

/// PostgreSQL FAQ repository implementation.
#[derive(Clone)]
pub struct PgFaqRepository {
    pool: PgPool,
}

impl PgFaqRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FaqRepository for PgFaqRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Faq>, AppError> {
        let row = sqlx::query_as::<_, FaqRow>(&format!("SELECT {FAQ_COLUMNS} FROM faqs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Faq>, AppError> {
        let rows = sqlx::query_as::<_, FaqRow>(&format!(
            "SELECT {FAQ_COLUMNS} FROM faqs WHERE (NOT $1 OR is_active) \
             ORDER BY category NULLS LAST, display_order, id"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, faq: &Faq) -> Result<Faq, AppError> {
        let row = sqlx::query_as::<_, FaqRow>(&format!(
            r#"
            INSERT INTO faqs (id, question, answer, category, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FAQ_COLUMNS}
            "#
        ))
        .bind(faq.id)
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(&faq.category)
        .bind(faq.display_order)
        .bind(faq.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, faq: &Faq) -> Result<Faq, AppError> {
        let row = sqlx::query_as::<_, FaqRow>(&format!(
            r#"
            UPDATE faqs
            SET question = $2, answer = $3, category = $4, display_order = $5, is_active = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {FAQ_COLUMNS}
            "#
        ))
        .bind(faq.id)
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(&faq.category)
        .bind(faq.display_order)
        .bind(faq.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("FAQ with id {} not found", faq.id)))?;
        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("FAQ with id {} not found", id)));
        }
        Ok(())
    }
}
