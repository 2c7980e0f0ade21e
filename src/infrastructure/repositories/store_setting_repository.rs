//! Store Setting Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{StoreSetting, StoreSettingRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: String,
    description: Option<String>,
    is_public: bool,
    updated_at: DateTime<Utc>,
}

impl From<SettingRow> for StoreSetting {
    fn from(r: SettingRow) -> Self {
        StoreSetting {
            key: r.key,
            value: r.value,
            description: r.description,
            is_public: r.is_public,
            updated_at: r.updated_at,
        }
    }
}

/// PostgreSQL store setting repository implementation.
#[derive(Clone)]
pub struct PgStoreSettingRepository {
    pool: PgPool,
}

impl PgStoreSettingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreSettingRepository for PgStoreSettingRepository {
    async fn get(&self, key: &str) -> Result<Option<StoreSetting>, AppError> {
        let row = sqlx::query_as::<_, SettingRow>(
            "SELECT key, value, description, is_public, updated_at FROM store_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, public_only: bool) -> Result<Vec<StoreSetting>, AppError> {
        let rows = sqlx::query_as::<_, SettingRow>(
            "SELECT key, value, description, is_public, updated_at FROM store_settings \
             WHERE (NOT $1 OR is_public) ORDER BY key",
        )
        .bind(public_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert(&self, setting: &StoreSetting) -> Result<StoreSetting, AppError> {
        let row = sqlx::query_as::<_, SettingRow>(
            r#"
            INSERT INTO store_settings (key, value, description, is_public)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                description = COALESCE(EXCLUDED.description, store_settings.description),
                is_public = EXCLUDED.is_public,
                updated_at = NOW()
            RETURNING key, value, description, is_public, updated_at
            "#,
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(&setting.description)
        .bind(setting.is_public)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM store_settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Setting '{}' not found", key)));
        }
        Ok(())
    }
}
