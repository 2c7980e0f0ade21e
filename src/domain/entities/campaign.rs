//! Marketing campaigns grouping coupons and promotions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Maps to the `campaigns` table. `ends_at` is always after `starts_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Campaign>, AppError>;

    async fn list(&self) -> Result<Vec<Campaign>, AppError>;

    async fn create(&self, campaign: &Campaign) -> Result<Campaign, AppError>;

    async fn update(&self, campaign: &Campaign) -> Result<Campaign, AppError>;

    /// Coupons and promotions keep existing with `campaign_id` cleared.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
