//! Messages submitted through the storefront contact form.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PageRequest;
use crate::shared::error::AppError;

/// Maps to the `contact_messages` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactMessageRepository: Send + Sync {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<ContactMessage>, AppError>;

    /// Newest first.
    async fn list(
        &self,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<(Vec<ContactMessage>, i64), AppError>;

    async fn mark_read(&self, id: i64, is_read: bool) -> Result<ContactMessage, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
