//! Key/value store configuration editable from the admin panel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Well-known keys read by business logic.
pub mod keys {
    pub const SHIPPING_FEE: &str = "shipping_fee";
    pub const FREE_SHIPPING_THRESHOLD: &str = "free_shipping_threshold";
    pub const CURRENCY: &str = "currency";
}

/// Maps to `store_settings`, keyed by `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    /// Exposed through the public settings endpoint
    pub is_public: bool,
    pub updated_at: DateTime<Utc>,
}

impl StoreSetting {
    /// Parse the value as a money amount.
    pub fn as_decimal(&self) -> Option<Decimal> {
        self.value.trim().parse().ok()
    }
}

/// Look up `key` in a settings list and parse it as money.
pub fn decimal_setting(settings: &[StoreSetting], key: &str) -> Option<Decimal> {
    settings
        .iter()
        .find(|s| s.key == key)
        .and_then(StoreSetting::as_decimal)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreSettingRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoreSetting>, AppError>;

    /// All settings ordered by key.
    async fn list(&self, public_only: bool) -> Result<Vec<StoreSetting>, AppError>;

    async fn upsert(&self, setting: &StoreSetting) -> Result<StoreSetting, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(key: &str, value: &str) -> StoreSetting {
        StoreSetting {
            key: key.into(),
            value: value.into(),
            description: None,
            is_public: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_decimal_setting_parses() {
        let all = vec![setting(keys::SHIPPING_FEE, " 39.90 "), setting(keys::CURRENCY, "TRY")];
        assert_eq!(decimal_setting(&all, keys::SHIPPING_FEE), Some(Decimal::new(3990, 2)));
        assert_eq!(decimal_setting(&all, keys::CURRENCY), None);
        assert_eq!(decimal_setting(&all, keys::FREE_SHIPPING_THRESHOLD), None);
    }
}
