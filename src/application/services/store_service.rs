//! Store Service
//!
//! Contact form messages and the key/value store settings, including the
//! cached public subset and typed reads used by checkout.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::application::dto::request::{ContactQuery, ContactRequest, StoreSettingRequest};
use crate::config::StoreSettings;
use crate::domain::{
    decimal_setting, setting_keys, ContactMessage, ContactMessageRepository, Page, PageRequest,
    StoreSetting, StoreSettingRepository,
};
use crate::infrastructure::cache::SettingsCache;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

const MAX_KEY_LENGTH: usize = 100;

/// Store service trait
#[async_trait]
pub trait StoreService: Send + Sync {
    /// Public contact form submission
    async fn submit_contact(&self, request: ContactRequest) -> Result<ContactMessage, StoreError>;

    async fn list_messages(&self, query: ContactQuery) -> Result<Page<ContactMessage>, StoreError>;

    async fn mark_read(&self, id: i64, is_read: bool) -> Result<ContactMessage, StoreError>;

    async fn delete_message(&self, id: i64) -> Result<(), StoreError>;

    /// All settings (admin)
    async fn list_settings(&self) -> Result<Vec<StoreSetting>, StoreError>;

    /// Settings flagged public, served from cache when possible
    async fn public_settings(&self) -> Result<Vec<StoreSetting>, StoreError>;

    async fn upsert_setting(
        &self,
        key: &str,
        request: StoreSettingRequest,
    ) -> Result<StoreSetting, StoreError>;

    async fn delete_setting(&self, key: &str) -> Result<(), StoreError>;

    /// Typed checkout configuration
    async fn config(&self) -> Result<StoreConfig, StoreError>;
}

/// Checkout configuration resolved from settings rows with config defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub currency: String,
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Decimal,
}

impl StoreConfig {
    pub fn resolve(settings: &[StoreSetting], defaults: &StoreSettings) -> Self {
        let currency = settings
            .iter()
            .find(|s| s.key == setting_keys::CURRENCY)
            .map(|s| s.value.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| defaults.currency.clone());

        Self {
            currency,
            shipping_fee: decimal_setting(settings, setting_keys::SHIPPING_FEE)
                .filter(|fee| !fee.is_sign_negative())
                .unwrap_or(defaults.shipping_fee),
            free_shipping_threshold: decimal_setting(settings, setting_keys::FREE_SHIPPING_THRESHOLD)
                .filter(|t| !t.is_sign_negative())
                .unwrap_or(defaults.free_shipping_threshold),
        }
    }
}

/// Store service errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Message not found")]
    MessageNotFound,

    #[error("Setting not found")]
    SettingNotFound,

    #[error("Setting keys use lowercase letters, digits and underscores")]
    InvalidKey,

    #[error("Setting '{0}' must be a non-negative amount")]
    InvalidAmount(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MessageNotFound | StoreError::SettingNotFound => {
                AppError::NotFound(err.to_string())
            }
            StoreError::InvalidKey | StoreError::InvalidAmount(_) => {
                AppError::BadRequest(err.to_string())
            }
            StoreError::Repository(e) => e,
        }
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// StoreService implementation
pub struct StoreServiceImpl<M, S>
where
    M: ContactMessageRepository,
    S: StoreSettingRepository,
{
    message_repo: Arc<M>,
    setting_repo: Arc<S>,
    cache: SettingsCache,
    id_generator: Arc<SnowflakeGenerator>,
    defaults: StoreSettings,
}

impl<M, S> StoreServiceImpl<M, S>
where
    M: ContactMessageRepository + 'static,
    S: StoreSettingRepository + 'static,
{
    pub fn new(
        message_repo: Arc<M>,
        setting_repo: Arc<S>,
        cache: SettingsCache,
        id_generator: Arc<SnowflakeGenerator>,
        defaults: StoreSettings,
    ) -> Self {
        Self {
            message_repo,
            setting_repo,
            cache,
            id_generator,
            defaults,
        }
    }
}

#[async_trait]
impl<M, S> StoreService for StoreServiceImpl<M, S>
where
    M: ContactMessageRepository + 'static,
    S: StoreSettingRepository + 'static,
{
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn submit_contact(&self, request: ContactRequest) -> Result<ContactMessage, StoreError> {
        let message = ContactMessage {
            id: self.id_generator.generate(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            phone: request
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            subject: request.subject.trim().to_string(),
            message: request.message.trim().to_string(),
            is_read: false,
            created_at: Utc::now(),
        };

        let created = self.message_repo.create(&message).await?;
        info!(message_id = created.id, "Contact message received");
        Ok(created)
    }

    async fn list_messages(&self, query: ContactQuery) -> Result<Page<ContactMessage>, StoreError> {
        let page = PageRequest::new(query.page, query.page_size);
        let (items, total) = self.message_repo.list(query.unread_only, page).await?;
        Ok(Page::new(items, page, total))
    }

    async fn mark_read(&self, id: i64, is_read: bool) -> Result<ContactMessage, StoreError> {
        if self.message_repo.find_by_id(id).await?.is_none() {
            return Err(StoreError::MessageNotFound);
        }
        Ok(self.message_repo.mark_read(id, is_read).await?)
    }

    async fn delete_message(&self, id: i64) -> Result<(), StoreError> {
        if self.message_repo.find_by_id(id).await?.is_none() {
            return Err(StoreError::MessageNotFound);
        }
        self.message_repo.delete(id).await?;
        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<StoreSetting>, StoreError> {
        Ok(self.setting_repo.list(false).await?)
    }

    async fn public_settings(&self) -> Result<Vec<StoreSetting>, StoreError> {
        if let Some(hit) = self.cache.get_public().await {
            return Ok(hit);
        }
        let settings = self.setting_repo.list(true).await?;
        self.cache.put_public(&settings).await;
        Ok(settings)
    }

    #[instrument(skip(self, request))]
    async fn upsert_setting(
        &self,
        key: &str,
        request: StoreSettingRequest,
    ) -> Result<StoreSetting, StoreError> {
        let key = key.trim();
        if !valid_key(key) {
            return Err(StoreError::InvalidKey);
        }

        let value = request.value.trim().to_string();
        let is_amount =
            key == setting_keys::SHIPPING_FEE || key == setting_keys::FREE_SHIPPING_THRESHOLD;
        if is_amount
            && value
                .parse::<Decimal>()
                .map_or(true, |v| v.is_sign_negative() && !v.is_zero())
        {
            return Err(StoreError::InvalidAmount(key.to_string()));
        }

        let setting = StoreSetting {
            key: key.to_string(),
            value,
            description: request.description,
            is_public: request.is_public,
            updated_at: Utc::now(),
        };
        let saved = self.setting_repo.upsert(&setting).await?;
        self.cache.invalidate().await;

        info!(key = %saved.key, "Store setting saved");
        Ok(saved)
    }

    async fn delete_setting(&self, key: &str) -> Result<(), StoreError> {
        if self.setting_repo.get(key).await?.is_none() {
            return Err(StoreError::SettingNotFound);
        }
        self.setting_repo.delete(key).await?;
        self.cache.invalidate().await;
        Ok(())
    }

    async fn config(&self) -> Result<StoreConfig, StoreError> {
        let settings = self.setting_repo.list(false).await?;
        Ok(StoreConfig::resolve(&settings, &self.defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_settings;
    use crate::domain::{MockContactMessageRepository, MockStoreSettingRepository};
    use mockall::predicate::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn setting(key: &str, value: &str) -> StoreSetting {
        StoreSetting {
            key: key.into(),
            value: value.into(),
            description: None,
            is_public: true,
            updated_at: Utc::now(),
        }
    }

    fn service(
        messages: MockContactMessageRepository,
        settings: MockStoreSettingRepository,
    ) -> StoreServiceImpl<MockContactMessageRepository, MockStoreSettingRepository> {
        StoreServiceImpl::new(
            Arc::new(messages),
            Arc::new(settings),
            SettingsCache::disabled(),
            Arc::new(SnowflakeGenerator::new(1, 1)),
            test_settings().store,
        )
    }

    #[test]
    fn test_config_prefers_rows_over_defaults() {
        let defaults = test_settings().store;
        let rows = vec![
            setting(setting_keys::SHIPPING_FEE, "49.90"),
            setting(setting_keys::CURRENCY, "eur"),
        ];
        let config = StoreConfig::resolve(&rows, &defaults);
        assert_eq!(config.shipping_fee, Decimal::new(4990, 2));
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.free_shipping_threshold, defaults.free_shipping_threshold);
    }

    #[test]
    fn test_config_ignores_unparseable_amounts() {
        let defaults = test_settings().store;
        let rows = vec![setting(setting_keys::SHIPPING_FEE, "free")];
        assert_eq!(
            StoreConfig::resolve(&rows, &defaults).shipping_fee,
            defaults.shipping_fee
        );
    }

    #[test_case("shipping_fee", true)]
    #[test_case("hero_title_2", true)]
    #[test_case("Shipping-Fee", false)]
    #[test_case("", false)]
    fn test_valid_key(key: &str, expected: bool) {
        assert_eq!(valid_key(key), expected);
    }

    #[tokio::test]
    async fn test_upsert_rejects_negative_fee() {
        let mut settings = MockStoreSettingRepository::new();
        settings.expect_upsert().never();

        let request = StoreSettingRequest {
            value: "-5".into(),
            description: None,
            is_public: true,
        };
        let err = service(MockContactMessageRepository::new(), settings)
            .upsert_setting(setting_keys::SHIPPING_FEE, request)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_public_settings_read_through() {
        let mut settings = MockStoreSettingRepository::new();
        settings
            .expect_list()
            .with(eq(true))
            .times(1)
            .returning(|_| Ok(vec![setting("store_name", "Lale")]));

        let result = service(MockContactMessageRepository::new(), settings)
            .public_settings()
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value, "Lale");
    }

    #[tokio::test]
    async fn test_mark_read_missing_message() {
        let mut messages = MockContactMessageRepository::new();
        messages.expect_find_by_id().returning(|_| Ok(None));
        messages.expect_mark_read().never();

        let err = service(messages, MockStoreSettingRepository::new())
            .mark_read(42, true)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_contact_email_normalized() {
        let mut messages = MockContactMessageRepository::new();
        messages
            .expect_create()
            .withf(|m| m.email == "zeynep@example.com" && !m.is_read && m.phone.is_none())
            .returning(|m| Ok(m.clone()));

        let request = ContactRequest {
            name: "Zeynep".into(),
            email: " Zeynep@Example.com ".into(),
            phone: Some("  ".into()),
            subject: "Wedding flowers".into(),
            message: "Do you deliver to Bodrum in June?".into(),
        };
        service(messages, MockStoreSettingRepository::new())
            .submit_contact(request)
            .await
            .unwrap();
    }
}
