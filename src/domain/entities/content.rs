//! Storefront content: home page sections and banners.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// What a home page section renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Hero,
    FeaturedProducts,
    Categories,
    #[default]
    Text,
    Testimonials,
    Newsletter,
}

impl SectionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hero" => Some(Self::Hero),
            "featured_products" => Some(Self::FeaturedProducts),
            "categories" => Some(Self::Categories),
            "text" => Some(Self::Text),
            "testimonials" => Some(Self::Testimonials),
            "newsletter" => Some(Self::Newsletter),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::FeaturedProducts => "featured_products",
            Self::Categories => "categories",
            Self::Text => "text",
            Self::Testimonials => "testimonials",
            Self::Newsletter => "newsletter",
        }
    }
}

/// Maps to `home_page_sections`; `content` is free-form JSONB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomePageSection {
    pub id: i64,
    pub section_type: SectionType,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: serde_json::Value,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Maps to `banners`. A missing bound leaves that side of the window open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub button_text: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.is_none_or(|s| s <= now)
            && self.ends_at.is_none_or(|e| now <= e)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_section(&self, id: i64) -> Result<Option<HomePageSection>, AppError>;

    /// Ordered by display_order.
    async fn list_sections(&self, active_only: bool) -> Result<Vec<HomePageSection>, AppError>;

    async fn create_section(&self, section: &HomePageSection) -> Result<HomePageSection, AppError>;

    async fn update_section(&self, section: &HomePageSection) -> Result<HomePageSection, AppError>;

    async fn delete_section(&self, id: i64) -> Result<(), AppError>;

    /// Rewrite display_order to follow `ordered_ids`, in one transaction.
    async fn reorder_sections(&self, ordered_ids: &[i64]) -> Result<(), AppError>;

    async fn find_banner(&self, id: i64) -> Result<Option<Banner>, AppError>;

    async fn list_banners(&self) -> Result<Vec<Banner>, AppError>;

    /// Active banners whose window contains `now`.
    async fn visible_banners(&self, now: DateTime<Utc>) -> Result<Vec<Banner>, AppError>;

    async fn create_banner(&self, banner: &Banner) -> Result<Banner, AppError>;

    async fn update_banner(&self, banner: &Banner) -> Result<Banner, AppError>;

    async fn delete_banner(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn banner(starts_at: Option<DateTime<Utc>>, ends_at: Option<DateTime<Utc>>) -> Banner {
        let now = Utc::now();
        Banner {
            id: 1,
            title: "Spring".into(),
            subtitle: None,
            image_url: "https://cdn.example.com/spring.jpg".into(),
            link_url: None,
            button_text: None,
            display_order: 0,
            is_active: true,
            starts_at,
            ends_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_open_window_always_visible() {
        assert!(banner(None, None).is_visible_at(Utc::now()));
    }

    #[test]
    fn test_window_bounds() {
        let now = Utc::now();
        let b = banner(Some(now - Duration::hours(1)), Some(now + Duration::hours(1)));
        assert!(b.is_visible_at(now));
        assert!(!b.is_visible_at(now + Duration::hours(2)));
        assert!(!b.is_visible_at(now - Duration::hours(2)));
    }

    #[test]
    fn test_inactive_hidden() {
        let mut b = banner(None, None);
        b.is_active = false;
        assert!(!b.is_visible_at(Utc::now()));
    }

    #[test]
    fn test_section_type_roundtrip() {
        assert_eq!(SectionType::from_str("featured_products"), SectionType::FeaturedProducts);
        assert_eq!(SectionType::parse("carousel"), None);
    }
}
