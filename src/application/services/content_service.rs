//! Content Service
//!
//! Home page sections, banners and FAQs, plus the assembled storefront
//! home page.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use super::catalog_service::{price_products, PricedProduct};
use crate::application::dto::request::{BannerRequest, FaqRequest, SectionRequest};
use crate::domain::{
    Banner, ContentRepository, Faq, FaqRepository, HomePageSection, PageRequest, ProductFilter,
    ProductRepository, PromotionRepository, SectionType,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};

/// Featured products shown on the home page.
const HOME_FEATURED_PRODUCTS: u32 = 8;

/// Content service trait
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Storefront landing page
    async fn home_page(&self) -> Result<HomePage, ContentError>;

    async fn list_sections(&self) -> Result<Vec<HomePageSection>, ContentError>;

    async fn get_section(&self, id: i64) -> Result<HomePageSection, ContentError>;

    async fn create_section(&self, request: SectionRequest) -> Result<HomePageSection, ContentError>;

    async fn update_section(
        &self,
        id: i64,
        request: SectionRequest,
    ) -> Result<HomePageSection, ContentError>;

    async fn delete_section(&self, id: i64) -> Result<(), ContentError>;

    /// Display order follows the position in `section_ids`
    async fn reorder_sections(&self, section_ids: Vec<String>) -> Result<(), ContentError>;

    async fn list_banners(&self) -> Result<Vec<Banner>, ContentError>;

    async fn get_banner(&self, id: i64) -> Result<Banner, ContentError>;

    async fn create_banner(&self, request: BannerRequest) -> Result<Banner, ContentError>;

    async fn update_banner(&self, id: i64, request: BannerRequest) -> Result<Banner, ContentError>;

    async fn delete_banner(&self, id: i64) -> Result<(), ContentError>;

    /// Active FAQs grouped by category (public)
    async fn faq_groups(&self) -> Result<Vec<FaqGroup>, ContentError>;

    async fn list_faqs(&self) -> Result<Vec<Faq>, ContentError>;

    async fn get_faq(&self, id: i64) -> Result<Faq, ContentError>;

    async fn create_faq(&self, request: FaqRequest) -> Result<Faq, ContentError>;

    async fn update_faq(&self, id: i64, request: FaqRequest) -> Result<Faq, ContentError>;

    async fn delete_faq(&self, id: i64) -> Result<(), ContentError>;
}

#[derive(Debug, Clone)]
pub struct HomePage {
    pub sections: Vec<HomePageSection>,
    pub banners: Vec<Banner>,
    pub featured_products: Vec<PricedProduct>,
}

#[derive(Debug, Clone)]
pub struct FaqGroup {
    pub category: Option<String>,
    pub faqs: Vec<Faq>,
}

/// Content service errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Section not found")]
    SectionNotFound,

    #[error("Banner not found")]
    BannerNotFound,

    #[error("FAQ not found")]
    FaqNotFound,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::SectionNotFound
            | ContentError::BannerNotFound
            | ContentError::FaqNotFound => AppError::NotFound(err.to_string()),
            ContentError::Invalid(msg) => AppError::BadRequest(msg),
            ContentError::Repository(e) => e,
        }
    }
}

/// Group FAQs by category, keeping the order categories first appear in.
pub fn group_faqs(faqs: Vec<Faq>) -> Vec<FaqGroup> {
    let mut groups: Vec<FaqGroup> = Vec::new();
    for faq in faqs {
        match groups.iter_mut().find(|g| g.category == faq.category) {
            Some(group) => group.faqs.push(faq),
            None => groups.push(FaqGroup {
                category: faq.category.clone(),
                faqs: vec![faq],
            }),
        }
    }
    groups
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn section_type(raw: &str) -> Result<SectionType, ContentError> {
    SectionType::parse(raw).ok_or_else(|| ContentError::Invalid(format!("Unknown section type '{}'", raw)))
}

fn check_banner_window(request: &BannerRequest) -> Result<(), ContentError> {
    if let (Some(start), Some(end)) = (request.starts_at, request.ends_at) {
        if end <= start {
            return Err(ContentError::Invalid("ends_at must be after starts_at".into()));
        }
    }
    Ok(())
}

/// ContentService implementation
pub struct ContentServiceImpl<C, F, P, R>
where
    C: ContentRepository,
    F: FaqRepository,
    P: ProductRepository,
    R: PromotionRepository,
{
    content_repo: Arc<C>,
    faq_repo: Arc<F>,
    product_repo: Arc<P>,
    promotion_repo: Arc<R>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, F, P, R> ContentServiceImpl<C, F, P, R>
where
    C: ContentRepository + 'static,
    F: FaqRepository + 'static,
    P: ProductRepository + 'static,
    R: PromotionRepository + 'static,
{
    pub fn new(
        content_repo: Arc<C>,
        faq_repo: Arc<F>,
        product_repo: Arc<P>,
        promotion_repo: Arc<R>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            content_repo,
            faq_repo,
            product_repo,
            promotion_repo,
            id_generator,
        }
    }
}

#[async_trait]
impl<C, F, P, R> ContentService for ContentServiceImpl<C, F, P, R>
where
    C: ContentRepository + 'static,
    F: FaqRepository + 'static,
    P: ProductRepository + 'static,
    R: PromotionRepository + 'static,
{
    #[instrument(skip(self))]
    async fn home_page(&self) -> Result<HomePage, ContentError> {
        let now = Utc::now();
        let sections = self.content_repo.list_sections(true).await?;
        let banners = self.content_repo.visible_banners(now).await?;

        let filter = ProductFilter {
            featured: Some(true),
            ..Default::default()
        };
        let (products, _) = self
            .product_repo
            .list(&filter, PageRequest::new(Some(1), Some(HOME_FEATURED_PRODUCTS)))
            .await?;
        let featured_products = price_products(self.promotion_repo.as_ref(), products, now).await?;

        Ok(HomePage {
            sections,
            banners,
            featured_products,
        })
    }

    async fn list_sections(&self) -> Result<Vec<HomePageSection>, ContentError> {
        Ok(self.content_repo.list_sections(false).await?)
    }

    async fn get_section(&self, id: i64) -> Result<HomePageSection, ContentError> {
        self.content_repo
            .find_section(id)
            .await?
            .ok_or(ContentError::SectionNotFound)
    }

    async fn create_section(&self, request: SectionRequest) -> Result<HomePageSection, ContentError> {
        let now = Utc::now();
        let section = HomePageSection {
            id: self.id_generator.generate(),
            section_type: section_type(&request.section_type)?,
            title: clean(request.title),
            subtitle: clean(request.subtitle),
            content: request.content,
            display_order: request.display_order,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        Ok(self.content_repo.create_section(&section).await?)
    }

    async fn update_section(
        &self,
        id: i64,
        request: SectionRequest,
    ) -> Result<HomePageSection, ContentError> {
        let mut section = self.get_section(id).await?;
        section.section_type = section_type(&request.section_type)?;
        section.title = clean(request.title);
        section.subtitle = clean(request.subtitle);
        section.content = request.content;
        section.display_order = request.display_order;
        section.is_active = request.is_active;
        Ok(self.content_repo.update_section(&section).await?)
    }

    async fn delete_section(&self, id: i64) -> Result<(), ContentError> {
        self.get_section(id).await?;
        self.content_repo.delete_section(id).await?;
        Ok(())
    }

    #[instrument(skip(self, section_ids), fields(count = section_ids.len()))]
    async fn reorder_sections(&self, section_ids: Vec<String>) -> Result<(), ContentError> {
        let mut ids = Vec::with_capacity(section_ids.len());
        for raw in &section_ids {
            let id = parse_id(raw, "section")?;
            if ids.contains(&id) {
                return Err(ContentError::Invalid(format!("Section {} listed twice", id)));
            }
            ids.push(id);
        }
        self.content_repo.reorder_sections(&ids).await?;
        Ok(())
    }

    async fn list_banners(&self) -> Result<Vec<Banner>, ContentError> {
        Ok(self.content_repo.list_banners().await?)
    }

    async fn get_banner(&self, id: i64) -> Result<Banner, ContentError> {
        self.content_repo
            .find_banner(id)
            .await?
            .ok_or(ContentError::BannerNotFound)
    }

    async fn create_banner(&self, request: BannerRequest) -> Result<Banner, ContentError> {
        check_banner_window(&request)?;
        let now = Utc::now();
        let banner = Banner {
            id: self.id_generator.generate(),
            title: request.title.trim().to_string(),
            subtitle: clean(request.subtitle),
            image_url: request.image_url.trim().to_string(),
            link_url: clean(request.link_url),
            button_text: clean(request.button_text),
            display_order: request.display_order,
            is_active: request.is_active,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            created_at: now,
            updated_at: now,
        };
        Ok(self.content_repo.create_banner(&banner).await?)
    }

    async fn update_banner(&self, id: i64, request: BannerRequest) -> Result<Banner, ContentError> {
        check_banner_window(&request)?;
        let mut banner = self.get_banner(id).await?;
        banner.title = request.title.trim().to_string();
        banner.subtitle = clean(request.subtitle);
        banner.image_url = request.image_url.trim().to_string();
        banner.link_url = clean(request.link_url);
        banner.button_text = clean(request.button_text);
        banner.display_order = request.display_order;
        banner.is_active = request.is_active;
        banner.starts_at = request.starts_at;
        banner.ends_at = request.ends_at;
        Ok(self.content_repo.update_banner(&banner).await?)
    }

    async fn delete_banner(&self, id: i64) -> Result<(), ContentError> {
        self.get_banner(id).await?;
        self.content_repo.delete_banner(id).await?;
        Ok(())
    }

    async fn faq_groups(&self) -> Result<Vec<FaqGroup>, ContentError> {
        Ok(group_faqs(self.faq_repo.list(true).await?))
    }

    async fn list_faqs(&self) -> Result<Vec<Faq>, ContentError> {
        Ok(self.faq_repo.list(false).await?)
    }

    async fn get_faq(&self, id: i64) -> Result<Faq, ContentError> {
        self.faq_repo
            .find_by_id(id)
            .await?
            .ok_or(ContentError::FaqNotFound)
    }

    async fn create_faq(&self, request: FaqRequest) -> Result<Faq, ContentError> {
        let now = Utc::now();
        let faq = Faq {
            id: self.id_generator.generate(),
            question: request.question.trim().to_string(),
            answer: request.answer.trim().to_string(),
            category: clean(request.category),
            display_order: request.display_order,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        Ok(self.faq_repo.create(&faq).await?)
    }

    async fn update_faq(&self, id: i64, request: FaqRequest) -> Result<Faq, ContentError> {
        let mut faq = self.get_faq(id).await?;
        faq.question = request.question.trim().to_string();
        faq.answer = request.answer.trim().to_string();
        faq.category = clean(request.category);
        faq.display_order = request.display_order;
        faq.is_active = request.is_active;
        Ok(self.faq_repo.update(&faq).await?)
    }

    async fn delete_faq(&self, id: i64) -> Result<(), ContentError> {
        self.get_faq(id).await?;
        self.faq_repo.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockContentRepository, MockFaqRepository, MockProductRepository, MockPromotionRepository,
        Product,
    };
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    type Svc = ContentServiceImpl<
        MockContentRepository,
        MockFaqRepository,
        MockProductRepository,
        MockPromotionRepository,
    >;

    fn service(
        content: MockContentRepository,
        faqs: MockFaqRepository,
        products: MockProductRepository,
    ) -> Svc {
        let mut promotions = MockPromotionRepository::new();
        promotions
            .expect_active_for_products()
            .returning(|_, _| Ok(vec![]));
        ContentServiceImpl::new(
            Arc::new(content),
            Arc::new(faqs),
            Arc::new(products),
            Arc::new(promotions),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    fn faq(id: i64, category: Option<&str>) -> Faq {
        Faq {
            id,
            question: format!("Question {}?", id),
            answer: "Yes.".into(),
            category: category.map(Into::into),
            display_order: id as i32,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_faqs_keeps_first_seen_order() {
        let groups = group_faqs(vec![
            faq(1, Some("Delivery")),
            faq(2, Some("Payment")),
            faq(3, Some("Delivery")),
            faq(4, None),
        ]);

        let summary: Vec<(Option<&str>, Vec<i64>)> = groups
            .iter()
            .map(|g| (g.category.as_deref(), g.faqs.iter().map(|f| f.id).collect()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some("Delivery"), vec![1, 3]),
                (Some("Payment"), vec![2]),
                (None, vec![4]),
            ]
        );
    }

    #[tokio::test]
    async fn test_home_page_asks_for_featured_products() {
        let mut content = MockContentRepository::new();
        content.expect_list_sections().withf(|active| *active).returning(|_| Ok(vec![]));
        content.expect_visible_banners().returning(|_| Ok(vec![]));
        let mut products = MockProductRepository::new();
        products
            .expect_list()
            .withf(|f, page| {
                f.featured == Some(true) && !f.include_inactive && page.page_size == HOME_FEATURED_PRODUCTS
            })
            .returning(|_, _| {
                Ok((
                    vec![Product {
                        id: 1,
                        price: Decimal::new(9900, 2),
                        is_featured: true,
                        ..Default::default()
                    }],
                    1,
                ))
            });

        let home = service(content, MockFaqRepository::new(), products)
            .home_page()
            .await
            .unwrap();
        assert_eq!(home.featured_products.len(), 1);
        assert_eq!(home.featured_products[0].effective_price, Decimal::new(9900, 2));
    }

    #[tokio::test]
    async fn test_reorder_rejects_duplicates() {
        let mut content = MockContentRepository::new();
        content.expect_reorder_sections().never();

        let err = service(content, MockFaqRepository::new(), MockProductRepository::new())
            .reorder_sections(vec!["5".into(), "6".into(), "5".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_unknown_section_type_rejected() {
        let mut content = MockContentRepository::new();
        content.expect_create_section().never();

        let request = SectionRequest {
            section_type: "carousel".into(),
            title: None,
            subtitle: None,
            content: serde_json::Value::Null,
            display_order: 0,
            is_active: true,
        };
        let err = service(content, MockFaqRepository::new(), MockProductRepository::new())
            .create_section(request)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }
}
