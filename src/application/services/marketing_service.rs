//! Marketing Service
//!
//! Campaigns, coupon codes and time-boxed product promotions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::auth_service::normalize_email;
use crate::application::dto::request::{
    CampaignRequest, CouponRequest, PromotionRequest, ValidateCouponRequest,
};
use crate::domain::services::{CouponRejection, PricingService};
use crate::domain::{
    generate_code, normalize_code, Campaign, CampaignRepository, Coupon, CouponRepository,
    CouponUsage, DiscountType, ProductPromotion, ProductRepository, PromotionRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};

/// Attempts at generating an unused coupon code.
const CODE_ATTEMPTS: usize = 5;

/// Marketing service trait
#[async_trait]
pub trait MarketingService: Send + Sync {
    async fn list_campaigns(&self) -> Result<Vec<Campaign>, MarketingError>;

    async fn get_campaign(&self, id: i64) -> Result<Campaign, MarketingError>;

    async fn create_campaign(&self, request: CampaignRequest) -> Result<Campaign, MarketingError>;

    async fn update_campaign(
        &self,
        id: i64,
        request: CampaignRequest,
    ) -> Result<Campaign, MarketingError>;

    async fn delete_campaign(&self, id: i64) -> Result<(), MarketingError>;

    async fn list_coupons(&self) -> Result<Vec<Coupon>, MarketingError>;

    async fn get_coupon(&self, id: i64) -> Result<Coupon, MarketingError>;

    /// Code is generated when omitted
    async fn create_coupon(&self, request: CouponRequest) -> Result<Coupon, MarketingError>;

    async fn update_coupon(&self, id: i64, request: CouponRequest)
        -> Result<Coupon, MarketingError>;

    async fn delete_coupon(&self, id: i64) -> Result<(), MarketingError>;

    async fn coupon_usages(&self, id: i64) -> Result<Vec<CouponUsage>, MarketingError>;

    /// Check a code against a cart without redeeming it
    async fn validate_coupon(
        &self,
        request: ValidateCouponRequest,
    ) -> Result<CouponValidation, MarketingError>;

    async fn list_promotions(
        &self,
        product_id: Option<i64>,
    ) -> Result<Vec<ProductPromotion>, MarketingError>;

    async fn get_promotion(&self, id: i64) -> Result<ProductPromotion, MarketingError>;

    async fn create_promotion(
        &self,
        request: PromotionRequest,
    ) -> Result<ProductPromotion, MarketingError>;

    async fn update_promotion(
        &self,
        id: i64,
        request: PromotionRequest,
    ) -> Result<ProductPromotion, MarketingError>;

    async fn delete_promotion(&self, id: i64) -> Result<(), MarketingError>;
}

/// Outcome of a coupon check
#[derive(Debug, Clone, PartialEq)]
pub struct CouponValidation {
    pub is_valid: bool,
    pub discount_amount: Decimal,
    pub free_shipping: bool,
    pub message: String,
}

impl CouponValidation {
    fn rejected(reason: CouponRejection) -> Self {
        Self {
            is_valid: false,
            discount_amount: Decimal::ZERO,
            free_shipping: false,
            message: reason.message(),
        }
    }
}

/// Marketing service errors
#[derive(Debug, thiserror::Error)]
pub enum MarketingError {
    #[error("Campaign not found")]
    CampaignNotFound,

    #[error("Coupon not found")]
    CouponNotFound,

    #[error("Promotion not found")]
    PromotionNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Coupon code '{0}' already exists")]
    CodeTaken(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<MarketingError> for AppError {
    fn from(err: MarketingError) -> Self {
        match err {
            MarketingError::CampaignNotFound
            | MarketingError::CouponNotFound
            | MarketingError::PromotionNotFound => AppError::NotFound(err.to_string()),
            MarketingError::ProductNotFound | MarketingError::Invalid(_) => {
                AppError::BadRequest(err.to_string())
            }
            MarketingError::CodeTaken(_) => AppError::Conflict(err.to_string()),
            MarketingError::Repository(e) => e,
        }
    }
}

fn check_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), MarketingError> {
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if end <= start {
            return Err(MarketingError::Invalid("ends_at must be after starts_at".into()));
        }
    }
    Ok(())
}

/// Parse a discount type and check its value.
fn discount(
    raw_type: &str,
    value: Decimal,
    allow_free_shipping: bool,
) -> Result<(DiscountType, Decimal), MarketingError> {
    let discount_type = DiscountType::parse(raw_type)
        .ok_or_else(|| MarketingError::Invalid(format!("Unknown discount type '{}'", raw_type)))?;

    match discount_type {
        DiscountType::Percentage if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED => Err(
            MarketingError::Invalid("Percentage must be greater than 0 and at most 100".into()),
        ),
        DiscountType::FixedAmount if value <= Decimal::ZERO => Err(MarketingError::Invalid(
            "Fixed discount must be greater than zero".into(),
        )),
        DiscountType::FreeShipping if !allow_free_shipping => Err(MarketingError::Invalid(
            "Promotions cannot grant free shipping".into(),
        )),
        DiscountType::FreeShipping => Ok((discount_type, Decimal::ZERO)),
        _ => Ok((discount_type, value)),
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn optional_id(raw: Option<&str>, what: &str) -> Result<Option<i64>, AppError> {
    raw.filter(|r| !r.trim().is_empty())
        .map(|r| parse_id(r, what))
        .transpose()
}

/// MarketingService implementation
pub struct MarketingServiceImpl<K, C, R, P>
where
    K: CampaignRepository,
    C: CouponRepository,
    R: PromotionRepository,
    P: ProductRepository,
{
    campaign_repo: Arc<K>,
    coupon_repo: Arc<C>,
    promotion_repo: Arc<R>,
    product_repo: Arc<P>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<K, C, R, P> MarketingServiceImpl<K, C, R, P>
where
    K: CampaignRepository + 'static,
    C: CouponRepository + 'static,
    R: PromotionRepository + 'static,
    P: ProductRepository + 'static,
{
    pub fn new(
        campaign_repo: Arc<K>,
        coupon_repo: Arc<C>,
        promotion_repo: Arc<R>,
        product_repo: Arc<P>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            campaign_repo,
            coupon_repo,
            promotion_repo,
            product_repo,
            id_generator,
        }
    }

    async fn check_campaign(&self, campaign_id: Option<i64>) -> Result<(), MarketingError> {
        if let Some(id) = campaign_id {
            if self.campaign_repo.find_by_id(id).await?.is_none() {
                return Err(MarketingError::Invalid(format!("Campaign {} does not exist", id)));
            }
        }
        Ok(())
    }

    /// Explicit codes must be free; generated codes retry on collision.
    async fn coupon_code(
        &self,
        requested: Option<&str>,
        exclude_id: Option<i64>,
    ) -> Result<String, MarketingError> {
        if let Some(raw) = requested.filter(|c| !c.trim().is_empty()) {
            let code = normalize_code(raw);
            if self.coupon_repo.code_exists(&code, exclude_id).await? {
                return Err(MarketingError::CodeTaken(code));
            }
            return Ok(code);
        }

        for _ in 0..CODE_ATTEMPTS {
            let code = generate_code();
            if !self.coupon_repo.code_exists(&code, None).await? {
                return Ok(code);
            }
        }
        Err(AppError::Internal("Could not generate a unique coupon code".into()).into())
    }

    async fn check_product(&self, raw: &str) -> Result<i64, MarketingError> {
        let product_id = parse_id(raw, "product")?;
        if self.product_repo.find_by_id(product_id).await?.is_none() {
            return Err(MarketingError::ProductNotFound);
        }
        Ok(product_id)
    }
}

#[async_trait]
impl<K, C, R, P> MarketingService for MarketingServiceImpl<K, C, R, P>
where
    K: CampaignRepository + 'static,
    C: CouponRepository + 'static,
    R: PromotionRepository + 'static,
    P: ProductRepository + 'static,
{
    async fn list_campaigns(&self) -> Result<Vec<Campaign>, MarketingError> {
        Ok(self.campaign_repo.list().await?)
    }

    async fn get_campaign(&self, id: i64) -> Result<Campaign, MarketingError> {
        self.campaign_repo
            .find_by_id(id)
            .await?
            .ok_or(MarketingError::CampaignNotFound)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_campaign(&self, request: CampaignRequest) -> Result<Campaign, MarketingError> {
        check_window(Some(request.starts_at), Some(request.ends_at))?;
        let now = Utc::now();
        let campaign = Campaign {
            id: self.id_generator.generate(),
            name: request.name.trim().to_string(),
            description: clean(request.description),
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        Ok(self.campaign_repo.create(&campaign).await?)
    }

    async fn update_campaign(
        &self,
        id: i64,
        request: CampaignRequest,
    ) -> Result<Campaign, MarketingError> {
        check_window(Some(request.starts_at), Some(request.ends_at))?;
        let mut campaign = self.get_campaign(id).await?;
        campaign.name = request.name.trim().to_string();
        campaign.description = clean(request.description);
        campaign.starts_at = request.starts_at;
        campaign.ends_at = request.ends_at;
        campaign.is_active = request.is_active;
        Ok(self.campaign_repo.update(&campaign).await?)
    }

    async fn delete_campaign(&self, id: i64) -> Result<(), MarketingError> {
        self.get_campaign(id).await?;
        self.campaign_repo.delete(id).await?;
        Ok(())
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, MarketingError> {
        Ok(self.coupon_repo.list().await?)
    }

    async fn get_coupon(&self, id: i64) -> Result<Coupon, MarketingError> {
        self.coupon_repo
            .find_by_id(id)
            .await?
            .ok_or(MarketingError::CouponNotFound)
    }

    #[instrument(skip(self, request))]
    async fn create_coupon(&self, request: CouponRequest) -> Result<Coupon, MarketingError> {
        let (discount_type, discount_value) =
            discount(&request.discount_type, request.discount_value, true)?;
        check_window(request.starts_at, request.ends_at)?;
        let campaign_id = optional_id(request.campaign_id.as_deref(), "campaign")?;
        self.check_campaign(campaign_id).await?;
        let code = self.coupon_code(request.code.as_deref(), None).await?;

        let now = Utc::now();
        let coupon = Coupon {
            id: self.id_generator.generate(),
            code,
            description: clean(request.description),
            discount_type,
            discount_value,
            min_order_amount: request.min_order_amount,
            max_discount_amount: request.max_discount_amount,
            max_uses: request.max_uses,
            max_uses_per_customer: request.max_uses_per_customer,
            current_uses: 0,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_active: request.is_active,
            campaign_id,
            created_at: now,
            updated_at: now,
        };

        let created = self.coupon_repo.create(&coupon).await?;
        info!(coupon_id = created.id, code = %created.code, "Coupon created");
        Ok(created)
    }

    async fn update_coupon(
        &self,
        id: i64,
        request: CouponRequest,
    ) -> Result<Coupon, MarketingError> {
        let mut coupon = self.get_coupon(id).await?;
        let (discount_type, discount_value) =
            discount(&request.discount_type, request.discount_value, true)?;
        check_window(request.starts_at, request.ends_at)?;
        let campaign_id = optional_id(request.campaign_id.as_deref(), "campaign")?;
        self.check_campaign(campaign_id).await?;

        if let Some(raw) = request.code.as_deref().filter(|c| !c.trim().is_empty()) {
            if normalize_code(raw) != coupon.code {
                coupon.code = self.coupon_code(Some(raw), Some(id)).await?;
            }
        }
        if let Some(max) = request.max_uses {
            if max < coupon.current_uses {
                return Err(MarketingError::Invalid(format!(
                    "max_uses cannot be below the {} uses already recorded",
                    coupon.current_uses
                )));
            }
        }

        coupon.description = clean(request.description);
        coupon.discount_type = discount_type;
        coupon.discount_value = discount_value;
        coupon.min_order_amount = request.min_order_amount;
        coupon.max_discount_amount = request.max_discount_amount;
        coupon.max_uses = request.max_uses;
        coupon.max_uses_per_customer = request.max_uses_per_customer;
        coupon.starts_at = request.starts_at;
        coupon.ends_at = request.ends_at;
        coupon.is_active = request.is_active;
        coupon.campaign_id = campaign_id;

        Ok(self.coupon_repo.update(&coupon).await?)
    }

    async fn delete_coupon(&self, id: i64) -> Result<(), MarketingError> {
        self.get_coupon(id).await?;
        self.coupon_repo.delete(id).await?;
        Ok(())
    }

    async fn coupon_usages(&self, id: i64) -> Result<Vec<CouponUsage>, MarketingError> {
        self.get_coupon(id).await?;
        Ok(self.coupon_repo.list_usages(id).await?)
    }

    async fn validate_coupon(
        &self,
        request: ValidateCouponRequest,
    ) -> Result<CouponValidation, MarketingError> {
        let code = normalize_code(&request.code);
        let Some(coupon) = self.coupon_repo.find_by_code(&code).await? else {
            return Ok(CouponValidation::rejected(CouponRejection::NotFound));
        };

        let customer_uses = match request.email.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(email) => {
                self.coupon_repo
                    .usage_count_for_email(coupon.id, &normalize_email(email))
                    .await?
            }
            None => 0,
        };

        Ok(
            match PricingService::evaluate_coupon(&coupon, request.subtotal, customer_uses, Utc::now())
            {
                Ok(outcome) => CouponValidation {
                    is_valid: true,
                    discount_amount: outcome.discount_amount,
                    free_shipping: outcome.free_shipping,
                    message: "Coupon applied".into(),
                },
                Err(reason) => CouponValidation::rejected(reason),
            },
        )
    }

    async fn list_promotions(
        &self,
        product_id: Option<i64>,
    ) -> Result<Vec<ProductPromotion>, MarketingError> {
        Ok(self.promotion_repo.list(product_id).await?)
    }

    async fn get_promotion(&self, id: i64) -> Result<ProductPromotion, MarketingError> {
        self.promotion_repo
            .find_by_id(id)
            .await?
            .ok_or(MarketingError::PromotionNotFound)
    }

    #[instrument(skip(self, request))]
    async fn create_promotion(
        &self,
        request: PromotionRequest,
    ) -> Result<ProductPromotion, MarketingError> {
        let (discount_type, discount_value) =
            discount(&request.discount_type, request.discount_value, false)?;
        check_window(Some(request.starts_at), Some(request.ends_at))?;
        let product_id = self.check_product(&request.product_id).await?;
        let campaign_id = optional_id(request.campaign_id.as_deref(), "campaign")?;
        self.check_campaign(campaign_id).await?;

        let now = Utc::now();
        let promotion = ProductPromotion {
            id: self.id_generator.generate(),
            product_id,
            campaign_id,
            name: clean(request.name),
            discount_type,
            discount_value,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        Ok(self.promotion_repo.create(&promotion).await?)
    }

    async fn update_promotion(
        &self,
        id: i64,
        request: PromotionRequest,
    ) -> Result<ProductPromotion, MarketingError> {
        let mut promotion = self.get_promotion(id).await?;
        let (discount_type, discount_value) =
            discount(&request.discount_type, request.discount_value, false)?;
        check_window(Some(request.starts_at), Some(request.ends_at))?;
        let product_id = self.check_product(&request.product_id).await?;
        let campaign_id = optional_id(request.campaign_id.as_deref(), "campaign")?;
        self.check_campaign(campaign_id).await?;

        promotion.product_id = product_id;
        promotion.campaign_id = campaign_id;
        promotion.name = clean(request.name);
        promotion.discount_type = discount_type;
        promotion.discount_value = discount_value;
        promotion.starts_at = request.starts_at;
        promotion.ends_at = request.ends_at;
        promotion.is_active = request.is_active;

        Ok(self.promotion_repo.update(&promotion).await?)
    }

    async fn delete_promotion(&self, id: i64) -> Result<(), MarketingError> {
        self.get_promotion(id).await?;
        self.promotion_repo.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockCampaignRepository, MockCouponRepository, MockProductRepository,
        MockPromotionRepository,
    };
    use chrono::Duration;
    use mockall::predicate::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    type Svc = MarketingServiceImpl<
        MockCampaignRepository,
        MockCouponRepository,
        MockPromotionRepository,
        MockProductRepository,
    >;

    fn service(coupons: MockCouponRepository) -> Svc {
        MarketingServiceImpl::new(
            Arc::new(MockCampaignRepository::new()),
            Arc::new(coupons),
            Arc::new(MockPromotionRepository::new()),
            Arc::new(MockProductRepository::new()),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn coupon() -> Coupon {
        Coupon {
            id: 3,
            code: "MOTHERSDAY".into(),
            discount_type: DiscountType::Percentage,
            discount_value: dec("20"),
            max_discount_amount: Some(dec("50")),
            ..Default::default()
        }
    }

    fn validate_request(subtotal: &str, email: Option<&str>) -> ValidateCouponRequest {
        ValidateCouponRequest {
            code: "mothersday".into(),
            subtotal: dec(subtotal),
            email: email.map(Into::into),
        }
    }

    fn coupon_request(code: Option<&str>, discount_type: &str, value: &str) -> CouponRequest {
        serde_json::from_value(serde_json::json!({
            "code": code,
            "discount_type": discount_type,
            "discount_value": value,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_validation_applies_cap() {
        let mut coupons = MockCouponRepository::new();
        coupons
            .expect_find_by_code()
            .with(eq("MOTHERSDAY"))
            .returning(|_| Ok(Some(coupon())));

        let result = service(coupons)
            .validate_coupon(validate_request("400", None))
            .await
            .unwrap();
        assert!(result.is_valid);
        assert_eq!(result.discount_amount, dec("50"));
        assert!(!result.free_shipping);
    }

    #[tokio::test]
    async fn test_validation_fails_once_usage_limit_reached() {
        let mut coupons = MockCouponRepository::new();
        coupons.expect_find_by_code().returning(|_| {
            Ok(Some(Coupon {
                max_uses: Some(10),
                current_uses: 10,
                ..coupon()
            }))
        });

        let result = service(coupons)
            .validate_coupon(validate_request("100", None))
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.discount_amount, Decimal::ZERO);
        assert_eq!(result.message, "Coupon usage limit reached");
    }

    #[tokio::test]
    async fn test_validation_counts_customer_uses() {
        let mut coupons = MockCouponRepository::new();
        coupons.expect_find_by_code().returning(|_| {
            Ok(Some(Coupon {
                max_uses_per_customer: Some(1),
                ..coupon()
            }))
        });
        coupons
            .expect_usage_count_for_email()
            .with(eq(3), eq("deniz@example.com"))
            .returning(|_, _| Ok(1));

        let result = service(coupons)
            .validate_coupon(validate_request("100", Some(" Deniz@Example.com")))
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, CouponRejection::CustomerLimitReached.message());
    }

    #[tokio::test]
    async fn test_validation_unknown_code() {
        let mut coupons = MockCouponRepository::new();
        coupons.expect_find_by_code().returning(|_| Ok(None));

        let result = service(coupons)
            .validate_coupon(validate_request("100", None))
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Coupon not found");
    }

    #[tokio::test]
    async fn test_validation_expired() {
        let mut coupons = MockCouponRepository::new();
        coupons.expect_find_by_code().returning(|_| {
            Ok(Some(Coupon {
                ends_at: Some(Utc::now() - Duration::days(1)),
                ..coupon()
            }))
        });

        let result = service(coupons)
            .validate_coupon(validate_request("100", None))
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Coupon has expired");
    }

    #[test_case("percentage", "0", false)]
    #[test_case("percentage", "100", true)]
    #[test_case("percentage", "100.01", false)]
    #[test_case("fixed_amount", "25", true)]
    #[test_case("fixed_amount", "0", false)]
    #[test_case("free_shipping", "0", true)]
    #[test_case("bogo", "10", false)]
    fn test_coupon_discount_rules(discount_type: &str, value: &str, ok: bool) {
        assert_eq!(discount(discount_type, dec(value), true).is_ok(), ok);
    }

    #[test]
    fn test_promotions_cannot_waive_shipping() {
        assert!(discount("free_shipping", Decimal::ZERO, false).is_err());
    }

    #[tokio::test]
    async fn test_create_coupon_generates_code() {
        let mut coupons = MockCouponRepository::new();
        coupons.expect_code_exists().returning(|_, _| Ok(false));
        coupons
            .expect_create()
            .withf(|c| c.code.len() == 8 && c.code == c.code.to_uppercase() && c.current_uses == 0)
            .returning(|c| Ok(c.clone()));

        service(coupons)
            .create_coupon(coupon_request(None, "fixed_amount", "30"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let mut coupons = MockCouponRepository::new();
        coupons
            .expect_code_exists()
            .with(eq("SPRING"), eq(None))
            .returning(|_, _| Ok(true));
        coupons.expect_create().never();

        let err = service(coupons)
            .create_coupon(coupon_request(Some("spring"), "percentage", "10"))
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_campaign_window_checked() {
        let now = Utc::now();
        let err = service(MockCouponRepository::new())
            .create_campaign(CampaignRequest {
                name: "Valentine's".into(),
                description: None,
                starts_at: now,
                ends_at: now,
                is_active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MarketingError::Invalid(_)));
    }
}
