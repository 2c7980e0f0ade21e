//! Order Service
//!
//! Checkout, order tracking and the back-office order workflow.
//!
//! Placement prices every line from the database (never from the client),
//! applies promotions, the coupon and shipping rules, then hands one
//! `OrderPlacement` to the repository which writes it in a single
//! transaction. Stock and coupon checks here only produce friendly errors;
//! the guarded updates inside that transaction are the real gate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::auth_service::normalize_email;
use super::store_service::StoreConfig;
use crate::application::dto::request::{OrderItemRequest, OrderQuery, PageQuery, PlaceOrderRequest};
use crate::config::StoreSettings;
use crate::domain::services::{CouponRejection, PricingService};
use crate::domain::{
    generate_order_number, normalize_code, CouponRepository, CouponUsage, MovementType, Order,
    OrderFilter, OrderItem, OrderPlacement, OrderRepository, OrderStatus, Page, PageRequest,
    PaymentMethod, PaymentStatus, Product, ProductRepository, PromotionRepository, StockMovement,
    StoreSettingRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};

/// Order service trait
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Place an order; `user_id` is set when the shopper is logged in
    async fn place_order(
        &self,
        request: PlaceOrderRequest,
        user_id: Option<i64>,
    ) -> Result<Order, OrderError>;

    /// Public lookup; the email must match the order
    async fn track_order(&self, order_number: &str, email: &str) -> Result<Order, OrderError>;

    async fn my_orders(&self, user_id: i64, query: PageQuery) -> Result<Page<Order>, OrderError>;

    async fn list_orders(&self, query: OrderQuery) -> Result<Page<Order>, OrderError>;

    async fn get_order(&self, id: i64) -> Result<Order, OrderError>;

    /// Move along the status machine; cancelling restocks the items
    async fn update_status(&self, id: i64, status: &str) -> Result<Order, OrderError>;

    async fn update_payment_status(&self, id: i64, status: &str) -> Result<Order, OrderError>;

    /// Back-office note, `None` clears it
    async fn update_note(&self, id: i64, note: Option<String>) -> Result<Order, OrderError>;
}

/// Order service errors
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found")]
    OrderNotFound,

    #[error("{0}")]
    InvalidItem(String),

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("{}", .0.message())]
    Coupon(CouponRejection),

    #[error("Delivery date cannot be in the past")]
    DeliveryDateInPast,

    #[error("Unknown {0}")]
    UnknownValue(&'static str),

    #[error("Order is already {0}")]
    OrderClosed(OrderStatus),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound => AppError::NotFound(err.to_string()),
            OrderError::InsufficientStock(_) => AppError::Conflict(err.to_string()),
            OrderError::InvalidItem(_)
            | OrderError::Coupon(_)
            | OrderError::DeliveryDateInPast
            | OrderError::UnknownValue(_)
            | OrderError::OrderClosed(_)
            | OrderError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
            OrderError::Repository(e) => e,
        }
    }
}

/// Midnight UTC at the start of `date`.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Exclusive upper bound for an inclusive end date.
pub(crate) fn day_end_exclusive(date: NaiveDate) -> DateTime<Utc> {
    day_start(date.succ_opt().unwrap_or(date))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A requested line after ids are parsed.
struct ParsedLine {
    product_id: i64,
    variation_id: Option<i64>,
    quantity: i32,
}

fn parse_lines(items: &[OrderItemRequest]) -> Result<Vec<ParsedLine>, OrderError> {
    items
        .iter()
        .map(|item| {
            Ok(ParsedLine {
                product_id: parse_id(&item.product_id, "product")?,
                variation_id: item
                    .variation_id
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| parse_id(v, "variation"))
                    .transpose()?,
                quantity: item.quantity,
            })
        })
        .collect()
}

/// OrderService implementation
pub struct OrderServiceImpl<O, P, C, R, S>
where
    O: OrderRepository,
    P: ProductRepository,
    C: CouponRepository,
    R: PromotionRepository,
    S: StoreSettingRepository,
{
    order_repo: Arc<O>,
    product_repo: Arc<P>,
    coupon_repo: Arc<C>,
    promotion_repo: Arc<R>,
    setting_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
    store_defaults: StoreSettings,
}

impl<O, P, C, R, S> OrderServiceImpl<O, P, C, R, S>
where
    O: OrderRepository + 'static,
    P: ProductRepository + 'static,
    C: CouponRepository + 'static,
    R: PromotionRepository + 'static,
    S: StoreSettingRepository + 'static,
{
    pub fn new(
        order_repo: Arc<O>,
        product_repo: Arc<P>,
        coupon_repo: Arc<C>,
        promotion_repo: Arc<R>,
        setting_repo: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
        store_defaults: StoreSettings,
    ) -> Self {
        Self {
            order_repo,
            product_repo,
            coupon_repo,
            promotion_repo,
            setting_repo,
            id_generator,
            store_defaults,
        }
    }

    async fn load_order(&self, id: i64) -> Result<Order, OrderError> {
        self.order_repo
            .find_by_id(id)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// Price each line and check it can be fulfilled.
    async fn build_items(
        &self,
        order_id: i64,
        lines: &[ParsedLine],
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderItem>, OrderError> {
        let ids: Vec<i64> = lines
            .iter()
            .map(|l| l.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let products: HashMap<i64, Product> = self
            .product_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let promotions = self.promotion_repo.active_for_products(&ids, now).await?;

        let mut requested: HashMap<(i64, Option<i64>), i32> = HashMap::new();
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let product = products
                .get(&line.product_id)
                .filter(|p| p.is_active)
                .ok_or_else(|| {
                    OrderError::InvalidItem(format!(
                        "Product {} is not available",
                        line.product_id
                    ))
                })?;

            let (base_price, variation_name, available) = match line.variation_id {
                Some(variation_id) => {
                    let variation = product
                        .variation(variation_id)
                        .filter(|v| v.is_active)
                        .ok_or_else(|| {
                            OrderError::InvalidItem(format!(
                                "Variation {} of {} is not available",
                                variation_id, product.name
                            ))
                        })?;
                    (
                        variation.price.unwrap_or(product.price),
                        Some(variation.name.clone()),
                        variation.stock_quantity,
                    )
                }
                None => (product.price, None, product.stock_quantity),
            };

            let wanted = requested
                .entry((line.product_id, line.variation_id))
                .or_insert(0);
            *wanted += line.quantity;
            if *wanted > available {
                return Err(OrderError::InsufficientStock(product.name.clone()));
            }

            let unit_price =
                PricingService::effective_price(product.id, base_price, &promotions, now);
            items.push(OrderItem {
                id: self.id_generator.generate(),
                order_id,
                product_id: product.id,
                variation_id: line.variation_id,
                product_name: product.name.clone(),
                variation_name,
                unit_price,
                quantity: line.quantity,
                line_total: unit_price * Decimal::from(line.quantity),
            });
        }

        Ok(items)
    }
}

#[async_trait]
impl<O, P, C, R, S> OrderService for OrderServiceImpl<O, P, C, R, S>
where
    O: OrderRepository + 'static,
    P: ProductRepository + 'static,
    C: CouponRepository + 'static,
    R: PromotionRepository + 'static,
    S: StoreSettingRepository + 'static,
{
    #[instrument(skip(self, request), fields(items = request.items.len(), user_id = ?user_id))]
    async fn place_order(
        &self,
        request: PlaceOrderRequest,
        user_id: Option<i64>,
    ) -> Result<Order, OrderError> {
        let now = Utc::now();

        if request
            .delivery_date
            .is_some_and(|d| d < now.date_naive())
        {
            return Err(OrderError::DeliveryDateInPast);
        }
        let payment_method = match request.payment_method.as_deref() {
            Some(raw) => PaymentMethod::parse(raw).ok_or(OrderError::UnknownValue("payment method"))?,
            None => PaymentMethod::default(),
        };
        let customer_email = normalize_email(&request.customer_email);

        let order_id = self.id_generator.generate();
        let lines = parse_lines(&request.items)?;
        let items = self.build_items(order_id, &lines, now).await?;
        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();

        // Coupon
        let mut coupon_usage = None;
        let mut coupon_code = None;
        let mut discount = Decimal::ZERO;
        let mut free_shipping = false;
        if let Some(raw) = request.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
            let code = normalize_code(raw);
            let coupon = self
                .coupon_repo
                .find_by_code(&code)
                .await?
                .ok_or(OrderError::Coupon(CouponRejection::NotFound))?;
            let used = self
                .coupon_repo
                .usage_count_for_email(coupon.id, &customer_email)
                .await?;
            let outcome = PricingService::evaluate_coupon(&coupon, subtotal, used, now)
                .map_err(OrderError::Coupon)?;

            discount = outcome.discount_amount;
            free_shipping = outcome.free_shipping;
            coupon_usage = Some(CouponUsage {
                id: self.id_generator.generate(),
                coupon_id: coupon.id,
                order_id,
                customer_email: customer_email.clone(),
                discount_amount: outcome.discount_amount,
                used_at: now,
            });
            coupon_code = Some(coupon.code);
        }

        let config = StoreConfig::resolve(&self.setting_repo.list(false).await?, &self.store_defaults);
        let shipping_fee = PricingService::shipping_fee(
            subtotal,
            config.shipping_fee,
            config.free_shipping_threshold,
            free_shipping,
        );
        let totals = PricingService::totals(subtotal, discount, shipping_fee);

        let order_number = generate_order_number(now);
        let stock_movements = items
            .iter()
            .map(|item| {
                let mut movement = StockMovement::new(
                    self.id_generator.generate(),
                    item.product_id,
                    item.variation_id,
                    MovementType::Out,
                    -item.quantity,
                );
                movement.reason = Some("Order placed".into());
                movement.reference = Some(order_number.clone());
                movement.created_by = user_id;
                movement
            })
            .collect();

        let order = Order {
            id: order_id,
            order_number,
            user_id,
            customer_id: None,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method,
            customer_name: request.customer_name.trim().to_string(),
            customer_email,
            customer_phone: request.customer_phone.trim().to_string(),
            recipient_name: request.recipient_name.trim().to_string(),
            recipient_phone: trimmed(request.recipient_phone),
            shipping_address: request.shipping_address.trim().to_string(),
            shipping_city: request.shipping_city.trim().to_string(),
            shipping_district: trimmed(request.shipping_district),
            shipping_postal_code: trimmed(request.shipping_postal_code),
            delivery_date: request.delivery_date,
            delivery_time_slot: trimmed(request.delivery_time_slot),
            gift_message: trimmed(request.gift_message),
            notes: trimmed(request.notes),
            admin_note: None,
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            shipping_fee: totals.shipping_fee,
            total: totals.total,
            coupon_code,
            items,
            created_at: now,
            updated_at: now,
        };

        let placement = OrderPlacement {
            order,
            stock_movements,
            coupon_usage,
            new_customer_id: self.id_generator.generate(),
        };

        let placed = self.order_repo.place(&placement).await.map_err(|e| {
            if let AppError::Conflict(ref msg) = e {
                warn!(reason = %msg, "Order placement lost a stock or coupon race");
            }
            OrderError::Repository(e)
        })?;

        info!(
            order_id = placed.id,
            order_number = %placed.order_number,
            total = %placed.total,
            "Order placed"
        );
        Ok(placed)
    }

    async fn track_order(&self, order_number: &str, email: &str) -> Result<Order, OrderError> {
        let order = self
            .order_repo
            .find_by_number(order_number.trim())
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        // Same response for a wrong email so order numbers cannot be probed.
        if order.customer_email != normalize_email(email) {
            return Err(OrderError::OrderNotFound);
        }
        Ok(order)
    }

    async fn my_orders(&self, user_id: i64, query: PageQuery) -> Result<Page<Order>, OrderError> {
        let page = PageRequest::new(query.page, query.page_size);
        let filter = OrderFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        let (orders, total) = self.order_repo.list(&filter, page).await?;
        Ok(Page::new(orders, page, total))
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Page<Order>, OrderError> {
        let status = query
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| OrderStatus::parse(s).ok_or(OrderError::UnknownValue("order status")))
            .transpose()?;
        let payment_status = query
            .payment_status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| PaymentStatus::parse(s).ok_or(OrderError::UnknownValue("payment status")))
            .transpose()?;

        let filter = OrderFilter {
            status,
            payment_status,
            search: trimmed(query.search),
            from: query.from.map(day_start),
            to: query.to.map(day_end_exclusive),
            user_id: None,
            customer_id: None,
        };
        let page = PageRequest::new(query.page, query.page_size);
        let (orders, total) = self.order_repo.list(&filter, page).await?;
        Ok(Page::new(orders, page, total))
    }

    async fn get_order(&self, id: i64) -> Result<Order, OrderError> {
        self.load_order(id).await
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: i64, status: &str) -> Result<Order, OrderError> {
        let next = OrderStatus::parse(status).ok_or(OrderError::UnknownValue("order status"))?;
        let order = self.load_order(id).await?;

        if order.status.is_terminal() {
            return Err(OrderError::OrderClosed(order.status));
        }
        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        let updated = if next == OrderStatus::Cancelled {
            let restock: Vec<StockMovement> = order
                .items
                .iter()
                .filter(|item| {
                    // The variation was deleted after the sale; its stock row is gone
                    let orphaned = item.variation_name.is_some() && item.variation_id.is_none();
                    if orphaned {
                        warn!(
                            order_id = id,
                            item_id = item.id,
                            "Skipping restock for deleted variation"
                        );
                    }
                    !orphaned
                })
                .map(|item| {
                    let mut movement = StockMovement::new(
                        self.id_generator.generate(),
                        item.product_id,
                        item.variation_id,
                        MovementType::In,
                        item.quantity,
                    );
                    movement.reason = Some("Order cancelled".into());
                    movement.reference = Some(order.order_number.clone());
                    movement
                })
                .collect();
            self.order_repo.cancel(id, order.status, &restock).await?
        } else {
            self.order_repo.update_status(id, order.status, next).await?
        };

        info!(order_id = id, from = %order.status, to = %next, "Order status changed");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn update_payment_status(&self, id: i64, status: &str) -> Result<Order, OrderError> {
        let next = PaymentStatus::parse(status).ok_or(OrderError::UnknownValue("payment status"))?;
        self.load_order(id).await?;
        Ok(self.order_repo.update_payment_status(id, next).await?)
    }

    async fn update_note(&self, id: i64, note: Option<String>) -> Result<Order, OrderError> {
        self.load_order(id).await?;
        Ok(self.order_repo.update_admin_note(id, trimmed(note)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_settings;
    use crate::domain::{
        Coupon, DiscountType, MockCouponRepository, MockOrderRepository, MockProductRepository,
        MockPromotionRepository, MockStoreSettingRepository, ProductPromotion, ProductVariation,
    };
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    type Svc = OrderServiceImpl<
        MockOrderRepository,
        MockProductRepository,
        MockCouponRepository,
        MockPromotionRepository,
        MockStoreSettingRepository,
    >;

    struct Mocks {
        orders: MockOrderRepository,
        products: MockProductRepository,
        coupons: MockCouponRepository,
        promotions: MockPromotionRepository,
        settings: MockStoreSettingRepository,
    }

    impl Mocks {
        fn new() -> Self {
            let mut promotions = MockPromotionRepository::new();
            promotions
                .expect_active_for_products()
                .returning(|_, _| Ok(vec![]));
            let mut settings = MockStoreSettingRepository::new();
            settings.expect_list().returning(|_| Ok(vec![]));
            Self {
                orders: MockOrderRepository::new(),
                products: MockProductRepository::new(),
                coupons: MockCouponRepository::new(),
                promotions,
                settings,
            }
        }

        fn with_products(mut self, products: Vec<Product>) -> Self {
            self.products
                .expect_find_by_ids()
                .returning(move |_| Ok(products.clone()));
            self
        }

        fn echo_place(mut self) -> Self {
            self.orders
                .expect_place()
                .returning(|placement| Ok(placement.order.clone()));
            self
        }

        fn build(self) -> Svc {
            OrderServiceImpl::new(
                Arc::new(self.orders),
                Arc::new(self.products),
                Arc::new(self.coupons),
                Arc::new(self.promotions),
                Arc::new(self.settings),
                Arc::new(SnowflakeGenerator::new(1, 1)),
                test_settings().store,
            )
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(id: i64, price: &str, stock: i32) -> Product {
        Product {
            id,
            name: format!("Bouquet {}", id),
            slug: format!("bouquet-{}", id),
            price: dec(price),
            stock_quantity: stock,
            ..Default::default()
        }
    }

    fn request(items: serde_json::Value) -> PlaceOrderRequest {
        serde_json::from_value(json!({
            "items": items,
            "customer_name": "Elif Demir",
            "customer_email": "Elif@Example.com",
            "customer_phone": "+90 555 000 0000",
            "recipient_name": "Can Demir",
            "shipping_address": "Bagdat Cd. 10",
            "shipping_city": "Istanbul"
        }))
        .unwrap()
    }

    fn order(status: OrderStatus) -> Order {
        Order {
            id: 7,
            order_number: "FS-20240214-ABC123".into(),
            user_id: None,
            customer_id: Some(3),
            status,
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::CashOnDelivery,
            customer_name: "Elif Demir".into(),
            customer_email: "elif@example.com".into(),
            customer_phone: "+90 555 000 0000".into(),
            recipient_name: "Can Demir".into(),
            recipient_phone: None,
            shipping_address: "Bagdat Cd. 10".into(),
            shipping_city: "Istanbul".into(),
            shipping_district: None,
            shipping_postal_code: None,
            delivery_date: None,
            delivery_time_slot: None,
            gift_message: None,
            notes: None,
            admin_note: None,
            subtotal: dec("100"),
            discount_amount: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            total: dec("100"),
            coupon_code: None,
            items: vec![OrderItem {
                id: 70,
                order_id: 7,
                product_id: 1,
                variation_id: None,
                product_name: "Bouquet 1".into(),
                variation_name: None,
                unit_price: dec("50"),
                quantity: 2,
                line_total: dec("100"),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_totals_with_flat_shipping() {
        let svc = Mocks::new()
            .with_products(vec![product(1, "120.00", 10), product(2, "35.50", 10)])
            .echo_place()
            .build();

        let placed = svc
            .place_order(
                request(json!([
                    { "product_id": "1", "quantity": 2 },
                    { "product_id": "2", "quantity": 1 }
                ])),
                None,
            )
            .await
            .unwrap();

        assert_eq!(placed.subtotal, dec("275.50"));
        assert_eq!(placed.shipping_fee, dec("49.90"));
        assert_eq!(placed.total, dec("325.40"));
        assert_eq!(placed.customer_email, "elif@example.com");
        assert!(placed.order_number.starts_with("FS-"));
        assert_eq!(placed.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_free_shipping_threshold() {
        let svc = Mocks::new()
            .with_products(vec![product(1, "750.00", 3)])
            .echo_place()
            .build();

        let placed = svc
            .place_order(request(json!([{ "product_id": "1", "quantity": 1 }])), None)
            .await
            .unwrap();
        assert_eq!(placed.shipping_fee, Decimal::ZERO);
        assert_eq!(placed.total, dec("750.00"));
    }

    #[tokio::test]
    async fn test_variation_price_and_promotion() {
        let mut p = product(1, "100.00", 0);
        p.variations = vec![ProductVariation {
            id: 11,
            product_id: 1,
            name: "24 stems".into(),
            sku: None,
            price: Some(dec("180.00")),
            stock_quantity: 4,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];

        let mut mocks = Mocks::new().with_products(vec![p]);
        mocks.promotions = MockPromotionRepository::new();
        mocks.promotions.expect_active_for_products().returning(|_, now| {
            Ok(vec![ProductPromotion {
                id: 5,
                product_id: 1,
                campaign_id: None,
                name: None,
                discount_type: DiscountType::Percentage,
                discount_value: dec("10"),
                starts_at: now - Duration::hours(1),
                ends_at: now + Duration::hours(1),
                is_active: true,
                created_at: now,
                updated_at: now,
            }])
        });
        let svc = mocks.echo_place().build();

        let placed = svc
            .place_order(
                request(json!([{ "product_id": "1", "variation_id": "11", "quantity": 2 }])),
                Some(99),
            )
            .await
            .unwrap();

        let item = &placed.items[0];
        assert_eq!(item.unit_price, dec("162.00"));
        assert_eq!(item.variation_name.as_deref(), Some("24 stems"));
        assert_eq!(placed.subtotal, dec("324.00"));
        assert_eq!(placed.user_id, Some(99));
    }

    #[tokio::test]
    async fn test_out_movements_reference_order() {
        let mut mocks = Mocks::new().with_products(vec![product(1, "10.00", 5)]);
        mocks
            .orders
            .expect_place()
            .withf(|p| {
                p.stock_movements.len() == 1
                    && p.stock_movements[0].quantity == -3
                    && p.stock_movements[0].movement_type == MovementType::Out
                    && p.stock_movements[0].reference.as_deref() == Some(p.order.order_number.as_str())
            })
            .returning(|p| Ok(p.order.clone()));

        mocks
            .build()
            .place_order(request(json!([{ "product_id": "1", "quantity": 3 }])), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_inactive_product_rejected() {
        let mut hidden = product(1, "10.00", 5);
        hidden.is_active = false;
        let mut mocks = Mocks::new().with_products(vec![hidden]);
        mocks.orders.expect_place().never();

        let err = mocks
            .build()
            .place_order(request(json!([{ "product_id": "1", "quantity": 1 }])), None)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_insufficient_stock_conflicts() {
        let mut mocks = Mocks::new().with_products(vec![product(1, "10.00", 3)]);
        mocks.orders.expect_place().never();

        // Two lines for the same product add up past the shelf.
        let err = mocks
            .build()
            .place_order(
                request(json!([
                    { "product_id": "1", "quantity": 2 },
                    { "product_id": "1", "quantity": 2 }
                ])),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_past_delivery_date_rejected() {
        let mut req = request(json!([{ "product_id": "1", "quantity": 1 }]));
        req.delivery_date = Some(Utc::now().date_naive() - Duration::days(1));

        let err = Mocks::new().build().place_order(req, None).await.unwrap_err();
        assert!(matches!(err, OrderError::DeliveryDateInPast));
    }

    #[tokio::test]
    async fn test_exhausted_coupon_rejected() {
        let mut mocks = Mocks::new().with_products(vec![product(1, "200.00", 5)]);
        mocks.coupons.expect_find_by_code().returning(|code| {
            Ok(Some(Coupon {
                id: 4,
                code: code.to_string(),
                discount_value: dec("10"),
                max_uses: Some(100),
                current_uses: 100,
                ..Default::default()
            }))
        });
        mocks
            .coupons
            .expect_usage_count_for_email()
            .returning(|_, _| Ok(0));
        mocks.orders.expect_place().never();

        let mut req = request(json!([{ "product_id": "1", "quantity": 1 }]));
        req.coupon_code = Some("spring10".into());
        let err = mocks.build().place_order(req, None).await.unwrap_err();

        assert!(matches!(err, OrderError::Coupon(CouponRejection::UsageLimitReached)));
        assert_eq!(err.to_string(), "Coupon usage limit reached");
    }

    #[tokio::test]
    async fn test_coupon_discount_recorded() {
        let mut mocks = Mocks::new().with_products(vec![product(1, "200.00", 5)]);
        mocks.coupons.expect_find_by_code().returning(|code| {
            Ok(Some(Coupon {
                id: 4,
                code: code.to_string(),
                discount_type: DiscountType::FixedAmount,
                discount_value: dec("25"),
                ..Default::default()
            }))
        });
        mocks
            .coupons
            .expect_usage_count_for_email()
            .returning(|_, _| Ok(0));
        mocks
            .orders
            .expect_place()
            .withf(|p| {
                p.coupon_usage
                    .as_ref()
                    .is_some_and(|u| u.coupon_id == 4 && u.discount_amount == dec("25"))
            })
            .returning(|p| Ok(p.order.clone()));

        let mut req = request(json!([{ "product_id": "1", "quantity": 1 }]));
        req.coupon_code = Some(" spring25 ".into());
        let placed = mocks.build().place_order(req, None).await.unwrap();

        assert_eq!(placed.coupon_code.as_deref(), Some("SPRING25"));
        assert_eq!(placed.discount_amount, dec("25"));
        assert_eq!(placed.total, dec("224.90"));
    }

    #[tokio::test]
    async fn test_track_order_requires_matching_email() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_find_by_number()
            .returning(|_| Ok(Some(order(OrderStatus::Pending))));
        let svc = mocks.build();

        assert!(svc.track_order("FS-20240214-ABC123", "ELIF@example.com").await.is_ok());
        let err = svc
            .track_order("FS-20240214-ABC123", "someone@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound));
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_find_by_id()
            .returning(|_| Ok(Some(order(OrderStatus::Shipped))));
        mocks.orders.expect_update_status().never();
        mocks.orders.expect_cancel().never();

        let err = mocks.build().update_status(7, "cancelled").await.unwrap_err();
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_cancel_restocks_items() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_find_by_id()
            .returning(|_| Ok(Some(order(OrderStatus::Confirmed))));
        mocks
            .orders
            .expect_cancel()
            .withf(|id, from, restock| {
                *id == 7
                    && *from == OrderStatus::Confirmed
                    && restock.len() == 1
                    && restock[0].movement_type == MovementType::In
                    && restock[0].quantity == 2
            })
            .returning(|_, _, _| Ok(order(OrderStatus::Cancelled)));

        let cancelled = mocks.build().update_status(7, "cancelled").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_skips_items_of_deleted_variations() {
        let mut mocks = Mocks::new();
        mocks.orders.expect_find_by_id().returning(|_| {
            let mut placed = order(OrderStatus::Pending);
            let mut sold_variation = placed.items[0].clone();
            sold_variation.id = 71;
            sold_variation.variation_id = None;
            sold_variation.variation_name = Some("Large".into());
            sold_variation.quantity = 5;
            placed.items.push(sold_variation);
            Ok(Some(placed))
        });
        mocks
            .orders
            .expect_cancel()
            .withf(|_, _, restock| {
                restock.len() == 1
                    && restock[0].variation_id.is_none()
                    && restock[0].quantity == 2
            })
            .returning(|_, _, _| Ok(order(OrderStatus::Cancelled)));

        let cancelled = mocks.build().update_status(7, "cancelled").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_closed_order_cannot_change_status() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_find_by_id()
            .returning(|_| Ok(Some(order(OrderStatus::Delivered))));
        mocks.orders.expect_update_status().never();
        mocks.orders.expect_cancel().never();

        let err = mocks.build().update_status(7, "shipped").await.unwrap_err();
        assert!(matches!(err, OrderError::OrderClosed(OrderStatus::Delivered)));
        assert_eq!(AppError::from(err).status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_status_filter_rejected() {
        let query = OrderQuery {
            status: Some("lost".into()),
            ..Default::default()
        };
        let err = Mocks::new().build().list_orders(query).await.unwrap_err();
        assert!(matches!(err, OrderError::UnknownValue(_)));
    }

    #[test]
    fn test_day_bounds() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(day_start(d).to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert_eq!(day_end_exclusive(d).to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }
}
