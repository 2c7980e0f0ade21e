//! Order Repository Implementation
//!
//! Order placement and cancellation are multi-table writes that run in a
//! single transaction. Stock and coupon capacity are protected by guarded
//! `UPDATE ... WHERE` statements rather than application locks.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{
    MovementType, Order, OrderFilter, OrderItem, OrderPlacement, OrderRepository, OrderStatus,
    PageRequest, PaymentMethod, PaymentStatus, StockMovement,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    user_id: Option<i64>,
    customer_id: Option<i64>,
    status: String,
    payment_status: String,
    payment_method: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    recipient_name: String,
    recipient_phone: Option<String>,
    shipping_address: String,
    shipping_city: String,
    shipping_district: Option<String>,
    shipping_postal_code: Option<String>,
    delivery_date: Option<NaiveDate>,
    delivery_time_slot: Option<String>,
    gift_message: Option<String>,
    notes: Option<String>,
    admin_note: Option<String>,
    subtotal: Decimal,
    discount_amount: Decimal,
    shipping_fee: Decimal,
    total: Decimal,
    coupon_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            customer_id: self.customer_id,
            status: OrderStatus::from_str(&self.status),
            payment_status: PaymentStatus::from_str(&self.payment_status),
            payment_method: PaymentMethod::from_str(&self.payment_method),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            recipient_name: self.recipient_name,
            recipient_phone: self.recipient_phone,
            shipping_address: self.shipping_address,
            shipping_city: self.shipping_city,
            shipping_district: self.shipping_district,
            shipping_postal_code: self.shipping_postal_code,
            delivery_date: self.delivery_date,
            delivery_time_slot: self.delivery_time_slot,
            gift_message: self.gift_message,
            notes: self.notes,
            admin_note: self.admin_note,
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            shipping_fee: self.shipping_fee,
            total: self.total,
            coupon_code: self.coupon_code,
            items: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    variation_id: Option<i64>,
    product_name: String,
    variation_name: Option<String>,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        OrderItem {
            id: r.id,
            order_id: r.order_id,
            product_id: r.product_id,
            variation_id: r.variation_id,
            product_name: r.product_name,
            variation_name: r.variation_name,
            unit_price: r.unit_price,
            quantity: r.quantity,
            line_total: r.line_total,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_id, status, payment_status, \
     payment_method, customer_name, customer_email, customer_phone, recipient_name, \
     recipient_phone, shipping_address, shipping_city, shipping_district, shipping_postal_code, \
     delivery_date, delivery_time_slot, gift_message, notes, admin_note, subtotal, \
     discount_amount, shipping_fee, total, coupon_code, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, variation_id, product_name, variation_name, \
     unit_price, quantity, line_total";

/// Shared WHERE clause for order listings; parameters $1..$7.
const LIST_FILTER: &str = r#"
    ($1::TEXT IS NULL OR status = $1)
    AND ($2::TEXT IS NULL OR payment_status = $2)
    AND ($3::TEXT IS NULL OR order_number ILIKE '%' || $3 || '%'
         OR customer_name ILIKE '%' || $3 || '%' OR customer_email ILIKE '%' || $3 || '%')
    AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
    AND ($5::TIMESTAMPTZ IS NULL OR created_at < $5)
    AND ($6::BIGINT IS NULL OR user_id = $6)
    AND ($7::BIGINT IS NULL OR customer_id = $7)
"#;

/// PostgreSQL order repository implementation.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order: &mut Order) -> Result<(), AppError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order.id)
        .fetch_all(&self.pool)
        .await?;
        order.items = rows.into_iter().map(Into::into).collect();
        Ok(())
    }

    async fn reload(&self, id: i64) -> Result<Order, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))
    }
}

/// Apply a signed stock change and return the new level.
///
/// Decrements are guarded so stock never goes negative; `None` means the
/// row is missing or there is not enough stock.
async fn apply_stock_delta(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    variation_id: Option<i64>,
    delta: i32,
) -> Result<Option<i32>, AppError> {
    let level = match variation_id {
        Some(variation_id) => {
            sqlx::query_scalar::<_, i32>(
                r#"
                UPDATE product_variations
                SET stock_quantity = stock_quantity + $3, updated_at = NOW()
                WHERE id = $1 AND product_id = $2 AND stock_quantity + $3 >= 0
                RETURNING stock_quantity
                "#,
            )
            .bind(variation_id)
            .bind(product_id)
            .bind(delta)
            .fetch_optional(&mut **tx)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, i32>(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity + $2, updated_at = NOW()
                WHERE id = $1 AND stock_quantity + $2 >= 0
                RETURNING stock_quantity
                "#,
            )
            .bind(product_id)
            .bind(delta)
            .fetch_optional(&mut **tx)
            .await?
        }
    };
    Ok(level)
}

pub(crate) async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    movement: &StockMovement,
    stock_after: i32,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, variation_id, movement_type, quantity,
                                     stock_after, reason, reference, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(movement.id)
    .bind(movement.product_id)
    .bind(movement.variation_id)
    .bind(movement.movement_type.as_str())
    .bind(movement.quantity)
    .bind(stock_after)
    .bind(&movement.reason)
    .bind(&movement.reference)
    .bind(movement.created_by)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn place(&self, placement: &OrderPlacement) -> Result<Order, AppError> {
        let order = &placement.order;
        let mut tx = self.pool.begin().await?;

        // Customer record keyed by email, created on first order.
        let customer_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO customers (id, user_id, email, full_name, phone, address, city,
                                   total_orders, total_spent, last_order_at)
            VALUES ($1, $2, LOWER($3), $4, $5, $6, $7, 1, $8, NOW())
            ON CONFLICT (email) DO UPDATE
            SET total_orders = customers.total_orders + 1,
                total_spent = customers.total_spent + EXCLUDED.total_spent,
                last_order_at = NOW(),
                user_id = COALESCE(customers.user_id, EXCLUDED.user_id),
                full_name = EXCLUDED.full_name,
                phone = COALESCE(EXCLUDED.phone, customers.phone),
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(placement.new_customer_id)
        .bind(order.user_id)
        .bind(&order.customer_email)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.shipping_address)
        .bind(&order.shipping_city)
        .bind(order.total)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, user_id, customer_id, status, payment_status,
                                payment_method, customer_name, customer_email, customer_phone,
                                recipient_name, recipient_phone, shipping_address, shipping_city,
                                shipping_district, shipping_postal_code, delivery_date,
                                delivery_time_slot, gift_message, notes, subtotal,
                                discount_amount, shipping_fee, total, coupon_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, LOWER($9), $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(customer_id)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.recipient_name)
        .bind(&order.recipient_phone)
        .bind(&order.shipping_address)
        .bind(&order.shipping_city)
        .bind(&order.shipping_district)
        .bind(&order.shipping_postal_code)
        .bind(order.delivery_date)
        .bind(&order.delivery_time_slot)
        .bind(&order.gift_message)
        .bind(&order.notes)
        .bind(order.subtotal)
        .bind(order.discount_amount)
        .bind(order.shipping_fee)
        .bind(order.total)
        .bind(&order.coupon_code)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Order number collision, please retry"))?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, variation_id, product_name,
                                         variation_name, unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.variation_id)
            .bind(&item.product_name)
            .bind(&item.variation_name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }

        for movement in &placement.stock_movements {
            let stock_after = apply_stock_delta(
                &mut tx,
                movement.product_id,
                movement.variation_id,
                movement.quantity,
            )
            .await?
            .ok_or_else(|| AppError::Conflict("Insufficient stock".into()))?;
            insert_movement(&mut tx, movement, stock_after).await?;
        }

        if let Some(usage) = &placement.coupon_usage {
            let claimed = sqlx::query(
                r#"
                UPDATE coupons
                SET current_uses = current_uses + 1, updated_at = NOW()
                WHERE id = $1 AND is_active AND (max_uses IS NULL OR current_uses < max_uses)
                "#,
            )
            .bind(usage.coupon_id)
            .execute(&mut *tx)
            .await?;

            if claimed.rows_affected() == 0 {
                return Err(AppError::Conflict("Coupon usage limit reached".into()));
            }

            sqlx::query(
                r#"
                INSERT INTO coupon_usages (id, coupon_id, order_id, customer_email, discount_amount)
                VALUES ($1, $2, $3, LOWER($4), $5)
                "#,
            )
            .bind(usage.id)
            .bind(usage.coupon_id)
            .bind(order.id)
            .bind(&usage.customer_email)
            .bind(usage.discount_amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.reload(order.id).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>, AppError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = row.into_order();
        self.load_items(&mut order).await?;
        Ok(Some(order))
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, AppError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = row.into_order();
        self.load_items(&mut order).await?;
        Ok(Some(order))
    }

    async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<Order>, i64), AppError> {
        let status = filter.status.map(|s| s.as_str());
        let payment_status = filter.payment_status.map(|s| s.as_str());
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM orders WHERE {LIST_FILTER}"
        ))
        .bind(status)
        .bind(payment_status)
        .bind(search)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.user_id)
        .bind(filter.customer_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {LIST_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $8 OFFSET $9"
        ))
        .bind(status)
        .bind(payment_status)
        .bind(search)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.user_id)
        .bind(filter.customer_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(OrderRow::into_order).collect(), total))
    }

    async fn update_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, AppError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Order status changed, reload and retry".into()));
        }
        self.reload(id).await
    }

    async fn cancel(
        &self,
        id: i64,
        from: OrderStatus,
        restock: &[StockMovement],
    ) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(OrderStatus::Cancelled.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Order status changed, reload and retry".into()));
        }

        for movement in restock {
            debug_assert_eq!(movement.movement_type, MovementType::In);
            // Returns None when the product or variation no longer exists
            if let Some(stock_after) = apply_stock_delta(
                &mut tx,
                movement.product_id,
                movement.variation_id,
                movement.quantity,
            )
            .await?
            {
                insert_movement(&mut tx, movement, stock_after).await?;
            }
        }

        tx.commit().await?;
        self.reload(id).await
    }

    async fn update_payment_status(
        &self,
        id: i64,
        status: PaymentStatus,
    ) -> Result<Order, AppError> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Order with id {} not found", id)));
        }
        self.reload(id).await
    }

    async fn update_admin_note(&self, id: i64, note: Option<String>) -> Result<Order, AppError> {
        let result =
            sqlx::query("UPDATE orders SET admin_note = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(note)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Order with id {} not found", id)));
        }
        self.reload(id).await
    }
}
