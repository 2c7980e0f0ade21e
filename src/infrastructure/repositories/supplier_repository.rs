//! Supplier Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{ProductSupplier, Supplier, SupplierRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: i64,
    name: String,
    contact_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(r: SupplierRow) -> Self {
        Supplier {
            id: r.id,
            name: r.name,
            contact_name: r.contact_name,
            email: r.email,
            phone: r.phone,
            address: r.address,
            notes: r.notes,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    product_id: i64,
    supplier_id: i64,
    supplier_sku: Option<String>,
    cost_price: Option<Decimal>,
    lead_time_days: Option<i32>,
    is_preferred: bool,
    supplier_name: Option<String>,
    product_name: Option<String>,
}

impl From<LinkRow> for ProductSupplier {
    fn from(r: LinkRow) -> Self {
        ProductSupplier {
            product_id: r.product_id,
            supplier_id: r.supplier_id,
            supplier_sku: r.supplier_sku,
            cost_price: r.cost_price,
            lead_time_days: r.lead_time_days,
            is_preferred: r.is_preferred,
            supplier_name: r.supplier_name,
            product_name: r.product_name,
        }
    }
}

const SUPPLIER_COLUMNS: &str =
    "id, name, contact_name, email, phone, address, notes, is_active, created_at, updated_at";

const LINK_SELECT: &str = r#"
    SELECT ps.product_id, ps.supplier_id, ps.supplier_sku, ps.cost_price, ps.lead_time_days,
           ps.is_preferred, s.name AS supplier_name, p.name AS product_name
    FROM product_suppliers ps
    JOIN suppliers s ON s.id = ps.supplier_id
    JOIN products p ON p.id = ps.product_id
"#;

/// PostgreSQL supplier repository implementation.
#[derive(Clone)]
pub struct PgSupplierRepository {
    pool: PgPool,
}

impl PgSupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupplierRepository for PgSupplierRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Supplier>, AppError> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Supplier>, AppError> {
        let rows = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE ($1 OR is_active) ORDER BY name"
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, supplier: &Supplier) -> Result<Supplier, AppError> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            r#"
            INSERT INTO suppliers (id, name, contact_name, email, phone, address, notes, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.notes)
        .bind(supplier.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, supplier: &Supplier) -> Result<Supplier, AppError> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            r#"
            UPDATE suppliers
            SET name = $2, contact_name = $3, email = $4, phone = $5, address = $6,
                notes = $7, is_active = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.notes)
        .bind(supplier.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Supplier with id {} not found", supplier.id)))?;
        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Supplier with id {} not found", id)));
        }
        Ok(())
    }

    async fn link_product(&self, link: &ProductSupplier) -> Result<ProductSupplier, AppError> {
        let mut tx = self.pool.begin().await?;

        if link.is_preferred {
            sqlx::query(
                "UPDATE product_suppliers SET is_preferred = FALSE \
                 WHERE product_id = $1 AND supplier_id <> $2",
            )
            .bind(link.product_id)
            .bind(link.supplier_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO product_suppliers (product_id, supplier_id, supplier_sku, cost_price,
                                           lead_time_days, is_preferred)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (product_id, supplier_id) DO UPDATE
            SET supplier_sku = EXCLUDED.supplier_sku,
                cost_price = EXCLUDED.cost_price,
                lead_time_days = EXCLUDED.lead_time_days,
                is_preferred = EXCLUDED.is_preferred
            "#,
        )
        .bind(link.product_id)
        .bind(link.supplier_id)
        .bind(&link.supplier_sku)
        .bind(link.cost_price)
        .bind(link.lead_time_days)
        .bind(link.is_preferred)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Product is already linked"))?;

        let row = sqlx::query_as::<_, LinkRow>(&format!(
            "{LINK_SELECT} WHERE ps.product_id = $1 AND ps.supplier_id = $2"
        ))
        .bind(link.product_id)
        .bind(link.supplier_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn unlink_product(&self, product_id: i64, supplier_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM product_suppliers WHERE product_id = $1 AND supplier_id = $2",
        )
        .bind(product_id)
        .bind(supplier_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product is not linked to this supplier".into()));
        }
        Ok(())
    }

    async fn list_for_product(&self, product_id: i64) -> Result<Vec<ProductSupplier>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "{LINK_SELECT} WHERE ps.product_id = $1 ORDER BY ps.is_preferred DESC, s.name"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_supplier(&self, supplier_id: i64) -> Result<Vec<ProductSupplier>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "{LINK_SELECT} WHERE ps.supplier_id = $1 ORDER BY p.name"
        ))
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
