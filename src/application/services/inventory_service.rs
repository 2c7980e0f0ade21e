//! Inventory Service
//!
//! Manual stock adjustments, the movement ledger and suppliers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::application::dto::request::{
    MovementQuery, ProductSupplierRequest, StockAdjustmentRequest, SupplierRequest,
};
use crate::domain::{
    AdjustmentMode, InventoryRepository, MovementType, Page, PageRequest, ProductRepository,
    ProductSupplier, StockAdjustment, StockMovement, StockMovementFilter, Supplier,
    SupplierRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};

/// Inventory service trait
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Apply a signed change or an absolute level; `user_id` is the admin
    async fn adjust_stock(
        &self,
        request: StockAdjustmentRequest,
        user_id: i64,
    ) -> Result<StockMovement, InventoryError>;

    async fn list_movements(&self, query: MovementQuery)
        -> Result<Page<StockMovement>, InventoryError>;

    async fn list_suppliers(&self, include_inactive: bool) -> Result<Vec<Supplier>, InventoryError>;

    /// Supplier with the products it delivers
    async fn get_supplier(&self, id: i64) -> Result<SupplierDetail, InventoryError>;

    async fn create_supplier(&self, request: SupplierRequest) -> Result<Supplier, InventoryError>;

    async fn update_supplier(
        &self,
        id: i64,
        request: SupplierRequest,
    ) -> Result<Supplier, InventoryError>;

    async fn delete_supplier(&self, id: i64) -> Result<(), InventoryError>;

    /// Create or replace the supplier's terms for a product
    async fn link_product(
        &self,
        supplier_id: i64,
        request: ProductSupplierRequest,
    ) -> Result<ProductSupplier, InventoryError>;

    async fn unlink_product(&self, supplier_id: i64, product_id: i64) -> Result<(), InventoryError>;

    async fn suppliers_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<ProductSupplier>, InventoryError>;
}

#[derive(Debug, Clone)]
pub struct SupplierDetail {
    pub supplier: Supplier,
    pub products: Vec<ProductSupplier>,
}

/// Inventory service errors
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Variation does not belong to this product")]
    VariationNotFound,

    #[error("Supplier not found")]
    SupplierNotFound,

    #[error("Provide exactly one of quantity or set_to")]
    AmbiguousAdjustment,

    #[error("Quantity must not be zero")]
    ZeroQuantity,

    #[error("Unknown movement type '{0}'")]
    UnknownMovementType(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound
            | InventoryError::VariationNotFound
            | InventoryError::SupplierNotFound => AppError::NotFound(err.to_string()),
            InventoryError::AmbiguousAdjustment
            | InventoryError::ZeroQuantity
            | InventoryError::UnknownMovementType(_) => AppError::BadRequest(err.to_string()),
            InventoryError::Repository(e) => e,
        }
    }
}

fn adjustment_mode(quantity: Option<i32>, set_to: Option<i32>) -> Result<AdjustmentMode, InventoryError> {
    match (quantity, set_to) {
        (Some(0), None) => Err(InventoryError::ZeroQuantity),
        (Some(delta), None) => Ok(AdjustmentMode::Delta(delta)),
        (None, Some(level)) => Ok(AdjustmentMode::SetTo(level)),
        _ => Err(InventoryError::AmbiguousAdjustment),
    }
}

/// Received goods are `in`; removals and counts are corrections.
fn default_movement_type(mode: AdjustmentMode) -> MovementType {
    match mode {
        AdjustmentMode::Delta(delta) if delta > 0 => MovementType::In,
        _ => MovementType::Adjustment,
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// InventoryService implementation
pub struct InventoryServiceImpl<I, S, P>
where
    I: InventoryRepository,
    S: SupplierRepository,
    P: ProductRepository,
{
    inventory_repo: Arc<I>,
    supplier_repo: Arc<S>,
    product_repo: Arc<P>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<I, S, P> InventoryServiceImpl<I, S, P>
where
    I: InventoryRepository + 'static,
    S: SupplierRepository + 'static,
    P: ProductRepository + 'static,
{
    pub fn new(
        inventory_repo: Arc<I>,
        supplier_repo: Arc<S>,
        product_repo: Arc<P>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            inventory_repo,
            supplier_repo,
            product_repo,
            id_generator,
        }
    }

    async fn load_supplier(&self, id: i64) -> Result<Supplier, InventoryError> {
        self.supplier_repo
            .find_by_id(id)
            .await?
            .ok_or(InventoryError::SupplierNotFound)
    }
}

#[async_trait]
impl<I, S, P> InventoryService for InventoryServiceImpl<I, S, P>
where
    I: InventoryRepository + 'static,
    S: SupplierRepository + 'static,
    P: ProductRepository + 'static,
{
    #[instrument(skip(self, request))]
    async fn adjust_stock(
        &self,
        request: StockAdjustmentRequest,
        user_id: i64,
    ) -> Result<StockMovement, InventoryError> {
        let product_id = parse_id(&request.product_id, "product")?;
        let variation_id = request
            .variation_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_id(v, "variation"))
            .transpose()?;
        let mode = adjustment_mode(request.quantity, request.set_to)?;
        let movement_type = match request.movement_type.as_deref() {
            Some(raw) => MovementType::parse(raw)
                .ok_or_else(|| InventoryError::UnknownMovementType(raw.to_string()))?,
            None => default_movement_type(mode),
        };

        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .ok_or(InventoryError::ProductNotFound)?;
        if let Some(variation_id) = variation_id {
            if product.variation(variation_id).is_none() {
                return Err(InventoryError::VariationNotFound);
            }
        }

        let adjustment = StockAdjustment {
            movement_id: self.id_generator.generate(),
            product_id,
            variation_id,
            mode,
            movement_type,
            reason: clean(request.reason),
            reference: clean(request.reference),
            created_by: Some(user_id),
        };
        let movement = self.inventory_repo.adjust(&adjustment).await?;

        info!(
            product_id,
            variation_id = ?variation_id,
            change = movement.quantity,
            stock_after = movement.stock_after,
            "Stock adjusted"
        );
        Ok(movement)
    }

    async fn list_movements(
        &self,
        query: MovementQuery,
    ) -> Result<Page<StockMovement>, InventoryError> {
        let product_id = query
            .product_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| parse_id(p, "product"))
            .transpose()?;
        let movement_type = match query.movement_type.as_deref().filter(|t| !t.is_empty()) {
            Some(raw) => Some(
                MovementType::parse(raw)
                    .ok_or_else(|| InventoryError::UnknownMovementType(raw.to_string()))?,
            ),
            None => None,
        };

        let filter = StockMovementFilter {
            product_id,
            movement_type,
        };
        let page = PageRequest::new(query.page, query.page_size);
        let (items, total) = self.inventory_repo.list_movements(&filter, page).await?;
        Ok(Page::new(items, page, total))
    }

    async fn list_suppliers(&self, include_inactive: bool) -> Result<Vec<Supplier>, InventoryError> {
        Ok(self.supplier_repo.list(include_inactive).await?)
    }

    async fn get_supplier(&self, id: i64) -> Result<SupplierDetail, InventoryError> {
        let supplier = self.load_supplier(id).await?;
        let products = self.supplier_repo.list_for_supplier(id).await?;
        Ok(SupplierDetail { supplier, products })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_supplier(&self, request: SupplierRequest) -> Result<Supplier, InventoryError> {
        let now = Utc::now();
        let supplier = Supplier {
            id: self.id_generator.generate(),
            name: request.name.trim().to_string(),
            contact_name: clean(request.contact_name),
            email: clean(request.email).map(|e| e.to_lowercase()),
            phone: clean(request.phone),
            address: clean(request.address),
            notes: clean(request.notes),
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        Ok(self.supplier_repo.create(&supplier).await?)
    }

    async fn update_supplier(
        &self,
        id: i64,
        request: SupplierRequest,
    ) -> Result<Supplier, InventoryError> {
        let mut supplier = self.load_supplier(id).await?;
        supplier.name = request.name.trim().to_string();
        supplier.contact_name = clean(request.contact_name);
        supplier.email = clean(request.email).map(|e| e.to_lowercase());
        supplier.phone = clean(request.phone);
        supplier.address = clean(request.address);
        supplier.notes = clean(request.notes);
        supplier.is_active = request.is_active;
        Ok(self.supplier_repo.update(&supplier).await?)
    }

    async fn delete_supplier(&self, id: i64) -> Result<(), InventoryError> {
        self.load_supplier(id).await?;
        self.supplier_repo.delete(id).await?;
        Ok(())
    }

    async fn link_product(
        &self,
        supplier_id: i64,
        request: ProductSupplierRequest,
    ) -> Result<ProductSupplier, InventoryError> {
        let supplier = self.load_supplier(supplier_id).await?;
        let product_id = parse_id(&request.product_id, "product")?;
        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .ok_or(InventoryError::ProductNotFound)?;

        let link = ProductSupplier {
            product_id,
            supplier_id,
            supplier_sku: clean(request.supplier_sku),
            cost_price: request.cost_price,
            lead_time_days: request.lead_time_days,
            is_preferred: request.is_preferred,
            supplier_name: Some(supplier.name),
            product_name: Some(product.name),
        };
        Ok(self.supplier_repo.link_product(&link).await?)
    }

    async fn unlink_product(&self, supplier_id: i64, product_id: i64) -> Result<(), InventoryError> {
        self.supplier_repo
            .unlink_product(product_id, supplier_id)
            .await?;
        Ok(())
    }

    async fn suppliers_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<ProductSupplier>, InventoryError> {
        if self.product_repo.find_by_id(product_id).await?.is_none() {
            return Err(InventoryError::ProductNotFound);
        }
        Ok(self.supplier_repo.list_for_product(product_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockInventoryRepository, MockProductRepository, MockSupplierRepository, Product,
    };
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn service(
        inventory: MockInventoryRepository,
        suppliers: MockSupplierRepository,
        products: MockProductRepository,
    ) -> InventoryServiceImpl<MockInventoryRepository, MockSupplierRepository, MockProductRepository>
    {
        InventoryServiceImpl::new(
            Arc::new(inventory),
            Arc::new(suppliers),
            Arc::new(products),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    fn adjustment(quantity: Option<i32>, set_to: Option<i32>) -> StockAdjustmentRequest {
        StockAdjustmentRequest {
            product_id: "21".into(),
            variation_id: None,
            quantity,
            set_to,
            movement_type: None,
            reason: Some("Weekly count".into()),
            reference: None,
        }
    }

    fn existing_product() -> MockProductRepository {
        let mut products = MockProductRepository::new();
        products.expect_find_by_id().returning(|id| {
            Ok(Some(Product {
                id,
                name: "White Lilies".into(),
                ..Default::default()
            }))
        });
        products
    }

    #[test_case(Some(5), None, true ; "delta")]
    #[test_case(None, Some(0), true ; "absolute zero")]
    #[test_case(Some(5), Some(3), false ; "both")]
    #[test_case(None, None, false ; "neither")]
    #[test_case(Some(0), None, false ; "zero delta")]
    fn test_adjustment_mode(quantity: Option<i32>, set_to: Option<i32>, ok: bool) {
        assert_eq!(adjustment_mode(quantity, set_to).is_ok(), ok);
    }

    #[test_case(AdjustmentMode::Delta(12), MovementType::In)]
    #[test_case(AdjustmentMode::Delta(-2), MovementType::Adjustment)]
    #[test_case(AdjustmentMode::SetTo(40), MovementType::Adjustment)]
    fn test_default_movement_type(mode: AdjustmentMode, expected: MovementType) {
        assert_eq!(default_movement_type(mode), expected);
    }

    #[tokio::test]
    async fn test_adjust_records_admin_and_type() {
        let mut inventory = MockInventoryRepository::new();
        inventory
            .expect_adjust()
            .withf(|a| {
                a.product_id == 21
                    && a.mode == AdjustmentMode::Delta(12)
                    && a.movement_type == MovementType::In
                    && a.created_by == Some(3)
            })
            .returning(|a| {
                let mut m = StockMovement::new(a.movement_id, a.product_id, None, a.movement_type, 12);
                m.stock_after = 20;
                Ok(m)
            });

        let movement = service(inventory, MockSupplierRepository::new(), existing_product())
            .adjust_stock(adjustment(Some(12), None), 3)
            .await
            .unwrap();
        assert_eq!(movement.stock_after, 20);
    }

    #[tokio::test]
    async fn test_adjust_rejects_foreign_variation() {
        let mut inventory = MockInventoryRepository::new();
        inventory.expect_adjust().never();

        let mut request = adjustment(Some(-1), None);
        request.variation_id = Some("999".into());
        let err = service(inventory, MockSupplierRepository::new(), existing_product())
            .adjust_stock(request, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::VariationNotFound));
    }

    #[tokio::test]
    async fn test_negative_result_surfaces_bad_request() {
        let mut inventory = MockInventoryRepository::new();
        inventory
            .expect_adjust()
            .returning(|_| Err(AppError::BadRequest("Stock cannot go below zero".into())));

        let err = service(inventory, MockSupplierRepository::new(), existing_product())
            .adjust_stock(adjustment(Some(-50), None), 3)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_link_product_fills_names() {
        let mut suppliers = MockSupplierRepository::new();
        suppliers.expect_find_by_id().returning(|id| {
            Ok(Some(Supplier {
                id,
                name: "Aalsmeer Direct".into(),
                contact_name: None,
                email: None,
                phone: None,
                address: None,
                notes: None,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
        suppliers
            .expect_link_product()
            .withf(|l| l.supplier_id == 8 && l.product_id == 21 && l.is_preferred)
            .returning(|l| Ok(l.clone()));

        let link = service(MockInventoryRepository::new(), suppliers, existing_product())
            .link_product(
                8,
                ProductSupplierRequest {
                    product_id: "21".into(),
                    supplier_sku: Some("AD-LIL-10".into()),
                    cost_price: None,
                    lead_time_days: Some(2),
                    is_preferred: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(link.supplier_name.as_deref(), Some("Aalsmeer Direct"));
        assert_eq!(link.product_name.as_deref(), Some("White Lilies"));
    }
}
