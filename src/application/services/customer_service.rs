//! Customer Service
//!
//! Admin view of customers. Segments are computed on read from the order
//! statistics kept on each customer row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::application::dto::request::{CustomerQuery, UpdateCustomerRequest};
use crate::domain::services::{SegmentationService, VIP_ORDER_COUNT};
use crate::domain::{
    Customer, CustomerFilter, CustomerRepository, CustomerSegment, Order, OrderFilter,
    OrderRepository, Page, PageRequest,
};
use crate::shared::error::AppError;

/// Orders shown on the customer detail page.
const RECENT_ORDERS: u32 = 10;

/// Customer service trait
#[async_trait]
pub trait CustomerService: Send + Sync {
    async fn list_customers(&self, query: CustomerQuery) -> Result<Page<CustomerView>, CustomerError>;

    /// Customer with their most recent orders
    async fn get_customer(&self, id: i64) -> Result<CustomerDetail, CustomerError>;

    /// Only the provided fields change
    async fn update_customer(
        &self,
        id: i64,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerView, CustomerError>;
}

/// Customer with computed segment
#[derive(Debug, Clone)]
pub struct CustomerView {
    pub customer: Customer,
    pub segment: CustomerSegment,
}

#[derive(Debug, Clone)]
pub struct CustomerDetail {
    pub view: CustomerView,
    pub recent_orders: Vec<Order>,
}

/// Customer service errors
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("Customer not found")]
    NotFound,

    #[error("Unknown segment '{0}'")]
    UnknownSegment(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<CustomerError> for AppError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::NotFound => AppError::NotFound(err.to_string()),
            CustomerError::UnknownSegment(_) => AppError::BadRequest(err.to_string()),
            CustomerError::Repository(e) => e,
        }
    }
}

/// Replace `current` when `update` is present; an empty string clears it.
fn merge(current: &mut Option<String>, update: Option<String>) {
    if let Some(value) = update {
        let value = value.trim();
        *current = (!value.is_empty()).then(|| value.to_string());
    }
}

/// CustomerService implementation
pub struct CustomerServiceImpl<C, O>
where
    C: CustomerRepository,
    O: OrderRepository,
{
    customer_repo: Arc<C>,
    order_repo: Arc<O>,
    segmentation: SegmentationService,
}

impl<C, O> CustomerServiceImpl<C, O>
where
    C: CustomerRepository + 'static,
    O: OrderRepository + 'static,
{
    pub fn new(customer_repo: Arc<C>, order_repo: Arc<O>, segmentation: SegmentationService) -> Self {
        Self {
            customer_repo,
            order_repo,
            segmentation,
        }
    }

    fn view(&self, customer: Customer) -> CustomerView {
        let segment = self.segmentation.classify(&customer, Utc::now());
        CustomerView { customer, segment }
    }

    async fn load(&self, id: i64) -> Result<Customer, CustomerError> {
        self.customer_repo
            .find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound)
    }
}

#[async_trait]
impl<C, O> CustomerService for CustomerServiceImpl<C, O>
where
    C: CustomerRepository + 'static,
    O: OrderRepository + 'static,
{
    async fn list_customers(&self, query: CustomerQuery) -> Result<Page<CustomerView>, CustomerError> {
        let segment = match query.segment.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                CustomerSegment::parse(raw)
                    .ok_or_else(|| CustomerError::UnknownSegment(raw.to_string()))?,
            ),
            None => None,
        };

        let filter = CustomerFilter {
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            segment,
            vip_spend_threshold: self.segmentation.vip_spend_threshold,
            vip_order_count: VIP_ORDER_COUNT,
            inactive_before: Some(self.segmentation.inactive_cutoff(Utc::now())),
        };
        let page = PageRequest::new(query.page, query.page_size);

        let (customers, total) = self.customer_repo.list(&filter, page).await?;
        Ok(Page::new(customers, page, total).map(|c| self.view(c)))
    }

    async fn get_customer(&self, id: i64) -> Result<CustomerDetail, CustomerError> {
        let customer = self.load(id).await?;
        let filter = OrderFilter {
            customer_id: Some(id),
            ..Default::default()
        };
        let (recent_orders, _) = self
            .order_repo
            .list(&filter, PageRequest::new(Some(1), Some(RECENT_ORDERS)))
            .await?;

        Ok(CustomerDetail {
            view: self.view(customer),
            recent_orders,
        })
    }

    #[instrument(skip(self, request))]
    async fn update_customer(
        &self,
        id: i64,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerView, CustomerError> {
        let mut customer = self.load(id).await?;
        merge(&mut customer.phone, request.phone);
        merge(&mut customer.address, request.address);
        merge(&mut customer.city, request.city);
        merge(&mut customer.notes, request.notes);

        let updated = self.customer_repo.update(&customer).await?;
        Ok(self.view(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockCustomerRepository, MockOrderRepository};
    use chrono::Duration;
    use mockall::predicate::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn customer(orders: i32, spent: i64) -> Customer {
        let now = Utc::now();
        Customer {
            id: 5,
            user_id: None,
            email: "mert@example.com".into(),
            full_name: "Mert Kaya".into(),
            phone: Some("+90 555 111 2233".into()),
            address: None,
            city: Some("Izmir".into()),
            total_orders: orders,
            total_spent: Decimal::new(spent, 0),
            last_order_at: Some(now - Duration::days(3)),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(
        customers: MockCustomerRepository,
        orders: MockOrderRepository,
    ) -> CustomerServiceImpl<MockCustomerRepository, MockOrderRepository> {
        CustomerServiceImpl::new(
            Arc::new(customers),
            Arc::new(orders),
            SegmentationService::new(Decimal::new(5000, 0), 180),
        )
    }

    #[tokio::test]
    async fn test_list_passes_segment_thresholds() {
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_list()
            .withf(|f, _| {
                f.segment == Some(CustomerSegment::Vip)
                    && f.vip_spend_threshold == Decimal::new(5000, 0)
                    && f.vip_order_count == VIP_ORDER_COUNT
                    && f.inactive_before.is_some()
            })
            .returning(|_, _| Ok((vec![customer(12, 800)], 1)));

        let page = service(customers, MockOrderRepository::new())
            .list_customers(CustomerQuery {
                segment: Some("VIP".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].segment, CustomerSegment::Vip);
    }

    #[tokio::test]
    async fn test_unknown_segment_rejected() {
        let err = service(MockCustomerRepository::new(), MockOrderRepository::new())
            .list_customers(CustomerQuery {
                segment: Some("gold".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_detail_loads_recent_orders() {
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_find_by_id()
            .with(eq(5))
            .returning(|_| Ok(Some(customer(1, 90))));
        let mut orders = MockOrderRepository::new();
        orders
            .expect_list()
            .withf(|f, page| f.customer_id == Some(5) && page.page_size == RECENT_ORDERS)
            .returning(|_, _| Ok((vec![], 0)));

        let detail = service(customers, orders).get_customer(5).await.unwrap();
        assert_eq!(detail.view.segment, CustomerSegment::New);
        assert!(detail.recent_orders.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_find_by_id()
            .returning(|_| Ok(Some(customer(3, 300))));
        customers
            .expect_update()
            .withf(|c| {
                c.phone.is_none()
                    && c.city.as_deref() == Some("Izmir")
                    && c.notes.as_deref() == Some("Prefers white lilies")
            })
            .returning(|c| Ok(c.clone()));

        let view = service(customers, MockOrderRepository::new())
            .update_customer(
                5,
                UpdateCustomerRequest {
                    phone: Some("".into()),
                    notes: Some("Prefers white lilies".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.segment, CustomerSegment::Regular);
    }
}
