//! Finance Service
//!
//! Expense bookkeeping, the profit summary and the admin dashboard.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, instrument};

use super::order_service::{day_end_exclusive, day_start};
use crate::application::dto::request::{
    DateRangeQuery, ExpenseCategoryRequest, ExpenseQuery, ExpenseRequest,
};
use crate::domain::{
    CategoryTotal, DashboardCounts, Expense, ExpenseCategory, ExpenseFilter, ExpenseRepository,
    Order, OrderFilter, OrderRepository, Page, PageRequest, ReportRepository, SalesTotals,
    SupplierRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::{parse_id, SnowflakeGenerator};

/// Orders listed on the dashboard.
const DASHBOARD_RECENT_ORDERS: u32 = 5;

/// Finance service trait
#[async_trait]
pub trait FinanceService: Send + Sync {
    async fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>, FinanceError>;

    async fn create_expense_category(
        &self,
        request: ExpenseCategoryRequest,
    ) -> Result<ExpenseCategory, FinanceError>;

    async fn update_expense_category(
        &self,
        id: i64,
        request: ExpenseCategoryRequest,
    ) -> Result<ExpenseCategory, FinanceError>;

    /// Rejected while expenses reference the category
    async fn delete_expense_category(&self, id: i64) -> Result<(), FinanceError>;

    async fn list_expenses(&self, query: ExpenseQuery) -> Result<Page<Expense>, FinanceError>;

    async fn get_expense(&self, id: i64) -> Result<Expense, FinanceError>;

    async fn create_expense(
        &self,
        request: ExpenseRequest,
        user_id: i64,
    ) -> Result<Expense, FinanceError>;

    async fn update_expense(&self, id: i64, request: ExpenseRequest)
        -> Result<Expense, FinanceError>;

    async fn delete_expense(&self, id: i64) -> Result<(), FinanceError>;

    /// Revenue, expenses and profit; defaults to the current month
    async fn summary(&self, range: DateRangeQuery) -> Result<FinancialSummary, FinanceError>;

    async fn dashboard(&self) -> Result<Dashboard, FinanceError>;
}

/// Profit and loss over an inclusive date range
#[derive(Debug, Clone)]
pub struct FinancialSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sales: SalesTotals,
    pub average_order_value: Decimal,
    pub total_expenses: Decimal,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub net_profit: Decimal,
}

impl FinancialSummary {
    pub fn new(
        from: NaiveDate,
        to: NaiveDate,
        sales: SalesTotals,
        expenses_by_category: Vec<CategoryTotal>,
    ) -> Self {
        let total_expenses: Decimal = expenses_by_category.iter().map(|c| c.total).sum();
        let average_order_value = if sales.order_count > 0 {
            (sales.revenue / Decimal::from(sales.order_count))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        };
        let net_profit = sales.revenue - total_expenses;

        Self {
            from,
            to,
            sales,
            average_order_value,
            total_expenses,
            expenses_by_category,
            net_profit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub counts: DashboardCounts,
    pub recent_orders: Vec<Order>,
}

/// Finance service errors
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    #[error("Expense category not found")]
    CategoryNotFound,

    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("Supplier not found")]
    SupplierNotFound,

    #[error("Expense category is still in use")]
    CategoryInUse,

    #[error("'from' must not be after 'to'")]
    InvalidRange,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<FinanceError> for AppError {
    fn from(err: FinanceError) -> Self {
        match err {
            FinanceError::CategoryNotFound | FinanceError::ExpenseNotFound => {
                AppError::NotFound(err.to_string())
            }
            FinanceError::SupplierNotFound | FinanceError::InvalidRange => {
                AppError::BadRequest(err.to_string())
            }
            FinanceError::CategoryInUse => AppError::Conflict(err.to_string()),
            FinanceError::Repository(e) => e,
        }
    }
}

/// Fill in a missing range with the month to date.
fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), FinanceError> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or_else(|| to.with_day(1).unwrap_or(to));
    if from > to {
        return Err(FinanceError::InvalidRange);
    }
    Ok((from, to))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// FinanceService implementation
pub struct FinanceServiceImpl<E, R, O, S>
where
    E: ExpenseRepository,
    R: ReportRepository,
    O: OrderRepository,
    S: SupplierRepository,
{
    expense_repo: Arc<E>,
    report_repo: Arc<R>,
    order_repo: Arc<O>,
    supplier_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<E, R, O, S> FinanceServiceImpl<E, R, O, S>
where
    E: ExpenseRepository + 'static,
    R: ReportRepository + 'static,
    O: OrderRepository + 'static,
    S: SupplierRepository + 'static,
{
    pub fn new(
        expense_repo: Arc<E>,
        report_repo: Arc<R>,
        order_repo: Arc<O>,
        supplier_repo: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            expense_repo,
            report_repo,
            order_repo,
            supplier_repo,
            id_generator,
        }
    }

    async fn load_category(&self, id: i64) -> Result<ExpenseCategory, FinanceError> {
        self.expense_repo
            .find_category(id)
            .await?
            .ok_or(FinanceError::CategoryNotFound)
    }

    /// Resolve and check the category and supplier references of a request.
    async fn references(
        &self,
        request: &ExpenseRequest,
    ) -> Result<(ExpenseCategory, Option<i64>), FinanceError> {
        let category_id = parse_id(&request.category_id, "expense category")?;
        let category = self.load_category(category_id).await?;

        let supplier_id = request
            .supplier_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_id(s, "supplier"))
            .transpose()?;
        if let Some(id) = supplier_id {
            if self.supplier_repo.find_by_id(id).await?.is_none() {
                return Err(FinanceError::SupplierNotFound);
            }
        }
        Ok((category, supplier_id))
    }
}

#[async_trait]
impl<E, R, O, S> FinanceService for FinanceServiceImpl<E, R, O, S>
where
    E: ExpenseRepository + 'static,
    R: ReportRepository + 'static,
    O: OrderRepository + 'static,
    S: SupplierRepository + 'static,
{
    async fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>, FinanceError> {
        Ok(self.expense_repo.list_categories().await?)
    }

    async fn create_expense_category(
        &self,
        request: ExpenseCategoryRequest,
    ) -> Result<ExpenseCategory, FinanceError> {
        let category = ExpenseCategory {
            id: self.id_generator.generate(),
            name: request.name.trim().to_string(),
            description: clean(request.description),
            created_at: Utc::now(),
        };
        Ok(self.expense_repo.create_category(&category).await?)
    }

    async fn update_expense_category(
        &self,
        id: i64,
        request: ExpenseCategoryRequest,
    ) -> Result<ExpenseCategory, FinanceError> {
        let mut category = self.load_category(id).await?;
        category.name = request.name.trim().to_string();
        category.description = clean(request.description);
        Ok(self.expense_repo.update_category(&category).await?)
    }

    #[instrument(skip(self))]
    async fn delete_expense_category(&self, id: i64) -> Result<(), FinanceError> {
        self.load_category(id).await?;
        if self.expense_repo.expense_count_for_category(id).await? > 0 {
            return Err(FinanceError::CategoryInUse);
        }
        self.expense_repo.delete_category(id).await?;
        Ok(())
    }

    async fn list_expenses(&self, query: ExpenseQuery) -> Result<Page<Expense>, FinanceError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(FinanceError::InvalidRange);
            }
        }
        let filter = ExpenseFilter {
            category_id: query
                .category_id
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| parse_id(s, "expense category"))
                .transpose()?,
            supplier_id: query
                .supplier_id
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| parse_id(s, "supplier"))
                .transpose()?,
            from: query.from,
            to: query.to,
        };
        let page = PageRequest::new(query.page, query.page_size);
        let (items, total) = self.expense_repo.list(&filter, page).await?;
        Ok(Page::new(items, page, total))
    }

    async fn get_expense(&self, id: i64) -> Result<Expense, FinanceError> {
        self.expense_repo
            .find_by_id(id)
            .await?
            .ok_or(FinanceError::ExpenseNotFound)
    }

    #[instrument(skip(self, request), fields(amount = %request.amount))]
    async fn create_expense(
        &self,
        request: ExpenseRequest,
        user_id: i64,
    ) -> Result<Expense, FinanceError> {
        let (category, supplier_id) = self.references(&request).await?;

        let now = Utc::now();
        let expense = Expense {
            id: self.id_generator.generate(),
            category_id: category.id,
            supplier_id,
            description: request.description.trim().to_string(),
            amount: request.amount,
            expense_date: request.expense_date,
            payment_method: clean(request.payment_method),
            reference: clean(request.reference),
            notes: clean(request.notes),
            created_by: Some(user_id),
            category_name: Some(category.name),
            created_at: now,
            updated_at: now,
        };

        let created = self.expense_repo.create(&expense).await?;
        info!(expense_id = created.id, category_id = created.category_id, "Expense recorded");
        Ok(created)
    }

    async fn update_expense(
        &self,
        id: i64,
        request: ExpenseRequest,
    ) -> Result<Expense, FinanceError> {
        let mut expense = self.get_expense(id).await?;
        let (category, supplier_id) = self.references(&request).await?;

        expense.category_id = category.id;
        expense.category_name = Some(category.name);
        expense.supplier_id = supplier_id;
        expense.description = request.description.trim().to_string();
        expense.amount = request.amount;
        expense.expense_date = request.expense_date;
        expense.payment_method = clean(request.payment_method);
        expense.reference = clean(request.reference);
        expense.notes = clean(request.notes);

        Ok(self.expense_repo.update(&expense).await?)
    }

    async fn delete_expense(&self, id: i64) -> Result<(), FinanceError> {
        self.get_expense(id).await?;
        self.expense_repo.delete(id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn summary(&self, range: DateRangeQuery) -> Result<FinancialSummary, FinanceError> {
        let (from, to) = resolve_range(range.from, range.to, Utc::now().date_naive())?;

        let sales = self
            .report_repo
            .sales_totals(day_start(from), day_end_exclusive(to))
            .await?;
        let by_category = self.expense_repo.totals_by_category(from, to).await?;

        Ok(FinancialSummary::new(from, to, sales, by_category))
    }

    async fn dashboard(&self) -> Result<Dashboard, FinanceError> {
        let today = day_start(Utc::now().date_naive());
        let counts = self.report_repo.dashboard_counts(today).await?;
        let (recent_orders, _) = self
            .order_repo
            .list(
                &OrderFilter::default(),
                PageRequest::new(Some(1), Some(DASHBOARD_RECENT_ORDERS)),
            )
            .await?;

        Ok(Dashboard {
            counts,
            recent_orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockExpenseRepository, MockOrderRepository, MockReportRepository, MockSupplierRepository,
    };
    use mockall::predicate::*;
    use pretty_assertions::assert_eq;

    type Svc = FinanceServiceImpl<
        MockExpenseRepository,
        MockReportRepository,
        MockOrderRepository,
        MockSupplierRepository,
    >;

    fn service(expenses: MockExpenseRepository, reports: MockReportRepository) -> Svc {
        FinanceServiceImpl::new(
            Arc::new(expenses),
            Arc::new(reports),
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockSupplierRepository::new()),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_range_defaults_to_month_to_date() {
        let (from, to) = resolve_range(None, None, date(2024, 5, 17)).unwrap();
        assert_eq!(from, date(2024, 5, 1));
        assert_eq!(to, date(2024, 5, 17));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = resolve_range(Some(date(2024, 6, 2)), Some(date(2024, 6, 1)), date(2024, 6, 9));
        assert!(matches!(err, Err(FinanceError::InvalidRange)));
    }

    #[test]
    fn test_summary_math() {
        let sales = SalesTotals {
            order_count: 3,
            revenue: dec("1000.00"),
            discounts: dec("50.00"),
            shipping: dec("99.80"),
        };
        let expenses = vec![
            CategoryTotal {
                category_id: 1,
                category_name: "Flowers".into(),
                total: dec("400.00"),
            },
            CategoryTotal {
                category_id: 2,
                category_name: "Rent".into(),
                total: dec("250.00"),
            },
        ];
        let summary = FinancialSummary::new(date(2024, 5, 1), date(2024, 5, 31), sales, expenses);

        assert_eq!(summary.total_expenses, dec("650.00"));
        assert_eq!(summary.net_profit, dec("350.00"));
        assert_eq!(summary.average_order_value, dec("333.33"));
    }

    #[test]
    fn test_summary_without_orders() {
        let summary =
            FinancialSummary::new(date(2024, 5, 1), date(2024, 5, 31), SalesTotals::default(), vec![]);
        assert_eq!(summary.average_order_value, Decimal::ZERO);
        assert_eq!(summary.net_profit, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_summary_uses_inclusive_end_date() {
        let mut reports = MockReportRepository::new();
        reports
            .expect_sales_totals()
            .withf(|from, to| {
                from.to_rfc3339() == "2024-05-01T00:00:00+00:00"
                    && to.to_rfc3339() == "2024-06-01T00:00:00+00:00"
            })
            .returning(|_, _| Ok(SalesTotals::default()));
        let mut expenses = MockExpenseRepository::new();
        expenses
            .expect_totals_by_category()
            .with(eq(date(2024, 5, 1)), eq(date(2024, 5, 31)))
            .returning(|_, _| Ok(vec![]));

        let summary = service(expenses, reports)
            .summary(DateRangeQuery {
                from: Some(date(2024, 5, 1)),
                to: Some(date(2024, 5, 31)),
            })
            .await
            .unwrap();
        assert_eq!(summary.to, date(2024, 5, 31));
    }

    #[tokio::test]
    async fn test_category_in_use_conflicts() {
        let mut expenses = MockExpenseRepository::new();
        expenses.expect_find_category().returning(|id| {
            Ok(Some(ExpenseCategory {
                id,
                name: "Packaging".into(),
                description: None,
                created_at: Utc::now(),
            }))
        });
        expenses
            .expect_expense_count_for_category()
            .returning(|_| Ok(2));
        expenses.expect_delete_category().never();

        let err = service(expenses, MockReportRepository::new())
            .delete_expense_category(4)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_expense_requires_existing_category() {
        let mut expenses = MockExpenseRepository::new();
        expenses.expect_find_category().returning(|_| Ok(None));
        expenses.expect_create().never();

        let request = ExpenseRequest {
            category_id: "4".into(),
            supplier_id: None,
            description: "Ribbon".into(),
            amount: dec("12.50"),
            expense_date: date(2024, 5, 2),
            payment_method: None,
            reference: None,
            notes: None,
        };
        let err = service(expenses, MockReportRepository::new())
            .create_expense(request, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::CategoryNotFound));
    }
}
