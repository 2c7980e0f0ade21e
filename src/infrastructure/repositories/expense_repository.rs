//! Expense Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{
    CategoryTotal, Expense, ExpenseCategory, ExpenseFilter, ExpenseRepository, PageRequest,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for ExpenseCategory {
    fn from(r: CategoryRow) -> Self {
        ExpenseCategory {
            id: r.id,
            name: r.name,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: i64,
    category_id: i64,
    supplier_id: Option<i64>,
    description: String,
    amount: Decimal,
    expense_date: NaiveDate,
    payment_method: Option<String>,
    reference: Option<String>,
    notes: Option<String>,
    created_by: Option<i64>,
    category_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(r: ExpenseRow) -> Self {
        Expense {
            id: r.id,
            category_id: r.category_id,
            supplier_id: r.supplier_id,
            description: r.description,
            amount: r.amount,
            expense_date: r.expense_date,
            payment_method: r.payment_method,
            reference: r.reference,
            notes: r.notes,
            created_by: r.created_by,
            category_name: r.category_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TotalRow {
    category_id: i64,
    category_name: String,
    total: Decimal,
}

const EXPENSE_SELECT: &str = r#"
    SELECT e.id, e.category_id, e.supplier_id, e.description, e.amount, e.expense_date,
           e.payment_method, e.reference, e.notes, e.created_by, c.name AS category_name,
           e.created_at, e.updated_at
    FROM expenses e
    JOIN expense_categories c ON c.id = e.category_id
"#;

const EXPENSE_FILTER: &str = r#"
    ($1::BIGINT IS NULL OR e.category_id = $1)
    AND ($2::BIGINT IS NULL OR e.supplier_id = $2)
    AND ($3::DATE IS NULL OR e.expense_date >= $3)
    AND ($4::DATE IS NULL OR e.expense_date <= $4)
"#;

/// PostgreSQL expense repository implementation.
#[derive(Clone)]
pub struct PgExpenseRepository {
    pool: PgPool,
}

impl PgExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PgExpenseRepository {
    async fn find_category(&self, id: i64) -> Result<Option<ExpenseCategory>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, created_at FROM expense_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_categories(&self) -> Result<Vec<ExpenseCategory>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, created_at FROM expense_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_category(&self, category: &ExpenseCategory) -> Result<ExpenseCategory, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO expense_categories (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Expense category name already exists"))?;
        Ok(row.into())
    }

    async fn update_category(&self, category: &ExpenseCategory) -> Result<ExpenseCategory, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE expense_categories SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Expense category name already exists"))?
        .ok_or_else(|| {
            AppError::NotFound(format!("Expense category with id {} not found", category.id))
        })?;
        Ok(row.into())
    }

    async fn delete_category(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM expense_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    AppError::Conflict("Expense category is in use".into())
                }
                _ => AppError::Database(e),
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Expense category with id {} not found",
                id
            )));
        }
        Ok(())
    }

    async fn expense_count_for_category(&self, category_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM expenses WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Expense>, AppError> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!("{EXPENSE_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Expense>, i64), AppError> {
        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM expenses e WHERE {EXPENSE_FILTER}"
        ))
        .bind(filter.category_id)
        .bind(filter.supplier_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
            "{EXPENSE_SELECT} WHERE {EXPENSE_FILTER} \
             ORDER BY e.expense_date DESC, e.id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(filter.category_id)
        .bind(filter.supplier_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn create(&self, expense: &Expense) -> Result<Expense, AppError> {
        sqlx::query(
            r#"
            INSERT INTO expenses (id, category_id, supplier_id, description, amount, expense_date,
                                  payment_method, reference, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(expense.id)
        .bind(expense.category_id)
        .bind(expense.supplier_id)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.payment_method)
        .bind(&expense.reference)
        .bind(&expense.notes)
        .bind(expense.created_by)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Expense already exists"))?;

        self.find_by_id(expense.id)
            .await?
            .ok_or_else(|| AppError::Internal("Created expense vanished".into()))
    }

    async fn update(&self, expense: &Expense) -> Result<Expense, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET category_id = $2, supplier_id = $3, description = $4, amount = $5,
                expense_date = $6, payment_method = $7, reference = $8, notes = $9,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(expense.id)
        .bind(expense.category_id)
        .bind(expense.supplier_id)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.payment_method)
        .bind(&expense.reference)
        .bind(&expense.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Expense already exists"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Expense with id {} not found", expense.id)));
        }
        self.find_by_id(expense.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Expense with id {} not found", expense.id)))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Expense with id {} not found", id)));
        }
        Ok(())
    }

    async fn totals_by_category(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        let rows = sqlx::query_as::<_, TotalRow>(
            r#"
            SELECT c.id AS category_id, c.name AS category_name, SUM(e.amount) AS total
            FROM expenses e
            JOIN expense_categories c ON c.id = e.category_id
            WHERE e.expense_date BETWEEN $1 AND $2
            GROUP BY c.id, c.name
            ORDER BY total DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryTotal {
                category_id: r.category_id,
                category_name: r.category_name,
                total: r.total,
            })
            .collect())
    }
}
