use crate::{
    db::DbPool,
    entities::{expense, sale, ExpenseStatus, SaleStatus},
    errors::ServiceError,
    reports::{check_range, export_csv, ExpenseEntry, ReportError, ReportGenerator, SaleEntry},
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

/// Which rows a CSV export contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Sales,
    Expenses,
}

impl ExportKind {
    pub fn file_name(self, start: NaiveDate, end: NaiveDate) -> String {
        let kind = match self {
            Self::Sales => "sales",
            Self::Expenses => "expenses",
        };
        format!("{}-{}-to-{}.csv", kind, start, end)
    }
}

/// Flat sale row for CSV export
#[derive(Debug, Serialize)]
struct SaleRow {
    id: i32,
    date: NaiveDate,
    product_name: String,
    quantity: String,
    unit_price: String,
    total: String,
    payment_method: String,
    customer_name: Option<String>,
    mpesa_code: Option<String>,
    status: SaleStatus,
}

impl From<sale::Model> for SaleRow {
    fn from(m: sale::Model) -> Self {
        Self {
            id: m.id,
            date: m.date,
            product_name: m.product_name,
            quantity: m.quantity.normalize().to_string(),
            unit_price: m.unit_price.round_dp(2).to_string(),
            total: m.total.round_dp(2).to_string(),
            payment_method: m.payment_method.to_string(),
            customer_name: m.customer_name,
            mpesa_code: m.mpesa_code,
            status: m.status,
        }
    }
}

/// Flat expense row for CSV export
#[derive(Debug, Serialize)]
struct ExpenseRow {
    id: i32,
    date: NaiveDate,
    description: String,
    category: Option<String>,
    amount: String,
    status: ExpenseStatus,
}

impl From<expense::Model> for ExpenseRow {
    fn from(m: expense::Model) -> Self {
        Self {
            id: m.id,
            date: m.date,
            description: m.description,
            category: m.category,
            amount: m.amount.round_dp(2).to_string(),
            status: m.status,
        }
    }
}

/// Loads rows from the database and hands them to the report generator
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn completed_sales(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<sale::Model>, ServiceError> {
        Ok(sale::Entity::find()
            .filter(sale::Column::Date.between(start, end))
            .filter(sale::Column::Status.eq(SaleStatus::Completed))
            .order_by_asc(sale::Column::Date)
            .order_by_asc(sale::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    async fn counted_expenses(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<expense::Model>, ServiceError> {
        Ok(expense::Entity::find()
            .filter(expense::Column::Date.between(start, end))
            .filter(expense::Column::Status.ne(ExpenseStatus::Rejected))
            .order_by_asc(expense::Column::Date)
            .order_by_asc(expense::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    /// A generator over completed sales and non-rejected expenses in `[start, end]`
    #[instrument(skip(self))]
    pub async fn generator(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReportGenerator, ServiceError> {
        check_range(start, end)?;
        let sales = self.completed_sales(start, end).await?;
        let expenses = self.counted_expenses(start, end).await?;
        debug!(
            sales = sales.len(),
            expenses = expenses.len(),
            "Loaded rows for report"
        );
        Ok(ReportGenerator::new(
            sales.iter().map(SaleEntry::from).collect(),
            expenses.iter().map(ExpenseEntry::from).collect(),
        ))
    }

    /// CSV of every sale or expense dated in `[start, end]`, whatever its status
    #[instrument(skip(self))]
    pub async fn export(
        &self,
        kind: ExportKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String, ServiceError> {
        if end < start {
            return Err(ReportError::InvalidRange { start, end }.into());
        }
        let csv = match kind {
            ExportKind::Sales => {
                let rows: Vec<SaleRow> = sale::Entity::find()
                    .filter(sale::Column::Date.between(start, end))
                    .order_by_asc(sale::Column::Date)
                    .order_by_asc(sale::Column::Id)
                    .all(&*self.db_pool)
                    .await?
                    .into_iter()
                    .map(SaleRow::from)
                    .collect();
                export_csv(&rows)?
            }
            ExportKind::Expenses => {
                let rows: Vec<ExpenseRow> = expense::Entity::find()
                    .filter(expense::Column::Date.between(start, end))
                    .order_by_asc(expense::Column::Date)
                    .order_by_asc(expense::Column::Id)
                    .all(&*self.db_pool)
                    .await?
                    .into_iter()
                    .map(ExpenseRow::from)
                    .collect();
                export_csv(&rows)?
            }
        };
        Ok(csv)
    }
}
