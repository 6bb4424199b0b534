use crate::{
    db::DbPool,
    entities::{debt, expense, product, sale, DebtStatus, ExpenseStatus, SaleStatus},
    errors::ServiceError,
    formatting::dates::{start_of_month, today},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Headline figures for the dashboard landing page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub today_revenue: Decimal,
    pub today_sales_count: u64,
    pub today_expenses: Decimal,
    pub month_revenue: Decimal,
    pub month_expenses: Decimal,
    pub month_net_profit: Decimal,
    pub low_stock_count: u64,
    pub outstanding_debt: Decimal,
    pub pending_expense_count: u64,
}

impl DashboardSummary {
    /// Folds this month's completed sales and non-rejected expenses into the summary
    pub fn tally(
        today: NaiveDate,
        month_sales: &[sale::Model],
        month_expenses: &[expense::Model],
    ) -> Self {
        let mut summary = Self {
            date: today,
            ..Self::default()
        };
        for sale in month_sales.iter().filter(|s| s.status == SaleStatus::Completed) {
            summary.month_revenue += sale.total;
            if sale.date == today {
                summary.today_revenue += sale.total;
                summary.today_sales_count += 1;
            }
        }
        for expense in month_expenses
            .iter()
            .filter(|e| e.status != ExpenseStatus::Rejected)
        {
            summary.month_expenses += expense.amount;
            if expense.date == today {
                summary.today_expenses += expense.amount;
            }
            if expense.status == ExpenseStatus::Pending {
                summary.pending_expense_count += 1;
            }
        }
        summary.month_net_profit = summary.month_revenue - summary.month_expenses;
        summary
    }
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Recomputed from raw rows on every call
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let today = today();
        let month_start = start_of_month(today);
        let db = &*self.db_pool;

        let month_sales = sale::Entity::find()
            .filter(sale::Column::Date.between(month_start, today))
            .all(db)
            .await?;
        let month_expenses = expense::Entity::find()
            .filter(expense::Column::Date.between(month_start, today))
            .all(db)
            .await?;

        let mut summary = DashboardSummary::tally(today, &month_sales, &month_expenses);

        // Pending expenses from earlier months still need a decision
        summary.pending_expense_count = expense::Entity::find()
            .filter(expense::Column::Status.eq(ExpenseStatus::Pending))
            .count(db)
            .await?;

        summary.low_stock_count = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .all(db)
            .await?
            .iter()
            .filter(|p| p.is_low_stock())
            .count() as u64;

        summary.outstanding_debt = debt::Entity::find()
            .filter(debt::Column::Status.ne(DebtStatus::Paid))
            .all(db)
            .await?
            .iter()
            .map(|d| d.balance)
            .sum();

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ExpenseStatus, PaymentMethod};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn sale(total: Decimal, date: NaiveDate, status: SaleStatus) -> sale::Model {
        sale::Model {
            id: 0,
            product_id: None,
            product_name: "Unga".into(),
            quantity: dec!(1),
            unit_price: total,
            total,
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            customer_phone: None,
            mpesa_code: None,
            status,
            date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn expense(amount: Decimal, date: NaiveDate, status: ExpenseStatus) -> expense::Model {
        expense::Model {
            id: 0,
            description: "Stock run".into(),
            category: None,
            amount,
            status,
            approved_by: None,
            approved_at: None,
            date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn tally_splits_today_from_the_month() {
        let sales = vec![
            sale(dec!(200), day(10), SaleStatus::Completed),
            sale(dec!(50), day(12), SaleStatus::Completed),
            sale(dec!(999), day(12), SaleStatus::Cancelled),
        ];
        let expenses = vec![
            expense(dec!(30), day(12), ExpenseStatus::Pending),
            expense(dec!(70), day(3), ExpenseStatus::Approved),
            expense(dec!(500), day(12), ExpenseStatus::Rejected),
        ];

        let summary = DashboardSummary::tally(day(12), &sales, &expenses);
        assert_eq!(summary.today_revenue, dec!(50));
        assert_eq!(summary.today_sales_count, 1);
        assert_eq!(summary.today_expenses, dec!(30));
        assert_eq!(summary.month_revenue, dec!(250));
        assert_eq!(summary.month_expenses, dec!(100));
        assert_eq!(summary.month_net_profit, dec!(150));
        assert_eq!(summary.pending_expense_count, 1);
    }
}
