use super::{clean, validate_not_blank, validate_positive};
use crate::{
    db::DbPool,
    entities::{expense, ExpenseStatus},
    errors::ServiceError,
    formatting::dates::today,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    #[validate(custom = "validate_not_blank", length(max = 1000))]
    pub description: String,
    pub category: Option<String>,
    #[validate(custom = "validate_positive")]
    pub amount: Decimal,
    /// Defaults to today (Nairobi)
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateExpenseRequest {
    #[validate(custom = "validate_not_blank", length(max = 1000))]
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(custom = "validate_positive")]
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ExpenseFilter {
    pub status: Option<ExpenseStatus>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Service for shop expenses and their approval
#[derive(Clone)]
pub struct ExpenseService {
    db_pool: Arc<DbPool>,
}

impl ExpenseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_expenses(
        &self,
        filter: ExpenseFilter,
    ) -> Result<Vec<expense::Model>, ServiceError> {
        let mut query = expense::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(expense::Column::Status.eq(status));
        }
        if let Some(category) = clean(filter.category) {
            query = query.filter(expense::Column::Category.eq(category));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(expense::Column::Date.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(expense::Column::Date.lte(end));
        }
        Ok(query
            .order_by_desc(expense::Column::Date)
            .order_by_desc(expense::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_expense(&self, id: i32) -> Result<expense::Model, ServiceError> {
        expense::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Expense", id))
    }

    /// New expenses always start out pending
    #[instrument(skip(self))]
    pub async fn create_expense(
        &self,
        request: CreateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;

        let created = expense::ActiveModel {
            description: Set(request.description.trim().to_string()),
            category: Set(clean(request.category)),
            amount: Set(request.amount),
            status: Set(ExpenseStatus::Pending),
            approved_by: Set(None),
            approved_at: Set(None),
            date: Set(request.date.unwrap_or_else(today)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(expense_id = created.id, amount = %created.amount, "Expense recorded");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_expense(
        &self,
        id: i32,
        request: UpdateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_expense(id).await?;

        let mut active: expense::ActiveModel = existing.into();
        if let Some(description) = request.description {
            active.description = Set(description.trim().to_string());
        }
        if request.category.is_some() {
            active.category = Set(clean(request.category));
        }
        if let Some(amount) = request.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = request.date {
            active.date = Set(date);
        }

        let updated = active.update(&*self.db_pool).await?;
        info!(expense_id = id, "Expense updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_expense(&self, id: i32) -> Result<(), ServiceError> {
        let result = expense::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Expense", id));
        }
        info!(expense_id = id, "Expense deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn approve_expense(
        &self,
        id: i32,
        approver_id: i32,
    ) -> Result<expense::Model, ServiceError> {
        self.decide(id, approver_id, ExpenseStatus::Approved).await
    }

    #[instrument(skip(self))]
    pub async fn reject_expense(
        &self,
        id: i32,
        approver_id: i32,
    ) -> Result<expense::Model, ServiceError> {
        self.decide(id, approver_id, ExpenseStatus::Rejected).await
    }

    async fn decide(
        &self,
        id: i32,
        approver_id: i32,
        decision: ExpenseStatus,
    ) -> Result<expense::Model, ServiceError> {
        let existing = self.get_expense(id).await?;
        ensure_pending(&existing)?;

        let mut active: expense::ActiveModel = existing.into();
        active.status = Set(decision);
        active.approved_by = Set(Some(approver_id));
        active.approved_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db_pool).await?;
        info!(expense_id = id, approver_id, status = ?decision, "Expense reviewed");
        Ok(updated)
    }
}

/// Only pending expenses can be approved or rejected
fn ensure_pending(expense: &expense::Model) -> Result<(), ServiceError> {
    if expense.status != ExpenseStatus::Pending {
        return Err(ServiceError::InvalidOperation(format!(
            "Expense {} has already been {:?}",
            expense.id, expense.status
        ).to_lowercase()));
    }
    Ok(())
}
