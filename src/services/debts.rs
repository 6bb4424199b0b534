use super::{clean, validate_non_negative, validate_not_blank, validate_positive};
use crate::{
    db::DbPool,
    entities::{debt, debt_payment, sale, DebtStatus, PaymentMethod},
    errors::ServiceError,
    formatting::dates::today,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDebtRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub customer_name: String,
    pub customer_phone: Option<String>,
    #[validate(custom = "validate_positive")]
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub sale_id: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDebtRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Changing the amount recomputes balance and status from what was already paid
    #[validate(custom = "validate_positive")]
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    #[validate(custom = "validate_non_negative")]
    pub amount: Decimal,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    pub mpesa_code: Option<String>,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Cash
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DebtFilter {
    pub status: Option<DebtStatus>,
    /// Only unpaid debts past their due date
    pub overdue: Option<bool>,
    /// Substring of the customer name
    pub customer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DebtDetail {
    #[serde(flatten)]
    pub debt: debt::Model,
    pub payments: Vec<debt_payment::Model>,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentReceipt {
    pub payment: debt_payment::Model,
    pub debt: debt::Model,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DebtSummary {
    pub total_outstanding: Decimal,
    pub total_collected: Decimal,
    pub pending_count: u64,
    pub partial_count: u64,
    pub paid_count: u64,
    pub overdue_count: u64,
}

impl DebtSummary {
    pub fn from_debts(debts: &[debt::Model], today: NaiveDate) -> Self {
        debts.iter().fold(Self::default(), |mut summary, debt| {
            summary.total_outstanding += debt.balance;
            summary.total_collected += debt.amount_paid;
            match debt.status {
                DebtStatus::Pending => summary.pending_count += 1,
                DebtStatus::Partial => summary.partial_count += 1,
                DebtStatus::Paid => summary.paid_count += 1,
            }
            if debt.is_overdue(today) {
                summary.overdue_count += 1;
            }
            summary
        })
    }
}

/// Checks a payment against the debt it settles
pub fn check_payment(debt: &debt::Model, request: &RecordPaymentRequest) -> Result<(), ServiceError> {
    if request.amount <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Payment amount must be greater than zero".to_string(),
        ));
    }
    if request.amount > debt.balance {
        return Err(ServiceError::ValidationError(format!(
            "Payment of {} exceeds the outstanding balance of {}",
            request.amount, debt.balance
        )));
    }
    match request.payment_method {
        PaymentMethod::Debt => Err(ServiceError::ValidationError(
            "A debt cannot be paid with another debt".to_string(),
        )),
        PaymentMethod::Mpesa if clean(request.mpesa_code.clone()).is_none() => Err(
            ServiceError::ValidationError("mpesa_code is required for M-Pesa payments".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Service for customer debts and their repayments
#[derive(Clone)]
pub struct DebtService {
    db_pool: Arc<DbPool>,
}

impl DebtService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_debts(&self, filter: DebtFilter) -> Result<Vec<debt::Model>, ServiceError> {
        let mut query = debt::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(debt::Column::Status.eq(status));
        }
        if let Some(customer) = clean(filter.customer) {
            query = query.filter(debt::Column::CustomerName.contains(customer.as_str()));
        }
        let debts = query
            .order_by_asc(debt::Column::DueDate)
            .order_by_desc(debt::Column::Id)
            .all(&*self.db_pool)
            .await?;

        Ok(match filter.overdue {
            Some(wanted) => {
                let today = today();
                debts
                    .into_iter()
                    .filter(|d| d.is_overdue(today) == wanted)
                    .collect()
            }
            None => debts,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_debt(&self, id: i32) -> Result<debt::Model, ServiceError> {
        debt::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Debt", id))
    }

    #[instrument(skip(self))]
    pub async fn get_with_payments(&self, id: i32) -> Result<DebtDetail, ServiceError> {
        let debt = self.get_debt(id).await?;
        let payments = self.list_payments(id).await?;
        let is_overdue = debt.is_overdue(today());
        Ok(DebtDetail {
            debt,
            payments,
            is_overdue,
        })
    }

    #[instrument(skip(self))]
    pub async fn create_debt(&self, request: CreateDebtRequest) -> Result<debt::Model, ServiceError> {
        request.validate()?;
        if let Some(sale_id) = request.sale_id {
            if sale::Entity::find_by_id(sale_id)
                .one(&*self.db_pool)
                .await?
                .is_none()
            {
                return Err(ServiceError::ValidationError(format!(
                    "sale_id {} does not refer to a recorded sale",
                    sale_id
                )));
            }
        }

        let created = debt::ActiveModel {
            customer_name: Set(request.customer_name.trim().to_string()),
            customer_phone: Set(clean(request.customer_phone)),
            amount: Set(request.amount),
            amount_paid: Set(Decimal::ZERO),
            balance: Set(request.amount),
            status: Set(DebtStatus::Pending),
            due_date: Set(request.due_date),
            sale_id: Set(request.sale_id),
            notes: Set(clean(request.notes)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(debt_id = created.id, amount = %created.amount, "Debt opened");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_debt(
        &self,
        id: i32,
        request: UpdateDebtRequest,
    ) -> Result<debt::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_debt(id).await?;

        if let Some(amount) = request.amount {
            if amount < existing.amount_paid {
                return Err(ServiceError::ValidationError(format!(
                    "Amount {} is below the {} already paid",
                    amount, existing.amount_paid
                )));
            }
        }

        let amount_paid = existing.amount_paid;
        let mut active: debt::ActiveModel = existing.into();
        if let Some(name) = request.customer_name {
            active.customer_name = Set(name.trim().to_string());
        }
        if request.customer_phone.is_some() {
            active.customer_phone = Set(clean(request.customer_phone));
        }
        if let Some(amount) = request.amount {
            active.amount = Set(amount);
            active.balance = Set(amount - amount_paid);
            active.status = Set(DebtStatus::from_payments(amount, amount_paid));
        }
        if request.due_date.is_some() {
            active.due_date = Set(request.due_date);
        }
        if request.notes.is_some() {
            active.notes = Set(clean(request.notes));
        }

        let updated = active.update(&*self.db_pool).await?;
        info!(debt_id = id, "Debt updated");
        Ok(updated)
    }

    /// Deletes a debt; its payments go with it
    #[instrument(skip(self))]
    pub async fn delete_debt(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        debt_payment::Entity::delete_many()
            .filter(debt_payment::Column::DebtId.eq(id))
            .exec(&txn)
            .await?;
        let result = debt::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Debt", id));
        }
        txn.commit().await?;

        info!(debt_id = id, "Debt deleted");
        Ok(())
    }

    /// Records a repayment and moves the debt's balance and status along with it
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        debt_id: i32,
        request: RecordPaymentRequest,
        received_by: Option<i32>,
    ) -> Result<PaymentReceipt, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;

        let existing = debt::Entity::find_by_id(debt_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Debt", debt_id))?;
        check_payment(&existing, &request)?;

        // Applied only while the balance still covers it, so two payments
        // racing on the same debt cannot overpay it.
        let applied = debt::Entity::update_many()
            .col_expr(
                debt::Column::AmountPaid,
                Expr::col(debt::Column::AmountPaid).add(request.amount),
            )
            .col_expr(
                debt::Column::Balance,
                Expr::col(debt::Column::Balance).sub(request.amount),
            )
            .col_expr(debt::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(debt::Column::Id.eq(debt_id))
            .filter(debt::Column::Balance.gte(request.amount))
            .exec(&txn)
            .await?;
        if applied.rows_affected == 0 {
            return Err(ServiceError::ValidationError(format!(
                "payment of {} exceeds the outstanding balance of debt {}",
                request.amount, debt_id
            )));
        }

        let payment = debt_payment::ActiveModel {
            debt_id: Set(debt_id),
            amount: Set(request.amount),
            payment_method: Set(request.payment_method),
            mpesa_code: Set(clean(request.mpesa_code)),
            received_by: Set(received_by),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let paid = debt::Entity::find_by_id(debt_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Debt", debt_id))?;
        let status = DebtStatus::from_payments(paid.amount, paid.amount_paid);
        let mut active: debt::ActiveModel = paid.into();
        active.status = Set(status);
        let debt = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            debt_id,
            payment_id = payment.id,
            amount = %payment.amount,
            balance = %debt.balance,
            "Debt payment recorded"
        );
        Ok(PaymentReceipt { payment, debt })
    }

    #[instrument(skip(self))]
    pub async fn list_payments(
        &self,
        debt_id: i32,
    ) -> Result<Vec<debt_payment::Model>, ServiceError> {
        Ok(debt_payment::Entity::find()
            .filter(debt_payment::Column::DebtId.eq(debt_id))
            .order_by_desc(debt_payment::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DebtSummary, ServiceError> {
        let debts = debt::Entity::find().all(&*self.db_pool).await?;
        Ok(DebtSummary::from_debts(&debts, today()))
    }
}
