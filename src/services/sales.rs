use super::{clean, validate_non_negative, validate_positive};
use crate::{
    db::DbPool,
    entities::{debt, product, sale, DebtStatus, PaymentMethod, SaleStatus},
    errors::ServiceError,
    formatting::dates::today,
};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Days a customer gets to settle a sale taken on credit
pub const DEFAULT_DEBT_TERM_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSaleRequest {
    /// Catalogue product; stock is decremented when set
    pub product_id: Option<i32>,
    /// Required when `product_id` is absent
    pub product_name: Option<String>,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    /// Defaults to the product's price
    #[validate(custom = "validate_non_negative")]
    pub unit_price: Option<Decimal>,
    /// Defaults to `quantity * unit_price`
    #[validate(custom = "validate_non_negative")]
    pub total: Option<Decimal>,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub mpesa_code: Option<String>,
    /// Defaults to today (Nairobi)
    pub date: Option<NaiveDate>,
    /// Debt sales only; defaults to 30 days after the sale
    pub due_date: Option<NaiveDate>,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Cash
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSaleRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub mpesa_code: Option<String>,
    pub date: Option<NaiveDate>,
    /// Cancelling a sale returns its quantity to stock
    pub status: Option<SaleStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct SaleFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<SaleStatus>,
}

/// A recorded sale and, for credit sales, the debt opened for it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaleReceipt {
    pub sale: sale::Model,
    pub debt: Option<debt::Model>,
}

/// Checks the rules that depend on the payment method
pub fn check_payment_details(request: &CreateSaleRequest) -> Result<(), ServiceError> {
    if request.product_id.is_none() && clean(request.product_name.clone()).is_none() {
        return Err(ServiceError::ValidationError(
            "product_id or product_name is required".to_string(),
        ));
    }
    match request.payment_method {
        PaymentMethod::Mpesa if clean(request.mpesa_code.clone()).is_none() => Err(
            ServiceError::ValidationError("mpesa_code is required for M-Pesa sales".to_string()),
        ),
        PaymentMethod::Debt if clean(request.customer_name.clone()).is_none() => Err(
            ServiceError::ValidationError("customer_name is required for debt sales".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Service for recording sales
#[derive(Clone)]
pub struct SaleService {
    db_pool: Arc<DbPool>,
}

impl SaleService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_sales(&self, filter: SaleFilter) -> Result<Vec<sale::Model>, ServiceError> {
        let mut query = sale::Entity::find();
        if let Some(start) = filter.start_date {
            query = query.filter(sale::Column::Date.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(sale::Column::Date.lte(end));
        }
        if let Some(method) = filter.payment_method {
            query = query.filter(sale::Column::PaymentMethod.eq(method));
        }
        if let Some(status) = filter.status {
            query = query.filter(sale::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(sale::Column::Date)
            .order_by_desc(sale::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, id: i32) -> Result<sale::Model, ServiceError> {
        sale::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", id))
    }

    /// Records a sale. Inserting the row, taking the quantity out of stock and
    /// opening the debt for credit sales happen in one transaction.
    #[instrument(skip(self))]
    pub async fn create_sale(&self, request: CreateSaleRequest) -> Result<SaleReceipt, ServiceError> {
        request.validate()?;
        check_payment_details(&request)?;

        let txn = self.db_pool.begin().await?;

        let product = match request.product_id {
            Some(product_id) => Some(
                product::Entity::find_by_id(product_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Product", product_id))?,
            ),
            None => None,
        };

        if let Some(product) = &product {
            if !product.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "{} is not available for sale",
                    product.name
                )));
            }
            if product.stock_quantity < request.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "{} has {} in stock, {} requested",
                    product.name, product.stock_quantity, request.quantity
                )));
            }
        }

        let unit_price = request
            .unit_price
            .or_else(|| product.as_ref().map(|p| p.price))
            .ok_or_else(|| ServiceError::ValidationError("unit_price is required".to_string()))?;
        let total = request
            .total
            .unwrap_or_else(|| (request.quantity * unit_price).round_dp(2));
        let product_name = product
            .as_ref()
            .map(|p| p.name.clone())
            .or_else(|| clean(request.product_name.clone()))
            .unwrap_or_default();
        let date = request.date.unwrap_or_else(today);

        let created = sale::ActiveModel {
            product_id: Set(request.product_id),
            product_name: Set(product_name),
            quantity: Set(request.quantity),
            unit_price: Set(unit_price),
            total: Set(total),
            payment_method: Set(request.payment_method),
            customer_name: Set(clean(request.customer_name.clone())),
            customer_phone: Set(clean(request.customer_phone.clone())),
            mpesa_code: Set(clean(request.mpesa_code.clone())),
            status: Set(SaleStatus::Completed),
            date: Set(date),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to insert sale: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        if let Some(product) = &product {
            take_stock(&txn, product, request.quantity).await?;
        }

        let debt = if request.payment_method == PaymentMethod::Debt {
            let due_date = request
                .due_date
                .unwrap_or(date + Duration::days(DEFAULT_DEBT_TERM_DAYS));
            let opened = debt::ActiveModel {
                customer_name: Set(created.customer_name.clone().unwrap_or_default()),
                customer_phone: Set(created.customer_phone.clone()),
                amount: Set(total),
                amount_paid: Set(Decimal::ZERO),
                balance: Set(total),
                status: Set(DebtStatus::from_payments(total, Decimal::ZERO)),
                due_date: Set(Some(due_date)),
                sale_id: Set(Some(created.id)),
                notes: Set(Some(format!("Sale #{}: {}", created.id, created.product_name))),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            Some(opened)
        } else {
            None
        };

        txn.commit().await?;

        info!(
            sale_id = created.id,
            total = %created.total,
            payment_method = %created.payment_method,
            "Sale recorded"
        );
        Ok(SaleReceipt { sale: created, debt })
    }

    #[instrument(skip(self))]
    pub async fn update_sale(
        &self,
        id: i32,
        request: UpdateSaleRequest,
    ) -> Result<sale::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;

        let existing = sale::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", id))?;

        let cancelling = match (existing.status, request.status) {
            (SaleStatus::Cancelled, Some(SaleStatus::Completed)) => {
                return Err(ServiceError::InvalidOperation(
                    "a cancelled sale cannot be reinstated; record a new sale".to_string(),
                ))
            }
            (SaleStatus::Completed, Some(SaleStatus::Cancelled)) => true,
            _ => false,
        };

        if cancelling {
            release_debt(&txn, &existing).await?;
            restore_stock(&txn, &existing).await?;
        }

        let mut active: sale::ActiveModel = existing.into();
        if request.customer_name.is_some() {
            active.customer_name = Set(clean(request.customer_name));
        }
        if request.customer_phone.is_some() {
            active.customer_phone = Set(clean(request.customer_phone));
        }
        if request.mpesa_code.is_some() {
            active.mpesa_code = Set(clean(request.mpesa_code));
        }
        if let Some(date) = request.date {
            active.date = Set(date);
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(sale_id = id, cancelled = cancelling, "Sale updated");
        Ok(updated)
    }

    /// Deletes a sale, returning a completed sale's quantity to stock
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let existing = sale::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", id))?;

        if existing.status == SaleStatus::Completed {
            release_debt(&txn, &existing).await?;
            restore_stock(&txn, &existing).await?;
        }

        sale::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(sale_id = id, "Sale deleted");
        Ok(())
    }
}

/// Decrements stock only while enough is left, so concurrent sales cannot
/// take the same units.
async fn take_stock<C: ConnectionTrait>(
    db: &C,
    product: &product::Model,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::StockQuantity.gte(quantity))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "{} no longer has {} in stock",
            product.name, quantity
        )));
    }
    Ok(())
}

async fn restore_stock<C: ConnectionTrait>(db: &C, sold: &sale::Model) -> Result<(), ServiceError> {
    let Some(product_id) = sold.product_id else {
        return Ok(());
    };
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).add(sold.quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        warn!(sale_id = sold.id, product_id, "Product gone, stock not restored");
    }
    Ok(())
}

/// Removes the debt a credit sale opened. Once the customer has paid towards
/// it the sale can no longer be undone.
async fn release_debt<C: ConnectionTrait>(db: &C, sold: &sale::Model) -> Result<(), ServiceError> {
    if sold.payment_method != PaymentMethod::Debt {
        return Ok(());
    }
    let debts = debt::Entity::find()
        .filter(debt::Column::SaleId.eq(sold.id))
        .all(db)
        .await?;
    if let Some(paid) = debts.iter().find(|d| d.amount_paid > Decimal::ZERO) {
        return Err(ServiceError::InvalidOperation(format!(
            "debt {} for sale {} already has {} paid",
            paid.id, sold.id, paid.amount_paid
        )));
    }
    for opened in debts {
        let debt_id = opened.id;
        opened.delete(db).await?;
        info!(sale_id = sold.id, debt_id, "Debt for sale removed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn request(method: PaymentMethod) -> CreateSaleRequest {
        CreateSaleRequest {
            product_id: Some(1),
            product_name: None,
            quantity: dec!(2),
            unit_price: Some(dec!(120)),
            total: None,
            payment_method: method,
            customer_name: None,
            customer_phone: None,
            mpesa_code: None,
            date: None,
            due_date: None,
        }
    }

    #[test]
    fn cash_sale_needs_no_extra_details() {
        assert!(check_payment_details(&request(PaymentMethod::Cash)).is_ok());
    }

    #[test]
    fn mpesa_sale_needs_a_code() {
        let mut req = request(PaymentMethod::Mpesa);
        assert_matches!(
            check_payment_details(&req),
            Err(ServiceError::ValidationError(_))
        );
        req.mpesa_code = Some("QK71ABC2XY".into());
        assert!(check_payment_details(&req).is_ok());
    }

    #[test]
    fn debt_sale_needs_a_customer() {
        let mut req = request(PaymentMethod::Debt);
        req.customer_name = Some("   ".into());
        assert_matches!(
            check_payment_details(&req),
            Err(ServiceError::ValidationError(_))
        );
        req.customer_name = Some("Otieno".into());
        assert!(check_payment_details(&req).is_ok());
    }

    #[test]
    fn free_text_sale_needs_a_name() {
        let mut req = request(PaymentMethod::Cash);
        req.product_id = None;
        assert!(check_payment_details(&req).is_err());
        req.product_name = Some("Sukuma wiki".into());
        assert!(check_payment_details(&req).is_ok());
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let mut req = request(PaymentMethod::Cash);
        req.quantity = dec!(0);
        assert!(req.validate().is_err());
    }
}
