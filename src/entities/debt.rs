use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl DebtStatus {
    /// Status implied by how much of `amount` has been paid so far.
    pub fn from_payments(amount: Decimal, amount_paid: Decimal) -> Self {
        if amount_paid <= Decimal::ZERO {
            Self::Pending
        } else if amount_paid >= amount {
            Self::Paid
        } else {
            Self::Partial
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Debt)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub customer_name: String,

    pub customer_phone: Option<String>,

    pub amount: Decimal,

    pub amount_paid: Decimal,

    /// Always `amount - amount_paid`
    pub balance: Decimal,

    pub status: DebtStatus,

    pub due_date: Option<NaiveDate>,

    /// Sale the debt originated from, if any
    pub sale_id: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != DebtStatus::Paid && self.due_date.map_or(false, |due| due < today)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id",
        on_delete = "SetNull"
    )]
    Sale,
    #[sea_orm(has_many = "super::debt_payment::Entity")]
    Payments,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::debt_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_follows_amount_paid() {
        assert_eq!(DebtStatus::from_payments(dec!(500), dec!(0)), DebtStatus::Pending);
        assert_eq!(DebtStatus::from_payments(dec!(500), dec!(200)), DebtStatus::Partial);
        assert_eq!(DebtStatus::from_payments(dec!(500), dec!(500)), DebtStatus::Paid);
        assert_eq!(DebtStatus::from_payments(dec!(500), dec!(650)), DebtStatus::Paid);
    }

    #[test]
    fn paid_debts_are_never_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut debt = Model {
            id: 1,
            customer_name: "Wanjiku".into(),
            customer_phone: None,
            amount: dec!(300),
            amount_paid: dec!(0),
            balance: dec!(300),
            status: DebtStatus::Pending,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            sale_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(debt.is_overdue(today));

        debt.status = DebtStatus::Paid;
        assert!(!debt.is_overdue(today));
    }
}
