//! sea-orm entities for the shop schema.
//!
//! Tables are created by the `migrations` crate; column types here mirror those
//! migrations (money as `DECIMAL(12,2)`, quantities as `DECIMAL(10,3)`).

pub mod debt;
pub mod debt_payment;
pub mod expense;
pub mod product;
pub mod sale;
pub mod user;

pub use debt::{DebtStatus, Entity as Debt, Model as DebtModel};
pub use debt_payment::{Entity as DebtPayment, Model as DebtPaymentModel};
pub use expense::{Entity as Expense, ExpenseStatus, Model as ExpenseModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use sale::{Entity as Sale, Model as SaleModel, PaymentMethod, SaleStatus};
pub use user::{Entity as User, Model as UserModel};
