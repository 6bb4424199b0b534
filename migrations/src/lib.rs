pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_products_table;
mod m20240101_000003_create_sales_table;
mod m20240101_000004_create_expenses_table;
mod m20240101_000005_create_debts_table;
mod m20240101_000006_create_debt_payments_table;
mod m20240215_000007_widen_product_stock_quantity;
mod m20240301_000008_add_report_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_sales_table::Migration),
            Box::new(m20240101_000004_create_expenses_table::Migration),
            Box::new(m20240101_000005_create_debts_table::Migration),
            Box::new(m20240101_000006_create_debt_payments_table::Migration),
            Box::new(m20240215_000007_widen_product_stock_quantity::Migration),
            Box::new(m20240301_000008_add_report_indexes::Migration),
        ]
    }
}
