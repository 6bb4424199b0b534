use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_sales_table::Sales;
use super::m20240101_000004_create_expenses_table::Expenses;
use super::m20240101_000005_create_debts_table::Debts;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000008_add_report_indexes"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sales_date")
                    .table(Sales::Table)
                    .col(Sales::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_expenses_date")
                    .table(Expenses::Table)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_debts_status")
                    .table(Debts::Table)
                    .col(Debts::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_debts_status").table(Debts::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_expenses_date")
                    .table(Expenses::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sales_date").table(Sales::Table).to_owned())
            .await
    }
}
