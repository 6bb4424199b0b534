use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_sales_table::Sales;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000005_create_debts_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Debts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Debts::CustomerName).string_len(255).not_null())
                    .col(ColumnDef::new(Debts::CustomerPhone).string_len(50).null())
                    .col(ColumnDef::new(Debts::Amount).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Debts::AmountPaid)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Debts::Balance).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Debts::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Debts::DueDate).date().null())
                    .col(ColumnDef::new(Debts::SaleId).integer().null())
                    .col(ColumnDef::new(Debts::Notes).text().null())
                    .col(
                        ColumnDef::new(Debts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Debts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_sale_id")
                            .from(Debts::Table, Debts::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Debts {
    Table,
    Id,
    CustomerName,
    CustomerPhone,
    Amount,
    AmountPaid,
    Balance,
    Status,
    DueDate,
    SaleId,
    Notes,
    CreatedAt,
    UpdatedAt,
}
