use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_products_table::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000003_create_sales_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sales::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sales::ProductId).integer().null())
                    .col(ColumnDef::new(Sales::ProductName).string_len(255).not_null())
                    .col(ColumnDef::new(Sales::Quantity).decimal_len(10, 3).not_null())
                    .col(ColumnDef::new(Sales::UnitPrice).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Sales::Total).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Sales::PaymentMethod)
                            .string_len(20)
                            .not_null()
                            .default("cash"),
                    )
                    .col(ColumnDef::new(Sales::CustomerName).string_len(255).null())
                    .col(ColumnDef::new(Sales::CustomerPhone).string_len(50).null())
                    .col(ColumnDef::new(Sales::MpesaCode).string_len(50).null())
                    .col(
                        ColumnDef::new(Sales::Status)
                            .string_len(20)
                            .not_null()
                            .default("completed"),
                    )
                    .col(ColumnDef::new(Sales::Date).date().not_null())
                    .col(
                        ColumnDef::new(Sales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Sales::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_product_id")
                            .from(Sales::Table, Sales::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Sales {
    Table,
    Id,
    ProductId,
    ProductName,
    Quantity,
    UnitPrice,
    Total,
    PaymentMethod,
    CustomerName,
    CustomerPhone,
    MpesaCode,
    Status,
    Date,
    CreatedAt,
    UpdatedAt,
}
