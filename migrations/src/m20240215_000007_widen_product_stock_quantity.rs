use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use super::m20240101_000002_create_products_table::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240215_000007_widen_product_stock_quantity"
    }
}

#[derive(DeriveIden)]
enum Widened {
    StockQuantityNew,
}

/// Loose produce is sold by weight, so stock needs fractional quantities.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() == DatabaseBackend::Sqlite {
            return swap_sqlite_stock_column(manager).await;
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Products::Table)
                    .modify_column(
                        ColumnDef::new(Products::StockQuantity)
                            .decimal_len(10, 3)
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The decimal column already holds whole quantities on SQLite
        if manager.get_database_backend() == DatabaseBackend::Sqlite {
            return Ok(());
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Products::Table)
                    .modify_column(
                        ColumnDef::new(Products::StockQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }
}

/// SQLite cannot change a column type in place: add a decimal column, copy the
/// stock across, drop the integer column and take over its name.
async fn swap_sqlite_stock_column(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .alter_table(
            Table::alter()
                .table(Products::Table)
                .add_column(
                    ColumnDef::new(Widened::StockQuantityNew)
                        .decimal_len(10, 3)
                        .not_null()
                        .default(0),
                )
                .to_owned(),
        )
        .await?;

    manager
        .exec_stmt(
            Query::update()
                .table(Products::Table)
                .value(Widened::StockQuantityNew, Expr::col(Products::StockQuantity))
                .to_owned(),
        )
        .await?;

    manager
        .alter_table(
            Table::alter()
                .table(Products::Table)
                .drop_column(Products::StockQuantity)
                .to_owned(),
        )
        .await?;

    manager
        .alter_table(
            Table::alter()
                .table(Products::Table)
                .rename_column(Widened::StockQuantityNew, Products::StockQuantity)
                .to_owned(),
        )
        .await
}
