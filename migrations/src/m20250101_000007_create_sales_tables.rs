use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_businesses_table::Businesses;
use super::m20250101_000002_create_catalog_tables::Products;
use super::m20250101_000003_create_contact_tables::Customers;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000007_create_sales_tables"
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
                    .col(ColumnDef::new(Sales::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sales::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Sales::CustomerId).uuid().null())
                    .col(ColumnDef::new(Sales::SaleNumber).string_len(50).not_null())
                    .col(ColumnDef::new(Sales::Subtotal).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Sales::Discount).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Sales::Total).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Sales::AmountPaid).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Sales::PaymentMethod).string_len(30).not_null())
                    .col(ColumnDef::new(Sales::PaymentStatus).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Sales::Status)
                            .string_len(20)
                            .not_null()
                            .default("completed"),
                    )
                    .col(
                        ColumnDef::new(Sales::SoldAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sales::Notes).text().null())
                    .col(
                        ColumnDef::new(Sales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_business")
                            .from(Sales::Table, Sales::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_customer")
                            .from(Sales::Table, Sales::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_business_sold_at")
                    .table(Sales::Table)
                    .col(Sales::BusinessId)
                    .col(Sales::SoldAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SaleItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SaleItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                    .col(ColumnDef::new(SaleItems::ProductId).uuid().not_null())
                    .col(ColumnDef::new(SaleItems::ProductName).string_len(255).not_null())
                    .col(
                        ColumnDef::new(SaleItems::Quantity)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SaleItems::UnitPrice)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SaleItems::UnitCost)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SaleItems::LineTotal)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_sale")
                            .from(SaleItems::Table, SaleItems::SaleId)
                            .to(Sales::Table, Sales::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_product")
                            .from(SaleItems::Table, SaleItems::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SaleItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Sales {
    Table,
    Id,
    BusinessId,
    CustomerId,
    SaleNumber,
    Subtotal,
    Discount,
    Total,
    AmountPaid,
    PaymentMethod,
    PaymentStatus,
    Status,
    SoldAt,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum SaleItems {
    Table,
    Id,
    SaleId,
    ProductId,
    ProductName,
    Quantity,
    UnitPrice,
    UnitCost,
    LineTotal,
}
