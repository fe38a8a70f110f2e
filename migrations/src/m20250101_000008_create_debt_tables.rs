use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_businesses_table::Businesses;
use super::m20250101_000003_create_contact_tables::{Customers, Suppliers};
use super::m20250101_000007_create_sales_tables::Sales;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000008_create_debt_tables"
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
                    .col(ColumnDef::new(Debts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Debts::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Debts::Direction).string_len(20).not_null())
                    .col(ColumnDef::new(Debts::CustomerId).uuid().null())
                    .col(ColumnDef::new(Debts::SupplierId).uuid().null())
                    .col(ColumnDef::new(Debts::SaleId).uuid().null())
                    .col(
                        ColumnDef::new(Debts::CounterpartyName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Debts::Description).text().null())
                    .col(ColumnDef::new(Debts::Amount).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Debts::AmountPaid).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Debts::DueDate).date().null())
                    .col(
                        ColumnDef::new(Debts::Status)
                            .string_len(20)
                            .not_null()
                            .default("outstanding"),
                    )
                    .col(
                        ColumnDef::new(Debts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Debts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_business")
                            .from(Debts::Table, Debts::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_customer")
                            .from(Debts::Table, Debts::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_supplier")
                            .from(Debts::Table, Debts::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_sale")
                            .from(Debts::Table, Debts::SaleId)
                            .to(Sales::Table, Sales::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DebtPayments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DebtPayments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DebtPayments::DebtId).uuid().not_null())
                    .col(
                        ColumnDef::new(DebtPayments::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DebtPayments::PaidOn).date().not_null())
                    .col(ColumnDef::new(DebtPayments::Note).text().null())
                    .col(
                        ColumnDef::new(DebtPayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debt_payments_debt")
                            .from(DebtPayments::Table, DebtPayments::DebtId)
                            .to(Debts::Table, Debts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DebtPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Debts {
    Table,
    Id,
    BusinessId,
    Direction,
    CustomerId,
    SupplierId,
    SaleId,
    CounterpartyName,
    Description,
    Amount,
    AmountPaid,
    DueDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum DebtPayments {
    Table,
    Id,
    DebtId,
    Amount,
    PaidOn,
    Note,
    CreatedAt,
}
