use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_businesses_table::Businesses;
use super::m20250101_000003_create_contact_tables::Suppliers;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000006_create_finance_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FundingSources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FundingSources::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FundingSources::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(FundingSources::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(FundingSources::SourceType)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FundingSources::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FundingSources::ReceivedOn).date().null())
                    .col(ColumnDef::new(FundingSources::Notes).text().null())
                    .col(
                        ColumnDef::new(FundingSources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FundingSources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_funding_sources_business")
                            .from(FundingSources::Table, FundingSources::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenditures::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenditures::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenditures::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Expenditures::FundingSourceId).uuid().null())
                    .col(ColumnDef::new(Expenditures::SupplierId).uuid().null())
                    .col(ColumnDef::new(Expenditures::Category).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Expenditures::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenditures::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenditures::ExpenseDate).date().not_null())
                    .col(
                        ColumnDef::new(Expenditures::PaymentMethod)
                            .string_len(30)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Expenditures::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenditures::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenditures_business")
                            .from(Expenditures::Table, Expenditures::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenditures_funding_source")
                            .from(Expenditures::Table, Expenditures::FundingSourceId)
                            .to(FundingSources::Table, FundingSources::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenditures_supplier")
                            .from(Expenditures::Table, Expenditures::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenditures_business_date")
                    .table(Expenditures::Table)
                    .col(Expenditures::BusinessId)
                    .col(Expenditures::ExpenseDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenditures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FundingSources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum FundingSources {
    Table,
    Id,
    BusinessId,
    Name,
    SourceType,
    Amount,
    ReceivedOn,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Expenditures {
    Table,
    Id,
    BusinessId,
    FundingSourceId,
    SupplierId,
    Category,
    Description,
    Amount,
    ExpenseDate,
    PaymentMethod,
    CreatedAt,
    UpdatedAt,
}
