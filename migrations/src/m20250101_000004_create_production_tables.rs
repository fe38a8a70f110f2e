use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_businesses_table::Businesses;
use super::m20250101_000002_create_catalog_tables::Products;
use super::m20250101_000003_create_contact_tables::Employees;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000004_create_production_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Productions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Productions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Productions::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Productions::ProductId).uuid().null())
                    .col(ColumnDef::new(Productions::BatchNumber).string_len(50).not_null())
                    .col(ColumnDef::new(Productions::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Productions::Status)
                            .string_len(20)
                            .not_null()
                            .default("planned"),
                    )
                    .col(
                        ColumnDef::new(Productions::PlannedQuantity)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Productions::StartDate).date().null())
                    .col(ColumnDef::new(Productions::EndDate).date().null())
                    .col(ColumnDef::new(Productions::Notes).text().null())
                    .col(
                        ColumnDef::new(Productions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Productions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_productions_business")
                            .from(Productions::Table, Productions::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_productions_product")
                            .from(Productions::Table, Productions::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_productions_business_batch")
                    .table(Productions::Table)
                    .col(Productions::BusinessId)
                    .col(Productions::BatchNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionStages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionStages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductionStages::ProductionId).uuid().not_null())
                    .col(ColumnDef::new(ProductionStages::Name).string_len(255).not_null())
                    .col(ColumnDef::new(ProductionStages::Sequence).integer().not_null())
                    .col(
                        ColumnDef::new(ProductionStages::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ProductionStages::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProductionStages::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProductionStages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_stages_production")
                            .from(ProductionStages::Table, ProductionStages::ProductionId)
                            .to(Productions::Table, Productions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionResources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionResources::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductionResources::ProductionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductionResources::ProductId).uuid().null())
                    .col(
                        ColumnDef::new(ProductionResources::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionResources::Quantity)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionResources::Unit)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionResources::UnitCost)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionResources::StockConsumed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ProductionResources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_resources_production")
                            .from(ProductionResources::Table, ProductionResources::ProductionId)
                            .to(Productions::Table, Productions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_resources_product")
                            .from(ProductionResources::Table, ProductionResources::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionLabor::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionLabor::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductionLabor::ProductionId).uuid().not_null())
                    .col(ColumnDef::new(ProductionLabor::EmployeeId).uuid().null())
                    .col(
                        ColumnDef::new(ProductionLabor::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionLabor::Hours)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionLabor::HourlyRate)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductionLabor::WorkDate).date().null())
                    .col(
                        ColumnDef::new(ProductionLabor::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_labor_production")
                            .from(ProductionLabor::Table, ProductionLabor::ProductionId)
                            .to(Productions::Table, Productions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_labor_employee")
                            .from(ProductionLabor::Table, ProductionLabor::EmployeeId)
                            .to(Employees::Table, Employees::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionOutputs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionOutputs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::ProductionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductionOutputs::ProductId).uuid().null())
                    .col(
                        ColumnDef::new(ProductionOutputs::Quantity)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::Unit)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductionOutputs::Notes).text().null())
                    .col(
                        ColumnDef::new(ProductionOutputs::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_outputs_production")
                            .from(ProductionOutputs::Table, ProductionOutputs::ProductionId)
                            .to(Productions::Table, Productions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_outputs_product")
                            .from(ProductionOutputs::Table, ProductionOutputs::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductionOutputs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductionLabor::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductionResources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductionStages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Productions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Productions {
    Table,
    Id,
    BusinessId,
    ProductId,
    BatchNumber,
    Name,
    Status,
    PlannedQuantity,
    StartDate,
    EndDate,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ProductionStages {
    Table,
    Id,
    ProductionId,
    Name,
    Sequence,
    Status,
    StartedAt,
    CompletedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ProductionResources {
    Table,
    Id,
    ProductionId,
    ProductId,
    Name,
    Quantity,
    Unit,
    UnitCost,
    StockConsumed,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ProductionLabor {
    Table,
    Id,
    ProductionId,
    EmployeeId,
    Description,
    Hours,
    HourlyRate,
    WorkDate,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ProductionOutputs {
    Table,
    Id,
    ProductionId,
    ProductId,
    Quantity,
    Unit,
    Notes,
    RecordedAt,
}
