use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_businesses_table::Businesses;
use super::m20250101_000002_create_catalog_tables::Products;
use super::m20250101_000003_create_contact_tables::Employees;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000005_create_distribution_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DistributionClients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DistributionClients::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DistributionClients::BusinessId).uuid().not_null())
                    .col(
                        ColumnDef::new(DistributionClients::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DistributionClients::ClientType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DistributionClients::ContactName)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(DistributionClients::Phone).string_len(50).null())
                    .col(ColumnDef::new(DistributionClients::Email).string_len(255).null())
                    .col(ColumnDef::new(DistributionClients::Address).text().null())
                    .col(ColumnDef::new(DistributionClients::Notes).text().null())
                    .col(
                        ColumnDef::new(DistributionClients::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DistributionClients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DistributionClients::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distribution_clients_business")
                            .from(DistributionClients::Table, DistributionClients::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DistributionRoutes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DistributionRoutes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DistributionRoutes::BusinessId).uuid().not_null())
                    .col(
                        ColumnDef::new(DistributionRoutes::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DistributionRoutes::Description).text().null())
                    .col(
                        ColumnDef::new(DistributionRoutes::DeliveryDays)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(DistributionRoutes::DriverId).uuid().null())
                    .col(
                        ColumnDef::new(DistributionRoutes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DistributionRoutes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DistributionRoutes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distribution_routes_business")
                            .from(DistributionRoutes::Table, DistributionRoutes::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distribution_routes_driver")
                            .from(DistributionRoutes::Table, DistributionRoutes::DriverId)
                            .to(Employees::Table, Employees::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deliveries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deliveries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deliveries::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Deliveries::ClientId).uuid().not_null())
                    .col(ColumnDef::new(Deliveries::RouteId).uuid().null())
                    .col(ColumnDef::new(Deliveries::ProductId).uuid().null())
                    .col(ColumnDef::new(Deliveries::ScheduledDate).date().not_null())
                    .col(
                        ColumnDef::new(Deliveries::Quantity)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deliveries::UnitPrice)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deliveries::Status)
                            .string_len(20)
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(
                        ColumnDef::new(Deliveries::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Deliveries::Notes).text().null())
                    .col(
                        ColumnDef::new(Deliveries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deliveries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deliveries_business")
                            .from(Deliveries::Table, Deliveries::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deliveries_client")
                            .from(Deliveries::Table, Deliveries::ClientId)
                            .to(DistributionClients::Table, DistributionClients::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deliveries_route")
                            .from(Deliveries::Table, Deliveries::RouteId)
                            .to(DistributionRoutes::Table, DistributionRoutes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deliveries_product")
                            .from(Deliveries::Table, Deliveries::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_deliveries_business_date")
                    .table(Deliveries::Table)
                    .col(Deliveries::BusinessId)
                    .col(Deliveries::ScheduledDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deliveries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DistributionRoutes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DistributionClients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DistributionClients {
    Table,
    Id,
    BusinessId,
    Name,
    ClientType,
    ContactName,
    Phone,
    Email,
    Address,
    Notes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum DistributionRoutes {
    Table,
    Id,
    BusinessId,
    Name,
    Description,
    DeliveryDays,
    DriverId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Deliveries {
    Table,
    Id,
    BusinessId,
    ClientId,
    RouteId,
    ProductId,
    ScheduledDate,
    Quantity,
    UnitPrice,
    Status,
    DeliveredAt,
    Notes,
    CreatedAt,
    UpdatedAt,
}
