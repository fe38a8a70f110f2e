use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_businesses_table::Businesses;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000003_create_contact_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Customers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Customers::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Customers::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Customers::Email).string_len(255).null())
                    .col(ColumnDef::new(Customers::Phone).string_len(50).null())
                    .col(ColumnDef::new(Customers::Address).text().null())
                    .col(ColumnDef::new(Customers::Notes).text().null())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customers_business")
                            .from(Customers::Table, Customers::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Suppliers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Suppliers::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Suppliers::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Suppliers::ContactName).string_len(255).null())
                    .col(ColumnDef::new(Suppliers::Email).string_len(255).null())
                    .col(ColumnDef::new(Suppliers::Phone).string_len(50).null())
                    .col(ColumnDef::new(Suppliers::Address).text().null())
                    .col(ColumnDef::new(Suppliers::Notes).text().null())
                    .col(
                        ColumnDef::new(Suppliers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Suppliers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_suppliers_business")
                            .from(Suppliers::Table, Suppliers::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Employees::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Employees::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Employees::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Employees::Email).string_len(255).null())
                    .col(ColumnDef::new(Employees::Phone).string_len(50).null())
                    .col(ColumnDef::new(Employees::Position).string_len(100).null())
                    .col(ColumnDef::new(Employees::HourlyRate).decimal_len(16, 4).null())
                    .col(ColumnDef::new(Employees::HireDate).date().null())
                    .col(
                        ColumnDef::new(Employees::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Employees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_business")
                            .from(Employees::Table, Employees::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suppliers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    BusinessId,
    Name,
    Email,
    Phone,
    Address,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Suppliers {
    Table,
    Id,
    BusinessId,
    Name,
    ContactName,
    Email,
    Phone,
    Address,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Employees {
    Table,
    Id,
    BusinessId,
    Name,
    Email,
    Phone,
    Position,
    HourlyRate,
    HireDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
