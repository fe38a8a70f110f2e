use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000001_create_businesses_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Businesses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Businesses::OwnerId).string_len(128).not_null())
                    .col(ColumnDef::new(Businesses::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Businesses::Description).text().null())
                    .col(ColumnDef::new(Businesses::BusinessType).string_len(50).null())
                    .col(
                        ColumnDef::new(Businesses::Currency)
                            .string_len(3)
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Businesses::Email).string_len(255).null())
                    .col(ColumnDef::new(Businesses::Phone).string_len(50).null())
                    .col(ColumnDef::new(Businesses::Address).text().null())
                    .col(ColumnDef::new(Businesses::OpeningTime).time().not_null())
                    .col(ColumnDef::new(Businesses::ClosingTime).time().not_null())
                    .col(
                        ColumnDef::new(Businesses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Businesses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_businesses_owner_id")
                    .table(Businesses::Table)
                    .col(Businesses::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Businesses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Businesses {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    BusinessType,
    Currency,
    Email,
    Phone,
    Address,
    OpeningTime,
    ClosingTime,
    CreatedAt,
    UpdatedAt,
}
