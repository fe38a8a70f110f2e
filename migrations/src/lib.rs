pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_businesses_table;
mod m20250101_000002_create_catalog_tables;
mod m20250101_000003_create_contact_tables;
mod m20250101_000004_create_production_tables;
mod m20250101_000005_create_distribution_tables;
mod m20250101_000006_create_finance_tables;
mod m20250101_000007_create_sales_tables;
mod m20250101_000008_create_debt_tables;
mod m20250101_000009_create_appointments_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_businesses_table::Migration),
            Box::new(m20250101_000002_create_catalog_tables::Migration),
            Box::new(m20250101_000003_create_contact_tables::Migration),
            Box::new(m20250101_000004_create_production_tables::Migration),
            Box::new(m20250101_000005_create_distribution_tables::Migration),
            Box::new(m20250101_000006_create_finance_tables::Migration),
            Box::new(m20250101_000007_create_sales_tables::Migration),
            Box::new(m20250101_000008_create_debt_tables::Migration),
            Box::new(m20250101_000009_create_appointments_table::Migration),
        ]
    }
}
