pub use sea_orm_migration::prelude::*;

mod m20251101_000001_create_vendors_and_service_areas;
mod m20251101_000002_create_staff;
mod m20251101_000003_create_products;
mod m20251101_000004_create_orders;
mod m20251120_000001_add_order_invoice_columns;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000001_create_vendors_and_service_areas::Migration),
            Box::new(m20251101_000002_create_staff::Migration),
            Box::new(m20251101_000003_create_products::Migration),
            Box::new(m20251101_000004_create_orders::Migration),
            Box::new(m20251120_000001_add_order_invoice_columns::Migration),
        ]
    }
}
