pub use sea_orm_migration::prelude::*;

mod m20260701_000001_create_products;
mod m20260701_000002_create_deals;
mod m20260701_000003_create_sync_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260701_000001_create_products::Migration),
            Box::new(m20260701_000002_create_deals::Migration),
            Box::new(m20260701_000003_create_sync_logs::Migration),
        ]
    }
}
