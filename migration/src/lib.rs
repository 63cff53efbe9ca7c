pub use sea_orm_migration::prelude::*;

mod m20251201_000001_create_users_and_franchises;
mod m20251201_000002_create_wallets_and_charges;
mod m20251201_000003_create_api_keys_and_strategies;
mod m20251201_000004_create_plans_and_support;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251201_000001_create_users_and_franchises::Migration),
            Box::new(m20251201_000002_create_wallets_and_charges::Migration),
            Box::new(m20251201_000003_create_api_keys_and_strategies::Migration),
            Box::new(m20251201_000004_create_plans_and_support::Migration),
        ]
    }
}
