pub use sea_orm_migration::prelude::*;

mod m20260827_000001_create_users;
mod m20260827_000002_create_trips;
mod m20260827_000003_create_bookings;
mod m20260827_000004_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260827_000001_create_users::Migration),
            Box::new(m20260827_000002_create_trips::Migration),
            Box::new(m20260827_000003_create_bookings::Migration),
            Box::new(m20260827_000004_create_payments::Migration),
        ]
    }
}
