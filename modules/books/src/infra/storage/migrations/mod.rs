use sea_orm_migration::prelude::*;

mod m20250101_000001_create_books;
mod m20250101_000002_create_reviews;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_books::Migration),
            Box::new(m20250101_000002_create_reviews::Migration),
        ]
    }

    // Every module keeps its own history in the shared database.
    fn migration_table_name() -> DynIden {
        Alias::new("seaql_migrations_books").into_iden()
    }
}
