pub use sea_orm_migration::prelude::*;

mod m20260301_000001_users;
mod m20260301_000002_groups;
mod m20260301_000003_expenses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_users::Migration),
            Box::new(m20260301_000002_groups::Migration),
            Box::new(m20260301_000003_expenses::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, Database, Statement};

    use super::*;

    #[tokio::test]
    async fn up_then_down_leaves_an_empty_schema() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let manager = SchemaManager::new(&db);
        for table in ["users", "sessions", "groups", "group_memberships", "expenses", "expense_shares"] {
            assert!(manager.has_table(table).await.unwrap(), "missing {table}");
        }

        Migrator::down(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        let rows = db
            .query_all(Statement::from_string(
                backend,
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'groups'",
            ))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
