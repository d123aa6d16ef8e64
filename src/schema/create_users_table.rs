use crate::executor::DbError;
use crate::migration::{Migration, SchemaManager};
use sea_query::{ColumnDef, Table};

/// `users`: accounts that own posts.
pub struct CreateUsersTable;

impl Migration for CreateUsersTable {
    fn identifier(&self) -> &str {
        "2025-07-20-050000_CreateUsersTable"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        let table = Table::create()
            .table("users")
            .col(ColumnDef::new("id").integer().not_null().auto_increment().primary_key())
            .col(ColumnDef::new("name").string_len(100).not_null())
            .col(ColumnDef::new("email").string_len(255).not_null().unique_key())
            .col(ColumnDef::new("phone").string_len(15).null())
            .col(ColumnDef::new("status").string_len(20).not_null().default("active"))
            .col(ColumnDef::new("created_at").timestamp().null())
            .col(ColumnDef::new("updated_at").timestamp().null())
            .col(ColumnDef::new("deleted_at").timestamp().null())
            .to_owned();

        manager.create_table(table)
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        manager.drop_table(Table::drop().table("users").to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;

    #[test]
    fn test_up_creates_users() {
        let executor = RecordingExecutor::new();
        CreateUsersTable.up(&SchemaManager::new(&executor)).unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 1);
        let sql = &statements[0];
        assert!(sql.starts_with("CREATE TABLE \"users\""), "{sql}");
        for column in ["\"name\"", "\"email\"", "\"phone\"", "\"status\"", "\"deleted_at\""] {
            assert!(sql.contains(column), "missing {column}");
        }
        assert!(sql.contains("UNIQUE"));
    }

    #[test]
    fn test_down_drops_users() {
        let executor = RecordingExecutor::new();
        CreateUsersTable.down(&SchemaManager::new(&executor)).unwrap();
        assert_eq!(executor.statements(), vec!["DROP TABLE \"users\""]);
    }
}
