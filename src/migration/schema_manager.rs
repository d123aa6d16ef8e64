//! SchemaManager - Provides methods for schema operations in migrations

use crate::executor::{DbError, DbExecutor};
use may_postgres::types::ToSql;
use sea_query::{
    IndexCreateStatement, IndexDropStatement, PostgresQueryBuilder, TableCreateStatement,
    TableDropStatement,
};

/// SchemaManager provides methods for performing schema operations in migrations
///
/// It borrows the runner's executor, so every statement a migration issues
/// runs on the same session and inside the same transaction as the ledger
/// write that records it.
pub struct SchemaManager<'a> {
    executor: &'a dyn DbExecutor,
}

impl<'a> SchemaManager<'a> {
    pub fn new(executor: &'a dyn DbExecutor) -> Self {
        Self { executor }
    }

    /// Create a table
    ///
    /// # Example
    /// ```rust,no_run
    /// # use bedrock::migration::SchemaManager;
    /// use sea_query::{Table, ColumnDef};
    ///
    /// # fn example(manager: &SchemaManager<'_>) -> Result<(), bedrock::DbError> {
    /// let table = Table::create()
    ///     .table("users")
    ///     .col(ColumnDef::new("id").integer().not_null().auto_increment().primary_key())
    ///     .col(ColumnDef::new("email").string().not_null().unique_key())
    ///     .to_owned();
    ///
    /// manager.create_table(table)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_table(&self, table: TableCreateStatement) -> Result<(), DbError> {
        let sql = table.build(PostgresQueryBuilder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Drop a table
    pub fn drop_table(&self, table: TableDropStatement) -> Result<(), DbError> {
        let sql = table.build(PostgresQueryBuilder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Create an index
    pub fn create_index(&self, index: IndexCreateStatement) -> Result<(), DbError> {
        let sql = index.build(PostgresQueryBuilder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Drop an index
    pub fn drop_index(&self, index: IndexDropStatement) -> Result<(), DbError> {
        let sql = index.build(PostgresQueryBuilder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Execute raw SQL
    ///
    /// # Example
    /// ```rust,no_run
    /// # fn example(manager: &bedrock::migration::SchemaManager<'_>) -> Result<(), bedrock::DbError> {
    /// manager.execute("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"", &[])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<(), DbError> {
        self.executor.execute(sql, params).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;
    use sea_query::{ColumnDef, Expr, Index, Table};

    #[test]
    fn test_statements_reach_executor_as_postgres_sql() {
        let executor = RecordingExecutor::new();
        let manager = SchemaManager::new(&executor);

        manager
            .create_table(
                Table::create()
                    .table("widgets")
                    .col(ColumnDef::new("id").integer().not_null().primary_key())
                    .to_owned(),
            )
            .unwrap();
        manager
            .create_index(
                Index::create()
                    .name("idx_widgets_id")
                    .table("widgets")
                    .col(Expr::col("id"))
                    .to_owned(),
            )
            .unwrap();
        manager.drop_table(Table::drop().table("widgets").to_owned()).unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE \"widgets\""));
        assert!(statements[1].contains("\"idx_widgets_id\""));
        assert!(statements[2].starts_with("DROP TABLE \"widgets\""));
    }

    #[test]
    fn test_executor_errors_propagate() {
        let executor = RecordingExecutor::failing("permission denied");
        let manager = SchemaManager::new(&executor);
        let err = manager.execute("CREATE EXTENSION pgcrypto", &[]).unwrap_err();
        assert!(err.to_string().contains("permission denied"));
    }
}
