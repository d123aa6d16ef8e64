//! Ledger (migration state table) management

use sea_query::{ColumnDef, PostgresQueryBuilder, Table, TableCreateStatement};

/// Build the `CREATE TABLE IF NOT EXISTS` statement for the ledger.
///
/// Column layout matches existing installations: `id`, `version`, `class`,
/// `group`, `namespace`, `time` (epoch seconds), `batch`.
pub fn create_ledger_table(table: &str) -> TableCreateStatement {
    Table::create()
        .table(table.to_string())
        .if_not_exists()
        .col(
            ColumnDef::new("id")
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new("version").string_len(255).not_null())
        .col(ColumnDef::new("class").string_len(255).not_null())
        .col(ColumnDef::new("group").string_len(255).not_null())
        .col(ColumnDef::new("namespace").string_len(255).not_null())
        .col(ColumnDef::new("time").big_integer().not_null())
        .col(ColumnDef::new("batch").integer().not_null())
        .to_owned()
}

/// Ledger DDL rendered for PostgreSQL.
pub fn create_ledger_table_sql(table: &str) -> String {
    create_ledger_table(table).build(PostgresQueryBuilder)
}

/// Quote an identifier for interpolation into hand-written SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_ddl_columns() {
        let sql = create_ledger_table_sql("migrations");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"migrations\""), "{sql}");
        for column in ["\"id\"", "\"version\"", "\"class\"", "\"group\"", "\"namespace\"", "\"time\"", "\"batch\""] {
            assert!(sql.contains(column), "missing {column} in {sql}");
        }
        assert!(sql.contains("PRIMARY KEY"));
    }

    #[test]
    fn test_ledger_ddl_uses_configured_name() {
        let sql = create_ledger_table_sql("schema_ledger");
        assert!(sql.contains("\"schema_ledger\""));
        assert!(!sql.contains("\"migrations\""));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("migrations"), "\"migrations\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}
