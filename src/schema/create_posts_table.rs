use crate::executor::DbError;
use crate::migration::{Migration, SchemaManager};
use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, Table};

/// `posts`: articles authored by a user. Depends on `users` for its foreign key.
pub struct CreatePostsTable;

impl Migration for CreatePostsTable {
    fn identifier(&self) -> &str {
        "2025-07-20-050553_CreatePostsTable"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        let table = Table::create()
            .table("posts")
            .col(ColumnDef::new("id").integer().not_null().auto_increment().primary_key())
            .col(ColumnDef::new("title").string_len(255).not_null())
            .col(ColumnDef::new("content").text().not_null())
            .col(ColumnDef::new("excerpt").text().null())
            .col(ColumnDef::new("status").string_len(20).not_null().default("draft"))
            .col(ColumnDef::new("user_id").integer().not_null())
            .col(ColumnDef::new("featured_image").string_len(255).null())
            .col(ColumnDef::new("published_at").timestamp().null())
            .col(ColumnDef::new("created_at").timestamp().null())
            .col(ColumnDef::new("updated_at").timestamp().null())
            .col(ColumnDef::new("deleted_at").timestamp().null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_posts_user_id")
                    .from("posts", "user_id")
                    .to("users", "id")
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table)?;

        for column in ["user_id", "status", "published_at"] {
            let index = Index::create()
                .name(format!("idx_posts_{column}"))
                .table("posts")
                .col(column)
                .to_owned();
            manager.create_index(index)?;
        }

        Ok(())
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        manager.drop_table(Table::drop().table("posts").to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;

    #[test]
    fn test_up_creates_posts_with_foreign_key_and_indexes() {
        let executor = RecordingExecutor::new();
        CreatePostsTable.up(&SchemaManager::new(&executor)).unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 4);
        assert!(statements[0].starts_with("CREATE TABLE \"posts\""));
        assert!(statements[0].contains("\"fk_posts_user_id\""));
        assert!(statements[0].contains("REFERENCES \"users\""));
        assert!(statements[0].contains("ON DELETE CASCADE"));
        assert!(statements[1].contains("\"idx_posts_user_id\""));
        assert!(statements[2].contains("\"idx_posts_status\""));
        assert!(statements[3].contains("\"idx_posts_published_at\""));
    }

    #[test]
    fn test_index_failure_stops_up() {
        let executor = RecordingExecutor::failing_on("CREATE INDEX", "disk full");
        let err = CreatePostsTable.up(&SchemaManager::new(&executor)).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(executor.statements().len(), 2);
    }
}
