//! The application's own migrations

mod create_posts_table;
mod create_users_table;

pub use create_posts_table::CreatePostsTable;
pub use create_users_table::CreateUsersTable;

use crate::error::InstallError;
use crate::migration::MigrationRegistry;

impl MigrationRegistry {
    /// Registry holding every migration shipped with the application.
    pub fn builtin() -> Result<Self, InstallError> {
        let mut registry = Self::new();
        registry.register(CreateUsersTable)?;
        registry.register(CreatePostsTable)?;
        Ok(registry)
    }
}
