#![cfg(test)]

use crate::db::connection::Database;
use anyhow::Result;
use sea_orm::DatabaseConnection as SeaOrmConnection;
use std::sync::Arc;
use tempfile::TempDir;

/// Migrated SQLite library in a temporary directory, removed on drop
pub struct TestDatabase {
    pub connection: Arc<SeaOrmConnection>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("library.db");

        let db = Database::connect(&db_path).await?;
        db.migrate().await?;

        Ok(Self {
            connection: db.get_connection(),
            _temp_dir: temp_dir,
        })
    }

    pub fn connection(&self) -> Arc<SeaOrmConnection> {
        self.connection.clone()
    }
}

pub async fn create_test_db() -> Result<TestDatabase> {
    TestDatabase::new().await
}
