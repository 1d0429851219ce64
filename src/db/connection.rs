use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseConnection as SeaOrmConnection};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub type DatabaseConnection = Arc<SeaOrmConnection>;

pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect to a specific database path
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.display());
        info!("Connecting to database at: {}", db_url);

        let mut opt = ConnectOptions::new(db_url);
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        Self::open(opt).await
    }

    /// Private in-memory database, used by the demo runner
    pub async fn in_memory() -> Result<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        // Every pooled connection would otherwise get its own empty database
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        Self::open(opt).await
    }

    async fn open(opt: ConnectOptions) -> Result<Self> {
        let connection = SeaOrmDatabase::connect(opt)
            .await
            .context("Failed to connect to database")?;

        use sea_orm::{ConnectionTrait, Statement};
        connection
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "PRAGMA foreign_keys = ON",
            ))
            .await
            .context("Failed to enable foreign key constraints")?;

        info!("Successfully connected to database");

        Ok(Self {
            connection: Arc::new(connection),
        })
    }

    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    pub async fn migrate(&self) -> Result<()> {
        use crate::db::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        info!("Running database migrations");

        let pending_count = Migrator::get_pending_migrations(&*self.connection)
            .await
            .context("Failed to get pending migrations")?
            .len();

        if pending_count > 0 {
            Migrator::up(&*self.connection, None)
                .await
                .context("Failed to run migrations")?;

            info!("Database migrations completed successfully");
        } else {
            info!("No pending migrations to apply");
        }

        Ok(())
    }
}
