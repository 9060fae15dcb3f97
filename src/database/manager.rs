use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;

/// Errors raised by the store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation. Authoritative over any application pre-check.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DatabaseError {
    /// Maps a PostgreSQL unique violation (23505) to `Conflict`, everything else passes through
    pub fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                return DatabaseError::Conflict(format!("{} already exists", what));
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Owns the PostgreSQL pool and opens tenant-scoped transactions
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Connect using the configured URL, optionally applying migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        url::Url::parse(&config.url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);

        if config.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations applied");
        }

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Begin a transaction with `app.tenant_id` set, so row-level security
    /// policies only expose the caller's tenant rows.
    pub async fn tenant_tx(&self, tenant_id: Uuid) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(tenant_id.to_string())
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
